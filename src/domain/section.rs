//! Sections and the owned outline trees they are assembled into.
//!
//! A [`Section`] is the payload of one heading: its depth, its title, the body
//! text up to the next heading and an optional test reference. Markers that
//! authors embed in the title (`[INTERFACE]`, `[IMPLEMENTS: name]`) are parsed
//! once, on construction, into [`Tags`].
//!
//! An [`Outline`] is an owned nested tree of sections. Parsers and the
//! directory merger produce outlines; [`Specification::new`] flattens them
//! into an indexed forest with parent links.
//!
//! [`Specification::new`]: crate::Specification::new

/// Marker that turns a section into a contract.
pub const INTERFACE_TAG: &str = "[INTERFACE]";

/// Opening of the marker that claims conformance to a named contract.
pub const IMPLEMENTS_TAG: &str = "[IMPLEMENTS:";

/// Machine-readable markers parsed from a section title.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tags {
    /// Contract name, present when the title carries [`INTERFACE_TAG`].
    interface: Option<String>,

    /// Name of the contract this section claims to implement.
    implements: Option<String>,
}

impl Tags {
    /// Parses the markers embedded in `title`.
    ///
    /// The interface marker is an exact, case-sensitive substring match. The
    /// contract name is the text before the marker, trimmed; anything after
    /// the marker is not part of the name.
    ///
    /// The implemented name is the text between `[IMPLEMENTS:` and the next
    /// `]`, trimmed. An unterminated or empty marker is ignored.
    #[must_use]
    pub fn parse(title: &str) -> Self {
        let interface = title
            .find(INTERFACE_TAG)
            .map(|start| title[..start].trim().to_string());

        let implements = title.find(IMPLEMENTS_TAG).and_then(|start| {
            let rest = &title[start + IMPLEMENTS_TAG.len()..];
            let end = rest.find(']')?;
            let name = rest[..end].trim();
            (!name.is_empty()).then(|| name.to_string())
        });

        Self {
            interface,
            implements,
        }
    }

    /// Whether the title carries the interface marker.
    #[must_use]
    pub const fn is_interface(&self) -> bool {
        self.interface.is_some()
    }

    /// The contract name of an interface section.
    #[must_use]
    pub fn interface_name(&self) -> Option<&str> {
        self.interface.as_deref()
    }

    /// The contract an implementation section claims to satisfy.
    #[must_use]
    pub fn implements(&self) -> Option<&str> {
        self.implements.as_deref()
    }
}

/// The payload of a single heading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    level: i32,
    title: String,
    content: String,
    test_reference: Option<String>,
    tags: Tags,
}

impl Section {
    /// Creates a section, parsing the markers embedded in `title`.
    #[must_use]
    pub fn new(
        level: i32,
        title: impl Into<String>,
        content: impl Into<String>,
        test_reference: Option<String>,
    ) -> Self {
        let title = title.into();
        let tags = Tags::parse(&title);
        Self {
            level,
            title,
            content: content.into(),
            test_reference,
            tags,
        }
    }

    /// Creates a section with no body, as synthesized from a directory name.
    #[must_use]
    pub fn heading(level: i32, title: impl Into<String>) -> Self {
        Self::new(level, title, String::new(), None)
    }

    /// Heading depth. Authored sections use 1 to 6; merged sections may be
    /// renormalized outside that range.
    #[must_use]
    pub const fn level(&self) -> i32 {
        self.level
    }

    pub(crate) const fn set_level(&mut self, level: i32) {
        self.level = level;
    }

    /// Display text of the heading, markers included.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Body text between this heading and the next one, trimmed.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// The test identifier referenced from the body, if any.
    #[must_use]
    pub fn test_reference(&self) -> Option<&str> {
        self.test_reference.as_deref()
    }

    /// Whether the body references a test.
    #[must_use]
    pub const fn has_test(&self) -> bool {
        self.test_reference.is_some()
    }

    /// The parsed title markers.
    #[must_use]
    pub const fn tags(&self) -> &Tags {
        &self.tags
    }

    /// Whether this section is a contract.
    #[must_use]
    pub const fn is_interface(&self) -> bool {
        self.tags.is_interface()
    }

    /// The contract this section claims to implement, if any.
    #[must_use]
    pub fn implemented_interface_name(&self) -> Option<&str> {
        self.tags.implements()
    }
}

/// An owned tree of sections, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outline {
    /// The section at the root of this subtree.
    pub section: Section,
    /// Immediate sub-sections.
    pub children: Vec<Outline>,
}

impl Outline {
    /// Creates a childless outline.
    #[must_use]
    pub const fn new(section: Section) -> Self {
        Self {
            section,
            children: Vec::new(),
        }
    }

    /// Creates an outline with the given children.
    #[must_use]
    pub const fn with_children(section: Section, children: Vec<Self>) -> Self {
        Self { section, children }
    }

    /// Title of the root section.
    #[must_use]
    pub fn title(&self) -> &str {
        self.section.title()
    }

    /// Whether this subtree has no children.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Rewrites the level of this subtree so that the root sits at `level`.
    ///
    /// Each child ends up exactly one level below its parent.
    pub fn renormalize(&mut self, level: i32) {
        self.section.set_level(level);
        for child in &mut self.children {
            child.renormalize(level + 1);
        }
    }
}
