//! The indexed forest of sections for one invocation.
//!
//! The [`Specification`] knows nothing about markdown or the filesystem. It
//! stores every section once, in pre-order, and addresses them by
//! [`SectionId`]. Each node owns the ids of its children; the parent id is a
//! back-reference used only to answer ancestor questions such as
//! [`SectionRef::requires_test`].

use std::{
    ops::Deref,
    path::{Path, PathBuf},
};

use crate::domain::section::{Outline, Section};

/// Index of a section within a [`Specification`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SectionId(usize);

#[derive(Debug, Clone, PartialEq, Eq)]
struct Node {
    section: Section,
    parent: Option<SectionId>,
    children: Vec<SectionId>,
}

/// An ordered forest of sections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Specification {
    /// Sections in pre-order. A node's id is its position here.
    nodes: Vec<Node>,

    /// Top-level sections, in document order.
    roots: Vec<SectionId>,

    /// The file or directory the forest was loaded from.
    source: Option<PathBuf>,
}

impl Specification {
    /// Builds a forest from owned outlines, attaching parent links.
    #[must_use]
    pub fn new(outlines: Vec<Outline>) -> Self {
        let mut specification = Self::default();
        for outline in outlines {
            let id = specification.insert(outline, None);
            specification.roots.push(id);
        }
        specification
    }

    fn insert(&mut self, outline: Outline, parent: Option<SectionId>) -> SectionId {
        let Outline { section, children } = outline;
        let id = SectionId(self.nodes.len());
        self.nodes.push(Node {
            section,
            parent,
            children: Vec::with_capacity(children.len()),
        });
        for child in children {
            let child_id = self.insert(child, Some(id));
            self.nodes[id.0].children.push(child_id);
        }
        id
    }

    /// Records where the forest was loaded from.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// The file or directory the forest was loaded from, if known.
    #[must_use]
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Total number of sections at any depth.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the forest has no sections at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Top-level sections, in document order.
    pub fn roots(&self) -> impl Iterator<Item = SectionRef<'_>> {
        self.roots.iter().map(|&id| SectionRef { spec: self, id })
    }

    /// Looks up a section by id.
    #[must_use]
    pub fn section(&self, id: SectionId) -> Option<SectionRef<'_>> {
        (id.0 < self.nodes.len()).then_some(SectionRef { spec: self, id })
    }

    /// Every section, in pre-order.
    pub fn iter(&self) -> impl Iterator<Item = SectionRef<'_>> {
        (0..self.nodes.len()).map(|index| SectionRef {
            spec: self,
            id: SectionId(index),
        })
    }

    /// Every leaf section, in pre-order.
    ///
    /// A fresh list is built on each call.
    #[must_use]
    pub fn all_leaves(&self) -> Vec<SectionRef<'_>> {
        self.iter().filter(SectionRef::is_leaf).collect()
    }

    /// Test identifiers referenced by leaves, in document order.
    #[must_use]
    pub fn referenced_tests(&self) -> Vec<&str> {
        self.all_leaves()
            .into_iter()
            .filter_map(|leaf| leaf.section().test_reference())
            .collect()
    }

    fn node(&self, id: SectionId) -> &Node {
        &self.nodes[id.0]
    }
}

/// A borrowed handle to one section and its position in the forest.
///
/// Dereferences to the underlying [`Section`].
#[derive(Debug, Clone, Copy)]
pub struct SectionRef<'a> {
    spec: &'a Specification,
    id: SectionId,
}

impl<'a> SectionRef<'a> {
    /// The id of this section.
    #[must_use]
    pub const fn id(&self) -> SectionId {
        self.id
    }

    /// The section payload.
    #[must_use]
    pub fn section(&self) -> &'a Section {
        &self.spec.node(self.id).section
    }

    /// Whether this section has no children.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.spec.node(self.id).children.is_empty()
    }

    /// Immediate sub-sections, in document order.
    pub fn children(&self) -> impl Iterator<Item = SectionRef<'a>> + use<'a> {
        let spec = self.spec;
        spec.node(self.id)
            .children
            .iter()
            .map(move |&id| SectionRef { spec, id })
    }

    /// The enclosing section, or `None` for a root.
    #[must_use]
    pub fn parent(&self) -> Option<SectionRef<'a>> {
        self.spec
            .node(self.id)
            .parent
            .map(|id| SectionRef { spec: self.spec, id })
    }

    /// Enclosing sections from the parent up to the root.
    pub fn ancestors(&self) -> impl Iterator<Item = SectionRef<'a>> + use<'a> {
        std::iter::successors(self.parent(), SectionRef::parent)
    }

    /// Whether this section is a leaf that must reference a test.
    ///
    /// Leaves under an interface, or interfaces themselves, never do.
    #[must_use]
    pub fn requires_test(&self) -> bool {
        self.is_leaf()
            && !self.is_interface()
            && !self.ancestors().any(|ancestor| ancestor.is_interface())
    }
}

impl Deref for SectionRef<'_> {
    type Target = Section;

    fn deref(&self) -> &Self::Target {
        self.section()
    }
}

impl PartialEq for SectionRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.spec, other.spec) && self.id == other.id
    }
}

impl Eq for SectionRef<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(level: i32, title: &str, test: Option<&str>) -> Outline {
        Outline::new(Section::new(level, title, "", test.map(str::to_string)))
    }

    fn node(level: i32, title: &str, children: Vec<Outline>) -> Outline {
        Outline::with_children(Section::heading(level, title), children)
    }

    fn sample() -> Specification {
        Specification::new(vec![
            node(
                1,
                "API Interface [INTERFACE]",
                vec![node(2, "Authentication", vec![leaf(3, "Login method", None)])],
            ),
            node(
                1,
                "API",
                vec![node(
                    2,
                    "Authentication",
                    vec![leaf(3, "Login method", Some("auth.TestLogin"))],
                )],
            ),
        ])
    }

    #[test]
    fn parent_links_are_attached() {
        let spec = sample();
        let roots: Vec<_> = spec.roots().collect();
        assert_eq!(roots.len(), 2);
        assert!(roots[0].parent().is_none());

        let child = roots[1].children().next().unwrap();
        assert_eq!(child.parent(), Some(roots[1]));

        let grandchild = child.children().next().unwrap();
        let titles: Vec<_> = grandchild.ancestors().map(|s| s.title().to_string()).collect();
        assert_eq!(titles, ["Authentication", "API"]);
    }

    #[test]
    fn leaves_under_interfaces_do_not_require_tests() {
        let spec = sample();
        let leaves = spec.all_leaves();
        assert_eq!(leaves.len(), 2);
        assert!(!leaves[0].requires_test());
        assert!(leaves[1].requires_test());
    }

    #[test]
    fn interface_leaf_does_not_require_test() {
        let spec = Specification::new(vec![leaf(1, "Storage [INTERFACE]", None)]);
        assert!(!spec.all_leaves()[0].requires_test());
    }

    #[test]
    fn non_leaf_does_not_require_test() {
        let spec = sample();
        let root = spec.roots().nth(1).unwrap();
        assert!(!root.requires_test());
    }

    #[test]
    fn all_leaves_is_restartable() {
        let spec = sample();
        let first: Vec<_> = spec.all_leaves().iter().map(SectionRef::id).collect();
        let second: Vec<_> = spec.all_leaves().iter().map(SectionRef::id).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn all_leaves_is_pre_order() {
        let spec = Specification::new(vec![
            node(1, "A", vec![leaf(2, "A1", None), node(2, "A2", vec![leaf(3, "A2a", None)])]),
            leaf(1, "B", None),
        ]);
        let titles: Vec<_> = spec.all_leaves().iter().map(|s| s.title().to_string()).collect();
        assert_eq!(titles, ["A1", "A2a", "B"]);
    }

    #[test]
    fn referenced_tests_in_document_order() {
        let spec = Specification::new(vec![
            leaf(1, "One", Some("pkg.TestOne")),
            leaf(1, "Two", None),
            leaf(1, "Three", Some("pkg.TestThree")),
        ]);
        assert_eq!(spec.referenced_tests(), ["pkg.TestOne", "pkg.TestThree"]);
    }

    #[test]
    fn empty_forest() {
        let spec = Specification::new(Vec::new());
        assert!(spec.is_empty());
        assert_eq!(spec.len(), 0);
        assert!(spec.all_leaves().is_empty());
        assert!(spec.section(SectionId(0)).is_none());
    }
}
