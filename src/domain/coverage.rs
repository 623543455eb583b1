//! Coverage evaluation and the collapse/expand policy for reporting it.
//!
//! Every leaf that requires a test contributes one to the total of each
//! enclosing subtree, and one to the passing count when its reference
//! resolves against the known tests. A subtree is in error when any such leaf
//! below it fails, or when it is a nonconforming implementation.
//!
//! A clean subtree is shown collapsed, as counts only. A subtree with any
//! error below it is shown in full, including the children that pass.

use std::collections::HashSet;

use tracing::instrument;

use crate::domain::{
    interface::InterfaceFailures,
    specification::{SectionRef, Specification},
};

/// The set of test identifiers reported by the test sources.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnownTests(HashSet<String>);

impl KnownTests {
    /// Whether the identifier was discovered.
    #[must_use]
    pub fn contains(&self, identifier: &str) -> bool {
        self.0.contains(identifier)
    }

    /// Number of distinct identifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no identifiers were discovered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for KnownTests {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<S: Into<String>> Extend<S> for KnownTests {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        self.0.extend(iter.into_iter().map(Into::into));
    }
}

/// Leaf counts for a subtree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    /// Leaves that require a test.
    pub total: usize,
    /// Leaves whose reference resolves to a known test.
    pub passing: usize,
}

impl std::ops::Add for Counts {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            total: self.total + rhs.total,
            passing: self.passing + rhs.passing,
        }
    }
}

impl std::iter::Sum for Counts {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), std::ops::Add::add)
    }
}

/// Coverage state of a single leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeafStatus {
    /// The reference resolves to a known test.
    Covered(String),
    /// The leaf requires a test but has no reference.
    MissingReference,
    /// The reference does not match any known test.
    TestNotFound(String),
    /// The leaf sits under an interface and needs no test.
    NotRequired,
}

impl LeafStatus {
    /// Classifies a leaf section.
    #[must_use]
    pub fn of(leaf: SectionRef<'_>, known: &KnownTests) -> Self {
        if !leaf.requires_test() {
            return Self::NotRequired;
        }
        match leaf.test_reference() {
            None => Self::MissingReference,
            Some(id) if known.contains(id) => Self::Covered(id.to_string()),
            Some(id) => Self::TestNotFound(id.to_string()),
        }
    }

    /// Whether this status counts as a coverage gap.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::MissingReference | Self::TestNotFound(_))
    }

    const fn counts(&self) -> Counts {
        match self {
            Self::NotRequired => Counts {
                total: 0,
                passing: 0,
            },
            Self::Covered(_) => Counts {
                total: 1,
                passing: 1,
            },
            Self::MissingReference | Self::TestNotFound(_) => Counts {
                total: 1,
                passing: 0,
            },
        }
    }
}

/// How much of the report to show.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RenderPolicy {
    /// Collapse clean subtrees to their counts.
    #[default]
    Collapse,
    /// Show every subtree in full.
    ExpandAll,
}

/// Whether a subtree is shown with or without its descendants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presentation {
    /// Counts only; descendants suppressed.
    Collapsed,
    /// Full detail.
    Expanded,
}

/// Evaluated coverage of one section and everything below it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtreeReport {
    /// Section title.
    pub title: String,
    /// Leaf counts for the whole subtree.
    pub counts: Counts,
    /// Whether any error occurs at or below this section.
    pub has_error: bool,
    /// Status of a leaf; `None` for sections with children.
    pub leaf: Option<LeafStatus>,
    /// Evaluated children, in document order.
    pub children: Vec<SubtreeReport>,
}

impl SubtreeReport {
    /// Evaluates a section and its descendants.
    #[must_use]
    pub fn evaluate(
        section: SectionRef<'_>,
        known: &KnownTests,
        interface_failures: &InterfaceFailures,
    ) -> Self {
        if section.is_leaf() {
            let status = LeafStatus::of(section, known);
            return Self {
                title: section.title().to_string(),
                counts: status.counts(),
                has_error: status.is_error() || interface_failures.contains(section.title()),
                leaf: Some(status),
                children: Vec::new(),
            };
        }

        let children: Vec<_> = section
            .children()
            .map(|child| Self::evaluate(child, known, interface_failures))
            .collect();

        Self {
            title: section.title().to_string(),
            counts: children.iter().map(|child| child.counts).sum(),
            has_error: interface_failures.contains(section.title())
                || children.iter().any(|child| child.has_error),
            leaf: None,
            children,
        }
    }

    /// Whether this report describes a leaf.
    #[must_use]
    pub const fn is_leaf(&self) -> bool {
        self.leaf.is_some()
    }

    /// Decides how this subtree is shown.
    ///
    /// Once a subtree contains an error it is always expanded, so the full
    /// picture is shown rather than only the failing branch.
    #[must_use]
    pub const fn presentation(&self, policy: RenderPolicy) -> Presentation {
        match policy {
            RenderPolicy::ExpandAll => Presentation::Expanded,
            RenderPolicy::Collapse if self.has_error => Presentation::Expanded,
            RenderPolicy::Collapse => Presentation::Collapsed,
        }
    }
}

/// Coverage and conformance findings for a whole specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageReport {
    /// One report per top-level section.
    pub roots: Vec<SubtreeReport>,
    /// Titles of leaves that require a test but reference none.
    pub missing_references: Vec<String>,
    /// References that do not match any known test.
    pub tests_not_found: Vec<String>,
    /// Nonconforming implementations.
    pub interface_failures: InterfaceFailures,
}

impl CoverageReport {
    /// Evaluates coverage for every section of the specification.
    #[must_use]
    #[instrument(level = "debug", skip_all, fields(known = known.len()))]
    pub fn evaluate(
        specification: &Specification,
        known: &KnownTests,
        interface_failures: InterfaceFailures,
    ) -> Self {
        let mut missing_references = Vec::new();
        let mut tests_not_found = Vec::new();

        for leaf in specification.all_leaves() {
            let status = LeafStatus::of(leaf, known);
            tracing::trace!(title = leaf.title(), ?status, "checked leaf");
            match status {
                LeafStatus::MissingReference => missing_references.push(leaf.title().to_string()),
                LeafStatus::TestNotFound(id) => tests_not_found.push(id),
                LeafStatus::Covered(_) | LeafStatus::NotRequired => {}
            }
        }

        let roots = specification
            .roots()
            .map(|root| SubtreeReport::evaluate(root, known, &interface_failures))
            .collect();

        Self {
            roots,
            missing_references,
            tests_not_found,
            interface_failures,
        }
    }

    /// Counts across the whole specification.
    #[must_use]
    pub fn counts(&self) -> Counts {
        self.roots.iter().map(|root| root.counts).sum()
    }

    /// Whether there are no coverage gaps and no conformance failures.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.missing_references.is_empty()
            && self.tests_not_found.is_empty()
            && self.interface_failures.is_empty()
    }
}
