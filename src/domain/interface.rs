//! Structural conformance of implementations to their interfaces.
//!
//! An interface section (`[INTERFACE]`) declares a contract through the
//! titles of its children. An implementation section (`[IMPLEMENTS: name]`)
//! conforms when every one of those titles also appears among its own
//! children. Titles are compared lower-cased and trimmed; body content is
//! ignored, and extra implementation children are allowed.

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    fmt,
};

use nonempty::NonEmpty;
use tracing::instrument;

use crate::domain::specification::{SectionRef, Specification};

/// Why an implementation fails to conform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Nonconformance {
    /// No interface carries the claimed name.
    InterfaceNotFound {
        /// The name given in the `[IMPLEMENTS: …]` marker.
        interface: String,
    },

    /// Required children are absent. Titles are normalized.
    MissingSections(NonEmpty<String>),
}

impl Nonconformance {
    /// The findings as display strings, one per missing item.
    #[must_use]
    pub fn missing(&self) -> Vec<String> {
        match self {
            Self::InterfaceNotFound { interface } => {
                vec![format!("interface '{interface}' not found")]
            }
            Self::MissingSections(titles) => titles.iter().cloned().collect(),
        }
    }
}

impl fmt::Display for Nonconformance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.missing().join(", "))
    }
}

/// Nonconforming implementations, keyed by implementation title.
///
/// An empty map means every implementation conforms.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterfaceFailures(BTreeMap<String, Nonconformance>);

impl InterfaceFailures {
    /// Whether every implementation conforms.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of nonconforming implementations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the implementation with this title failed.
    #[must_use]
    pub fn contains(&self, title: &str) -> bool {
        self.0.contains_key(title)
    }

    /// The failure recorded for an implementation title.
    #[must_use]
    pub fn get(&self, title: &str) -> Option<&Nonconformance> {
        self.0.get(title)
    }

    /// Failures ordered by implementation title.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Nonconformance)> {
        self.0.iter().map(|(title, failure)| (title.as_str(), failure))
    }

    fn insert(&mut self, title: String, failure: Nonconformance) {
        self.0.insert(title, failure);
    }
}

fn normalize(title: &str) -> String {
    title.trim().to_lowercase()
}

/// Lists the interface's child titles that the implementation lacks.
///
/// Results are normalized, in interface order, without duplicates.
#[must_use]
pub fn validate_implementation(
    implementation: SectionRef<'_>,
    interface: SectionRef<'_>,
) -> Vec<String> {
    let implemented: HashSet<String> = implementation
        .children()
        .map(|child| normalize(child.title()))
        .collect();

    let mut seen = HashSet::new();
    interface
        .children()
        .map(|child| normalize(child.title()))
        .filter(|required| !implemented.contains(required))
        .filter(|required| seen.insert(required.clone()))
        .collect()
}

impl Specification {
    /// Checks every implementation section against the interface it names.
    ///
    /// Interfaces are indexed by contract name; when two interfaces share a
    /// name the later one in document order wins.
    #[must_use]
    #[instrument(level = "debug", skip(self))]
    pub fn validate_interfaces(&self) -> InterfaceFailures {
        let mut interfaces: HashMap<&str, SectionRef<'_>> = HashMap::new();
        let mut implementations: Vec<(SectionRef<'_>, &str)> = Vec::new();

        for section in self.iter() {
            let section_data = section.section();
            if let Some(name) = section_data.tags().interface_name() {
                interfaces.insert(name, section);
            }
            if let Some(name) = section_data.implemented_interface_name() {
                implementations.push((section, name));
            }
        }

        tracing::debug!(
            interfaces = interfaces.len(),
            implementations = implementations.len(),
            "indexed contract sections"
        );

        let mut failures = InterfaceFailures::default();
        for (implementation, name) in implementations {
            let Some(&interface) = interfaces.get(name) else {
                tracing::debug!(
                    implementation = implementation.title(),
                    interface = name,
                    "interface not found"
                );
                failures.insert(
                    implementation.title().to_string(),
                    Nonconformance::InterfaceNotFound {
                        interface: name.to_string(),
                    },
                );
                continue;
            };

            if let Some(missing) =
                NonEmpty::from_vec(validate_implementation(implementation, interface))
            {
                tracing::debug!(
                    implementation = implementation.title(),
                    missing = missing.len(),
                    "implementation is missing required sections"
                );
                failures.insert(
                    implementation.title().to_string(),
                    Nonconformance::MissingSections(missing),
                );
            }
        }

        failures
    }
}
