//! Domain models for specification coverage.
//!
//! This module contains the section forest, the interface conformance check,
//! coverage evaluation and configuration.

/// Sections and owned outline trees.
pub mod section;
pub use section::{IMPLEMENTS_TAG, INTERFACE_TAG, Outline, Section, Tags};

/// The indexed section forest.
pub mod specification;
pub use specification::{SectionId, SectionRef, Specification};

/// Interface/implementation conformance.
pub mod interface;
pub use interface::{InterfaceFailures, Nonconformance, validate_implementation};

/// Coverage evaluation and render policy.
pub mod coverage;
pub use coverage::{
    Counts, CoverageReport, KnownTests, LeafStatus, Presentation, RenderPolicy, SubtreeReport,
};

mod config;
pub use config::{
    CONFIG_FILE_NAME, Config, ConfigError, ConnectorConfig, ConnectorKind, LEGACY_CONFIG_FILE_NAME,
    UnknownConnector,
};
