//! Specification coverage analysis
//!
//! Specifications are markdown documents whose heading hierarchy describes a
//! system's behaviour. Each leaf section references the test that verifies
//! it; this crate builds the section tree, checks interface conformance and
//! reports which leaves are covered by known tests.

pub mod domain;
pub use domain::{
    Config, CoverageReport, InterfaceFailures, KnownTests, Section, SectionRef, Specification,
};

/// Loading specifications from markdown files and directories.
pub mod storage;
pub use storage::{LoadError, load, parse_directory, parse_markdown};

/// Test discovery through external test runners.
pub mod connectors;
pub use connectors::{DiscoveryError, TestSource};
