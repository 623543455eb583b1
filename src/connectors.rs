//! Test discovery through external test runners.
//!
//! A [`TestSource`] produces the identifiers of the tests that exist in a
//! project. Connectors list tests by invoking the project's own runner in
//! collection mode; they never execute tests.

use std::{io, path::PathBuf, process::ExitStatus, time::Duration};

use tracing::instrument;

use crate::domain::{Config, ConnectorConfig, ConnectorKind, KnownTests};

mod go;
mod process;
mod pytest;

pub use go::{GoConnector, parse_go_test_output};
pub use pytest::{PytestConnector, parse_pytest_output};

/// A source of known test identifiers.
pub trait TestSource {
    /// Short name used in diagnostics.
    fn name(&self) -> &str;

    /// Lists every test identifier, in the order the runner reports them.
    ///
    /// # Errors
    ///
    /// Returns an error if the runner cannot be launched, fails, or does not
    /// finish in time.
    fn discover_tests(&self) -> Result<Vec<String>, DiscoveryError>;
}

/// Errors that can occur while discovering tests.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    /// The runner could not be started.
    #[error("failed to launch `{program}`")]
    Spawn {
        /// The executable.
        program: String,
        /// The underlying error.
        #[source]
        source: io::Error,
    },

    /// The runner did not finish within the configured timeout.
    #[error("`{program}` test discovery timed out after {}s", timeout.as_secs())]
    Timeout {
        /// The executable.
        program: String,
        /// How long discovery was allowed to take.
        timeout: Duration,
    },

    /// The runner exited unsuccessfully.
    #[error("`{program}` test discovery failed ({status})\nOutput: {output}")]
    Failed {
        /// The executable.
        program: String,
        /// The exit status.
        status: ExitStatus,
        /// Combined standard output and standard error.
        output: String,
    },

    /// Communicating with the runner failed.
    #[error("I/O error while running `{program}`")]
    Io {
        /// The executable.
        program: String,
        /// The underlying error.
        #[source]
        source: io::Error,
    },
}

/// Settings shared by every connector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Executable to run.
    pub executable: String,
    /// Directory to run it in.
    pub path: PathBuf,
    /// How long discovery may take.
    pub timeout: Duration,
}

impl From<&ConnectorConfig> for Invocation {
    fn from(config: &ConnectorConfig) -> Self {
        Self {
            executable: config.executable().to_string(),
            path: config.path.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

/// Builds the test source described by a connector configuration.
#[must_use]
pub fn from_config(config: &ConnectorConfig) -> Box<dyn TestSource> {
    let invocation = Invocation::from(config);
    match config.kind {
        ConnectorKind::Go => Box::new(GoConnector::new(invocation)),
        ConnectorKind::Pytest => Box::new(PytestConnector::new(invocation)),
    }
}

/// Queries every configured connector and returns all identifiers, in order.
///
/// # Errors
///
/// Fails on the first connector that fails; no partial list is returned.
#[instrument(level = "debug", skip_all, fields(connectors = config.connectors().len()))]
pub fn discover_all(config: &Config) -> Result<Vec<String>, DiscoveryError> {
    let mut tests = Vec::new();
    for connector in config.connectors() {
        let source = from_config(connector);
        let discovered = source.discover_tests()?;
        tracing::info!(
            connector = source.name(),
            path = %connector.path.display(),
            count = discovered.len(),
            "discovered tests"
        );
        tests.extend(discovered);
    }
    Ok(tests)
}

/// Collects the identifiers of every configured connector into a set.
///
/// # Errors
///
/// Fails on the first connector that fails.
pub fn known_tests(config: &Config) -> Result<KnownTests, DiscoveryError> {
    Ok(discover_all(config)?.into_iter().collect())
}

/// Whether `executable` can be resolved to a file, either directly or via
/// `PATH`.
#[must_use]
pub fn is_available(executable: &str) -> bool {
    let candidate = std::path::Path::new(executable);
    if candidate.components().count() > 1 {
        return candidate.is_file();
    }
    std::env::var_os("PATH").is_some_and(|paths| {
        std::env::split_paths(&paths).any(|dir| {
            let path = dir.join(executable);
            path.is_file() || (cfg!(windows) && path.with_extension("exe").is_file())
        })
    })
}
