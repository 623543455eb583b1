use tracing::instrument;

use crate::connectors::{DiscoveryError, Invocation, TestSource, is_available, process};

/// Lists Python tests with `pytest --collect-only -q`.
///
/// Identifiers are pytest node IDs, such as
/// `tests/test_calc.py::TestCalc::test_add`.
#[derive(Debug, Clone)]
pub struct PytestConnector {
    invocation: Invocation,
}

impl PytestConnector {
    /// Creates a connector that runs with the given settings.
    #[must_use]
    pub const fn new(invocation: Invocation) -> Self {
        Self { invocation }
    }

    /// Whether the configured executable can be found.
    #[must_use]
    pub fn detect(&self) -> bool {
        is_available(&self.invocation.executable)
    }
}

impl TestSource for PytestConnector {
    fn name(&self) -> &str {
        "pytest"
    }

    #[instrument(level = "debug", skip(self), fields(path = %self.invocation.path.display()))]
    fn discover_tests(&self) -> Result<Vec<String>, DiscoveryError> {
        let output = process::run(&self.invocation, &["--collect-only", "-q"])?;
        if output.status.success() {
            return Ok(parse_pytest_output(&output.combined));
        }
        if is_empty_collection(&output.combined) {
            tracing::debug!("pytest collected no tests");
            return Ok(Vec::new());
        }
        Err(DiscoveryError::Failed {
            program: self.invocation.executable.clone(),
            status: output.status,
            output: output.combined,
        })
    }
}

/// pytest exits unsuccessfully when nothing is collected; that is only a
/// failure if collection also reported an error.
fn is_empty_collection(output: &str) -> bool {
    let output = output.to_lowercase();
    output.contains("no tests collected") && !output.contains("error")
}

/// Extracts node IDs from `pytest --collect-only -q` output.
#[must_use]
pub fn parse_pytest_output(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("===") && !line.contains(" test"))
        .filter(|line| line.contains("::"))
        .map(ToString::to_string)
        .collect()
}
