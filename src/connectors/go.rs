use std::sync::LazyLock;

use regex::Regex;
use tracing::instrument;

use crate::connectors::{DiscoveryError, Invocation, TestSource, is_available, process};

static TEST_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(Test[A-Za-z0-9_]+)$").expect("test name pattern is valid"));

static PACKAGE_OK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ok\s+(\S+)").expect("package pattern is valid"));

/// Lists Go tests with `go test -list=. ./...`.
///
/// Identifiers have the form `<package>.<TestName>`, where the package path
/// is relative to the module.
#[derive(Debug, Clone)]
pub struct GoConnector {
    invocation: Invocation,
}

impl GoConnector {
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

impl TestSource for GoConnector {
    fn name(&self) -> &str {
        "go"
    }

    #[instrument(level = "debug", skip(self), fields(path = %self.invocation.path.display()))]
    fn discover_tests(&self) -> Result<Vec<String>, DiscoveryError> {
        let output = process::run(&self.invocation, &["test", "-list=.", "./..."])?;
        if !output.status.success() {
            return Err(DiscoveryError::Failed {
                program: self.invocation.executable.clone(),
                status: output.status,
                output: output.combined,
            });
        }
        Ok(parse_go_test_output(&output.combined))
    }
}

/// Extracts package-qualified test names from `go test -list` output.
///
/// Test names accumulate until the `ok <package>` line that closes their
/// package. The first segment of the first package path is taken to be the
/// module and is stripped from every package path.
#[must_use]
pub fn parse_go_test_output(output: &str) -> Vec<String> {
    let mut tests = Vec::new();
    let mut pending: Vec<&str> = Vec::new();
    let mut module: Option<&str> = None;

    for line in output.lines() {
        if let Some(captures) = TEST_NAME.captures(line) {
            if let Some(name) = captures.get(1) {
                pending.push(name.as_str());
            }
            continue;
        }

        let Some(package) = PACKAGE_OK.captures(line).and_then(|c| c.get(1)) else {
            continue;
        };
        let package = package.as_str();
        let root = *module.get_or_insert_with(|| package.split('/').next().unwrap_or(package));
        let relative = package
            .strip_prefix(root)
            .and_then(|rest| rest.strip_prefix('/'))
            .unwrap_or(package);

        tests.extend(pending.drain(..).map(|name| format!("{relative}.{name}")));
    }

    tests
}
