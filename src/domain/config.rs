use std::{
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".align.toml";

/// Name of the unversioned YAML configuration file, read when no TOML
/// configuration exists.
pub const LEGACY_CONFIG_FILE_NAME: &str = ".align.yml";

/// Configuration for coverage checking.
///
/// This struct lists the test-discovery connectors whose combined output forms
/// the set of known test identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// The connectors to query, in order.
    connectors: Vec<ConnectorConfig>,
}

/// Settings for a single test-discovery connector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorConfig {
    /// Which test runner to invoke.
    #[serde(rename = "type")]
    pub kind: ConnectorKind,

    /// Directory the runner is invoked in.
    pub path: PathBuf,

    /// Executable to run instead of the connector's default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executable: Option<String>,

    /// Seconds to wait for test discovery before giving up.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ConnectorConfig {
    /// Creates a connector configuration with default settings.
    #[must_use]
    pub fn new(kind: ConnectorKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
            executable: None,
            timeout_secs: default_timeout_secs(),
        }
    }

    /// The executable to run, falling back to the connector's default.
    #[must_use]
    pub fn executable(&self) -> &str {
        self.executable
            .as_deref()
            .filter(|exe| !exe.is_empty())
            .unwrap_or_else(|| self.kind.default_executable())
    }
}

/// The supported test runners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectorKind {
    /// `go test`
    Go,
    /// `pytest`
    Pytest,
}

impl ConnectorKind {
    /// Every supported connector.
    pub const ALL: [Self; 2] = [Self::Go, Self::Pytest];

    /// The executable invoked when none is configured.
    #[must_use]
    pub const fn default_executable(self) -> &'static str {
        match self {
            Self::Go => "go",
            Self::Pytest => "pytest",
        }
    }

    /// The `<language>-<framework>` name accepted on the command line.
    #[must_use]
    pub const fn qualified_name(self) -> &'static str {
        match self {
            Self::Go => "go-test",
            Self::Pytest => "python-pytest",
        }
    }
}

impl fmt::Display for ConnectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Go => write!(f, "go"),
            Self::Pytest => write!(f, "pytest"),
        }
    }
}

/// An unrecognised connector name.
#[derive(Debug, thiserror::Error)]
#[error("unsupported connector type: {0}")]
pub struct UnknownConnector(String);

impl FromStr for ConnectorKind {
    type Err = UnknownConnector;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| s == kind.to_string() || s == kind.qualified_name())
            .ok_or_else(|| UnknownConnector(s.to_string()))
    }
}

/// Errors that can occur when loading, saving or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file does not exist.
    #[error("{} not found", .0.display())]
    NotFound(PathBuf),

    /// The configuration file could not be read or written.
    #[error("failed to access config file {}", path.display())]
    Io {
        /// The configuration file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for this schema.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),

    /// The configuration file is not valid YAML for this schema.
    #[error("failed to parse config file")]
    Yaml(#[from] serde_yaml::Error),

    /// The configuration could not be serialized.
    #[error("failed to serialize config")]
    Serialize(#[from] toml::ser::Error),

    /// No connectors are configured.
    #[error("no connectors configured")]
    NoConnectors,

    /// A connector has no path.
    #[error("connector {index}: path is required")]
    MissingPath {
        /// Position of the connector in the list.
        index: usize,
    },
}

impl Config {
    /// Creates a configuration with the given connectors.
    #[must_use]
    pub const fn new(connectors: Vec<ConnectorConfig>) -> Self {
        Self { connectors }
    }

    /// Loads the configuration from the file at the given path.
    ///
    /// Files with a `.yml` or `.yaml` extension are read as the unversioned
    /// YAML format. Anything else is read as versioned TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, cannot be read, or if its
    /// content is invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        let is_yaml = path
            .extension()
            .is_some_and(|ext| ext == "yml" || ext == "yaml");
        if is_yaml {
            let legacy: Legacy = serde_yaml::from_str(&content)?;
            return Ok(Self::new(legacy.connectors));
        }
        Ok(toml::from_str(&content)?)
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Renders the configuration as TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Checks that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns an error if no connectors are configured, or if a connector has
    /// an empty path.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.connectors.is_empty() {
            return Err(ConfigError::NoConnectors);
        }
        if let Some(index) = self
            .connectors
            .iter()
            .position(|connector| connector.path.as_os_str().is_empty())
        {
            return Err(ConfigError::MissingPath { index });
        }
        Ok(())
    }

    /// The configured connectors, in order.
    #[must_use]
    pub fn connectors(&self) -> &[ConnectorConfig] {
        &self.connectors
    }
}

const fn default_timeout_secs() -> u64 {
    30
}

/// The serialized versions of the configuration.
/// This allows for future changes to the configuration format and to the domain
/// type without breaking compatibility.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default)]
        connectors: Vec<ConnectorConfig>,
    },
}

/// The unversioned YAML layout.
#[derive(Debug, Deserialize)]
struct Legacy {
    #[serde(default)]
    connectors: Vec<ConnectorConfig>,
}

impl From<Versions> for Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 { connectors } => Self { connectors },
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        Self::V1 {
            connectors: config.connectors,
        }
    }
}
