use std::path::{Path, PathBuf};

mod check;
mod show;
mod terminal;

use aligned::{
    Config,
    domain::{CONFIG_FILE_NAME, ConnectorConfig, ConnectorKind, LEGACY_CONFIG_FILE_NAME},
};
use anyhow::Context;
use check::Check;
use clap::ArgAction;
use list_tests::ListTests;
use show::Show;
use tracing::instrument;

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// The path to the configuration file
    #[arg(short, long, default_value = CONFIG_FILE_NAME, global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        self.command.run(&self.config)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        // stdout carries the report
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Check that every specification leaf is covered by a known test
    ///
    /// Fully covered sections are collapsed to their counts; sections with
    /// problems are shown in full. Exits with status 1 if anything is
    /// uncovered or an implementation does not conform to its interface.
    Check(Check),

    /// Display the section tree of a specification
    Show(Show),

    /// List every test discovered by the configured connectors
    ListTests(ListTests),

    /// Verify that the configuration is valid
    Checkconf(Checkconf),

    /// Create a configuration file with a single connector
    Init(Init),
}

impl Command {
    fn run(self, config: &Path) -> anyhow::Result<()> {
        match self {
            Self::Check(command) => command.run(config)?,
            Self::Show(command) => command.run()?,
            Self::ListTests(command) => command.run(config)?,
            Self::Checkconf(command) => command.run(config)?,
            Self::Init(command) => command.run(config)?,
        }
        Ok(())
    }
}

/// Loads and validates the configuration file.
///
/// A missing `.align.toml` falls back to a `.align.yml` next to it.
fn load_config(path: &Path) -> anyhow::Result<Config> {
    let path = &config_path(path);
    let config = Config::load(path)?;
    config
        .validate()
        .with_context(|| format!("invalid configuration in {}", path.display()))?;
    tracing::debug!(
        path = %path.display(),
        connectors = config.connectors().len(),
        "loaded configuration"
    );
    Ok(config)
}

fn config_path(path: &Path) -> PathBuf {
    if path.file_name().is_some_and(|name| name == CONFIG_FILE_NAME) && !path.exists() {
        let legacy = path.with_file_name(LEGACY_CONFIG_FILE_NAME);
        if legacy.exists() {
            tracing::debug!(path = %legacy.display(), "using legacy configuration");
            return legacy;
        }
    }
    path.to_path_buf()
}

#[derive(Debug, clap::Parser)]
pub struct Checkconf {
    /// Print the configuration after validating it
    #[arg(long)]
    print: bool,
}

impl Checkconf {
    #[instrument(level = "debug", skip(self))]
    fn run(self, config_path: &Path) -> anyhow::Result<()> {
        let config = load_config(config_path)?;
        if self.print {
            print!("{}", config.to_toml()?);
        } else {
            println!("Configuration is valid");
        }
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Init {
    /// The connector to configure: go-test (go) or python-pytest (pytest)
    connector: ConnectorKind,

    /// Directory the test runner is invoked in
    path: PathBuf,
}

impl Init {
    #[instrument(level = "debug", skip(self))]
    fn run(self, config_path: &Path) -> anyhow::Result<()> {
        if config_path.exists() {
            anyhow::bail!("{} already exists", config_path.display());
        }

        let config = Config::new(vec![ConnectorConfig::new(self.connector, &self.path)]);
        config
            .save(config_path)
            .with_context(|| format!("failed to create {}", config_path.display()))?;

        println!(
            "Created {} with {} connector at {}",
            config_path.display(),
            self.connector.qualified_name(),
            self.path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn verbosity_is_global() {
        let cli = Cli::try_parse_from(["align", "check", "spec.md", "-vv"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.config, PathBuf::from(CONFIG_FILE_NAME));
    }

    #[test]
    fn init_accepts_qualified_connector_names() {
        let cli = Cli::try_parse_from(["align", "init", "python-pytest", "tests"]).unwrap();
        let Command::Init(init) = cli.command else {
            panic!("expected init");
        };
        assert_eq!(init.connector, ConnectorKind::Pytest);
        assert_eq!(init.path, PathBuf::from("tests"));
    }

    #[test]
    fn init_rejects_unknown_connector() {
        assert!(Cli::try_parse_from(["align", "init", "elixir-exunit", "."]).is_err());
    }

    #[test]
    fn init_writes_config_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let init = || Init {
            connector: ConnectorKind::Go,
            path: PathBuf::from("."),
        };

        init().run(&path).unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.connectors()[0].kind, ConnectorKind::Go);

        let error = init().run(&path).unwrap_err();
        assert!(error.to_string().contains("already exists"));
    }

    #[test]
    fn load_config_rejects_empty_connector_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "_version = \"1\"\n").unwrap();

        assert!(load_config(&path).is_err());
    }

    #[test]
    fn missing_toml_config_falls_back_to_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            dir.path().join(LEGACY_CONFIG_FILE_NAME),
            "connectors:\n  - type: pytest\n    path: tests\n",
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.connectors()[0].kind, ConnectorKind::Pytest);

        std::fs::write(&path, "_version = \"1\"\n").unwrap();
        assert!(load_config(&path).is_err());
    }
}
