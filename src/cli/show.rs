use std::{fmt::Write as _, path::PathBuf};

use aligned::{SectionRef, Specification};
use clap::Parser;
use serde_json::{Value, json};
use tracing::instrument;

use super::terminal::{Colorize, indent};

#[derive(Debug, Parser)]
pub struct Show {
    /// Specification file or directory
    path: PathBuf,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "pretty")]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Pretty,
    Json,
}

impl Show {
    #[instrument(level = "debug", skip(self), fields(path = %self.path.display()))]
    pub fn run(self) -> anyhow::Result<()> {
        let specification = aligned::load(&self.path)?;

        match self.output {
            OutputFormat::Pretty => print!("{}", render_specification(&specification)),
            OutputFormat::Json => {
                let sections: Vec<_> = specification.roots().map(section_json).collect();
                println!("{}", serde_json::to_string_pretty(&sections)?);
            }
        }
        Ok(())
    }
}

fn render_specification(specification: &Specification) -> String {
    let mut out = String::new();
    for root in specification.roots() {
        render_section(&mut out, root, 0);
    }
    out
}

fn render_section(out: &mut String, section: SectionRef<'_>, depth: usize) {
    let prefix = indent(depth);
    let _ = writeln!(out, "{prefix}{}", section.title().info());

    if let Some(test) = section.test_reference() {
        let _ = writeln!(out, "{prefix}  {}{}", "Test: ".dim(), test.success());
    } else if section.is_leaf() {
        let _ = writeln!(out, "{prefix}  {}", "⚠ Missing test reference".error());
    }

    for child in section.children() {
        render_section(out, child, depth + 1);
    }
}

fn section_json(section: SectionRef<'_>) -> Value {
    json!({
        "title": section.title(),
        "level": section.level(),
        "test": section.test_reference(),
        "children": section.children().map(section_json).collect::<Vec<_>>(),
    })
}
