use std::{
    fmt::Write as _,
    path::{Path, PathBuf},
    process,
};

use aligned::{
    CoverageReport, KnownTests,
    domain::{LeafStatus, Presentation, RenderPolicy, SubtreeReport},
};
use anyhow::Context;
use clap::Parser;
use serde_json::{Value, json};
use tracing::instrument;

use super::{
    load_config,
    terminal::{Colorize, indent, is_narrow},
};

#[derive(Debug, Parser)]
pub struct Check {
    /// Specification file or directory
    path: PathBuf,

    /// Show every section, including fully covered ones
    #[arg(long)]
    expand: bool,

    /// Output format (tree, json)
    #[arg(long, value_name = "FORMAT", default_value = "tree")]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Tree,
    Json,
}

impl Check {
    #[instrument(level = "debug", skip(self), fields(path = %self.path.display()))]
    pub fn run(self, config_path: &Path) -> anyhow::Result<()> {
        let config = load_config(config_path)?;
        let specification = aligned::load(&self.path)?;
        let known: KnownTests =
            aligned::connectors::known_tests(&config).context("error discovering tests")?;
        tracing::info!(
            sections = specification.len(),
            tests = known.len(),
            "checking coverage"
        );

        let failures = specification.validate_interfaces();
        let report = CoverageReport::evaluate(&specification, &known, failures);

        match self.output {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&report_json(&report))?);
            }
            OutputFormat::Tree => {
                let policy = if self.expand {
                    RenderPolicy::ExpandAll
                } else {
                    RenderPolicy::Collapse
                };
                print!("{}", render_report(&report, policy, is_narrow()));
            }
        }

        if !report.is_clean() {
            process::exit(1);
        }

        Ok(())
    }
}

/// Renders the report tree followed by a summary of the findings.
fn render_report(report: &CoverageReport, policy: RenderPolicy, narrow: bool) -> String {
    let mut out = String::from("Specification coverage report:\n\n");
    for root in &report.roots {
        render_subtree(&mut out, root, 0, policy);
    }
    out.push('\n');
    render_summary(&mut out, report, narrow);
    out
}

fn render_subtree(out: &mut String, node: &SubtreeReport, depth: usize, policy: RenderPolicy) {
    let icon = if node.has_error {
        "✗".error()
    } else {
        "✓".success()
    };
    let _ = write!(out, "{}{icon} {}", indent(depth), node.title.info());

    if let Some(status) = &node.leaf {
        match status {
            LeafStatus::Covered(id) => {
                let _ = write!(out, " {}", format!("({id})").dim());
            }
            LeafStatus::MissingReference => {
                let _ = write!(out, " {}", "(Missing test reference)".error());
            }
            LeafStatus::TestNotFound(id) => {
                let _ = write!(out, " {}", format!("(Test not found: {id})").error());
            }
            LeafStatus::NotRequired => {}
        }
        out.push('\n');
        return;
    }

    match node.presentation(policy) {
        Presentation::Collapsed => {
            let counts = node.counts;
            let _ = writeln!(
                out,
                " {}",
                format!("({}/{} passed)", counts.passing, counts.total).dim()
            );
        }
        Presentation::Expanded => {
            out.push('\n');
            for child in &node.children {
                render_subtree(out, child, depth + 1, policy);
            }
        }
    }
}

fn render_summary(out: &mut String, report: &CoverageReport, narrow: bool) {
    if report.is_clean() {
        let _ = writeln!(out, "{}", "All specifications covered ✓".success());
        return;
    }

    let missing = report.missing_references.len();
    if missing > 0 {
        let _ = writeln!(
            out,
            "{}",
            format!("{missing} specifications missing test references").error()
        );
    }

    let not_found = report.tests_not_found.len();
    if not_found > 0 {
        let _ = writeln!(
            out,
            "{}",
            format!("{not_found} test references not found").error()
        );
    }

    let failures = &report.interface_failures;
    if !failures.is_empty() {
        let _ = writeln!(
            out,
            "{}",
            format!("{} interface implementation errors:", failures.len()).error()
        );
        for (implementation, nonconformance) in failures.iter() {
            if narrow {
                let _ = writeln!(out, "  {implementation} is missing:");
                for item in nonconformance.missing() {
                    let _ = writeln!(out, "    - {item}");
                }
            } else {
                let _ = writeln!(out, "  {implementation} is missing: {nonconformance}");
            }
        }
    }
}

fn subtree_json(node: &SubtreeReport) -> Value {
    let mut value = json!({
        "title": node.title,
        "total": node.counts.total,
        "passing": node.counts.passing,
        "has_error": node.has_error,
    });

    if let Some(status) = &node.leaf {
        let (status, test) = match status {
            LeafStatus::Covered(id) => ("covered", Some(id)),
            LeafStatus::MissingReference => ("missing_reference", None),
            LeafStatus::TestNotFound(id) => ("test_not_found", Some(id)),
            LeafStatus::NotRequired => ("not_required", None),
        };
        value["status"] = json!(status);
        value["test"] = json!(test);
    } else {
        value["children"] = node.children.iter().map(subtree_json).collect();
    }

    value
}

fn report_json(report: &CoverageReport) -> Value {
    let counts = report.counts();
    let interface_failures: Vec<_> = report
        .interface_failures
        .iter()
        .map(|(implementation, nonconformance)| {
            json!({
                "implementation": implementation,
                "missing": nonconformance.missing(),
            })
        })
        .collect();

    json!({
        "clean": report.is_clean(),
        "total": counts.total,
        "passing": counts.passing,
        "sections": report.roots.iter().map(subtree_json).collect::<Vec<_>>(),
        "missing_references": report.missing_references,
        "tests_not_found": report.tests_not_found,
        "interface_failures": interface_failures,
    })
}
