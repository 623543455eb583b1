//! Markdown documents to section outlines.
//!
//! Only ATX headings (`#` to `######`) introduce sections. Everything between
//! one heading and the next, at any depth, is that section's body. A body may
//! reference a test with a marker line:
//!
//! ```markdown
//! **Test:** `calculator.TestAdd`
//! ```

use std::{
    io,
    path::{Path, PathBuf},
    sync::LazyLock,
};

use regex::Regex;
use tracing::instrument;

use crate::domain::{Outline, Section, Specification};

static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(.+)$").expect("heading pattern is valid"));

// The identifier may hold anything but a backtick: slashes, colons, spaces
// and `>` all occur in real runner output.
static TEST_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\*\*(?i:test):\*\*\s*`([^`]+)`").expect("test marker pattern is valid")
});

/// Errors that can occur when loading a specification.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The specification path does not exist.
    #[error("spec path not found: {}", .0.display())]
    NotFound(PathBuf),

    /// A file or directory could not be read.
    #[error("failed to read {}", path.display())]
    Io {
        /// The path being read.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },

    /// The document could not be interpreted.
    ///
    /// Markdown always yields a (possibly empty) forest, so this is not
    /// produced when loading markdown.
    #[error("malformed specification {}: {message}", path.display())]
    Malformed {
        /// The offending document.
        path: PathBuf,
        /// What was wrong with it.
        message: String,
    },
}

impl LoadError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            Self::NotFound(path.to_path_buf())
        } else {
            Self::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}

/// Extracts the test identifier from a section body.
///
/// Only the first marker counts. Bare, unquoted identifiers are not
/// recognised.
#[must_use]
pub fn extract_test_reference(content: &str) -> Option<String> {
    TEST_REFERENCE
        .captures(content)
        .and_then(|captures| captures.get(1))
        .map(|identifier| identifier.as_str().to_string())
}

/// Formats the marker line that references a test.
///
/// This is the inverse of [`extract_test_reference`] for any identifier that
/// contains no backtick.
#[must_use]
pub fn format_test_reference(identifier: &str) -> String {
    format!("**Test:** `{identifier}`")
}

struct OpenSection {
    level: i32,
    title: String,
    body: Vec<String>,
}

impl OpenSection {
    fn close(self) -> Section {
        let content = self.body.join("\n").trim().to_string();
        let test_reference = extract_test_reference(&content);
        Section::new(self.level, self.title, content, test_reference)
    }
}

/// Splits a document into its sections, in document order.
///
/// Text before the first heading belongs to no section and is dropped.
fn scan_sections(content: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut open: Option<OpenSection> = None;

    for line in content.lines() {
        if let Some(captures) = HEADING.captures(line) {
            if let Some(previous) = open.take() {
                sections.push(previous.close());
            }
            let level = i32::try_from(captures[1].len()).unwrap_or(i32::MAX);
            open = Some(OpenSection {
                level,
                title: captures[2].trim().to_string(),
                body: Vec::new(),
            });
        } else if let Some(section) = open.as_mut() {
            section.body.push(line.to_string());
        }
    }

    if let Some(last) = open {
        sections.push(last.close());
    }

    sections
}

/// Nests a flat, depth-tagged list of sections into outlines.
///
/// A heading closes every open scope at the same or a deeper level. Levels
/// need not increase by exactly one: a level-4 heading directly under a
/// level-1 heading becomes its child.
fn assemble(sections: Vec<Section>) -> Vec<Outline> {
    fn close(stack: &mut Vec<Outline>, roots: &mut Vec<Outline>) {
        if let Some(done) = stack.pop() {
            match stack.last_mut() {
                Some(parent) => parent.children.push(done),
                None => roots.push(done),
            }
        }
    }

    let mut roots = Vec::new();
    let mut stack: Vec<Outline> = Vec::new();

    for section in sections {
        while stack
            .last()
            .is_some_and(|top| top.section.level() >= section.level())
        {
            close(&mut stack, &mut roots);
        }
        stack.push(Outline::new(section));
    }

    while !stack.is_empty() {
        close(&mut stack, &mut roots);
    }

    roots
}

/// Parses a markdown document into outlines at their authored levels.
#[must_use]
pub fn parse_outlines(content: &str) -> Vec<Outline> {
    assemble(scan_sections(content))
}

/// Parses a markdown document into a specification.
///
/// A document without headings yields an empty specification.
#[must_use]
pub fn parse_markdown(content: &str) -> Specification {
    Specification::new(parse_outlines(content))
}

pub(crate) fn read_outlines(path: &Path) -> Result<Vec<Outline>, LoadError> {
    let content = std::fs::read_to_string(path).map_err(|e| LoadError::io(path, e))?;
    let outlines = parse_outlines(&content);
    tracing::debug!(path = %path.display(), roots = outlines.len(), "parsed markdown file");
    Ok(outlines)
}

/// Reads and parses a single markdown file.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
#[instrument(level = "debug")]
pub fn parse_file(path: &Path) -> Result<Specification, LoadError> {
    Ok(Specification::new(read_outlines(path)?).with_source(path))
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn titles(outlines: &[Outline]) -> Vec<&str> {
        outlines.iter().map(Outline::title).collect()
    }

    #[test]
    fn nests_by_depth() {
        let outlines = parse_outlines(
            "# Calculator\n\n## Addition\n\n### Adds integers\n\n## Subtraction\n\n# Notes\n",
        );

        assert_eq!(titles(&outlines), ["Calculator", "Notes"]);
        assert_eq!(titles(&outlines[0].children), ["Addition", "Subtraction"]);
        assert_eq!(titles(&outlines[0].children[0].children), ["Adds integers"]);
        assert!(outlines[1].is_leaf());
    }

    #[test]
    fn skipped_levels_nest_under_nearest_open_ancestor() {
        let outlines = parse_outlines("# Root\n#### Deep\n## Shallow\n");

        assert_eq!(outlines.len(), 1);
        assert_eq!(titles(&outlines[0].children), ["Deep", "Shallow"]);
        assert_eq!(outlines[0].children[0].section.level(), 4);
    }

    #[test]
    fn headingless_document_is_empty() {
        let spec = parse_markdown("Just some prose.\n\nNo headings here.\n");
        assert!(spec.is_empty());

        assert!(parse_markdown("").is_empty());
    }

    #[test]
    fn adjacent_headings_have_empty_content() {
        let outlines = parse_outlines("# One\n## Two\n");
        assert_eq!(outlines[0].section.content(), "");
        assert_eq!(outlines[0].children[0].section.content(), "");
    }

    #[test]
    fn content_is_trimmed_and_excludes_preamble() {
        let outlines = parse_outlines("preamble\n# Title\n\n  body line\n\nsecond\n\n");
        assert_eq!(outlines[0].section.content(), "body line\n\nsecond");
    }

    #[test]
    fn test_reference_is_attached_to_its_section() {
        let outlines = parse_outlines(
            "# Calculator\n\n## Add\nAdds numbers.\n\n**Test:** `calculator.TestAdd`\n\n## Subtract\n",
        );
        let add = &outlines[0].children[0].section;
        let subtract = &outlines[0].children[1].section;

        assert_eq!(add.test_reference(), Some("calculator.TestAdd"));
        assert!(!subtract.has_test());
    }

    #[test]
    fn heading_requires_space_after_markers() {
        let outlines = parse_outlines("# Title\n#hashtag\n####### seven\n");
        assert_eq!(outlines.len(), 1);
        assert!(outlines[0].is_leaf());
        assert_eq!(outlines[0].section.content(), "#hashtag\n####### seven");
    }

    #[test]
    fn title_is_trimmed() {
        let outlines = parse_outlines("##   Spaced title   \n");
        assert_eq!(outlines[0].title(), "Spaced title");
        assert_eq!(outlines[0].section.level(), 2);
    }

    #[test_case("**Test:** `pkg.TestName`", Some("pkg.TestName"); "go")]
    #[test_case("**test:** `tests/test_calc.py::TestCalc::test_add`", Some("tests/test_calc.py::TestCalc::test_add"); "pytest lower case")]
    #[test_case("**TEST:** `src/a.test.js > suite > adds two numbers`", Some("src/a.test.js > suite > adds two numbers"); "vitest upper case")]
    #[test_case("**Test:**`tight`", Some("tight"); "no space")]
    #[test_case("**Test:** pkg.TestName", None; "bare identifier")]
    #[test_case("See **Test:** `pkg.TestName`", None; "not at line start")]
    #[test_case("No marker at all", None; "absent")]
    fn extracts_test_reference(content: &str, expected: Option<&str>) {
        assert_eq!(extract_test_reference(content).as_deref(), expected);
    }

    #[test]
    fn first_marker_wins() {
        let content = "**Test:** `first`\n**Test:** `second`";
        assert_eq!(extract_test_reference(content).as_deref(), Some("first"));
    }

    #[test_case("calculator.TestAdd"; "dotted")]
    #[test_case("test/file.exs:Module:test description with spaces"; "spaces and colons")]
    #[test_case("module@submodule.function_name_test"; "at sign")]
    #[test_case("src/file.test.js > describe > test name"; "angle brackets")]
    fn format_then_extract_is_identity(identifier: &str) {
        let marker = format_test_reference(identifier);
        assert_eq!(extract_test_reference(&marker).as_deref(), Some(identifier));
    }

    #[test]
    fn parse_file_records_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spec.md");
        std::fs::write(&path, "# Spec\n## Leaf\n").unwrap();

        let spec = parse_file(&path).unwrap();

        assert_eq!(spec.source(), Some(path.as_path()));
        assert_eq!(spec.len(), 2);
    }

    #[test]
    fn parse_file_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.md");

        let error = parse_file(&path).unwrap_err();
        assert!(matches!(error, LoadError::NotFound(p) if p == path));
    }
}
