//! Merging a directory of markdown documents into one specification.
//!
//! Each directory contributes one section that hosts everything found inside
//! it. That section is either the first heading of `<dirname>.md`, when such a
//! file exists, or one synthesized from the directory name. Documents and
//! subdirectories become its children, with their levels rewritten to follow
//! the directory depth.
//!
//! The root directory is the exception: its documents keep their authored
//! levels and, without a `<dirname>.md`, its contents become top-level
//! sections directly.

use std::{
    ffi::OsStr,
    io,
    path::{Path, PathBuf},
};

use tracing::instrument;
use walkdir::WalkDir;

use crate::{
    domain::{Outline, Section, Specification},
    storage::markdown::{LoadError, read_outlines},
};

/// What a directory contributes to its parent.
enum Merged {
    /// The root's contents, to be unwrapped into top-level sections.
    Container(Vec<Outline>),
    /// A single section hosting the directory's contents.
    Section(Outline),
}

/// Converts a directory name into a section title.
///
/// The name is split on `_` and the segments are joined with spaces; empty
/// segments are kept, so `a__b` becomes `A  B`. Within a segment every word
/// is capitalized, where words are separated by anything other than letters
/// and digits, so `api-gateway` becomes `Api-Gateway`. An all-caps segment
/// is lower-cased first, so `CLI` becomes `Cli`.
#[must_use]
pub fn title_from_directory_name(name: &str) -> String {
    name.split('_').map(capitalize).collect::<Vec<_>>().join(" ")
}

fn capitalize(segment: &str) -> String {
    let segment = if segment.to_uppercase() == segment {
        segment.to_lowercase()
    } else {
        segment.to_string()
    };

    let mut title = String::with_capacity(segment.len());
    let mut word_start = true;
    for c in segment.chars() {
        if word_start {
            title.extend(c.to_uppercase());
        } else {
            title.push(c);
        }
        word_start = !c.is_alphanumeric();
    }
    title
}

/// Parses every markdown file below `root` into a single specification.
///
/// Entries are visited in file-name order, so the result is deterministic.
///
/// # Errors
///
/// Returns an error if any directory or file cannot be read. Nothing is
/// returned for a partially read tree.
#[instrument(level = "debug")]
pub fn parse_directory(root: &Path) -> Result<Specification, LoadError> {
    let roots = match merge_directory(root, -1, true)? {
        Some(Merged::Container(children)) => children,
        Some(Merged::Section(section)) => vec![section],
        None => Vec::new(),
    };
    tracing::debug!(roots = roots.len(), "merged specification directory");
    Ok(Specification::new(roots).with_source(root))
}

struct Listing {
    markdown: Vec<PathBuf>,
    directories: Vec<PathBuf>,
}

fn list_directory(dir: &Path) -> Result<Listing, LoadError> {
    let mut listing = Listing {
        markdown: Vec::new(),
        directories: Vec::new(),
    };

    let entries = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name();

    for entry in entries {
        let entry = entry.map_err(|error| walk_error(dir, error))?;
        if entry.file_type().is_dir() {
            listing.directories.push(entry.into_path());
        } else if entry.path().extension() == Some(OsStr::new("md")) {
            listing.markdown.push(entry.into_path());
        }
    }

    Ok(listing)
}

fn walk_error(dir: &Path, error: walkdir::Error) -> LoadError {
    let path = error.path().unwrap_or(dir).to_path_buf();
    let source = error
        .into_io_error()
        .unwrap_or_else(|| io::Error::other("filesystem loop detected"));
    LoadError::io(&path, source)
}

fn directory_name(dir: &Path) -> Option<String> {
    dir.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .or_else(|| {
            dir.canonicalize()
                .ok()?
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
        })
}

fn merge_directory(dir: &Path, level: i32, is_root: bool) -> Result<Option<Merged>, LoadError> {
    let Listing {
        markdown,
        directories,
    } = list_directory(dir)?;

    let name = directory_name(dir).unwrap_or_default();
    let parent_file = format!("{name}.md");
    let is_parent_file =
        |path: &Path| path.file_name().is_some_and(|file| file == OsStr::new(&parent_file));

    let mut parent: Option<Outline> = None;
    let mut children: Vec<Outline> = Vec::new();

    if let Some(path) = markdown.iter().find(|path| is_parent_file(path.as_path())) {
        let mut sections = read_outlines(path)?.into_iter();
        if let Some(mut first) = sections.next() {
            tracing::trace!(
                path = %path.display(),
                title = first.title(),
                "using directory parent document"
            );
            first.section.set_level(level + 1);
            for child in &mut first.children {
                child.renormalize(level + 2);
            }
            for mut sibling in sections {
                sibling.renormalize(level + 2);
                children.push(sibling);
            }
            parent = Some(first);
        }
    }

    for path in markdown.iter().filter(|path| !is_parent_file(path.as_path())) {
        for mut outline in read_outlines(path)? {
            if !is_root {
                let target = if parent.is_some() { level + 2 } else { level + 1 };
                outline.renormalize(target);
            }
            children.push(outline);
        }
    }

    for subdirectory in &directories {
        match merge_directory(subdirectory, level + 1, false)? {
            Some(Merged::Section(section)) => children.push(section),
            Some(Merged::Container(sections)) => children.extend(sections),
            None => {}
        }
    }

    if let Some(mut parent) = parent {
        parent.children.extend(children);
        return Ok(Some(Merged::Section(parent)));
    }

    if children.is_empty() {
        return Ok(None);
    }

    if is_root {
        return Ok(Some(Merged::Container(children)));
    }

    let title = title_from_directory_name(&name);
    tracing::trace!(dir = %dir.display(), %title, "synthesized directory section");
    Ok(Some(Merged::Section(Outline::with_children(
        Section::heading(level + 1, title),
        children,
    ))))
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case("submodule", "Submodule"; "single word")]
    #[test_case("test_connectors", "Test Connectors"; "snake case")]
    #[test_case("api-gateway", "Api-Gateway"; "hyphen starts a word")]
    #[test_case("v2.0-beta_notes", "V2.0-Beta Notes"; "punctuation starts a word")]
    #[test_case("CLI", "Cli"; "acronym is lowered")]
    #[test_case("HTTP_server", "Http Server"; "mixed acronym")]
    #[test_case("camelCase", "CamelCase"; "inner capitals kept")]
    #[test_case("a__b", "A  B"; "empty segments kept")]
    #[test_case("_private", " Private"; "leading underscore")]
    #[test_case("", ""; "empty")]
    fn directory_titles(name: &str, expected: &str) {
        assert_eq!(title_from_directory_name(name), expected);
    }

    #[test]
    fn empty_directory_yields_empty_specification() {
        let dir = tempfile::tempdir().unwrap();
        let spec = parse_directory(dir.path()).unwrap();
        assert!(spec.is_empty());
        assert_eq!(spec.source(), Some(dir.path()));
    }

    #[test]
    fn non_markdown_files_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "# Not a spec\n").unwrap();
        std::fs::write(dir.path().join("spec.md"), "# Spec\n").unwrap();

        let spec = parse_directory(dir.path()).unwrap();
        let titles: Vec<_> = spec.roots().map(|s| s.title().to_string()).collect();
        assert_eq!(titles, ["Spec"]);
    }

    #[test]
    fn missing_directory_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        assert!(matches!(
            parse_directory(&missing),
            Err(LoadError::NotFound(_))
        ));
    }

    #[test]
    fn nested_levels_follow_directory_depth() {
        let dir = tempfile::tempdir().unwrap();
        let outer = dir.path().join("outer");
        let inner = outer.join("inner_part");
        std::fs::create_dir_all(&inner).unwrap();
        std::fs::write(outer.join("outer.md"), "# Outer Doc\n##### Intro\n").unwrap();
        std::fs::write(inner.join("doc.md"), "### Doc\n").unwrap();

        let spec = parse_directory(dir.path()).unwrap();
        let outer = spec.roots().next().unwrap();
        assert_eq!(outer.title(), "Outer Doc");
        assert_eq!(outer.level(), 1);

        let children: Vec<_> = outer.children().collect();
        assert_eq!(children[0].title(), "Intro");
        assert_eq!(children[0].level(), 2);
        assert_eq!(children[1].title(), "Inner Part");
        assert_eq!(children[1].level(), 2);
        assert_eq!(children[1].children().next().unwrap().title(), "Doc");
    }
}
