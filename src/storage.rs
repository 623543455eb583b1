/// Merging directories of markdown documents.
pub mod directory;
/// Parsing single markdown documents.
pub mod markdown;

use std::path::Path;

use tracing::instrument;

use crate::domain::Specification;
pub use directory::{parse_directory, title_from_directory_name};
pub use markdown::{
    LoadError, extract_test_reference, format_test_reference, parse_file, parse_markdown,
    parse_outlines,
};

/// Loads a specification from a markdown file or a directory of them.
///
/// # Errors
///
/// Returns an error if the path does not exist or anything below it cannot be
/// read.
#[instrument(level = "debug")]
pub fn load(path: &Path) -> Result<Specification, LoadError> {
    let metadata = std::fs::metadata(path).map_err(|e| LoadError::io(path, e))?;
    if metadata.is_dir() {
        parse_directory(path)
    } else {
        parse_file(path)
    }
}
