//! Input discovery.
//!
//! Finds the files a batch should convert: a single file, the direct
//! children of a directory, or a whole directory tree.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::error::{Error, Result};

/// Check if `path` has the given extension, ignoring case.
#[must_use]
pub fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}

/// Find input files under `input`.
///
/// A file is returned on its own if its extension matches. A directory is
/// listed (recursively when asked, without following symlinked
/// directories). Results are sorted by path.
///
/// # Errors
///
/// Returns [`Error::InputNotFound`] if `input` does not exist and
/// [`Error::Scan`] if a directory cannot be read.
pub fn discover(input: &Path, extension: &str, recursive: bool) -> Result<Vec<PathBuf>> {
    if !input.exists() {
        return Err(Error::input_not_found(input));
    }

    let mut found = Vec::new();
    if input.is_file() {
        if has_extension(input, extension) {
            found.push(input.to_path_buf());
        } else {
            debug!(file = %input.display(), "input file does not have a .{extension} extension");
        }
    } else {
        walk(input, extension, recursive, &mut found)?;
    }

    found.sort();
    debug!(input = %input.display(), count = found.len(), recursive, "scan complete");
    Ok(found)
}

fn walk(dir: &Path, extension: &str, recursive: bool, found: &mut Vec<PathBuf>) -> Result<()> {
    let entries = fs::read_dir(dir).map_err(|source| Error::Scan {
        path: dir.to_path_buf(),
        source,
    })?;

    for entry in entries {
        let entry = entry.map_err(|source| Error::Scan {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(|source| Error::Scan {
            path: path.clone(),
            source,
        })?;
        // Symlinked directories are not followed, so a link loop cannot repeat inputs.
        if file_type.is_dir() {
            if recursive {
                walk(&path, extension, recursive, found)?;
            }
        } else if has_extension(&path, extension) {
            trace!(file = %path.display(), "found input");
            found.push(path);
        }
    }
    Ok(())
}

/// Where reports go when no output directory is given: next to the input.
#[must_use]
pub fn default_output_dir(input: &Path) -> PathBuf {
    if input.is_file() {
        input
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
    } else {
        input.to_path_buf()
    }
}
