//! Stored-path handling: normalization, validation, and base computation.
//!
//! Paths inside a container always use forward slashes, regardless of the
//! host convention. Relative storage rebases each file against the parent
//! directory of the input argument that covers it (the "longest matching
//! prefix" rule); full-path storage keeps the absolute path verbatim.

use std::path::{Component, Path, PathBuf};

use crate::{Error, Result};

/// Maximum length for stored paths, in bytes.
///
/// This cap does double duty: it bounds hostile headers, and it guarantees
/// a lone entry's `path_len` field can never collide with the solid-block
/// magic word, which keeps the block stream unambiguous.
pub const MAX_PATH_LENGTH: usize = 32 * 1024;

/// Validates and normalizes a path for storage in a container.
///
/// Host separators are converted to `/`. The result must be non-empty,
/// NUL-free and at most [`MAX_PATH_LENGTH`] bytes.
pub fn normalize(path: &Path) -> Result<String> {
    let s = path.to_string_lossy();
    let normalized = if std::path::MAIN_SEPARATOR == '/' {
        s.into_owned()
    } else {
        s.replace(std::path::MAIN_SEPARATOR, "/")
    };
    validate(&normalized)?;
    Ok(normalized)
}

/// Validates an already-normalized stored path.
pub fn validate(path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(Error::InvalidArchivePath("path is empty".into()));
    }
    if path.len() > MAX_PATH_LENGTH {
        return Err(Error::InvalidArchivePath(format!(
            "path is {} bytes, limit is {}",
            path.len(),
            MAX_PATH_LENGTH
        )));
    }
    if path.contains('\0') {
        return Err(Error::InvalidArchivePath("path contains NUL byte".into()));
    }
    Ok(())
}

/// Returns `true` if the stored path contains a `..` segment.
///
/// Such paths are never produced by the writer; the extractor refuses to
/// place them.
pub fn has_parent_segment(path: &str) -> bool {
    path.split('/').any(|seg| seg == "..")
}

/// Computes the stored path for `file`, which was reached from one of the
/// writer's input arguments.
///
/// With `full_path` set, the absolute form of `file` is stored. Otherwise
/// the longest input argument that is a path-prefix of `file` is located
/// and the file is stored relative to that argument's parent directory, so
/// that archiving `sub` stores `sub/b.bin` rather than `b.bin`. When no
/// argument covers the file, its own parent serves as the base.
pub fn stored_path(file: &Path, inputs: &[PathBuf], full_path: bool) -> Result<String> {
    if full_path {
        let abs = std::fs::canonicalize(file).unwrap_or_else(|_| file.to_path_buf());
        return normalize(&abs);
    }

    let base = longest_covering_input(file, inputs)
        .and_then(|input| input.parent().map(Path::to_path_buf))
        .filter(|p| !p.as_os_str().is_empty())
        .or_else(|| {
            file.parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf)
        });

    let rel = match base {
        Some(base) => file.strip_prefix(&base).unwrap_or(file).to_path_buf(),
        None => file.to_path_buf(),
    };
    normalize(&rel)
}

/// Finds the longest input argument that is a component-wise prefix of
/// `file`. Input order breaks length ties.
fn longest_covering_input<'a>(file: &Path, inputs: &'a [PathBuf]) -> Option<&'a PathBuf> {
    let mut best: Option<&PathBuf> = None;
    for input in inputs {
        if file.starts_with(input) {
            let longer = match best {
                Some(b) => input.components().count() > b.components().count(),
                None => true,
            };
            if longer {
                best = Some(input);
            }
        }
    }
    best
}

/// Composes an output path for extraction: the stored path is joined under
/// `root`, with any absolute prefix stripped so full-path archives unpack
/// beneath the destination instead of scribbling over the filesystem.
pub fn output_path(root: &Path, stored: &str) -> PathBuf {
    let trimmed = stored.trim_start_matches('/');
    let mut out = root.to_path_buf();
    for part in Path::new(trimmed).components() {
        match part {
            Component::Normal(c) => out.push(c),
            // Prefix/RootDir cannot appear after the trim on Unix; drop
            // drive prefixes from archives created elsewhere.
            _ => {}
        }
    }
    out
}
