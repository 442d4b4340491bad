//! Filesystem traversal and exclusion for the writer.
//!
//! Inputs are either regular files (one entry each) or directories walked
//! recursively. A file is excluded when any glob pattern matches anywhere
//! in its path (`*` and `?` wildcards) or when its path sits under a
//! literal exclusion prefix. Traversal follows the walker's natural order;
//! no alphabetical guarantee is made.

use std::path::{Path, PathBuf};

use regex::Regex;
use walkdir::WalkDir;

use crate::{Error, Result};

/// Extensions of file formats that are already compressed.
///
/// Files ending in one of these are stored verbatim regardless of the
/// requested codec; recompressing them wastes time for no gain.
pub const COMPRESSED_EXTENSIONS: &[&str] = &[
    ".zip", ".rar", ".7z", ".tar.gz", ".tgz", ".tar.bz2", ".tbz2", ".tar.xz", ".txz", ".gz",
    ".bz2", ".xz", ".lz4", ".zst", ".jpg", ".jpeg", ".png", ".gif", ".webp", ".bmp", ".tiff",
    ".ico", ".mp3", ".aac", ".ogg", ".flac", ".m4a", ".wma", ".mp4", ".avi", ".mkv", ".mov",
    ".wmv", ".flv", ".webm", ".m4v", ".pdf", ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx",
];

/// Returns `true` if the file's extension marks it as already compressed.
///
/// The comparison is case-insensitive and honors compound suffixes such as
/// `.tar.gz`.
pub fn is_already_compressed(path: &Path) -> bool {
    let name = match path.file_name() {
        Some(n) => n.to_string_lossy().to_lowercase(),
        None => return false,
    };
    COMPRESSED_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
}

/// A compiled set of exclusion patterns.
///
/// Each pattern participates twice: as a wildcard match anywhere in the
/// path (`*` expands to `.*`, `?` to `.`), and as a literal path prefix.
#[derive(Debug, Default)]
pub struct ExcludeSet {
    patterns: Vec<(String, Regex)>,
}

impl ExcludeSet {
    /// Compiles the given patterns.
    pub fn compile(patterns: &[String]) -> Self {
        let patterns = patterns
            .iter()
            .filter_map(|p| glob_to_regex(p).map(|re| (p.clone(), re)))
            .collect();
        Self { patterns }
    }

    /// Returns `true` if no patterns were supplied.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Returns `true` if `path` should be excluded from the archive.
    pub fn matches(&self, path: &Path) -> bool {
        let text = path.to_string_lossy();
        for (literal, re) in &self.patterns {
            if re.is_match(&text) {
                log::debug!("excluding '{}' (matches pattern: {})", text, literal);
                return true;
            }
            if text.starts_with(literal.as_str()) {
                log::debug!("excluding '{}' (under excluded path: {})", text, literal);
                return true;
            }
        }
        false
    }
}

/// Converts a glob pattern into a search-anchored regex.
fn glob_to_regex(pattern: &str) -> Option<Regex> {
    let mut re = String::with_capacity(pattern.len() * 2);
    for ch in pattern.chars() {
        match ch {
            '*' => re.push_str(".*"),
            '?' => re.push('.'),
            c => re.push_str(&regex::escape(&c.to_string())),
        }
    }
    Regex::new(&re).ok()
}

/// Expands the writer's input arguments into the list of files to archive.
///
/// Directories are walked recursively; exclusion applies to both whole
/// inputs and individual walked files. A missing input is an error unless
/// `ignore_errors` downgrades it to a warning.
pub fn collect_input_files(
    inputs: &[PathBuf],
    excludes: &ExcludeSet,
    ignore_errors: bool,
) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for input in inputs {
        if !input.exists() {
            if ignore_errors {
                log::warn!("path not found: '{}' (ignored)", input.display());
                continue;
            }
            return Err(Error::PathNotFound {
                path: input.display().to_string(),
            });
        }
        if excludes.matches(input) {
            continue;
        }

        if input.is_dir() {
            walk_directory(input, excludes, ignore_errors, &mut files)?;
        } else {
            files.push(input.clone());
        }
    }

    Ok(files)
}

fn walk_directory(
    dir: &Path,
    excludes: &ExcludeSet,
    ignore_errors: bool,
    files: &mut Vec<PathBuf>,
) -> Result<()> {
    let walker = WalkDir::new(dir).follow_links(false).into_iter();
    for entry in walker.filter_entry(|e| !excludes.matches(e.path())) {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                if ignore_errors {
                    log::warn!("cannot read directory entry under '{}': {e} (ignored)", dir.display());
                    continue;
                }
                return Err(Error::Io(std::io::Error::other(e)));
            }
        };
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_already_compressed_simple() {
        assert!(is_already_compressed(Path::new("photo.jpg")));
        assert!(is_already_compressed(Path::new("PHOTO.JPG")));
        assert!(is_already_compressed(Path::new("a/b/backup.zip")));
        assert!(!is_already_compressed(Path::new("notes.txt")));
        assert!(!is_already_compressed(Path::new("no_extension")));
    }

    #[test]
    fn test_already_compressed_compound() {
        assert!(is_already_compressed(Path::new("dump.tar.gz")));
        assert!(is_already_compressed(Path::new("dump.tgz")));
        assert!(is_already_compressed(Path::new("dump.tar.xz")));
    }

    #[test]
    fn test_exclude_star_glob() {
        let ex = ExcludeSet::compile(&["*.log".to_string()]);
        assert!(ex.matches(Path::new("build/output.log")));
        assert!(!ex.matches(Path::new("build/output.txt")));
    }

    #[test]
    fn test_exclude_question_glob() {
        let ex = ExcludeSet::compile(&["file?.txt".to_string()]);
        assert!(ex.matches(Path::new("file1.txt")));
        assert!(ex.matches(Path::new("fileX.txt")));
        assert!(!ex.matches(Path::new("file.txt")));
    }

    #[test]
    fn test_exclude_is_search_not_full_match() {
        // Patterns are anchored at find: "cache" matches anywhere.
        let ex = ExcludeSet::compile(&["cache".to_string()]);
        assert!(ex.matches(Path::new("proj/cache/x.bin")));
    }

    #[test]
    fn test_exclude_literal_prefix() {
        let ex = ExcludeSet::compile(&["target/".to_string()]);
        assert!(ex.matches(Path::new("target/debug/foo")));
    }

    #[test]
    fn test_exclude_escapes_regex_metachars() {
        let ex = ExcludeSet::compile(&["a+b".to_string()]);
        assert!(ex.matches(Path::new("dir/a+b.txt")));
        assert!(!ex.matches(Path::new("dir/aab.txt")));
    }

    #[test]
    fn test_collect_missing_input_errors() {
        let ex = ExcludeSet::default();
        let inputs = vec![PathBuf::from("definitely/not/here-42")];
        let err = collect_input_files(&inputs, &ex, false).unwrap_err();
        assert!(matches!(err, Error::PathNotFound { .. }));
    }

    #[test]
    fn test_collect_missing_input_ignored() {
        let ex = ExcludeSet::default();
        let inputs = vec![PathBuf::from("definitely/not/here-42")];
        let files = collect_input_files(&inputs, &ex, true).unwrap();
        assert!(files.is_empty());
    }
}
