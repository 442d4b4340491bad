//! Archive modification: removing entries.
//!
//! Removal rewrites the container to a temporary file omitting the
//! selected entries, then atomically renames it over the original. Kept
//! lone entries are copied byte-for-byte; kept members of solid blocks
//! are materialized as lone entries, re-compressed individually with the
//! codec and level inherited from their block. The rewritten archive is
//! therefore always non-solid.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::entry::{Entry, EntryKind};
use crate::format::encode_prefix;
use crate::format::header::LoneHeader;
use crate::progress::{ConfirmFn, ProgressUpdate, SharedProgress, no_progress};
use crate::read;
use crate::{Error, Result};

/// Options for [`remove`][crate::remove].
pub struct RemoveOptions {
    /// Downgrade an empty match to a warning instead of
    /// [`Error::NothingToRemove`].
    pub ignore_errors: bool,
    /// Consulted before solid members are re-materialized as lone
    /// entries; declining aborts the rewrite with nothing changed.
    pub confirm: Option<ConfirmFn>,
    /// Progress sink.
    pub progress: SharedProgress,
}

impl Default for RemoveOptions {
    fn default() -> Self {
        Self {
            ignore_errors: false,
            confirm: None,
            progress: no_progress(),
        }
    }
}

impl RemoveOptions {
    /// Creates default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Downgrades an empty match to a warning.
    pub fn ignore_errors(mut self, value: bool) -> Self {
        self.ignore_errors = value;
        self
    }

    /// Installs the confirmation predicate.
    pub fn confirm(mut self, confirm: ConfirmFn) -> Self {
        self.confirm = Some(confirm);
        self
    }

    /// Installs a progress sink.
    pub fn progress(mut self, progress: SharedProgress) -> Self {
        self.progress = progress;
        self
    }
}

/// Results of a removal.
#[derive(Debug, Default, Clone)]
pub struct RemovalReport {
    /// Entries removed from the archive.
    pub removed: usize,
    /// Original bytes freed (sum of removed entries' uncompressed sizes).
    pub bytes_freed: u64,
    /// Entries kept in the rewritten archive.
    pub kept: usize,
}

/// Removes entries matching the selection (exact paths plus path
/// prefixes) and rewrites the archive without them.
pub fn remove(
    archive: impl AsRef<Path>,
    selection: &[String],
    options: &RemoveOptions,
) -> Result<RemovalReport> {
    let archive = archive.as_ref();
    let entries = read::scan(archive)?;

    let (kept, removed): (Vec<Entry>, Vec<Entry>) = entries
        .into_iter()
        .partition(|entry| !matches_selection(&entry.path, selection));

    if removed.is_empty() {
        if options.ignore_errors {
            log::warn!("no matching paths found to remove");
            return Ok(RemovalReport::default());
        }
        return Err(Error::NothingToRemove);
    }

    for entry in &removed {
        log::info!("removing '{}'", entry.path);
    }

    let must_materialize = kept.iter().any(Entry::is_solid_member);
    if must_materialize {
        if let Some(confirm) = &options.confirm {
            let prompt = "Remaining solid-block members will be re-compressed as individual \
                          entries. Continue?";
            if !confirm(prompt) {
                log::warn!("removal declined; archive left unchanged");
                return Ok(RemovalReport::default());
            }
        }
    }

    let temp_path = temp_sibling(archive);
    let result = rewrite(archive, &temp_path, &kept, options);

    match result {
        Ok(()) => {
            std::fs::rename(&temp_path, archive)
                .map_err(|e| Error::CannotRename { source: e })?;
        }
        Err(e) => {
            let _ = std::fs::remove_file(&temp_path);
            return Err(e);
        }
    }

    let report = RemovalReport {
        removed: removed.len(),
        bytes_freed: removed.iter().map(|e| e.uncompressed_size).sum(),
        kept: kept.len(),
    };

    log::info!(
        "removed {} entr(ies) from '{}', {} bytes freed",
        report.removed,
        archive.display(),
        report.bytes_freed
    );

    Ok(report)
}

/// Exact match, or prefix match on the stored path.
fn matches_selection(path: &str, selection: &[String]) -> bool {
    selection
        .iter()
        .any(|s| path == s || path.starts_with(s.as_str()))
}

fn temp_sibling(archive: &Path) -> PathBuf {
    let mut name = archive.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Writes the surviving entries to `temp`: lone entries as raw copies,
/// solid members re-framed as lone entries.
fn rewrite(
    archive: &Path,
    temp: &Path,
    kept: &[Entry],
    options: &RemoveOptions,
) -> Result<()> {
    let mut out = File::create(temp).map_err(|e| Error::CannotCreateArchive {
        path: temp.display().to_string(),
        source: e,
    })?;
    out.write_all(&encode_prefix(0))?;

    // Decompress each surviving solid block once, then slice members out
    // of it as they come up in archive order.
    let mut block_cache: BTreeMap<usize, Vec<u8>> = BTreeMap::new();
    for entry in kept {
        if let EntryKind::SolidMember { block_id } = entry.kind {
            if !block_cache.contains_key(&block_id) {
                let compressed =
                    read::read_region(archive, entry.header_offset, entry.compressed_size)?;
                let block = entry.codec.decompress(&compressed, 0)?;
                block_cache.insert(block_id, block);
            }
        }
    }

    let started_at = Instant::now();
    for (index, entry) in kept.iter().enumerate() {
        match entry.kind {
            EntryKind::Lone => {
                let total = entry.data_offset - entry.header_offset + entry.compressed_size;
                let bytes = read::read_region(archive, entry.header_offset, total)?;
                out.write_all(&bytes)?;
            }
            EntryKind::SolidMember { block_id } => {
                let block = block_cache
                    .get(&block_id)
                    .ok_or_else(|| Error::corrupt_stream(entry.header_offset, "missing block"))?;
                let start = entry.data_offset as usize;
                let end = start + entry.uncompressed_size as usize;
                if end > block.len() {
                    return Err(Error::SizeMismatch {
                        path: entry.path.clone(),
                        expected: entry.uncompressed_size,
                        actual: block.len().saturating_sub(start) as u64,
                    });
                }

                let data = &block[start..end];
                let compressed = entry.codec.compress(data, entry.level)?;
                let header = LoneHeader {
                    path: entry.path.clone(),
                    codec: entry.codec,
                    level: entry.level,
                    digest: entry.digest,
                    digest_hex: entry.digest_hex.clone(),
                    uncompressed_size: entry.uncompressed_size,
                    compressed_size: compressed.len() as u64,
                    properties: entry.properties,
                };
                out.write_all(&header.encode()?)?;
                out.write_all(&compressed)?;
            }
        }

        options.progress.on_progress(&ProgressUpdate {
            current: index + 1,
            total: kept.len(),
            path: &entry.path,
            uncompressed: entry.uncompressed_size,
            compressed: entry.compressed_size,
            started_at,
        });
    }

    out.sync_all()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_selection_exact() {
        let selection = vec!["a.txt".to_string()];
        assert!(matches_selection("a.txt", &selection));
        assert!(!matches_selection("b.txt", &selection));
    }

    #[test]
    fn test_matches_selection_prefix() {
        let selection = vec!["docs/".to_string()];
        assert!(matches_selection("docs/readme.md", &selection));
        assert!(!matches_selection("src/main.rs", &selection));
        // Bare prefixes match too, as in path-prefix removal.
        let bare = vec!["docs".to_string()];
        assert!(matches_selection("docs/readme.md", &bare));
    }

    #[test]
    fn test_temp_sibling_name() {
        let temp = temp_sibling(Path::new("dir/a.przm"));
        assert_eq!(temp, PathBuf::from("dir/a.przm.tmp"));
    }

    #[test]
    fn test_remove_missing_archive() {
        let err = remove(
            "no/such/archive.przm",
            &["x".to_string()],
            &RemoveOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::PathNotFound { .. }));
    }
}
