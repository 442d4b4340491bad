//! Parallel extraction.
//!
//! Selected entries are partitioned into work items: every lone entry is
//! one task, and every solid block is one task owning all of its selected
//! members (the block payload is decompressed once and sliced). Tasks run
//! on the worker pool; each opens its own read handle on the archive so
//! no seek cursor is shared.
//!
//! Per-file output failures are logged and counted without aborting the
//! whole operation; archive-side corruption aborts it.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::archive_path;
use crate::entry::{Entry, EntryKind};
use crate::pool::WorkerPool;
use crate::progress::{ProgressUpdate, SharedProgress, no_progress};
use crate::{Error, Result};

/// Options for [`extract`][crate::extract].
pub struct ExtractOptions {
    /// Stored paths (exact) or directory prefixes (ending in `/`) to
    /// extract. Empty selects everything.
    pub selection: Vec<String>,
    /// Skip files that already exist in the destination.
    pub no_overwrite: bool,
    /// Skip digest verification of written files.
    pub no_verify: bool,
    /// Skip restoring timestamps, permissions and ownership.
    pub no_preserve_props: bool,
    /// Worker pool size.
    pub threads: usize,
    /// Progress sink.
    pub progress: SharedProgress,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            selection: Vec::new(),
            no_overwrite: false,
            no_verify: false,
            no_preserve_props: false,
            threads: 1,
            progress: no_progress(),
        }
    }
}

impl ExtractOptions {
    /// Creates default options: everything, overwrite, verify, preserve,
    /// one worker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts extraction to the given stored paths or `dir/` prefixes.
    pub fn selection(mut self, selection: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.selection = selection.into_iter().map(Into::into).collect();
        self
    }

    /// Skips files that already exist.
    pub fn no_overwrite(mut self, value: bool) -> Self {
        self.no_overwrite = value;
        self
    }

    /// Disables digest verification of written files.
    pub fn no_verify(mut self, value: bool) -> Self {
        self.no_verify = value;
        self
    }

    /// Disables property restoration.
    pub fn no_preserve_props(mut self, value: bool) -> Self {
        self.no_preserve_props = value;
        self
    }

    /// Sets the worker pool size.
    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    /// Installs a progress sink.
    pub fn progress(mut self, progress: SharedProgress) -> Self {
        self.progress = progress;
        self
    }
}

/// Aggregated results of an extraction.
#[derive(Debug, Default, Clone)]
pub struct ExtractionReport {
    /// Files written to the destination.
    pub extracted: usize,
    /// Files skipped (existing, or unsafe paths).
    pub skipped: usize,
    /// Uncompressed bytes written.
    pub bytes_extracted: u64,
    /// Digests recomputed over written files.
    pub hashes_checked: usize,
    /// Digests that did not match the stored value.
    pub hash_mismatches: usize,
    /// Cumulative busy time per worker.
    pub worker_busy: Vec<Duration>,
}

impl ExtractionReport {
    /// Returns `true` if every checked digest matched.
    pub fn integrity_ok(&self) -> bool {
        self.hash_mismatches == 0
    }
}

/// Shared state for extraction tasks.
struct ExtractContext {
    archive: PathBuf,
    out_dir: PathBuf,
    no_overwrite: bool,
    no_verify: bool,
    no_preserve_props: bool,
    progress: SharedProgress,
    progress_lock: Mutex<()>,
    progress_counter: AtomicUsize,
    total: usize,
    started_at: Instant,
    extracted: AtomicUsize,
    skipped: AtomicUsize,
    bytes_extracted: AtomicU64,
    hashes_checked: AtomicUsize,
    hash_mismatches: AtomicUsize,
}

impl ExtractContext {
    fn report_progress(&self, entry: &Entry) {
        let current = self.progress_counter.fetch_add(1, Ordering::Relaxed) + 1;
        let update = ProgressUpdate {
            current,
            total: self.total,
            path: &entry.path,
            uncompressed: entry.uncompressed_size,
            compressed: entry.compressed_size,
            started_at: self.started_at,
        };
        // Serialize sink access; ordering across tasks stays unspecified.
        let _guard = self.progress_lock.lock();
        self.progress.on_progress(&update);
    }
}

/// Extracts entries from `archive` under `out_dir`.
pub fn extract(
    archive: impl AsRef<Path>,
    out_dir: impl AsRef<Path>,
    options: &ExtractOptions,
) -> Result<ExtractionReport> {
    let archive = archive.as_ref();
    let out_dir = out_dir.as_ref();

    let entries = super::scan(archive)?;
    let selected = select_entries(entries, &options.selection);

    if selected.is_empty() {
        if !options.selection.is_empty() {
            log::warn!("no entries in the archive match the requested paths");
        }
        return Ok(ExtractionReport::default());
    }

    let context = Arc::new(ExtractContext {
        archive: archive.to_path_buf(),
        out_dir: out_dir.to_path_buf(),
        no_overwrite: options.no_overwrite,
        no_verify: options.no_verify,
        no_preserve_props: options.no_preserve_props,
        progress: Arc::clone(&options.progress),
        progress_lock: Mutex::new(()),
        progress_counter: AtomicUsize::new(0),
        total: selected.len(),
        started_at: Instant::now(),
        extracted: AtomicUsize::new(0),
        skipped: AtomicUsize::new(0),
        bytes_extracted: AtomicU64::new(0),
        hashes_checked: AtomicUsize::new(0),
        hash_mismatches: AtomicUsize::new(0),
    });

    // Lone entries are independent tasks; each solid block is one task
    // owning all of its selected members.
    let mut lone_entries = Vec::new();
    let mut solid_blocks: BTreeMap<usize, Vec<Entry>> = BTreeMap::new();
    for entry in selected {
        match entry.kind {
            EntryKind::Lone => lone_entries.push(entry),
            EntryKind::SolidMember { block_id } => {
                solid_blocks.entry(block_id).or_default().push(entry);
            }
        }
    }

    let pool = WorkerPool::new(options.threads);
    let mut handles = Vec::new();

    for entry in lone_entries {
        let ctx = Arc::clone(&context);
        handles.push(pool.submit(move || extract_lone(&ctx, &entry)));
    }
    for (_, members) in solid_blocks {
        let ctx = Arc::clone(&context);
        handles.push(pool.submit(move || extract_solid_block(&ctx, &members)));
    }

    let mut first_error = None;
    for handle in handles {
        match handle.wait() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => first_error = first_error.or(Some(e)),
            Err(e) => first_error = first_error.or(Some(e)),
        }
    }
    let worker_busy = pool.busy_times();
    drop(pool);

    if let Some(e) = first_error {
        return Err(e);
    }

    let report = ExtractionReport {
        extracted: context.extracted.load(Ordering::Relaxed),
        skipped: context.skipped.load(Ordering::Relaxed),
        bytes_extracted: context.bytes_extracted.load(Ordering::Relaxed),
        hashes_checked: context.hashes_checked.load(Ordering::Relaxed),
        hash_mismatches: context.hash_mismatches.load(Ordering::Relaxed),
        worker_busy,
    };

    log::info!(
        "extracted {} file(s), {} skipped, {} digest(s) checked, {} mismatch(es)",
        report.extracted,
        report.skipped,
        report.hashes_checked,
        report.hash_mismatches
    );

    Ok(report)
}

/// Applies the allowlist: an element ending in `/` selects members under
/// that prefix, anything else selects the exact path. An empty allowlist
/// selects everything.
pub(crate) fn select_entries(entries: Vec<Entry>, selection: &[String]) -> Vec<Entry> {
    if selection.is_empty() {
        return entries;
    }

    let mut exact: Vec<&str> = Vec::new();
    let mut prefixes: Vec<&str> = Vec::new();
    for s in selection {
        if s.ends_with('/') {
            prefixes.push(s);
        } else {
            exact.push(s);
        }
    }

    entries
        .into_iter()
        .filter(|entry| {
            exact.iter().any(|p| entry.path == *p)
                || prefixes.iter().any(|p| entry.path.starts_with(p))
        })
        .collect()
}

/// Writes one decompressed buffer to its destination, restoring
/// properties and re-checking the digest. Returns `true` when a file was
/// written.
fn place_file(ctx: &ExtractContext, entry: &Entry, data: &[u8]) -> bool {
    if archive_path::has_parent_segment(&entry.path) {
        log::warn!("skipping '{}': path escapes the destination", entry.path);
        ctx.skipped.fetch_add(1, Ordering::Relaxed);
        return false;
    }

    let out_path = archive_path::output_path(&ctx.out_dir, &entry.path);

    if ctx.no_overwrite && out_path.exists() {
        log::debug!("skipping existing file '{}'", entry.path);
        ctx.skipped.fetch_add(1, Ordering::Relaxed);
        return false;
    }

    if let Some(parent) = out_path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            log::warn!("cannot create directory '{}': {e}", parent.display());
            return false;
        }
    }

    if let Err(e) = std::fs::write(&out_path, data) {
        log::warn!("cannot write '{}': {e}", out_path.display());
        return false;
    }

    if !ctx.no_preserve_props {
        entry.properties.apply(&out_path);
    }

    ctx.extracted.fetch_add(1, Ordering::Relaxed);
    ctx.bytes_extracted
        .fetch_add(entry.uncompressed_size, Ordering::Relaxed);

    if entry.has_digest() && !ctx.no_verify {
        ctx.hashes_checked.fetch_add(1, Ordering::Relaxed);
        match entry.digest.digest_file(&out_path) {
            Ok(actual) if actual == entry.digest_hex => {
                log::debug!("digest verified for '{}'", entry.path);
            }
            Ok(actual) => {
                ctx.hash_mismatches.fetch_add(1, Ordering::Relaxed);
                log::warn!(
                    "digest mismatch for '{}': expected {}, got {actual}",
                    entry.path,
                    entry.digest_hex
                );
            }
            Err(e) => {
                ctx.hash_mismatches.fetch_add(1, Ordering::Relaxed);
                log::warn!("cannot re-read '{}' for verification: {e}", entry.path);
            }
        }
    }

    true
}

/// Task body for a lone entry.
fn extract_lone(ctx: &ExtractContext, entry: &Entry) -> Result<()> {
    let compressed = super::read_region(&ctx.archive, entry.data_offset, entry.compressed_size)?;
    let data = entry
        .codec
        .decompress(&compressed, entry.uncompressed_size as usize)?;

    if data.len() as u64 != entry.uncompressed_size {
        return Err(Error::SizeMismatch {
            path: entry.path.clone(),
            expected: entry.uncompressed_size,
            actual: data.len() as u64,
        });
    }

    place_file(ctx, entry, &data);
    ctx.report_progress(entry);
    Ok(())
}

/// Task body for a solid block: one payload read, one decompression, then
/// per-member slicing.
fn extract_solid_block(ctx: &ExtractContext, members: &[Entry]) -> Result<()> {
    let Some(first) = members.first() else {
        return Ok(());
    };

    let compressed = super::read_region(&ctx.archive, first.header_offset, first.compressed_size)?;
    let total_size: u64 = members.iter().map(|m| m.uncompressed_size).sum();
    let block = first.codec.decompress(&compressed, total_size as usize)?;

    for member in members {
        let start = member.data_offset as usize;
        let end = start + member.uncompressed_size as usize;
        if end > block.len() {
            return Err(Error::SizeMismatch {
                path: member.path.clone(),
                expected: member.uncompressed_size,
                actual: block.len().saturating_sub(start) as u64,
            });
        }

        place_file(ctx, member, &block[start..end]);
        ctx.report_progress(member);
    }

    Ok(())
}
