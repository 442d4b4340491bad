//! Digest verification without materializing output.
//!
//! Every entry carrying a digest is decompressed into memory, re-hashed
//! and compared against the stored value. Mismatches accumulate into the
//! report; they never abort the run. Entries without digests are skipped
//! and surfaced as a single "no hashes" condition when nothing was
//! checkable.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::entry::{Entry, EntryKind};
use crate::pool::WorkerPool;
use crate::{Error, Result};

/// Options for [`verify`][crate::verify].
#[derive(Clone)]
pub struct VerifyOptions {
    /// Worker pool size.
    pub threads: usize,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        Self { threads: 1 }
    }
}

impl VerifyOptions {
    /// Creates default options (one worker).
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the worker pool size.
    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }
}

/// Results of a verification run.
#[derive(Debug, Default, Clone)]
pub struct VerificationReport {
    /// Entries whose digests were recomputed.
    pub checked: usize,
    /// Entries whose recomputed digest differed from the stored one.
    pub mismatches: usize,
    /// Entries skipped because they carry no digest.
    pub skipped_no_digest: usize,
    /// Stored paths of the mismatching entries.
    pub mismatched_paths: Vec<String>,
}

impl VerificationReport {
    /// Returns `true` when the archive carried no digests at all.
    pub fn no_hashes(&self) -> bool {
        self.checked == 0
    }

    /// Returns `true` when every checked digest matched.
    pub fn all_passed(&self) -> bool {
        self.mismatches == 0
    }
}

struct VerifyContext {
    archive: PathBuf,
    checked: AtomicUsize,
    mismatches: AtomicUsize,
    mismatched_paths: Mutex<Vec<String>>,
}

impl VerifyContext {
    fn record(&self, entry: &Entry, data: &[u8]) {
        self.checked.fetch_add(1, Ordering::Relaxed);
        let actual = entry.digest.digest_bytes(data);
        if actual != entry.digest_hex {
            self.mismatches.fetch_add(1, Ordering::Relaxed);
            log::warn!(
                "digest mismatch for '{}': expected {}, got {actual}",
                entry.path,
                entry.digest_hex
            );
            if let Ok(mut paths) = self.mismatched_paths.lock() {
                paths.push(entry.path.clone());
            }
        }
    }
}

/// Re-checks every stored digest in `archive`.
pub fn verify(archive: impl AsRef<Path>, options: &VerifyOptions) -> Result<VerificationReport> {
    let archive = archive.as_ref();
    let entries = super::scan(archive)?;

    let mut skipped_no_digest = 0usize;
    let mut lone_entries = Vec::new();
    let mut solid_blocks: BTreeMap<usize, Vec<Entry>> = BTreeMap::new();

    for entry in entries {
        match entry.kind {
            _ if !entry.has_digest() => skipped_no_digest += 1,
            EntryKind::Lone => lone_entries.push(entry),
            EntryKind::SolidMember { block_id } => {
                solid_blocks.entry(block_id).or_default().push(entry);
            }
        }
    }

    if lone_entries.is_empty() && solid_blocks.is_empty() {
        log::info!("verification complete: no entries had digests to check");
        return Ok(VerificationReport {
            skipped_no_digest,
            ..Default::default()
        });
    }

    let context = Arc::new(VerifyContext {
        archive: archive.to_path_buf(),
        checked: AtomicUsize::new(0),
        mismatches: AtomicUsize::new(0),
        mismatched_paths: Mutex::new(Vec::new()),
    });

    let pool = WorkerPool::new(options.threads);
    let mut handles = Vec::new();

    for entry in lone_entries {
        let ctx = Arc::clone(&context);
        handles.push(pool.submit(move || verify_lone(&ctx, &entry)));
    }
    for (_, members) in solid_blocks {
        let ctx = Arc::clone(&context);
        handles.push(pool.submit(move || verify_solid_block(&ctx, &members)));
    }

    let mut first_error = None;
    for handle in handles {
        match handle.wait() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => first_error = first_error.or(Some(e)),
            Err(e) => first_error = first_error.or(Some(e)),
        }
    }
    drop(pool);

    if let Some(e) = first_error {
        return Err(e);
    }

    let mismatched_paths = context
        .mismatched_paths
        .lock()
        .map(|p| p.clone())
        .unwrap_or_default();
    let report = VerificationReport {
        checked: context.checked.load(Ordering::Relaxed),
        mismatches: context.mismatches.load(Ordering::Relaxed),
        skipped_no_digest,
        mismatched_paths,
    };

    if report.all_passed() {
        log::info!("verification complete: all {} digest(s) matched", report.checked);
    } else {
        log::warn!(
            "verification complete: {} mismatch(es) out of {} checked",
            report.mismatches,
            report.checked
        );
    }

    Ok(report)
}

fn verify_lone(ctx: &VerifyContext, entry: &Entry) -> Result<()> {
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

    ctx.record(entry, &data);
    Ok(())
}

fn verify_solid_block(ctx: &VerifyContext, members: &[Entry]) -> Result<()> {
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
        ctx.record(member, &block[start..end]);
    }

    Ok(())
}
