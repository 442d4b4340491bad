//! Archive creation.
//!
//! Non-solid creation fans one task per input file across the worker
//! pool: read, digest, compress, then emit the framed header and payload
//! as one critical section under the writer mutex. Entry order in the
//! container therefore reflects task completion, not traversal order.
//!
//! Solid creation is sequential: member contents are concatenated into a
//! single buffer that is compressed once, preceded by the packed member
//! metadata.

mod append;

pub use append::append;

use std::collections::HashSet;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::archive_path;
use crate::codec::Codec;
use crate::digest::DigestKind;
use crate::format::header::{LoneHeader, SolidMemberMeta};
use crate::format::{FLAG_SOLID_FIRST_BLOCK, encode_prefix};
use crate::fs::{ExcludeSet, collect_input_files, is_already_compressed};
use crate::pool::WorkerPool;
use crate::progress::{ProgressUpdate, SharedProgress, no_progress};
use crate::properties::FileProperties;
use crate::{Error, Result};

/// Options for [`create`][crate::create] and [`append`][crate::append].
pub struct WriteOptions {
    /// Requested codec; individual files may downgrade to store when
    /// their extension marks them as already compressed.
    pub codec: Codec,
    /// Compression level (0-9).
    pub level: u8,
    /// Digest recorded per entry; [`DigestKind::None`] disables hashing.
    pub digest: DigestKind,
    /// Exclusion patterns: wildcards (`*`, `?`) matched anywhere in the
    /// path, and literal path prefixes.
    pub exclude: Vec<String>,
    /// Store absolute paths instead of rebased relative ones.
    pub full_path: bool,
    /// Downgrade per-file failures (missing, unreadable, duplicate) to
    /// warnings.
    pub ignore_errors: bool,
    /// Pack all files into one solid block.
    pub solid: bool,
    /// Worker pool size for non-solid creation.
    pub threads: usize,
    /// Progress sink.
    pub progress: SharedProgress,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            codec: Codec::Zstd,
            level: 5,
            digest: DigestKind::Sha256,
            exclude: Vec::new(),
            full_path: false,
            ignore_errors: false,
            solid: false,
            threads: 1,
            progress: no_progress(),
        }
    }
}

impl WriteOptions {
    /// Creates default options: zstd level 5, sha256, non-solid, one
    /// worker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the codec.
    pub fn codec(mut self, codec: Codec) -> Self {
        self.codec = codec;
        self
    }

    /// Sets the compression level (0-9).
    pub fn level(mut self, level: u32) -> Result<Self> {
        if level > 9 {
            return Err(Error::InvalidLevel { level });
        }
        self.level = level as u8;
        Ok(self)
    }

    /// Sets the digest algorithm.
    pub fn digest(mut self, digest: DigestKind) -> Self {
        self.digest = digest;
        self
    }

    /// Adds exclusion patterns.
    pub fn exclude(mut self, patterns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.exclude.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Stores absolute paths.
    pub fn full_path(mut self, value: bool) -> Self {
        self.full_path = value;
        self
    }

    /// Downgrades per-file failures to warnings.
    pub fn ignore_errors(mut self, value: bool) -> Self {
        self.ignore_errors = value;
        self
    }

    /// Packs everything into one solid block.
    pub fn solid(mut self, value: bool) -> Self {
        self.solid = value;
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

/// Aggregated results of a create or append.
#[derive(Debug, Default, Clone)]
pub struct CreationReport {
    /// Entries written.
    pub files_added: usize,
    /// Total original bytes.
    pub bytes_uncompressed: u64,
    /// Total stored bytes (payloads only).
    pub bytes_compressed: u64,
    /// Cumulative busy time per worker; empty for solid creation, which
    /// is sequential.
    pub worker_busy: Vec<Duration>,
}

impl CreationReport {
    /// Fraction of input bytes saved by compression, in `0.0..=1.0`.
    pub fn space_savings(&self) -> f64 {
        if self.bytes_uncompressed == 0 {
            0.0
        } else {
            1.0 - self.bytes_compressed as f64 / self.bytes_uncompressed as f64
        }
    }
}

/// Creates a new archive from the given input files and directories.
///
/// An empty input set produces a valid archive holding only the 7-byte
/// prefix.
pub fn create(
    archive: impl AsRef<Path>,
    inputs: &[PathBuf],
    options: &WriteOptions,
) -> Result<CreationReport> {
    let archive = archive.as_ref();

    let excludes = ExcludeSet::compile(&options.exclude);
    let files = collect_input_files(inputs, &excludes, options.ignore_errors)?;
    let mut seen = HashSet::new();
    let pairs = plan_entries(&files, inputs, options, &mut seen)?;

    log::info!(
        "creating archive '{}' with {} file(s)",
        archive.display(),
        pairs.len()
    );

    let report = if options.solid && !pairs.is_empty() {
        let (block, stats) = build_solid_block(&pairs, options)?;
        let mut file = create_archive_file(archive)?;
        if stats.files_added == 0 {
            // Every member was skipped; an empty solid block would still
            // claim the rest of the file, so fall back to a bare prefix.
            file.write_all(&encode_prefix(0))?;
        } else {
            file.write_all(&encode_prefix(FLAG_SOLID_FIRST_BLOCK))?;
            file.write_all(&block)?;
        }
        file.sync_all()?;
        stats
    } else {
        let mut file = create_archive_file(archive)?;
        file.write_all(&encode_prefix(0))?;
        write_lone_entries(file, &pairs, options)?
    };

    log::info!(
        "created '{}': {} file(s), {} -> {} bytes",
        archive.display(),
        report.files_added,
        report.bytes_uncompressed,
        report.bytes_compressed
    );

    Ok(report)
}

fn create_archive_file(archive: &Path) -> Result<File> {
    File::create(archive).map_err(|e| Error::CannotCreateArchive {
        path: archive.display().to_string(),
        source: e,
    })
}

/// Computes stored paths and applies the duplicate policy. `seen` may be
/// pre-seeded with paths already in the archive (append).
pub(crate) fn plan_entries(
    files: &[PathBuf],
    inputs: &[PathBuf],
    options: &WriteOptions,
    seen: &mut HashSet<String>,
) -> Result<Vec<(PathBuf, String)>> {
    let mut pairs = Vec::with_capacity(files.len());
    for file in files {
        let stored = archive_path::stored_path(file, inputs, options.full_path)?;
        if !seen.insert(stored.clone()) {
            if options.ignore_errors {
                log::warn!("file already exists in archive: '{stored}' (ignored)");
                continue;
            }
            return Err(Error::DuplicatePath { path: stored });
        }
        pairs.push((file.clone(), stored));
    }
    Ok(pairs)
}

/// Shared state for lone-entry compression tasks.
struct WriteContext {
    writer: Mutex<File>,
    codec: Codec,
    level: u8,
    digest: DigestKind,
    ignore_errors: bool,
    progress: SharedProgress,
    progress_counter: AtomicUsize,
    total: usize,
    started_at: Instant,
    files_added: AtomicUsize,
    bytes_uncompressed: AtomicU64,
    bytes_compressed: AtomicU64,
}

/// Writes lone entries for every planned pair through the worker pool.
/// The file must already hold the prefix (create) or the existing
/// container (append) and be positioned at its end.
pub(crate) fn write_lone_entries(
    file: File,
    pairs: &[(PathBuf, String)],
    options: &WriteOptions,
) -> Result<CreationReport> {
    let context = Arc::new(WriteContext {
        writer: Mutex::new(file),
        codec: options.codec,
        level: options.level,
        digest: options.digest,
        ignore_errors: options.ignore_errors,
        progress: Arc::clone(&options.progress),
        progress_counter: AtomicUsize::new(0),
        total: pairs.len(),
        started_at: Instant::now(),
        files_added: AtomicUsize::new(0),
        bytes_uncompressed: AtomicU64::new(0),
        bytes_compressed: AtomicU64::new(0),
    });

    let pool = WorkerPool::new(options.threads);
    let handles: Vec<_> = pairs
        .iter()
        .map(|(fs_path, stored)| {
            let ctx = Arc::clone(&context);
            let fs_path = fs_path.clone();
            let stored = stored.clone();
            pool.submit(move || write_one_entry(&ctx, &fs_path, &stored))
        })
        .collect();

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

    {
        let file = context.writer.lock().unwrap();
        file.sync_all()?;
    }

    Ok(CreationReport {
        files_added: context.files_added.load(Ordering::Relaxed),
        bytes_uncompressed: context.bytes_uncompressed.load(Ordering::Relaxed),
        bytes_compressed: context.bytes_compressed.load(Ordering::Relaxed),
        worker_busy,
    })
}

/// Task body: read, digest, compress, frame, emit.
fn write_one_entry(ctx: &WriteContext, fs_path: &Path, stored: &str) -> Result<()> {
    let data = match std::fs::read(fs_path) {
        Ok(data) => data,
        Err(e) => {
            if ctx.ignore_errors {
                log::warn!("cannot open file: '{}' ({e}, ignored)", fs_path.display());
                return Ok(());
            }
            return Err(Error::Io(e));
        }
    };

    let mut codec = ctx.codec;
    if codec != Codec::Store && is_already_compressed(fs_path) {
        log::debug!(
            "storing already compressed file '{}' without recompression",
            fs_path.display()
        );
        codec = Codec::Store;
    }

    let digest_hex = ctx.digest.digest_bytes(&data);
    let compressed = codec.compress(&data, ctx.level)?;
    let properties = FileProperties::from_path(fs_path);

    let header = LoneHeader {
        path: stored.to_string(),
        codec,
        level: ctx.level,
        digest: ctx.digest,
        digest_hex,
        uncompressed_size: data.len() as u64,
        compressed_size: compressed.len() as u64,
        properties,
    };
    let header_bytes = header.encode()?;

    // Header and payload land as one contiguous region.
    {
        let mut file = ctx.writer.lock().unwrap();
        file.write_all(&header_bytes)?;
        file.write_all(&compressed)?;
    }

    ctx.files_added.fetch_add(1, Ordering::Relaxed);
    ctx.bytes_uncompressed
        .fetch_add(data.len() as u64, Ordering::Relaxed);
    ctx.bytes_compressed
        .fetch_add(compressed.len() as u64, Ordering::Relaxed);

    let current = ctx.progress_counter.fetch_add(1, Ordering::Relaxed) + 1;
    ctx.progress.on_progress(&ProgressUpdate {
        current,
        total: ctx.total,
        path: stored,
        uncompressed: data.len() as u64,
        compressed: compressed.len() as u64,
        started_at: ctx.started_at,
    });

    Ok(())
}

/// Builds the body of a solid block (codec, level, metadata size,
/// metadata, compressed payload) sequentially.
pub(crate) fn build_solid_block(
    pairs: &[(PathBuf, String)],
    options: &WriteOptions,
) -> Result<(Vec<u8>, CreationReport)> {
    let started_at = Instant::now();
    let mut metadata = Vec::new();
    let mut buffer = Vec::new();
    let mut files_added = 0usize;

    for (index, (fs_path, stored)) in pairs.iter().enumerate() {
        let data = match std::fs::read(fs_path) {
            Ok(data) => data,
            Err(e) => {
                if options.ignore_errors {
                    log::warn!("cannot open file: '{}' ({e}, ignored)", fs_path.display());
                    continue;
                }
                return Err(Error::Io(e));
            }
        };

        let member = SolidMemberMeta {
            path: stored.clone(),
            digest: options.digest,
            digest_hex: options.digest.digest_bytes(&data),
            uncompressed_size: data.len() as u64,
            properties: FileProperties::from_path(fs_path),
        };
        metadata.extend_from_slice(&member.encode()?);
        buffer.extend_from_slice(&data);
        files_added += 1;

        options.progress.on_progress(&ProgressUpdate {
            current: index + 1,
            total: pairs.len(),
            path: stored,
            uncompressed: member.uncompressed_size,
            compressed: 0,
            started_at,
        });
    }

    let payload = options.codec.compress(&buffer, options.level)?;

    let mut block = Vec::with_capacity(10 + metadata.len() + payload.len());
    block.push(options.codec.id());
    block.push(options.level);
    block.extend_from_slice(&(metadata.len() as u64).to_le_bytes());
    block.extend_from_slice(&metadata);
    block.extend_from_slice(&payload);

    let report = CreationReport {
        files_added,
        bytes_uncompressed: buffer.len() as u64,
        bytes_compressed: payload.len() as u64,
        worker_busy: Vec::new(),
    };
    Ok((block, report))
}
