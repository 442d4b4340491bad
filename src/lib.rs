//! # przm
//!
//! A pure-Rust implementation of the PRZM archive container: a
//! self-describing pack of compressed, digest-protected file entries that
//! streams forward and supports random per-entry extraction.
//!
//! ## Quick Start
//!
//! ### Creating an Archive
//!
//! ```rust,no_run
//! use przm::{create, Codec, DigestKind, WriteOptions, Result};
//! use std::path::PathBuf;
//!
//! fn main() -> Result<()> {
//!     let options = WriteOptions::new()
//!         .codec(Codec::Zstd)
//!         .level(5)?
//!         .digest(DigestKind::Sha256)
//!         .threads(4);
//!
//!     let inputs = vec![PathBuf::from("docs"), PathBuf::from("notes.txt")];
//!     let report = create("backup.przm", &inputs, &options)?;
//!     println!(
//!         "wrote {} entries ({:.1}% saved)",
//!         report.files_added,
//!         report.space_savings() * 100.0
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ### Listing and Extracting
//!
//! ```rust,no_run
//! use przm::{extract, list, ExtractOptions, Result};
//!
//! fn main() -> Result<()> {
//!     for entry in list("backup.przm")? {
//!         println!("{}: {} bytes", entry.path, entry.uncompressed_size);
//!     }
//!
//!     let options = ExtractOptions::new()
//!         .selection(["docs/"])
//!         .threads(4);
//!     let report = extract("backup.przm", "restored", &options)?;
//!     println!("{} files, {} mismatches", report.extracted, report.hash_mismatches);
//!     Ok(())
//! }
//! ```
//!
//! ### Verifying and Removing
//!
//! ```rust,no_run
//! use przm::{remove, verify, RemoveOptions, VerifyOptions, Result};
//!
//! fn main() -> Result<()> {
//!     let report = verify("backup.przm", &VerifyOptions::new())?;
//!     assert!(report.all_passed());
//!
//!     remove("backup.przm", &["docs/drafts/".into()], &RemoveOptions::new())?;
//!     Ok(())
//! }
//! ```
//!
//! ## Container Shape
//!
//! An archive is a 7-byte prefix (`PRZM`, version, flags) followed by
//! blocks. A **lone entry** block carries one file with its own header
//! and payload, independently decompressible. A **solid block**
//! compresses the concatenation of many members behind a packed metadata
//! region; members inherit the block's codec and level. A solid block is
//! always the terminal region of the file.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `zlib` | Yes | Zlib and gzip ids via flate2 |
//! | `bzip2` | Yes | BZip2 |
//! | `lzma` | Yes | LZMA |
//! | `lz4` | Yes | LZ4 |
//! | `zstd` | Yes | Zstandard |
//! | `brotli` | Yes | Brotli |
//! | `snappy` | Yes | Snappy |
//!
//! ## Logging, Progress and Confirmation
//!
//! The crate never prints. Diagnostics go through the [`log`] facade;
//! per-item progress goes through the [`ProgressSink`] carried in the
//! operation options; the remover consults an optional yes/no predicate
//! before re-shaping solid members. Presentation is entirely the
//! caller's concern.
//!
//! ## Minimum Supported Rust Version (MSRV)
//!
//! This crate requires **Rust 1.85** or later.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod archive_path;
pub mod codec;
pub mod digest;
pub mod edit;
pub mod entry;
pub mod error;
pub mod format;
pub mod fs;
pub mod pool;
pub mod progress;
pub mod properties;
pub mod read;
pub mod write;

pub use codec::Codec;
pub use digest::DigestKind;
pub use error::{Error, Result};

// Re-export the descriptor types at the crate root for convenience
pub use entry::{Entry, EntryKind};
pub use properties::FileProperties;

// Re-export the operation APIs at the crate root for convenience
pub use edit::{RemovalReport, RemoveOptions, remove};
pub use read::extract::{ExtractOptions, ExtractionReport, extract};
pub use read::verify::{VerificationReport, VerifyOptions, verify};
pub use read::{entry_properties, list, scan};
pub use write::{CreationReport, WriteOptions, append, create};

// Re-export the concurrency and progress plumbing
pub use pool::{TaskHandle, WorkerPool};
pub use progress::{
    ConfirmFn, NoProgress, ProgressFn, ProgressSink, ProgressUpdate, SharedProgress, no_progress,
};
