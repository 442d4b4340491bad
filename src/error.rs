//! Error types for PRZM archive operations.
//!
//! This module provides the [`Error`] enum which represents all possible
//! failure modes when working with PRZM archives, along with a convenient
//! [`Result<T>`] type alias.
//!
//! # Error Handling
//!
//! All fallible operations in this crate return `Result<T, Error>`. Handle
//! errors with pattern matching or the `?` operator:
//!
//! ```rust,no_run
//! use przm::{list, Error};
//!
//! fn count_entries(path: &str) -> przm::Result<usize> {
//!     match list(path) {
//!         Ok(entries) => Ok(entries.len()),
//!         Err(Error::CorruptHeader { offset, reason }) => {
//!             eprintln!("archive damaged at byte {:#x}: {}", offset, reason);
//!             Err(Error::CorruptHeader { offset, reason })
//!         }
//!         Err(e) => Err(e),
//!     }
//! }
//! ```

use std::io;

/// The main error type for PRZM archive operations.
///
/// Errors fall into several categories:
///
/// | Category | Variants | Typical Cause |
/// |----------|----------|---------------|
/// | Input I/O | [`Io`][Self::Io], [`PathNotFound`][Self::PathNotFound] | File system operations |
/// | Output I/O | [`CannotCreateArchive`][Self::CannotCreateArchive], [`CannotRename`][Self::CannotRename] | Creating or replacing the container |
/// | Parsing | [`CorruptHeader`][Self::CorruptHeader], [`CorruptStream`][Self::CorruptStream], [`UnsupportedVersion`][Self::UnsupportedVersion] | Invalid archive data |
/// | Registry | [`UnknownCodec`][Self::UnknownCodec], [`UnknownDigest`][Self::UnknownDigest], [`UnsupportedCodec`][Self::UnsupportedCodec] | Ids missing from this build |
/// | Pipeline | [`CompressionFailed`][Self::CompressionFailed], [`DecompressionFailed`][Self::DecompressionFailed], [`SizeMismatch`][Self::SizeMismatch] | Codec failures |
/// | Policy | [`DuplicatePath`][Self::DuplicatePath], [`NothingToRemove`][Self::NothingToRemove], [`SolidTailAppend`][Self::SolidTailAppend] | Semantic rules |
///
/// Digest mismatches during extraction and verification are *not* errors;
/// they accumulate into the operation reports.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An I/O error occurred during file operations.
    ///
    /// This wraps [`std::io::Error`]; check the underlying
    /// [`std::io::ErrorKind`] for causes such as permission denial or a
    /// full disk.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// An input path given to the writer does not exist.
    #[error("path not found: {path}")]
    PathNotFound {
        /// The missing input path.
        path: String,
    },

    /// The archive file could not be created.
    #[error("cannot create archive '{path}': {source}")]
    CannotCreateArchive {
        /// The target archive path.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The rewritten archive could not replace the original.
    ///
    /// The remover writes to a temporary file and renames it over the
    /// original; the original is left intact when this error is returned.
    #[error("cannot rename rewritten archive: {source}")]
    CannotRename {
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The archive prefix or an entry header is corrupt or truncated.
    ///
    /// The offset is where the reader detected the damage.
    #[error("corrupt header at offset {offset:#x}: {reason}")]
    CorruptHeader {
        /// The byte offset where corruption was detected.
        offset: u64,
        /// A description of the corruption.
        reason: String,
    },

    /// Bytes between blocks are neither a valid lone-entry header nor the
    /// solid-block magic.
    #[error("corrupt block stream at offset {offset:#x}: {reason}")]
    CorruptStream {
        /// The byte offset of the unreadable region.
        offset: u64,
        /// A description of the problem.
        reason: String,
    },

    /// The archive declares a format version this build does not read.
    #[error("unsupported archive version {version} (expected 1)")]
    UnsupportedVersion {
        /// The version found in the prefix.
        version: u16,
    },

    /// An entry names a codec id that is not part of the registry.
    #[error("unknown codec id {id:#04x}")]
    UnknownCodec {
        /// The unrecognized id byte.
        id: u8,
    },

    /// An entry names a digest id that is not part of the registry.
    #[error("unknown digest id {id:#04x}")]
    UnknownDigest {
        /// The unrecognized id byte.
        id: u8,
    },

    /// A codec id is reserved in the wire format but not available in this
    /// build (a disabled feature, or the lzo slot).
    #[error("codec '{codec}' is not supported by this build")]
    UnsupportedCodec {
        /// The codec name.
        codec: &'static str,
    },

    /// A codec failed while compressing.
    ///
    /// Codec failures indicate a programmer error or resource exhaustion
    /// and are never recovered from.
    #[error("{codec} compression failed: {reason}")]
    CompressionFailed {
        /// The codec name.
        codec: &'static str,
        /// A description from the codec backend.
        reason: String,
    },

    /// A codec failed while decompressing, which indicates archive
    /// corruption.
    #[error("{codec} decompression failed: {reason}")]
    DecompressionFailed {
        /// The codec name.
        codec: &'static str,
        /// A description from the codec backend.
        reason: String,
    },

    /// Decompressed data did not have the size recorded in the entry.
    #[error("size mismatch for '{path}': expected {expected} bytes, got {actual}")]
    SizeMismatch {
        /// The stored entry path.
        path: String,
        /// The uncompressed size recorded in the header.
        expected: u64,
        /// The size actually produced by the codec.
        actual: u64,
    },

    /// An appended file would collide with a path already stored.
    #[error("duplicate path in archive: {path}")]
    DuplicatePath {
        /// The colliding stored path.
        path: String,
    },

    /// No stored path matched the removal selection.
    #[error("no matching paths found to remove")]
    NothingToRemove,

    /// The archive ends with a solid block, which must stay terminal;
    /// nothing can be appended after it.
    #[error("cannot append to '{path}': archive ends with a solid block")]
    SolidTailAppend {
        /// The archive path.
        path: String,
    },

    /// A stored path was requested but is not present in the archive.
    #[error("entry not found: {path}")]
    EntryNotFound {
        /// The path that was not found.
        path: String,
    },

    /// A compression level outside 0-9 was requested.
    #[error("invalid compression level {level}: must be 0-9")]
    InvalidLevel {
        /// The rejected level.
        level: u32,
    },

    /// A path cannot be stored in the container.
    ///
    /// Stored paths must be non-empty, free of NUL bytes, and at most
    /// [`MAX_PATH_LENGTH`][crate::archive_path::MAX_PATH_LENGTH] bytes.
    #[error("invalid archive path: {0}")]
    InvalidArchivePath(String),

    /// A worker thread died before delivering its result.
    #[error("worker task aborted")]
    WorkerLost,
}

impl Error {
    /// Returns `true` if this is a data corruption error.
    ///
    /// Corruption errors indicate the container itself is damaged, as
    /// opposed to bad inputs or policy violations.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Error::CorruptHeader { .. }
                | Error::CorruptStream { .. }
                | Error::DecompressionFailed { .. }
                | Error::SizeMismatch { .. }
        )
    }

    /// Returns `true` if this error comes from the codec or digest
    /// registries rather than the data itself.
    pub fn is_registry_error(&self) -> bool {
        matches!(
            self,
            Error::UnknownCodec { .. }
                | Error::UnknownDigest { .. }
                | Error::UnsupportedCodec { .. }
        )
    }

    /// Returns `true` if this error is a semantic policy rejection that
    /// `ignore_errors` can downgrade to a warning.
    pub fn is_policy_error(&self) -> bool {
        matches!(
            self,
            Error::DuplicatePath { .. } | Error::NothingToRemove | Error::PathNotFound { .. }
        )
    }

    /// Returns the byte offset associated with this error, if any.
    pub fn offset(&self) -> Option<u64> {
        match self {
            Error::CorruptHeader { offset, .. } => Some(*offset),
            Error::CorruptStream { offset, .. } => Some(*offset),
            _ => None,
        }
    }

    /// Creates a `CorruptHeader` error.
    pub fn corrupt_header(offset: u64, reason: impl Into<String>) -> Self {
        Error::CorruptHeader {
            offset,
            reason: reason.into(),
        }
    }

    /// Creates a `CorruptStream` error.
    pub fn corrupt_stream(offset: u64, reason: impl Into<String>) -> Self {
        Error::CorruptStream {
            offset,
            reason: reason.into(),
        }
    }
}

/// A specialized Result type for PRZM operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_from() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn test_corrupt_header_display() {
        let err = Error::corrupt_header(0x1234, "truncated path field");
        assert!(err.to_string().contains("0x1234"));
        assert!(err.to_string().contains("truncated path field"));
        assert!(err.is_corruption());
        assert_eq!(err.offset(), Some(0x1234));
    }

    #[test]
    fn test_corrupt_stream_display() {
        let err = Error::corrupt_stream(99, "stray trailing bytes");
        assert!(err.to_string().contains("0x63"));
        assert!(err.is_corruption());
    }

    #[test]
    fn test_unknown_ids() {
        let err = Error::UnknownCodec { id: 0x2a };
        assert!(err.to_string().contains("0x2a"));
        assert!(err.is_registry_error());

        let err = Error::UnknownDigest { id: 0xff };
        assert!(err.to_string().contains("0xff"));
        assert!(err.is_registry_error());
    }

    #[test]
    fn test_size_mismatch_display() {
        let err = Error::SizeMismatch {
            path: "a/b.txt".into(),
            expected: 100,
            actual: 90,
        };
        let msg = err.to_string();
        assert!(msg.contains("a/b.txt"));
        assert!(msg.contains("100"));
        assert!(msg.contains("90"));
        assert!(err.is_corruption());
    }

    #[test]
    fn test_policy_errors() {
        assert!(Error::DuplicatePath { path: "x".into() }.is_policy_error());
        assert!(Error::NothingToRemove.is_policy_error());
        assert!(!Error::UnsupportedVersion { version: 2 }.is_policy_error());
    }

    #[test]
    fn test_invalid_level_display() {
        let err = Error::InvalidLevel { level: 15 };
        assert_eq!(err.to_string(), "invalid compression level 15: must be 0-9");
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
