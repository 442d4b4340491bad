//! In-memory entry descriptors.
//!
//! A descriptor records everything the reader resolved about one archived
//! file: identity, sizes, codec/digest tags, host attributes, and where
//! its bytes live. Descriptors are immutable once produced; the remover
//! rewrites the container rather than patching them in place.

use crate::codec::Codec;
use crate::digest::DigestKind;
use crate::properties::FileProperties;

/// Where an entry's payload lives inside the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A self-contained block: one framed header followed by one payload,
    /// independently decompressible.
    Lone,
    /// A member of a solid block, sharing that block's compressed payload
    /// with its siblings.
    SolidMember {
        /// Index of the owning solid block, in archive order.
        block_id: usize,
    },
}

impl EntryKind {
    /// Returns `true` for members of solid blocks.
    pub fn is_solid(self) -> bool {
        matches!(self, EntryKind::SolidMember { .. })
    }
}

/// The descriptor of one archived file.
///
/// Offsets mean different things for the two entry shapes:
///
/// * **Lone**: `header_offset` addresses the entry's framed header in the
///   file and `data_offset` its compressed payload in the file.
/// * **Solid member**: `header_offset` addresses the owning block's
///   compressed payload in the file, and `data_offset` is the member's
///   position *within the decompressed block*; `compressed_size` is the
///   whole block's payload length, shared by every sibling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Stored path, forward-slash separated.
    pub path: String,
    /// Size of the original file in bytes.
    pub uncompressed_size: u64,
    /// Size of the compressed payload in bytes (block payload for solid
    /// members).
    pub compressed_size: u64,
    /// Codec used for the payload. Solid members inherit the block codec.
    pub codec: Codec,
    /// Compression level recorded at write time (0-9).
    pub level: u8,
    /// Digest algorithm for `digest_hex`.
    pub digest: DigestKind,
    /// Lowercase hex digest of the original bytes; empty when `digest` is
    /// [`DigestKind::None`].
    pub digest_hex: String,
    /// Host attributes captured at write time.
    pub properties: FileProperties,
    /// See the type-level documentation for shape-dependent meaning.
    pub header_offset: u64,
    /// See the type-level documentation for shape-dependent meaning.
    pub data_offset: u64,
    /// Whether the entry is lone or part of a solid block.
    pub kind: EntryKind,
}

impl Entry {
    /// Returns `true` if this entry is a member of a solid block.
    pub fn is_solid_member(&self) -> bool {
        self.kind.is_solid()
    }

    /// Returns `true` if this entry carries a digest to verify against.
    pub fn has_digest(&self) -> bool {
        self.digest != DigestKind::None
    }

    /// Compression ratio of this entry (compressed / uncompressed), or
    /// 1.0 for empty files. Solid members report the whole block's
    /// payload against their own size, so the value is only meaningful
    /// for lone entries.
    pub fn ratio(&self) -> f64 {
        if self.uncompressed_size == 0 {
            1.0
        } else {
            self.compressed_size as f64 / self.uncompressed_size as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_entry() -> Entry {
        Entry {
            path: "dir/file.txt".into(),
            uncompressed_size: 1000,
            compressed_size: 400,
            codec: Codec::Zstd,
            level: 3,
            digest: DigestKind::Sha256,
            digest_hex: "ab".repeat(32),
            properties: FileProperties::default(),
            header_offset: 7,
            data_offset: 64,
            kind: EntryKind::Lone,
        }
    }

    #[test]
    fn test_kind_queries() {
        let lone = sample_entry();
        assert!(!lone.is_solid_member());

        let member = Entry {
            kind: EntryKind::SolidMember { block_id: 2 },
            ..sample_entry()
        };
        assert!(member.is_solid_member());
        assert!(matches!(
            member.kind,
            EntryKind::SolidMember { block_id: 2 }
        ));
    }

    #[test]
    fn test_has_digest() {
        let entry = sample_entry();
        assert!(entry.has_digest());

        let plain = Entry {
            digest: DigestKind::None,
            digest_hex: String::new(),
            ..sample_entry()
        };
        assert!(!plain.has_digest());
    }

    #[test]
    fn test_ratio() {
        let entry = sample_entry();
        assert!((entry.ratio() - 0.4).abs() < f64::EPSILON);

        let empty = Entry {
            uncompressed_size: 0,
            compressed_size: 0,
            ..sample_entry()
        };
        assert!((empty.ratio() - 1.0).abs() < f64::EPSILON);
    }
}
