//! Header framing for the two entry shapes.
//!
//! Lone entries carry a complete self-describing header ahead of their
//! payload. Solid blocks carry a packed metadata region describing every
//! member; codec and level live on the block, so member records omit them
//! along with the compressed size.

use std::io::Read;

use crate::archive_path::MAX_PATH_LENGTH;
use crate::codec::Codec;
use crate::digest::DigestKind;
use crate::properties::FileProperties;
use crate::{Error, Result};

/// Upper bound for the digest field; the largest registered digest is 128
/// hex characters.
const MAX_DIGEST_LENGTH: usize = 512;

/// The framed header of a lone entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoneHeader {
    /// Stored path.
    pub path: String,
    /// Payload codec.
    pub codec: Codec,
    /// Compression level (0-9).
    pub level: u8,
    /// Digest algorithm.
    pub digest: DigestKind,
    /// Lowercase hex digest of the original bytes.
    pub digest_hex: String,
    /// Original file size.
    pub uncompressed_size: u64,
    /// Payload size as stored.
    pub compressed_size: u64,
    /// Host attributes.
    pub properties: FileProperties,
}

impl LoneHeader {
    /// Serializes the header; deterministic for a given descriptor.
    pub fn encode(&self) -> Result<Vec<u8>> {
        crate::archive_path::validate(&self.path)?;

        let path = self.path.as_bytes();
        let digest = self.digest_hex.as_bytes();
        let mut out = Vec::with_capacity(path.len() + digest.len() + 64);

        out.extend_from_slice(&(path.len() as u32).to_le_bytes());
        out.extend_from_slice(path);
        out.push(self.codec.id());
        out.push(self.level);
        out.push(self.digest.id());
        out.extend_from_slice(&(digest.len() as u16).to_le_bytes());
        out.extend_from_slice(digest);
        out.extend_from_slice(&self.uncompressed_size.to_le_bytes());
        out.extend_from_slice(&self.compressed_size.to_le_bytes());
        encode_properties(&mut out, &self.properties);
        Ok(out)
    }

    /// Parses a header whose leading `path_len` field was already consumed
    /// by the block-boundary peek. `base_offset` addresses that field and
    /// is used for error attribution only.
    pub fn decode_after_path_len<R: Read>(
        reader: &mut R,
        path_len: u32,
        base_offset: u64,
    ) -> Result<Self> {
        if path_len as usize > MAX_PATH_LENGTH {
            return Err(Error::corrupt_stream(
                base_offset,
                format!("path length {path_len} exceeds the format limit"),
            ));
        }

        let path = read_string(reader, path_len as usize, base_offset, "path")?;
        let codec = Codec::from_id(read_u8(reader, base_offset, "codec id")?)?;
        let level = read_u8(reader, base_offset, "level")?;
        let digest = DigestKind::from_id(read_u8(reader, base_offset, "digest id")?)?;

        let digest_len = read_u16(reader, base_offset, "digest length")?;
        if digest_len as usize > MAX_DIGEST_LENGTH {
            return Err(Error::corrupt_header(
                base_offset,
                format!("digest length {digest_len} exceeds the format limit"),
            ));
        }
        let digest_hex = read_string(reader, digest_len as usize, base_offset, "digest")?;

        let uncompressed_size = read_u64(reader, base_offset, "uncompressed size")?;
        let compressed_size = read_u64(reader, base_offset, "compressed size")?;
        let properties = decode_properties(reader, base_offset)?;

        Ok(Self {
            path,
            codec,
            level,
            digest,
            digest_hex,
            uncompressed_size,
            compressed_size,
            properties,
        })
    }

    /// Size of the encoded header in bytes.
    pub fn encoded_len(&self) -> u64 {
        // path_len + path + codec + level + digest id + digest_len +
        // digest + sizes + times + permissions + ownership
        4 + self.path.len() as u64
            + 3
            + 2
            + self.digest_hex.len() as u64
            + 16
            + 16
            + 12
    }
}

/// One member record inside a solid block's metadata region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolidMemberMeta {
    /// Stored path.
    pub path: String,
    /// Digest algorithm.
    pub digest: DigestKind,
    /// Lowercase hex digest of the original bytes.
    pub digest_hex: String,
    /// Original file size.
    pub uncompressed_size: u64,
    /// Host attributes.
    pub properties: FileProperties,
}

impl SolidMemberMeta {
    /// Serializes one member record.
    pub fn encode(&self) -> Result<Vec<u8>> {
        crate::archive_path::validate(&self.path)?;

        let path = self.path.as_bytes();
        let digest = self.digest_hex.as_bytes();
        let mut out = Vec::with_capacity(path.len() + digest.len() + 48);

        out.extend_from_slice(&(path.len() as u32).to_le_bytes());
        out.extend_from_slice(path);
        out.push(self.digest.id());
        out.extend_from_slice(&(digest.len() as u16).to_le_bytes());
        out.extend_from_slice(digest);
        out.extend_from_slice(&self.uncompressed_size.to_le_bytes());
        encode_properties(&mut out, &self.properties);
        Ok(out)
    }

    /// Parses the packed member records filling a solid block's metadata
    /// region. The region must be exactly consumed.
    pub fn decode_all(metadata: &[u8], base_offset: u64) -> Result<Vec<Self>> {
        let mut cursor = std::io::Cursor::new(metadata);
        let mut members = Vec::new();

        while (cursor.position() as usize) < metadata.len() {
            let record_offset = base_offset + cursor.position();

            let path_len = read_u32(&mut cursor, record_offset, "member path length")?;
            if path_len as usize > MAX_PATH_LENGTH {
                return Err(Error::corrupt_header(
                    record_offset,
                    format!("member path length {path_len} exceeds the format limit"),
                ));
            }
            let path = read_string(&mut cursor, path_len as usize, record_offset, "member path")?;
            let digest = DigestKind::from_id(read_u8(&mut cursor, record_offset, "digest id")?)?;
            let digest_len = read_u16(&mut cursor, record_offset, "digest length")?;
            if digest_len as usize > MAX_DIGEST_LENGTH {
                return Err(Error::corrupt_header(
                    record_offset,
                    format!("digest length {digest_len} exceeds the format limit"),
                ));
            }
            let digest_hex =
                read_string(&mut cursor, digest_len as usize, record_offset, "digest")?;
            let uncompressed_size = read_u64(&mut cursor, record_offset, "uncompressed size")?;
            let properties = decode_properties(&mut cursor, record_offset)?;

            members.push(Self {
                path,
                digest,
                digest_hex,
                uncompressed_size,
                properties,
            });
        }

        Ok(members)
    }
}

fn encode_properties(out: &mut Vec<u8>, props: &FileProperties) {
    out.extend_from_slice(&props.creation_time.to_le_bytes());
    out.extend_from_slice(&props.modification_time.to_le_bytes());
    out.extend_from_slice(&props.permissions.to_le_bytes());
    out.extend_from_slice(&props.uid.to_le_bytes());
    out.extend_from_slice(&props.gid.to_le_bytes());
}

fn decode_properties<R: Read>(reader: &mut R, base_offset: u64) -> Result<FileProperties> {
    Ok(FileProperties {
        creation_time: read_u64(reader, base_offset, "creation time")?,
        modification_time: read_u64(reader, base_offset, "modification time")?,
        permissions: read_u32(reader, base_offset, "permissions")?,
        uid: read_u32(reader, base_offset, "uid")?,
        gid: read_u32(reader, base_offset, "gid")?,
    })
}

fn truncated(offset: u64, what: &str) -> Error {
    Error::corrupt_header(offset, format!("truncated {what} field"))
}

fn read_u8<R: Read>(reader: &mut R, offset: u64, what: &str) -> Result<u8> {
    let mut buf = [0u8; 1];
    reader
        .read_exact(&mut buf)
        .map_err(|_| truncated(offset, what))?;
    Ok(buf[0])
}

fn read_u16<R: Read>(reader: &mut R, offset: u64, what: &str) -> Result<u16> {
    let mut buf = [0u8; 2];
    reader
        .read_exact(&mut buf)
        .map_err(|_| truncated(offset, what))?;
    Ok(u16::from_le_bytes(buf))
}

fn read_u32<R: Read>(reader: &mut R, offset: u64, what: &str) -> Result<u32> {
    let mut buf = [0u8; 4];
    reader
        .read_exact(&mut buf)
        .map_err(|_| truncated(offset, what))?;
    Ok(u32::from_le_bytes(buf))
}

fn read_u64<R: Read>(reader: &mut R, offset: u64, what: &str) -> Result<u64> {
    let mut buf = [0u8; 8];
    reader
        .read_exact(&mut buf)
        .map_err(|_| truncated(offset, what))?;
    Ok(u64::from_le_bytes(buf))
}

fn read_string<R: Read>(reader: &mut R, len: usize, offset: u64, what: &str) -> Result<String> {
    let mut buf = vec![0u8; len];
    reader
        .read_exact(&mut buf)
        .map_err(|_| truncated(offset, what))?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample_header() -> LoneHeader {
        LoneHeader {
            path: "docs/file.txt".into(),
            codec: Codec::Zlib,
            level: 9,
            digest: DigestKind::Sha256,
            digest_hex: "ab".repeat(32),
            uncompressed_size: 1234,
            compressed_size: 567,
            properties: FileProperties {
                creation_time: 1_700_000_000,
                modification_time: 1_700_000_100,
                permissions: 0o100644,
                uid: 1000,
                gid: 1000,
            },
        }
    }

    fn decode_lone(bytes: &[u8]) -> Result<LoneHeader> {
        let mut cursor = Cursor::new(bytes);
        let path_len = read_u32(&mut cursor, 0, "path length")?;
        LoneHeader::decode_after_path_len(&mut cursor, path_len, 0)
    }

    #[test]
    fn test_lone_header_round_trip() {
        let header = sample_header();
        let bytes = header.encode().unwrap();
        assert_eq!(bytes.len() as u64, header.encoded_len());
        assert_eq!(decode_lone(&bytes).unwrap(), header);
    }

    #[test]
    fn test_lone_header_layout_is_little_endian() {
        let header = LoneHeader {
            path: "a".into(),
            codec: Codec::Zstd,
            level: 3,
            digest: DigestKind::None,
            digest_hex: String::new(),
            uncompressed_size: 0x0102,
            compressed_size: 0x0304,
            properties: FileProperties::default(),
        };
        let bytes = header.encode().unwrap();
        // path_len = 1 LE
        assert_eq!(&bytes[..4], &[1, 0, 0, 0]);
        assert_eq!(bytes[4], b'a');
        // codec zstd = 6, level 3, digest none = 0, digest_len = 0
        assert_eq!(&bytes[5..10], &[6, 3, 0, 0, 0]);
        // uncompressed 0x0102 LE
        assert_eq!(&bytes[10..12], &[0x02, 0x01]);
    }

    #[test]
    fn test_lone_header_truncated() {
        let header = sample_header();
        let bytes = header.encode().unwrap();
        let err = decode_lone(&bytes[..bytes.len() - 5]).unwrap_err();
        assert!(matches!(err, Error::CorruptHeader { .. }));
    }

    #[test]
    fn test_lone_header_unknown_codec() {
        let header = sample_header();
        let mut bytes = header.encode().unwrap();
        // codec id sits right after the path field
        bytes[4 + header.path.len()] = 99;
        let err = decode_lone(&bytes).unwrap_err();
        assert!(matches!(err, Error::UnknownCodec { id: 99 }));
    }

    #[test]
    fn test_lone_header_unknown_digest() {
        let header = sample_header();
        let mut bytes = header.encode().unwrap();
        bytes[4 + header.path.len() + 2] = 250;
        let err = decode_lone(&bytes).unwrap_err();
        assert!(matches!(err, Error::UnknownDigest { id: 250 }));
    }

    #[test]
    fn test_lone_header_rejects_oversized_path_len() {
        let mut cursor = Cursor::new(vec![0u8; 16]);
        let err =
            LoneHeader::decode_after_path_len(&mut cursor, (MAX_PATH_LENGTH as u32) + 1, 7)
                .unwrap_err();
        assert!(matches!(err, Error::CorruptStream { offset: 7, .. }));
    }

    #[test]
    fn test_member_round_trip() {
        let member = SolidMemberMeta {
            path: "sub/naïve.bin".into(),
            digest: DigestKind::Sha1,
            digest_hex: "cd".repeat(20),
            uncompressed_size: 42,
            properties: FileProperties {
                creation_time: 10,
                modification_time: 20,
                permissions: 0o100600,
                uid: 1,
                gid: 2,
            },
        };
        let other = SolidMemberMeta {
            path: "zero.dat".into(),
            digest: DigestKind::Sha1,
            digest_hex: "ef".repeat(20),
            uncompressed_size: 0,
            properties: FileProperties::default(),
        };

        let mut region = member.encode().unwrap();
        region.extend_from_slice(&other.encode().unwrap());

        let parsed = SolidMemberMeta::decode_all(&region, 100).unwrap();
        assert_eq!(parsed, vec![member, other]);
    }

    #[test]
    fn test_member_region_truncated() {
        let member = SolidMemberMeta {
            path: "x".into(),
            digest: DigestKind::None,
            digest_hex: String::new(),
            uncompressed_size: 5,
            properties: FileProperties::default(),
        };
        let region = member.encode().unwrap();
        let err = SolidMemberMeta::decode_all(&region[..region.len() - 1], 0).unwrap_err();
        assert!(matches!(err, Error::CorruptHeader { .. }));
    }

    #[test]
    fn test_empty_member_region() {
        assert!(SolidMemberMeta::decode_all(&[], 0).unwrap().is_empty());
    }

    #[test]
    fn test_encode_rejects_bad_path() {
        let header = LoneHeader {
            path: String::new(),
            ..sample_header()
        };
        assert!(matches!(
            header.encode(),
            Err(Error::InvalidArchivePath(_))
        ));
    }
}
