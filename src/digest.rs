//! Digest registry for entry integrity fingerprints.
//!
//! Every entry may carry a hex-encoded digest of its original
//! (uncompressed) bytes. The discriminator byte is part of the on-disk
//! format, so the numeric ids here are frozen: ids 0-14 are the original
//! table, 15-19 are later extensions occupying distinct slots.
//!
//! Digests can be computed over an in-memory buffer or streamed from a
//! reader; the writer hashes the buffer it is about to compress, while the
//! extractor re-hashes the file it just wrote.

use std::io::{self, Read};

use blake2::{Blake2b512, Blake2s256};
use md5::Md5;
use ripemd::Ripemd160;
use sha1::Sha1;
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};
use sha3::{Sha3_224, Sha3_256, Sha3_384, Sha3_512};
use whirlpool::Whirlpool;

use crate::{Error, Result};

/// Buffer size for streaming digest computation (8 KiB).
const READ_BUFFER_SIZE: usize = 8192;

/// The digest algorithm recorded in an entry header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum DigestKind {
    /// No digest; the entry's `digest` field is empty.
    #[default]
    None,
    /// MD5 (legacy; collision-broken, kept for interoperability).
    Md5,
    /// SHA-1 (legacy).
    Sha1,
    /// SHA-256.
    Sha256,
    /// SHA-512.
    Sha512,
    /// SHA-384.
    Sha384,
    /// BLAKE2b-512.
    Blake2b,
    /// BLAKE2s-256.
    Blake2s,
    /// SHA3-256.
    Sha3_256,
    /// SHA3-512.
    Sha3_512,
    /// RIPEMD-160.
    Ripemd160,
    /// Whirlpool.
    Whirlpool,
    /// SHA-224.
    Sha224,
    /// SHA3-224.
    Sha3_224,
    /// SHA3-384.
    Sha3_384,
    /// BLAKE3.
    Blake3,
    /// XXH3 (64-bit, non-cryptographic).
    Xxh3,
    /// XXH128 (non-cryptographic).
    Xxh128,
    /// CRC-32 (IEEE).
    Crc32,
    /// CRC-64 (ECMA).
    Crc64,
}

impl DigestKind {
    /// All supported digest kinds, in id order.
    pub const ALL: &'static [DigestKind] = &[
        DigestKind::None,
        DigestKind::Md5,
        DigestKind::Sha1,
        DigestKind::Sha256,
        DigestKind::Sha512,
        DigestKind::Sha384,
        DigestKind::Blake2b,
        DigestKind::Blake2s,
        DigestKind::Sha3_256,
        DigestKind::Sha3_512,
        DigestKind::Ripemd160,
        DigestKind::Whirlpool,
        DigestKind::Sha224,
        DigestKind::Sha3_224,
        DigestKind::Sha3_384,
        DigestKind::Blake3,
        DigestKind::Xxh3,
        DigestKind::Xxh128,
        DigestKind::Crc32,
        DigestKind::Crc64,
    ];

    /// Returns the stable on-disk id for this digest.
    pub fn id(self) -> u8 {
        match self {
            DigestKind::None => 0,
            DigestKind::Md5 => 1,
            DigestKind::Sha1 => 2,
            DigestKind::Sha256 => 3,
            DigestKind::Sha512 => 4,
            DigestKind::Sha384 => 5,
            DigestKind::Blake2b => 6,
            DigestKind::Blake2s => 7,
            DigestKind::Sha3_256 => 8,
            DigestKind::Sha3_512 => 9,
            DigestKind::Ripemd160 => 10,
            DigestKind::Whirlpool => 11,
            DigestKind::Sha224 => 12,
            DigestKind::Sha3_224 => 13,
            DigestKind::Sha3_384 => 14,
            DigestKind::Blake3 => 15,
            DigestKind::Xxh3 => 16,
            DigestKind::Xxh128 => 17,
            DigestKind::Crc32 => 18,
            DigestKind::Crc64 => 19,
        }
    }

    /// Resolves an on-disk id to a digest kind.
    pub fn from_id(id: u8) -> Result<Self> {
        DigestKind::ALL
            .iter()
            .copied()
            .find(|k| k.id() == id)
            .ok_or(Error::UnknownDigest { id })
    }

    /// Returns the canonical lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            DigestKind::None => "none",
            DigestKind::Md5 => "md5",
            DigestKind::Sha1 => "sha1",
            DigestKind::Sha256 => "sha256",
            DigestKind::Sha512 => "sha512",
            DigestKind::Sha384 => "sha384",
            DigestKind::Blake2b => "blake2b",
            DigestKind::Blake2s => "blake2s",
            DigestKind::Sha3_256 => "sha3-256",
            DigestKind::Sha3_512 => "sha3-512",
            DigestKind::Ripemd160 => "ripemd160",
            DigestKind::Whirlpool => "whirlpool",
            DigestKind::Sha224 => "sha224",
            DigestKind::Sha3_224 => "sha3-224",
            DigestKind::Sha3_384 => "sha3-384",
            DigestKind::Blake3 => "blake3",
            DigestKind::Xxh3 => "xxh3",
            DigestKind::Xxh128 => "xxh128",
            DigestKind::Crc32 => "crc32",
            DigestKind::Crc64 => "crc64",
        }
    }

    /// Parses a digest name, as accepted on a command line.
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.to_lowercase();
        DigestKind::ALL.iter().copied().find(|k| k.name() == lower)
    }

    /// Length in characters of the hex digest this kind produces, or 0 for
    /// [`DigestKind::None`].
    pub fn hex_len(self) -> usize {
        match self {
            DigestKind::None => 0,
            DigestKind::Md5 => 32,
            DigestKind::Sha1 => 40,
            DigestKind::Sha256 => 64,
            DigestKind::Sha512 => 128,
            DigestKind::Sha384 => 96,
            DigestKind::Blake2b => 128,
            DigestKind::Blake2s => 64,
            DigestKind::Sha3_256 => 64,
            DigestKind::Sha3_512 => 128,
            DigestKind::Ripemd160 => 40,
            DigestKind::Whirlpool => 128,
            DigestKind::Sha224 => 56,
            DigestKind::Sha3_224 => 56,
            DigestKind::Sha3_384 => 96,
            DigestKind::Blake3 => 64,
            DigestKind::Xxh3 => 16,
            DigestKind::Xxh128 => 32,
            DigestKind::Crc32 => 8,
            DigestKind::Crc64 => 16,
        }
    }

    /// Computes the lowercase hex digest of a byte buffer.
    ///
    /// Returns an empty string for [`DigestKind::None`].
    pub fn digest_bytes(self, data: &[u8]) -> String {
        match self {
            DigestKind::None => String::new(),
            DigestKind::Md5 => hash_bytes::<Md5>(data),
            DigestKind::Sha1 => hash_bytes::<Sha1>(data),
            DigestKind::Sha256 => hash_bytes::<Sha256>(data),
            DigestKind::Sha512 => hash_bytes::<Sha512>(data),
            DigestKind::Sha384 => hash_bytes::<Sha384>(data),
            DigestKind::Blake2b => hash_bytes::<Blake2b512>(data),
            DigestKind::Blake2s => hash_bytes::<Blake2s256>(data),
            DigestKind::Sha3_256 => hash_bytes::<Sha3_256>(data),
            DigestKind::Sha3_512 => hash_bytes::<Sha3_512>(data),
            DigestKind::Ripemd160 => hash_bytes::<Ripemd160>(data),
            DigestKind::Whirlpool => hash_bytes::<Whirlpool>(data),
            DigestKind::Sha224 => hash_bytes::<Sha224>(data),
            DigestKind::Sha3_224 => hash_bytes::<Sha3_224>(data),
            DigestKind::Sha3_384 => hash_bytes::<Sha3_384>(data),
            DigestKind::Blake3 => blake3::hash(data).to_hex().to_string(),
            DigestKind::Xxh3 => format!("{:016x}", xxhash_rust::xxh3::xxh3_64(data)),
            DigestKind::Xxh128 => format!("{:032x}", xxhash_rust::xxh3::xxh3_128(data)),
            DigestKind::Crc32 => format!("{:08x}", crc32fast::hash(data)),
            DigestKind::Crc64 => {
                let mut digest = crc64fast::Digest::new();
                digest.write(data);
                format!("{:016x}", digest.sum64())
            }
        }
    }

    /// Computes the lowercase hex digest of everything a reader yields.
    pub fn digest_reader<R: Read>(self, reader: &mut R) -> io::Result<String> {
        match self {
            DigestKind::None => Ok(String::new()),
            DigestKind::Md5 => hash_reader::<Md5, _>(reader),
            DigestKind::Sha1 => hash_reader::<Sha1, _>(reader),
            DigestKind::Sha256 => hash_reader::<Sha256, _>(reader),
            DigestKind::Sha512 => hash_reader::<Sha512, _>(reader),
            DigestKind::Sha384 => hash_reader::<Sha384, _>(reader),
            DigestKind::Blake2b => hash_reader::<Blake2b512, _>(reader),
            DigestKind::Blake2s => hash_reader::<Blake2s256, _>(reader),
            DigestKind::Sha3_256 => hash_reader::<Sha3_256, _>(reader),
            DigestKind::Sha3_512 => hash_reader::<Sha3_512, _>(reader),
            DigestKind::Ripemd160 => hash_reader::<Ripemd160, _>(reader),
            DigestKind::Whirlpool => hash_reader::<Whirlpool, _>(reader),
            DigestKind::Sha224 => hash_reader::<Sha224, _>(reader),
            DigestKind::Sha3_224 => hash_reader::<Sha3_224, _>(reader),
            DigestKind::Sha3_384 => hash_reader::<Sha3_384, _>(reader),
            DigestKind::Blake3 => {
                let mut hasher = blake3::Hasher::new();
                stream_into(reader, |chunk| {
                    hasher.update(chunk);
                })?;
                Ok(hasher.finalize().to_hex().to_string())
            }
            DigestKind::Xxh3 => {
                let mut hasher = xxhash_rust::xxh3::Xxh3::new();
                stream_into(reader, |chunk| {
                    hasher.update(chunk);
                })?;
                Ok(format!("{:016x}", hasher.digest()))
            }
            DigestKind::Xxh128 => {
                let mut hasher = xxhash_rust::xxh3::Xxh3::new();
                stream_into(reader, |chunk| {
                    hasher.update(chunk);
                })?;
                Ok(format!("{:032x}", hasher.digest128()))
            }
            DigestKind::Crc32 => {
                let mut hasher = crc32fast::Hasher::new();
                stream_into(reader, |chunk| hasher.update(chunk))?;
                Ok(format!("{:08x}", hasher.finalize()))
            }
            DigestKind::Crc64 => {
                let mut digest = crc64fast::Digest::new();
                stream_into(reader, |chunk| digest.write(chunk))?;
                Ok(format!("{:016x}", digest.sum64()))
            }
        }
    }

    /// Computes the lowercase hex digest of a file's contents.
    pub fn digest_file(self, path: &std::path::Path) -> io::Result<String> {
        if self == DigestKind::None {
            return Ok(String::new());
        }
        let mut file = std::fs::File::open(path)?;
        self.digest_reader(&mut file)
    }
}

impl std::fmt::Display for DigestKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

fn hash_bytes<D: Digest>(data: &[u8]) -> String {
    hex::encode(D::digest(data))
}

fn hash_reader<D: Digest, R: Read>(reader: &mut R) -> io::Result<String> {
    let mut hasher = D::new();
    stream_into(reader, |chunk| hasher.update(chunk))?;
    Ok(hex::encode(hasher.finalize()))
}

fn stream_into<R: Read>(reader: &mut R, mut sink: impl FnMut(&[u8])) -> io::Result<()> {
    let mut buffer = [0u8; READ_BUFFER_SIZE];
    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            return Ok(());
        }
        sink(&buffer[..n]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_id_round_trip() {
        for &kind in DigestKind::ALL {
            assert_eq!(DigestKind::from_id(kind.id()).unwrap(), kind);
        }
    }

    #[test]
    fn test_ids_are_frozen() {
        assert_eq!(DigestKind::None.id(), 0);
        assert_eq!(DigestKind::Md5.id(), 1);
        assert_eq!(DigestKind::Sha1.id(), 2);
        assert_eq!(DigestKind::Sha256.id(), 3);
        assert_eq!(DigestKind::Sha512.id(), 4);
        assert_eq!(DigestKind::Sha384.id(), 5);
        assert_eq!(DigestKind::Sha3_384.id(), 14);
        assert_eq!(DigestKind::Blake3.id(), 15);
        assert_eq!(DigestKind::Crc64.id(), 19);
    }

    #[test]
    fn test_unknown_id_rejected() {
        assert!(matches!(
            DigestKind::from_id(200),
            Err(Error::UnknownDigest { id: 200 })
        ));
    }

    #[test]
    fn test_from_name() {
        assert_eq!(DigestKind::from_name("sha256"), Some(DigestKind::Sha256));
        assert_eq!(DigestKind::from_name("SHA3-512"), Some(DigestKind::Sha3_512));
        assert_eq!(DigestKind::from_name("nope"), None);
    }

    #[test]
    fn test_known_vectors() {
        assert_eq!(
            DigestKind::Md5.digest_bytes(b"abc"),
            "900150983cd24fb0d6963f7d28e17f72"
        );
        assert_eq!(
            DigestKind::Sha1.digest_bytes(b"abc"),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
        assert_eq!(
            DigestKind::Sha256.digest_bytes(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(DigestKind::Crc32.digest_bytes(b"123456789"), "cbf43926");
    }

    #[test]
    fn test_none_is_empty() {
        assert_eq!(DigestKind::None.digest_bytes(b"whatever"), "");
        let mut r = Cursor::new(b"whatever".to_vec());
        assert_eq!(DigestKind::None.digest_reader(&mut r).unwrap(), "");
    }

    #[test]
    fn test_hex_len_matches_output() {
        for &kind in DigestKind::ALL {
            let hex = kind.digest_bytes(b"sample input");
            assert_eq!(hex.len(), kind.hex_len(), "length mismatch for {kind}");
            assert!(hex.chars().all(|c| c.is_ascii_hexdigit() || hex.is_empty()));
        }
    }

    #[test]
    fn test_deterministic_and_distinct() {
        for &kind in DigestKind::ALL {
            if kind == DigestKind::None {
                continue;
            }
            let a = kind.digest_bytes(b"input one");
            let b = kind.digest_bytes(b"input one");
            let c = kind.digest_bytes(b"input two");
            assert_eq!(a, b, "{kind} must be deterministic");
            assert_ne!(a, c, "{kind} must separate different inputs");
        }
    }

    #[test]
    fn test_reader_matches_bytes() {
        let data = vec![7u8; 100_000];
        for &kind in DigestKind::ALL {
            let from_bytes = kind.digest_bytes(&data);
            let from_reader = kind.digest_reader(&mut Cursor::new(&data)).unwrap();
            assert_eq!(from_bytes, from_reader, "mismatch for {kind}");
        }
    }

    #[test]
    fn test_digest_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        std::fs::write(&path, b"file contents").unwrap();

        let from_file = DigestKind::Sha256.digest_file(&path).unwrap();
        let from_bytes = DigestKind::Sha256.digest_bytes(b"file contents");
        assert_eq!(from_file, from_bytes);
    }

    #[test]
    fn test_empty_input() {
        // Every algorithm must produce its well-defined empty-input digest.
        assert_eq!(
            DigestKind::Sha256.digest_bytes(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(DigestKind::Crc32.digest_bytes(b""), "00000000");
    }
}
