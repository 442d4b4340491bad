//! Compression codec registry.
//!
//! Codecs are tagged variants dispatching to a per-variant compress and
//! decompress pair over byte buffers. The discriminator byte is part of
//! the on-disk format, so the ids here are frozen. `zlib` and `gzip` are
//! distinct wire ids sharing one payload codec (zlib-framed deflate); the
//! `lzo` and `lzma2` slots are reserved but have no backend in this build.
//!
//! Levels run 0-9 everywhere; codecs whose native scale differs map the
//! level through a fixed table, and codecs without a level knob ignore it.

#[cfg(feature = "bzip2")]
pub mod bzip2;

#[cfg(feature = "zlib")]
pub mod deflate;

#[cfg(feature = "lz4")]
pub mod lz4;

#[cfg(feature = "lzma")]
pub mod lzma;

#[cfg(feature = "snappy")]
pub mod snappy;

#[cfg(feature = "zstd")]
pub mod zstd;

#[cfg(feature = "brotli")]
pub mod brotli;

use crate::{Error, Result};

/// Maps an archive compression level (0-9) to a Zstd level (1-19).
///
/// | Input | Zstd | Characteristic |
/// |-------|------|----------------|
/// | 0-1   | 1    | Fastest        |
/// | 2-3   | 2-3  | Fast           |
/// | 4-6   | 5-9  | Balanced       |
/// | 7-8   | 12-15| High           |
/// | 9     | 19   | Maximum        |
#[cfg(feature = "zstd")]
pub(crate) const ZSTD_LEVEL_MAP: [i32; 10] = [1, 1, 2, 3, 5, 7, 9, 12, 15, 19];

/// Maps an archive compression level (0-9) to a Brotli quality (0-11).
#[cfg(feature = "brotli")]
pub(crate) const BROTLI_QUALITY_MAP: [u32; 10] = [0, 1, 2, 3, 4, 5, 6, 8, 10, 11];

/// The compression codec recorded in an entry or solid-block header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum Codec {
    /// Store: payload kept verbatim.
    #[default]
    Store,
    /// Zlib-framed deflate.
    Zlib,
    /// BZip2.
    Bzip2,
    /// LZMA.
    Lzma,
    /// Gzip wire id; shares the zlib payload codec.
    Gzip,
    /// LZ4 (block format with prepended size).
    Lz4,
    /// Zstandard.
    Zstd,
    /// Brotli.
    Brotli,
    /// Snappy (raw block format).
    Snappy,
    /// LZO: reserved wire id, no backend in this build.
    Lzo,
    /// LZMA2: reserved wire id, no backend in this build.
    Lzma2,
}

impl Codec {
    /// All codec ids known to the wire format, in id order.
    pub const ALL: &'static [Codec] = &[
        Codec::Store,
        Codec::Zlib,
        Codec::Bzip2,
        Codec::Lzma,
        Codec::Gzip,
        Codec::Lz4,
        Codec::Zstd,
        Codec::Brotli,
        Codec::Snappy,
        Codec::Lzo,
        Codec::Lzma2,
    ];

    /// Returns the stable on-disk id for this codec.
    pub fn id(self) -> u8 {
        match self {
            Codec::Store => 0,
            Codec::Zlib => 1,
            Codec::Bzip2 => 2,
            Codec::Lzma => 3,
            Codec::Gzip => 4,
            Codec::Lz4 => 5,
            Codec::Zstd => 6,
            Codec::Brotli => 7,
            Codec::Snappy => 8,
            Codec::Lzo => 9,
            Codec::Lzma2 => 10,
        }
    }

    /// Resolves an on-disk id to a codec.
    pub fn from_id(id: u8) -> Result<Self> {
        Codec::ALL
            .iter()
            .copied()
            .find(|c| c.id() == id)
            .ok_or(Error::UnknownCodec { id })
    }

    /// Returns the canonical lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            Codec::Store => "none",
            Codec::Zlib => "zlib",
            Codec::Bzip2 => "bzip2",
            Codec::Lzma => "lzma",
            Codec::Gzip => "gzip",
            Codec::Lz4 => "lz4",
            Codec::Zstd => "zstd",
            Codec::Brotli => "brotli",
            Codec::Snappy => "snappy",
            Codec::Lzo => "lzo",
            Codec::Lzma2 => "lzma2",
        }
    }

    /// Parses a codec name, as accepted on a command line.
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.to_lowercase();
        Codec::ALL.iter().copied().find(|c| c.name() == lower)
    }

    /// Compresses a buffer at the given level (0-9).
    pub fn compress(self, data: &[u8], level: u8) -> Result<Vec<u8>> {
        match self {
            Codec::Store => Ok(data.to_vec()),

            #[cfg(feature = "zlib")]
            Codec::Zlib | Codec::Gzip => deflate::compress(data, level),

            #[cfg(feature = "bzip2")]
            Codec::Bzip2 => bzip2::compress(data, level),

            #[cfg(feature = "lzma")]
            Codec::Lzma => lzma::compress(data),

            #[cfg(feature = "lz4")]
            Codec::Lz4 => lz4::compress(data),

            #[cfg(feature = "zstd")]
            Codec::Zstd => zstd::compress(data, level),

            #[cfg(feature = "brotli")]
            Codec::Brotli => brotli::compress(data, level),

            #[cfg(feature = "snappy")]
            Codec::Snappy => snappy::compress(data),

            _ => Err(Error::UnsupportedCodec { codec: self.name() }),
        }
    }

    /// Decompresses a buffer. `size_hint` is the expected uncompressed
    /// size and is used only as an allocation hint; callers verify the
    /// actual length against the entry descriptor.
    pub fn decompress(self, data: &[u8], size_hint: usize) -> Result<Vec<u8>> {
        match self {
            Codec::Store => Ok(data.to_vec()),

            #[cfg(feature = "zlib")]
            Codec::Zlib | Codec::Gzip => deflate::decompress(data, size_hint),

            #[cfg(feature = "bzip2")]
            Codec::Bzip2 => bzip2::decompress(data, size_hint),

            #[cfg(feature = "lzma")]
            Codec::Lzma => lzma::decompress(data),

            #[cfg(feature = "lz4")]
            Codec::Lz4 => lz4::decompress(data),

            #[cfg(feature = "zstd")]
            Codec::Zstd => zstd::decompress(data, size_hint),

            #[cfg(feature = "brotli")]
            Codec::Brotli => brotli::decompress(data, size_hint),

            #[cfg(feature = "snappy")]
            Codec::Snappy => snappy::decompress(data),

            _ => Err(Error::UnsupportedCodec { codec: self.name() }),
        }
    }

    /// Returns `true` if this build can compress and decompress with this
    /// codec.
    pub fn is_supported(self) -> bool {
        match self {
            Codec::Store => true,
            Codec::Lzo | Codec::Lzma2 => false,
            #[cfg(feature = "zlib")]
            Codec::Zlib | Codec::Gzip => true,
            #[cfg(feature = "bzip2")]
            Codec::Bzip2 => true,
            #[cfg(feature = "lzma")]
            Codec::Lzma => true,
            #[cfg(feature = "lz4")]
            Codec::Lz4 => true,
            #[cfg(feature = "zstd")]
            Codec::Zstd => true,
            #[cfg(feature = "brotli")]
            Codec::Brotli => true,
            #[cfg(feature = "snappy")]
            Codec::Snappy => true,
            #[allow(unreachable_patterns)]
            _ => false,
        }
    }
}

impl std::fmt::Display for Codec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
