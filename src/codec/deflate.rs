//! Zlib-framed deflate, serving both the `zlib` and `gzip` wire ids.

use std::io::Read;

use flate2::Compression;
use flate2::read::{ZlibDecoder, ZlibEncoder};

use crate::{Error, Result};

pub(crate) fn compress(data: &[u8], level: u8) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(data, Compression::new(u32::from(level.min(9))));
    let mut out = Vec::new();
    encoder
        .read_to_end(&mut out)
        .map_err(|e| Error::CompressionFailed {
            codec: "zlib",
            reason: e.to_string(),
        })?;
    Ok(out)
}

pub(crate) fn decompress(data: &[u8], size_hint: usize) -> Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(data);
    let mut out = Vec::with_capacity(size_hint);
    decoder
        .read_to_end(&mut out)
        .map_err(|e| Error::DecompressionFailed {
            codec: "zlib",
            reason: e.to_string(),
        })?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let data = b"zlib round trip through the deflate payload codec".repeat(20);
        let packed = compress(&data, 9).unwrap();
        assert!(packed.len() < data.len());
        assert_eq!(decompress(&packed, data.len()).unwrap(), data);
    }

    #[test]
    fn test_level_zero_still_framed() {
        // Level 0 emits stored deflate blocks, which still round trip.
        let data = b"no compression at level zero";
        let packed = compress(data, 0).unwrap();
        assert_eq!(decompress(&packed, data.len()).unwrap(), data);
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(decompress(&[0xDE, 0xAD, 0xBE, 0xEF], 16).is_err());
    }
}
