//! LZMA codec.
//!
//! Backed by `lzma-rs`, whose encoder takes no level parameter; the
//! archive level byte is recorded in headers but does not change the
//! encoded stream.

use crate::{Error, Result};

pub(crate) fn compress(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    lzma_rs::lzma_compress(&mut std::io::Cursor::new(data), &mut out).map_err(|e| {
        Error::CompressionFailed {
            codec: "lzma",
            reason: e.to_string(),
        }
    })?;
    Ok(out)
}

pub(crate) fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    lzma_rs::lzma_decompress(&mut std::io::Cursor::new(data), &mut out).map_err(|e| {
        Error::DecompressionFailed {
            codec: "lzma",
            reason: e.to_string(),
        }
    })?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lzma_round_trip() {
        let data = b"lzma stream with enough repetition to shrink ".repeat(40);
        let packed = compress(&data).unwrap();
        assert!(packed.len() < data.len());
        assert_eq!(decompress(&packed).unwrap(), data);
    }

    #[test]
    fn test_lzma_empty() {
        let packed = compress(b"").unwrap();
        assert!(decompress(&packed).unwrap().is_empty());
    }

    #[test]
    fn test_lzma_garbage_rejected() {
        assert!(decompress(&[0xA5; 16]).is_err());
    }
}
