//! Snappy codec (raw block format).
//!
//! Snappy has no compression level; the archive level byte is recorded
//! but does not affect the stream.

use crate::{Error, Result};

pub(crate) fn compress(data: &[u8]) -> Result<Vec<u8>> {
    snap::raw::Encoder::new()
        .compress_vec(data)
        .map_err(|e| Error::CompressionFailed {
            codec: "snappy",
            reason: e.to_string(),
        })
}

pub(crate) fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    snap::raw::Decoder::new()
        .decompress_vec(data)
        .map_err(|e| Error::DecompressionFailed {
            codec: "snappy",
            reason: e.to_string(),
        })
}
