//! LZ4 codec (block format with prepended size).
//!
//! `lz4_flex` exposes no compression level; the archive level byte is
//! recorded but does not affect the stream.

use crate::{Error, Result};

pub(crate) fn compress(data: &[u8]) -> Result<Vec<u8>> {
    Ok(lz4_flex::compress_prepend_size(data))
}

pub(crate) fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    lz4_flex::decompress_size_prepended(data).map_err(|e| Error::DecompressionFailed {
        codec: "lz4",
        reason: e.to_string(),
    })
}
