//! BZip2 codec.

use std::io::Read;

use bzip2::Compression;
use bzip2::read::{BzDecoder, BzEncoder};

use crate::{Error, Result};

pub(crate) fn compress(data: &[u8], level: u8) -> Result<Vec<u8>> {
    // BZip2 block sizes run 1-9; level 0 degrades to the smallest block.
    let level = u32::from(level.clamp(1, 9));
    let mut encoder = BzEncoder::new(data, Compression::new(level));
    let mut out = Vec::new();
    encoder
        .read_to_end(&mut out)
        .map_err(|e| Error::CompressionFailed {
            codec: "bzip2",
            reason: e.to_string(),
        })?;
    Ok(out)
}

pub(crate) fn decompress(data: &[u8], size_hint: usize) -> Result<Vec<u8>> {
    let mut decoder = BzDecoder::new(data);
    let mut out = Vec::with_capacity(size_hint);
    decoder
        .read_to_end(&mut out)
        .map_err(|e| Error::DecompressionFailed {
            codec: "bzip2",
            reason: e.to_string(),
        })?;
    Ok(out)
}
