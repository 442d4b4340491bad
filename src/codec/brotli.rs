//! Brotli codec.

use std::io::{Read, Write};

use crate::{Error, Result};

use super::BROTLI_QUALITY_MAP;

const BROTLI_BUFFER_SIZE: usize = 4096;
const BROTLI_LG_WINDOW: u32 = 22;

pub(crate) fn compress(data: &[u8], level: u8) -> Result<Vec<u8>> {
    let quality = BROTLI_QUALITY_MAP[usize::from(level.min(9))];
    let mut out = Vec::new();
    {
        // The stream end marker is emitted when the writer drops.
        let mut writer =
            brotli::CompressorWriter::new(&mut out, BROTLI_BUFFER_SIZE, quality, BROTLI_LG_WINDOW);
        writer.write_all(data).map_err(|e| Error::CompressionFailed {
            codec: "brotli",
            reason: e.to_string(),
        })?;
    }
    Ok(out)
}

pub(crate) fn decompress(data: &[u8], size_hint: usize) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(size_hint);
    brotli::Decompressor::new(data, BROTLI_BUFFER_SIZE)
        .read_to_end(&mut out)
        .map_err(|e| Error::DecompressionFailed {
            codec: "brotli",
            reason: e.to_string(),
        })?;
    Ok(out)
}
