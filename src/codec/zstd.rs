//! Zstandard codec.

use crate::{Error, Result};

use super::ZSTD_LEVEL_MAP;

pub(crate) fn compress(data: &[u8], level: u8) -> Result<Vec<u8>> {
    let zstd_level = ZSTD_LEVEL_MAP[usize::from(level.min(9))];
    zstd::encode_all(data, zstd_level).map_err(|e| Error::CompressionFailed {
        codec: "zstd",
        reason: e.to_string(),
    })
}

pub(crate) fn decompress(data: &[u8], _size_hint: usize) -> Result<Vec<u8>> {
    zstd::decode_all(data).map_err(|e| Error::DecompressionFailed {
        codec: "zstd",
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let data = b"zstandard balances ratio and speed ".repeat(60);
        let packed = compress(&data, 3).unwrap();
        assert!(packed.len() < data.len());
        assert_eq!(decompress(&packed, data.len()).unwrap(), data);
    }

    #[test]
    fn test_level_map_bounds() {
        assert_eq!(ZSTD_LEVEL_MAP[0], 1);
        assert_eq!(ZSTD_LEVEL_MAP[9], 19);
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(decompress(&[1, 2, 3, 4, 5], 8).is_err());
    }
}
