//! Archive scanning: walking the block stream into entry descriptors.
//!
//! The reader opens the container for random access, validates the fixed
//! prefix, then walks blocks in file order. At each block boundary it
//! reads one 4-byte word: the solid-block magic announces a trailing
//! solid block, anything else is the `path_len` field of a lone entry
//! (the two can never collide because stored paths are length-capped).
//! A solid block's payload extends to end of file, so a solid block is
//! always the terminal region; the writers enforce the same rule.

pub mod extract;
pub mod verify;

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use crate::entry::{Entry, EntryKind};
use crate::format::header::{LoneHeader, SolidMemberMeta};
use crate::format::{FLAG_SOLID_FIRST_BLOCK, PREFIX_SIZE, SOLID_BLOCK_MAGIC, read_prefix};
use crate::{Codec, Error, Result};

/// Scans a container, returning entry descriptors in traversal order.
///
/// Offsets in the descriptors are fully resolved; see [`Entry`] for the
/// shape-dependent meaning of `header_offset` and `data_offset`.
pub fn scan(archive: impl AsRef<Path>) -> Result<Vec<Entry>> {
    let archive = archive.as_ref();
    let file = File::open(archive).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::PathNotFound {
                path: archive.display().to_string(),
            }
        } else {
            Error::Io(e)
        }
    })?;
    let file_len = file.metadata()?.len();
    let mut reader = BufReader::new(file);

    let flags = read_prefix(&mut reader)?;
    log::debug!(
        "scanning '{}' ({} bytes, flags {:#04x})",
        archive.display(),
        file_len,
        flags
    );

    let mut entries = Vec::new();
    let mut offset = PREFIX_SIZE;

    if flags & FLAG_SOLID_FIRST_BLOCK != 0 {
        scan_solid_block(&mut reader, offset, file_len, 0, &mut entries)?;
        return Ok(entries);
    }

    let mut solid_blocks = 0usize;
    loop {
        let mut word = [0u8; 4];
        if !read_boundary_word(&mut reader, &mut word, offset)? {
            break;
        }

        if word == SOLID_BLOCK_MAGIC {
            scan_solid_block(&mut reader, offset + 4, file_len, solid_blocks, &mut entries)?;
            solid_blocks += 1;
            // The solid payload runs to EOF; nothing can follow.
            break;
        }

        let path_len = u32::from_le_bytes(word);
        let header = LoneHeader::decode_after_path_len(&mut reader, path_len, offset)?;
        let data_offset = offset + header.encoded_len();

        if data_offset + header.compressed_size > file_len {
            return Err(Error::corrupt_header(
                offset,
                format!(
                    "payload of '{}' extends past end of file",
                    header.path
                ),
            ));
        }

        entries.push(Entry {
            path: header.path,
            uncompressed_size: header.uncompressed_size,
            compressed_size: header.compressed_size,
            codec: header.codec,
            level: header.level,
            digest: header.digest,
            digest_hex: header.digest_hex,
            properties: header.properties,
            header_offset: offset,
            data_offset,
            kind: EntryKind::Lone,
        });

        reader.seek_relative(header.compressed_size as i64)?;
        offset = data_offset + header.compressed_size;
    }

    Ok(entries)
}

/// Lists the entries of a container; alias of [`scan`] matching the
/// operation vocabulary of the public API.
pub fn list(archive: impl AsRef<Path>) -> Result<Vec<Entry>> {
    scan(archive)
}

/// Fetches the descriptor of one stored path.
pub fn entry_properties(archive: impl AsRef<Path>, path: &str) -> Result<Entry> {
    scan(archive)?
        .into_iter()
        .find(|e| e.path == path)
        .ok_or_else(|| Error::EntryNotFound { path: path.into() })
}

/// Returns `true` if the container's terminal block is solid, in which
/// case nothing may be appended.
pub fn tail_is_solid(archive: impl AsRef<Path>) -> Result<bool> {
    Ok(scan(archive)?
        .last()
        .map(Entry::is_solid_member)
        .unwrap_or(false))
}

/// Reads the 4-byte word that starts every block. Returns `false` on a
/// clean end of file; a partial word is stream corruption.
fn read_boundary_word<R: Read>(reader: &mut R, word: &mut [u8; 4], offset: u64) -> Result<bool> {
    let mut filled = 0;
    while filled < 4 {
        let n = reader.read(&mut word[filled..])?;
        if n == 0 {
            if filled == 0 {
                return Ok(false);
            }
            return Err(Error::corrupt_stream(
                offset,
                format!("{filled} stray bytes at end of archive"),
            ));
        }
        filled += n;
    }
    Ok(true)
}

/// Parses one solid block starting at `block_start` (after the prefix or
/// the block magic) and appends a descriptor per member.
fn scan_solid_block<R: Read>(
    reader: &mut R,
    block_start: u64,
    file_len: u64,
    block_id: usize,
    entries: &mut Vec<Entry>,
) -> Result<()> {
    let mut head = [0u8; 10];
    reader
        .read_exact(&mut head)
        .map_err(|_| Error::corrupt_header(block_start, "truncated solid block header"))?;

    let codec = Codec::from_id(head[0])?;
    let level = head[1];
    let mut size_bytes = [0u8; 8];
    size_bytes.copy_from_slice(&head[2..10]);
    let metadata_size = u64::from_le_bytes(size_bytes);

    let metadata_start = block_start + 10;
    if metadata_start + metadata_size > file_len {
        return Err(Error::corrupt_header(
            block_start,
            format!("solid metadata ({metadata_size} bytes) extends past end of file"),
        ));
    }

    let mut metadata = vec![0u8; metadata_size as usize];
    reader
        .read_exact(&mut metadata)
        .map_err(|_| Error::corrupt_header(metadata_start, "truncated solid metadata"))?;

    let members = SolidMemberMeta::decode_all(&metadata, metadata_start)?;

    // The payload length is not stored; the block is terminal so it runs
    // to end of file.
    let payload_start = metadata_start + metadata_size;
    let compressed_size = file_len - payload_start;

    let mut member_offset = 0u64;
    for member in members {
        let uncompressed_size = member.uncompressed_size;
        entries.push(Entry {
            path: member.path,
            uncompressed_size,
            compressed_size,
            codec,
            level,
            digest: member.digest,
            digest_hex: member.digest_hex,
            properties: member.properties,
            header_offset: payload_start,
            data_offset: member_offset,
            kind: EntryKind::SolidMember { block_id },
        });
        member_offset += uncompressed_size;
    }

    Ok(())
}

/// Opens the archive and reads `len` bytes at `offset`; used by the
/// extractor and verifier, which give every task its own handle so no
/// seek cursor is shared.
pub(crate) fn read_region(archive: &Path, offset: u64, len: u64) -> Result<Vec<u8>> {
    let mut file = File::open(archive)?;
    file.seek(std::io::SeekFrom::Start(offset))?;
    let mut buf = vec![0u8; len as usize];
    file.read_exact(&mut buf)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(path: &Path, bytes: &[u8]) {
        let mut f = File::create(path).unwrap();
        f.write_all(bytes).unwrap();
    }

    #[test]
    fn test_scan_missing_archive() {
        let err = scan("no/such/archive.przm").unwrap_err();
        assert!(matches!(err, Error::PathNotFound { .. }));
    }

    #[test]
    fn test_scan_empty_archive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.przm");
        write_file(&path, &crate::format::encode_prefix(0));

        let entries = scan(&path).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn test_scan_rejects_stray_tail() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stray.przm");
        let mut bytes = crate::format::encode_prefix(0).to_vec();
        bytes.extend_from_slice(&[1, 2]); // 2 stray bytes, not a boundary word
        write_file(&path, &bytes);

        let err = scan(&path).unwrap_err();
        assert!(matches!(err, Error::CorruptStream { .. }));
    }

    #[test]
    fn test_scan_rejects_truncated_payload() {
        use crate::digest::DigestKind;
        use crate::format::header::LoneHeader;
        use crate::properties::FileProperties;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.przm");

        let header = LoneHeader {
            path: "f.bin".into(),
            codec: Codec::Store,
            level: 0,
            digest: DigestKind::None,
            digest_hex: String::new(),
            uncompressed_size: 100,
            compressed_size: 100,
            properties: FileProperties::default(),
        };
        let mut bytes = crate::format::encode_prefix(0).to_vec();
        bytes.extend_from_slice(&header.encode().unwrap());
        bytes.extend_from_slice(&[0u8; 10]); // payload claims 100 bytes
        write_file(&path, &bytes);

        let err = scan(&path).unwrap_err();
        assert!(matches!(err, Error::CorruptHeader { .. }));
    }

    #[test]
    fn test_entry_properties_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.przm");
        write_file(&path, &crate::format::encode_prefix(0));

        let err = entry_properties(&path, "ghost.txt").unwrap_err();
        assert!(matches!(err, Error::EntryNotFound { .. }));
    }
}
