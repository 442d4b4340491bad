//! Shared fixtures for the integration suites.
//!
//! Note: `#![allow(dead_code)]` is required because each integration test
//! file compiles as a separate crate and may only use a subset of these
//! helpers.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use przm::{Codec, DigestKind, WriteOptions};

/// Creates the S1-style tree: `a.txt` with "hello\n" and `sub/b.bin`
/// with 0xDEADBEEF. Returns the two input paths.
pub fn sample_tree(root: &Path) -> Vec<PathBuf> {
    let a = root.join("a.txt");
    fs::write(&a, b"hello\n").unwrap();

    let sub = root.join("sub");
    fs::create_dir_all(&sub).unwrap();
    fs::write(sub.join("b.bin"), [0xDE, 0xAD, 0xBE, 0xEF]).unwrap();

    vec![a, sub]
}

/// Default options for tests: deterministic single-worker runs.
pub fn options(codec: Codec, level: u32, digest: DigestKind) -> WriteOptions {
    WriteOptions::new()
        .codec(codec)
        .level(level)
        .unwrap()
        .digest(digest)
}

/// Reads a whole file.
pub fn read(path: &Path) -> Vec<u8> {
    fs::read(path).unwrap()
}
