//! Appending entries to an existing archive.
//!
//! Appends only ever extend the file tail. The existing descriptor list
//! is read first to enforce path uniqueness. A solid block may be
//! appended to a lone-entry archive (it becomes the terminal region), but
//! nothing can follow an archive whose tail is already solid.

use std::collections::HashSet;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::entry::Entry;
use crate::format::SOLID_BLOCK_MAGIC;
use crate::fs::{ExcludeSet, collect_input_files};
use crate::read;
use crate::{Error, Result};

use super::{CreationReport, WriteOptions, build_solid_block, plan_entries, write_lone_entries};

/// Appends the given inputs to an existing archive.
///
/// Fails with [`Error::DuplicatePath`] when an input collides with a
/// stored path, unless `ignore_errors` downgrades the collision to a
/// warning and skips the file; an append in which every file is skipped
/// leaves the archive byte-identical.
pub fn append(
    archive: impl AsRef<Path>,
    inputs: &[PathBuf],
    options: &WriteOptions,
) -> Result<CreationReport> {
    let archive = archive.as_ref();

    let existing = read::scan(archive)?;
    if existing.last().map(Entry::is_solid_member).unwrap_or(false) {
        return Err(Error::SolidTailAppend {
            path: archive.display().to_string(),
        });
    }

    let excludes = ExcludeSet::compile(&options.exclude);
    let files = collect_input_files(inputs, &excludes, options.ignore_errors)?;

    let mut seen: HashSet<String> = existing.into_iter().map(|e| e.path).collect();
    let had_entries = !seen.is_empty();
    let pairs = plan_entries(&files, inputs, options, &mut seen)?;

    if pairs.is_empty() {
        log::info!("nothing to append to '{}'", archive.display());
        return Ok(CreationReport::default());
    }

    log::info!(
        "appending {} file(s) to '{}'",
        pairs.len(),
        archive.display()
    );

    let report = if options.solid {
        if had_entries {
            log::warn!(
                "appending a solid block to a lone-entry archive; the result mixes block shapes"
            );
        }
        let (block, stats) = build_solid_block(&pairs, options)?;
        if stats.files_added == 0 {
            // Every member was skipped; writing an empty solid block
            // would claim the rest of the file for nothing.
            return Ok(stats);
        }
        let mut file = OpenOptions::new().append(true).open(archive)?;
        file.write_all(&SOLID_BLOCK_MAGIC)?;
        file.write_all(&block)?;
        file.sync_all()?;
        stats
    } else {
        let file = OpenOptions::new().append(true).open(archive)?;
        write_lone_entries(file, &pairs, options)?
    };

    log::info!(
        "appended {} file(s) to '{}'",
        report.files_added,
        archive.display()
    );

    Ok(report)
}
