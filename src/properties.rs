//! File property capture and restoration.
//!
//! Entry descriptors carry timestamps (seconds since the Unix epoch),
//! permission bits and ownership ids. Capture happens when the writer
//! stats an input file; restoration happens after extraction and is
//! best-effort throughout: a timestamp, mode or ownership failure degrades
//! to a warning and never fails the extraction.

use std::fs::Metadata;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use filetime::FileTime;

/// Host attributes of one archived file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileProperties {
    /// Creation time, seconds since 1970-01-01 UTC. Falls back to the
    /// modification time on filesystems without birth times.
    pub creation_time: u64,
    /// Modification time, seconds since 1970-01-01 UTC.
    pub modification_time: u64,
    /// Host permission bits (Unix mode). Zero when unavailable.
    pub permissions: u32,
    /// Owner user id. Zero on hosts without the concept.
    pub uid: u32,
    /// Owner group id. Zero on hosts without the concept.
    pub gid: u32,
}

fn unix_seconds(time: std::io::Result<SystemTime>) -> u64 {
    time.ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

impl FileProperties {
    /// Captures properties from filesystem metadata.
    pub fn from_metadata(meta: &Metadata) -> Self {
        let modification_time = unix_seconds(meta.modified());
        let creation_time = match unix_seconds(meta.created()) {
            0 => modification_time,
            t => t,
        };

        #[cfg(unix)]
        let (permissions, uid, gid) = {
            use std::os::unix::fs::MetadataExt;
            (meta.mode(), meta.uid(), meta.gid())
        };
        #[cfg(not(unix))]
        let (permissions, uid, gid) = (0u32, 0u32, 0u32);

        Self {
            creation_time,
            modification_time,
            permissions,
            uid,
            gid,
        }
    }

    /// Captures properties for a path, returning defaults when the stat
    /// fails.
    pub fn from_path(path: &Path) -> Self {
        match std::fs::metadata(path) {
            Ok(meta) => Self::from_metadata(&meta),
            Err(e) => {
                log::warn!("cannot stat '{}': {e}", path.display());
                Self::default()
            }
        }
    }

    /// Applies the stored properties to an extracted file.
    ///
    /// Only the modification time is settable portably; permissions and
    /// ownership are restored on Unix hosts. Each failure is logged and
    /// swallowed.
    pub fn apply(&self, path: &Path) {
        if self.modification_time != 0 {
            let mtime = FileTime::from_unix_time(self.modification_time as i64, 0);
            if let Err(e) = filetime::set_file_mtime(path, mtime) {
                log::warn!("cannot set mtime on '{}': {e}", path.display());
            }
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if self.permissions != 0 {
                let perms = std::fs::Permissions::from_mode(self.permissions);
                if let Err(e) = std::fs::set_permissions(path, perms) {
                    log::warn!("cannot set permissions on '{}': {e}", path.display());
                }
            }
            if self.uid != 0 || self.gid != 0 {
                if let Err(e) = std::os::unix::fs::chown(path, Some(self.uid), Some(self.gid)) {
                    // Expected for unprivileged processes.
                    log::debug!("cannot chown '{}': {e}", path.display());
                }
            }
        }
    }
}
