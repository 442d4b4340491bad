//! Progress reporting for archive operations.
//!
//! The core never prints; it reports through a [`ProgressSink`] carried in
//! the operation options, leaving presentation (bars, colors, raw lines)
//! to the caller. Sink access is serialized by the operations themselves,
//! but updates arrive in completion order, not input order.

use std::sync::Arc;
use std::time::Instant;

/// One progress notification.
#[derive(Debug, Clone, Copy)]
pub struct ProgressUpdate<'a> {
    /// Items finished so far, including this one.
    pub current: usize,
    /// Total items selected for the operation.
    pub total: usize,
    /// Stored path of the item just finished.
    pub path: &'a str,
    /// Original size of the item in bytes.
    pub uncompressed: u64,
    /// Stored size of the item in bytes.
    pub compressed: u64,
    /// When the operation started; lets sinks derive rates and ETAs.
    pub started_at: Instant,
}

/// Receives progress notifications from archive operations.
pub trait ProgressSink: Send + Sync {
    /// Called once per finished item.
    fn on_progress(&self, update: &ProgressUpdate<'_>);
}

/// A progress sink that does nothing (null object pattern).
#[derive(Debug, Default, Clone)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn on_progress(&self, _update: &ProgressUpdate<'_>) {}
}

/// A progress sink that calls a closure.
pub struct ProgressFn<F>(F);

impl<F> ProgressFn<F>
where
    F: Fn(&ProgressUpdate<'_>) + Send + Sync,
{
    /// Wraps a closure as a progress sink.
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> ProgressSink for ProgressFn<F>
where
    F: Fn(&ProgressUpdate<'_>) + Send + Sync,
{
    fn on_progress(&self, update: &ProgressUpdate<'_>) {
        (self.0)(update)
    }
}

/// Shared handle to the progress sink used by an operation.
pub type SharedProgress = Arc<dyn ProgressSink>;

/// Returns a shared no-op sink.
pub fn no_progress() -> SharedProgress {
    Arc::new(NoProgress)
}

/// A yes/no predicate injected by the embedder, consulted before
/// operations that reshape data irreversibly.
pub type ConfirmFn = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Formats a byte count with IEC units (KiB, MiB, GiB).
pub fn format_bytes(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = KIB * 1024.0;
    const GIB: f64 = MIB * 1024.0;

    let b = bytes as f64;
    if b < KIB {
        format!("{bytes} B")
    } else if b < MIB {
        format!("{:.1} KiB", b / KIB)
    } else if b < GIB {
        format!("{:.1} MiB", b / MIB)
    } else {
        format!("{:.1} GiB", b / GIB)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_no_progress_is_silent() {
        let sink = NoProgress;
        sink.on_progress(&ProgressUpdate {
            current: 1,
            total: 2,
            path: "a.txt",
            uncompressed: 10,
            compressed: 5,
            started_at: Instant::now(),
        });
    }

    #[test]
    fn test_progress_fn_receives_updates() {
        let seen: Arc<Mutex<Vec<(usize, String)>>> = Arc::new(Mutex::new(Vec::new()));
        let seen2 = Arc::clone(&seen);
        let sink = ProgressFn::new(move |u: &ProgressUpdate<'_>| {
            seen2.lock().unwrap().push((u.current, u.path.to_string()));
        });

        let started_at = Instant::now();
        for (i, path) in ["a", "b"].iter().enumerate() {
            sink.on_progress(&ProgressUpdate {
                current: i + 1,
                total: 2,
                path,
                uncompressed: 0,
                compressed: 0,
                started_at,
            });
        }

        let seen = seen.lock().unwrap();
        assert_eq!(*seen, vec![(1, "a".into()), (2, "b".into())]);
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1024), "1.0 KiB");
        assert_eq!(format_bytes(1536), "1.5 KiB");
        assert_eq!(format_bytes(1048576), "1.0 MiB");
        assert_eq!(format_bytes(3 * 1024 * 1024 * 1024), "3.0 GiB");
    }
}
