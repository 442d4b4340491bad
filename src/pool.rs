//! Fixed-size worker pool for per-entry compression and extraction work.
//!
//! Tasks enter a FIFO queue; a fixed set of workers pulls and executes
//! them. Each submission returns a [`TaskHandle`] that blocks until the
//! task's result is available. Dropping the pool signals shutdown, skips
//! tasks that have not started, and joins every worker. Workers record
//! cumulative busy time, which operations surface in their reports.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, unbounded};

use crate::{Error, Result};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// A fixed-size thread pool with future-returning submission.
pub struct WorkerPool {
    sender: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
    busy_micros: Arc<Vec<AtomicU64>>,
    shutdown: Arc<AtomicBool>,
}

/// The completion handle of one submitted task.
///
/// [`wait`][TaskHandle::wait] blocks until the task finishes and yields
/// its result. If the executing worker died, [`Error::WorkerLost`] is
/// returned instead.
pub struct TaskHandle<T> {
    receiver: Receiver<T>,
}

impl<T> TaskHandle<T> {
    /// Blocks until the task completes.
    pub fn wait(self) -> Result<T> {
        self.receiver.recv().map_err(|_| Error::WorkerLost)
    }
}

impl WorkerPool {
    /// Creates a pool with the given number of workers (at least one).
    pub fn new(threads: usize) -> Self {
        let threads = threads.max(1);
        let (sender, receiver) = unbounded::<Job>();
        let busy_micros: Arc<Vec<AtomicU64>> =
            Arc::new((0..threads).map(|_| AtomicU64::new(0)).collect());
        let shutdown = Arc::new(AtomicBool::new(false));

        let workers = (0..threads)
            .map(|index| {
                let receiver = receiver.clone();
                let busy = Arc::clone(&busy_micros);
                let shutdown = Arc::clone(&shutdown);
                std::thread::Builder::new()
                    .name(format!("przm-worker-{index}"))
                    .spawn(move || worker_loop(index, &receiver, &busy, &shutdown))
                    .expect("spawning worker thread")
            })
            .collect();

        Self {
            sender: Some(sender),
            workers,
            busy_micros,
            shutdown,
        }
    }

    /// Returns the number of workers.
    pub fn thread_count(&self) -> usize {
        self.workers.len()
    }

    /// Submits a task, returning its completion handle.
    pub fn submit<T, F>(&self, task: F) -> TaskHandle<T>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let job: Job = Box::new(move || {
            // A dropped handle is fine; the send result is irrelevant.
            let _ = tx.send(task());
        });
        if let Some(sender) = &self.sender {
            // The receiver lives as long as the workers; this cannot fail
            // before shutdown.
            let _ = sender.send(job);
        }
        TaskHandle { receiver: rx }
    }

    /// Per-worker cumulative busy time, indexed by worker.
    pub fn busy_times(&self) -> Vec<Duration> {
        self.busy_micros
            .iter()
            .map(|micros| Duration::from_micros(micros.load(Ordering::Relaxed)))
            .collect()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        // Closing the channel wakes idle workers; queued-but-unstarted
        // jobs are skipped because the shutdown flag is already set.
        self.sender.take();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

fn worker_loop(
    index: usize,
    receiver: &Receiver<Job>,
    busy: &[AtomicU64],
    shutdown: &AtomicBool,
) {
    while let Ok(job) = receiver.recv() {
        if shutdown.load(Ordering::Relaxed) {
            // Unstarted work is dropped on shutdown.
            continue;
        }
        let started = Instant::now();
        job();
        let elapsed = started.elapsed().as_micros() as u64;
        busy[index].fetch_add(elapsed, Ordering::Relaxed);
    }
}
