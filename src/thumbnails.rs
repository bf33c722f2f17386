//! Background preview decoding for grid tiles.
//!
//! - Small worker pool decoding previews off the UI thread
//! - Requests are deduplicated while in flight
//! - Requests that do not fit in the queue wait in a backlog instead of being lost
//! - Cancelled requests are skipped by the workers and never reported
//! - Results are drained by the owner (the GTK layer polls from a timeout)
//! - Uses flume for communication between workers and the owner

use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use flume::{Receiver, Sender, TrySendError};
use parking_lot::RwLock;
use tracing::{debug, trace, warn};

use crate::image_loader::{self, Preview};

/// Default number of worker threads.
pub const DEFAULT_WORKERS: usize = 2;

/// Maximum number of worker threads.
const MAX_WORKERS: usize = 4;

/// Maximum number of requests handed to the workers at once.
const MAX_QUEUE_SIZE: usize = 512;

#[derive(Debug)]
struct PreviewRequest {
    path: PathBuf,
}

/// A finished decode. `preview` is `None` when the file could not be decoded.
#[derive(Debug)]
pub struct PreviewResult {
    pub path: PathBuf,
    pub preview: Option<Preview>,
}

/// Worker pool decoding previews at a fixed maximum edge length.
pub struct PreviewPool {
    request_tx: Sender<PreviewRequest>,
    result_rx: Receiver<PreviewResult>,
    /// Requested and not yet delivered or cancelled. Shared with the workers.
    pending: Arc<RwLock<HashSet<PathBuf>>>,
    /// Requests waiting for room in the worker queue, oldest first.
    backlog: VecDeque<PathBuf>,
}

impl PreviewPool {
    /// Spawns `workers` decoder threads (clamped to 1..=4).
    ///
    /// Workers exit once the pool is dropped and their current decode finishes.
    pub fn new(workers: usize, max_edge: u32) -> Self {
        Self::with_queue_capacity(workers, max_edge, MAX_QUEUE_SIZE)
    }

    fn with_queue_capacity(workers: usize, max_edge: u32, capacity: usize) -> Self {
        let num_workers = workers.clamp(1, MAX_WORKERS);
        let (request_tx, request_rx) = flume::bounded::<PreviewRequest>(capacity.max(1));
        let (result_tx, result_rx) = flume::unbounded::<PreviewResult>();
        let pending = Arc::new(RwLock::new(HashSet::new()));

        for worker_id in 0..num_workers {
            let rx = request_rx.clone();
            let tx = result_tx.clone();
            let pending = Arc::clone(&pending);
            let spawned = std::thread::Builder::new()
                .name(format!("preview-{worker_id}"))
                .spawn(move || worker_loop(worker_id, rx, tx, pending, max_edge));
            if let Err(err) = spawned {
                warn!(error = %err, "Failed to spawn preview worker");
            }
        }

        Self {
            request_tx,
            result_rx,
            pending,
            backlog: VecDeque::new(),
        }
    }

    /// Queues a decode for `path` unless one is already in flight.
    ///
    /// A request that finds the worker queue full is kept and handed over on a
    /// later `request` or `drain`.
    pub fn request(&mut self, path: &Path) {
        if !self.pending.write().insert(path.to_path_buf()) {
            trace!(?path, "Preview already pending");
            return;
        }
        self.backlog.push_back(path.to_path_buf());
        self.flush_backlog();
    }

    /// Drops interest in `path`. A decode already running still finishes, but
    /// its result is discarded.
    pub fn cancel(&mut self, path: &Path) {
        if self.pending.write().remove(path) {
            self.backlog.retain(|queued| queued != path);
            trace!(?path, "Preview cancelled");
        }
    }

    #[cfg(test)]
    fn is_pending(&self, path: &Path) -> bool {
        self.pending.read().contains(path)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.read().len()
    }

    /// Collects every result finished so far without blocking.
    ///
    /// Results for cancelled paths are left out.
    pub fn drain(&mut self) -> Vec<PreviewResult> {
        let results: Vec<PreviewResult> = {
            let mut pending = self.pending.write();
            self.result_rx
                .try_iter()
                .filter(|result| pending.remove(&result.path))
                .collect()
        };
        self.flush_backlog();
        results
    }

    fn flush_backlog(&mut self) {
        while let Some(path) = self.backlog.pop_front() {
            if !self.pending.read().contains(&path) {
                continue;
            }
            match self.request_tx.try_send(PreviewRequest { path }) {
                Ok(()) => {}
                Err(TrySendError::Full(req)) => {
                    self.backlog.push_front(req.path);
                    break;
                }
                Err(TrySendError::Disconnected(req)) => {
                    warn!(path = ?req.path, "Preview workers are gone");
                    self.pending.write().remove(&req.path);
                }
            }
        }
    }
}

fn worker_loop(
    worker_id: usize,
    rx: Receiver<PreviewRequest>,
    tx: Sender<PreviewResult>,
    pending: Arc<RwLock<HashSet<PathBuf>>>,
    max_edge: u32,
) {
    while let Ok(req) = rx.recv() {
        if !pending.read().contains(&req.path) {
            trace!(worker_id, path = ?req.path, "Skipping cancelled preview");
            continue;
        }
        let preview = match image_loader::decode_preview(&req.path, max_edge) {
            Ok(preview) => Some(preview),
            Err(err) => {
                debug!(error = ?err, "Preview decode failed");
                None
            }
        };
        if tx
            .send(PreviewResult {
                path: req.path,
                preview,
            })
            .is_err()
        {
            break;
        }
    }
    trace!(worker_id, "Preview worker exiting");
}
