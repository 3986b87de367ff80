//! Background decode queue for the image viewer.
//!
//! A small pool of worker threads pulls generation-tagged decode requests
//! off a bounded flume channel, runs them through the `ImageLoader`, and
//! pushes outcomes onto an unbounded result channel that the UI thread
//! drains with `poll`. Requests are never de-duplicated or cancelled;
//! staleness is decided by the caller when it applies the outcomes.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use flume::{Receiver, Sender};
use tracing::{debug, warn};

use crate::image_loader::{DecodedImage, ImageLoader};

/// Maximum number of worker threads.
const MAX_WORKERS: usize = 4;

/// Maximum number of queued requests before submissions are refused.
const MAX_QUEUE_SIZE: usize = 64;

/// A request to decode one image for a specific selection generation.
#[derive(Debug, Clone)]
pub(crate) struct LoadRequest {
    /// Selection generation that issued this request.
    pub generation: u64,
    /// Id of the image entry that initiated the load.
    pub image_id: String,
    /// Path handed to the loader.
    pub path: PathBuf,
}

/// Result of a decode sent back to the UI thread.
#[derive(Debug)]
pub(crate) struct LoadOutcome {
    pub generation: u64,
    pub image_id: String,
    pub path: PathBuf,
    /// `None` when the loader failed; the failure is non-fatal.
    pub image: Option<DecodedImage>,
}

/// Worker pool executing decode requests off the UI thread.
pub(crate) struct LoadQueue {
    request_tx: Sender<LoadRequest>,
    result_rx: Receiver<LoadOutcome>,
    workers: Vec<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
}

impl LoadQueue {
    /// Spawn a queue with the given number of workers.
    ///
    /// At least two workers are kept so loads from rapid selection changes
    /// genuinely overlap and can complete out of order.
    pub fn new(loader: Arc<dyn ImageLoader>, workers: usize) -> Self {
        let num_workers = workers.clamp(2, MAX_WORKERS);

        let (request_tx, request_rx) = flume::bounded(MAX_QUEUE_SIZE);
        let (result_tx, result_rx) = flume::unbounded();

        let shutdown = Arc::new(AtomicBool::new(false));
        let mut worker_handles = Vec::with_capacity(num_workers);

        for worker_id in 0..num_workers {
            let rx = request_rx.clone();
            let tx = result_tx.clone();
            let shutdown = Arc::clone(&shutdown);
            let loader = Arc::clone(&loader);

            let handle = thread::Builder::new()
                .name(format!("load-worker-{}", worker_id))
                .spawn(move || {
                    worker_loop(worker_id, rx, tx, shutdown, loader);
                })
                .expect("Failed to spawn load worker");

            worker_handles.push(handle);
        }

        debug!(num_workers, "Started image load queue");

        Self {
            request_tx,
            result_rx,
            workers: worker_handles,
            shutdown,
        }
    }

    /// Submit a decode request.
    ///
    /// Returns false if the queue is full or shut down; the caller treats
    /// a refused submission as an immediate load failure.
    pub fn submit(&self, request: LoadRequest) -> bool {
        match self.request_tx.try_send(request) {
            Ok(()) => true,
            Err(flume::TrySendError::Full(request)) => {
                warn!(?request.path, "Load queue full, dropping request");
                false
            }
            Err(flume::TrySendError::Disconnected(request)) => {
                warn!(?request.path, "Load queue disconnected");
                false
            }
        }
    }

    /// Drain all completed outcomes (non-blocking).
    pub fn poll(&self) -> Vec<LoadOutcome> {
        let mut outcomes = Vec::new();
        while let Ok(outcome) = self.result_rx.try_recv() {
            outcomes.push(outcome);
        }
        outcomes
    }

    /// Signal workers to stop and wait for them to finish.
    pub fn shutdown(&mut self) {
        debug!("Shutting down load queue");
        self.shutdown.store(true, Ordering::SeqCst);
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
    }
}

impl Drop for LoadQueue {
    fn drop(&mut self) {
        if !self.shutdown.load(Ordering::Relaxed) {
            self.shutdown();
        }
    }
}

fn worker_loop(
    worker_id: usize,
    rx: Receiver<LoadRequest>,
    tx: Sender<LoadOutcome>,
    shutdown: Arc<AtomicBool>,
    loader: Arc<dyn ImageLoader>,
) {
    debug!(worker_id, "Load worker started");

    loop {
        if shutdown.load(Ordering::Relaxed) {
            break;
        }

        match rx.recv_timeout(Duration::from_millis(100)) {
            Ok(request) => {
                let image = loader.load_image(&request.path);
                let outcome = LoadOutcome {
                    generation: request.generation,
                    image_id: request.image_id,
                    path: request.path,
                    image,
                };
                if tx.send(outcome).is_err() {
                    // Receiver side is gone; nothing left to do.
                    break;
                }
            }
            Err(flume::RecvTimeoutError::Timeout) => continue,
            Err(flume::RecvTimeoutError::Disconnected) => break,
        }
    }

    debug!(worker_id, "Load worker stopped");
}
