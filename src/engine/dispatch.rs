// src/engine/dispatch.rs

//! The dispatch worker: a single named thread that performs every drain.
//!
//! Triggers are messages on an unbounded channel, so the worker is woken
//! cooperatively and processes drains strictly in the order they were
//! requested. Only this thread ever calls the downstream listener.

use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, trace, warn};

use crate::engine::core::CoalescerCore;
use crate::errors::{CoalesceError, Result};

#[derive(Debug)]
enum WorkerMsg {
    Drain,
    Flush(oneshot::Sender<usize>),
    Shutdown,
}

/// Cloneable handle that schedules a drain on the worker.
#[derive(Debug, Clone)]
pub struct DrainTrigger {
    tx: mpsc::UnboundedSender<WorkerMsg>,
}

impl DrainTrigger {
    pub fn fire(&self) {
        if self.tx.send(WorkerMsg::Drain).is_err() {
            trace!("drain requested after dispatch worker stopped");
        }
    }
}

/// Owner of the dispatch thread. Dropping it stops the worker once the
/// drain in progress (if any) has finished.
#[derive(Debug)]
pub struct DispatchWorker {
    core: Arc<CoalescerCore>,
    tx: mpsc::UnboundedSender<WorkerMsg>,
    thread_id: ThreadId,
    handle: Option<JoinHandle<()>>,
}

impl DispatchWorker {
    pub fn spawn(core: Arc<CoalescerCore>, thread_name: &str) -> Result<Self> {
        let (tx, mut rx) = mpsc::unbounded_channel::<WorkerMsg>();

        let worker_core = Arc::clone(&core);
        let handle = thread::Builder::new()
            .name(thread_name.to_string())
            .spawn(move || {
                debug!("dispatch worker started");
                while let Some(msg) = rx.blocking_recv() {
                    match msg {
                        WorkerMsg::Drain => {
                            worker_core.drain();
                        }
                        WorkerMsg::Flush(done) => {
                            let dispatched = worker_core.drain();
                            // The flusher may have given up waiting.
                            let _ = done.send(dispatched);
                        }
                        WorkerMsg::Shutdown => break,
                    }
                }
                debug!("dispatch worker finished");
            })
            .map_err(CoalesceError::WorkerSpawn)?;

        info!(thread = thread_name, "dispatch worker spawned");

        Ok(Self {
            core,
            tx,
            thread_id: handle.thread().id(),
            handle: Some(handle),
        })
    }

    pub fn trigger(&self) -> DrainTrigger {
        DrainTrigger {
            tx: self.tx.clone(),
        }
    }

    /// True when called from inside a listener callback.
    pub fn is_worker_thread(&self) -> bool {
        thread::current().id() == self.thread_id
    }

    /// Run one drain on the worker and block until it has finished.
    ///
    /// Called from the worker itself (a listener flushing re-entrantly) the
    /// drain runs inline. Must not be called from inside an async runtime;
    /// use [`DispatchWorker::flush_async`] there.
    pub fn flush(&self) -> Result<usize> {
        if self.is_worker_thread() {
            return Ok(self.core.drain());
        }

        let (done_tx, done_rx) = oneshot::channel();
        self.tx
            .send(WorkerMsg::Flush(done_tx))
            .map_err(|_| CoalesceError::WorkerStopped)?;
        done_rx.blocking_recv().map_err(|_| CoalesceError::WorkerStopped)
    }

    /// Async variant of [`DispatchWorker::flush`].
    pub async fn flush_async(&self) -> Result<usize> {
        let (done_tx, done_rx) = oneshot::channel();
        self.tx
            .send(WorkerMsg::Flush(done_tx))
            .map_err(|_| CoalesceError::WorkerStopped)?;
        done_rx.await.map_err(|_| CoalesceError::WorkerStopped)
    }
}

impl Drop for DispatchWorker {
    fn drop(&mut self) {
        let _ = self.tx.send(WorkerMsg::Shutdown);

        // A listener dropping the last handle would otherwise join itself.
        if self.is_worker_thread() {
            return;
        }

        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("dispatch worker thread panicked");
            }
        }
    }
}
