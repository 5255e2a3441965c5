//! Lifecycle of the layout computation unit.
//!
//! The algorithm itself is a black box behind [`LayoutEngine`]. It runs on a
//! dedicated worker thread so a slow computation never blocks the caller's
//! event loop; requests are serialized by the worker's channel. The worker is
//! created lazily on first use and torn down on crash so the next call gets a
//! fresh one.

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use log::{debug, warn};
use thiserror::Error;

use crate::config::BackendConfig;

use super::error::LayoutError;
use super::graph::LayoutGraph;

/// Error reported by the engine itself. The engine protocol is textual, so
/// this carries an opaque message rather than structure.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct EngineError(pub String);

/// The external layout algorithm: hierarchical graph in, the same graph
/// annotated with positions and edge sections out.
pub trait LayoutEngine: Send {
    fn layout(&mut self, graph: LayoutGraph) -> Result<LayoutGraph, EngineError>;
}

type EngineFactory = dyn Fn() -> Box<dyn LayoutEngine> + Send + Sync;

struct Request {
    graph: LayoutGraph,
    reply: Sender<Result<LayoutGraph, EngineError>>,
}

struct Worker {
    tx: Sender<Request>,
}

impl Worker {
    fn spawn(factory: &EngineFactory) -> std::io::Result<Self> {
        // Constructing the engine here, under the caller's init lock, keeps
        // "exactly one engine" observable even before the thread runs.
        let mut engine = factory();
        let (tx, rx) = mpsc::channel::<Request>();
        thread::Builder::new()
            .name("mindmap-layout-backend".into())
            .spawn(move || {
                while let Ok(request) = rx.recv() {
                    let result = engine.layout(request.graph);
                    // The caller may have timed out and dropped its receiver;
                    // a late reply is simply discarded.
                    let _ = request.reply.send(result);
                }
            })?;
        Ok(Self { tx })
    }
}

/// Shared handle to the computation unit. Explicitly owned and injectable:
/// the service holds one, tests build theirs around a scripted engine, and
/// process-wide sharing is just an `Arc<Backend>`.
///
/// Lifecycle has two externally visible states, uninitialized and ready.
/// Initialization happens under the slot lock, so a second caller arriving
/// mid-init blocks and then reuses the same worker instead of spawning
/// another; a failed spawn leaves the slot empty for a clean retry.
pub struct Backend {
    slot: Mutex<Option<Arc<Worker>>>,
    factory: Box<EngineFactory>,
    timeout: Duration,
}

impl Backend {
    pub fn new<F>(factory: F, config: &BackendConfig) -> Self
    where
        F: Fn() -> Box<dyn LayoutEngine> + Send + Sync + 'static,
    {
        Self {
            slot: Mutex::new(None),
            factory: Box::new(factory),
            timeout: config.timeout(),
        }
    }

    /// Dispatch one layout computation and await its result.
    ///
    /// Timeouts leave the worker running (the stale reply lands in a dropped
    /// channel); a dead worker thread is treated as a crash, torn down, and
    /// re-initialized lazily on the next call.
    pub fn layout(&self, graph: LayoutGraph) -> Result<LayoutGraph, LayoutError> {
        let worker = self.handle()?;
        let (reply_tx, reply_rx) = mpsc::channel();
        let request = Request {
            graph,
            reply: reply_tx,
        };
        if worker.tx.send(request).is_err() {
            self.tear_down(&worker);
            return Err(LayoutError::BackendCrashed);
        }
        match reply_rx.recv_timeout(self.timeout) {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(err)) => Err(LayoutError::Engine(err.0)),
            Err(RecvTimeoutError::Timeout) => Err(LayoutError::Timeout),
            Err(RecvTimeoutError::Disconnected) => {
                self.tear_down(&worker);
                Err(LayoutError::BackendCrashed)
            }
        }
    }

    /// Terminate the worker, if any. The next call re-initializes.
    pub fn terminate(&self) {
        let mut slot = self.lock_slot();
        if slot.take().is_some() {
            debug!("layout backend terminated");
        }
    }

    fn handle(&self) -> Result<Arc<Worker>, LayoutError> {
        let mut slot = self.lock_slot();
        if let Some(worker) = slot.as_ref() {
            return Ok(worker.clone());
        }
        debug!("initializing layout backend");
        let worker = Arc::new(Worker::spawn(self.factory.as_ref())?);
        *slot = Some(worker.clone());
        Ok(worker)
    }

    /// Clear the slot, but only if it still holds the worker we failed with;
    /// a concurrent caller may already have re-initialized.
    fn tear_down(&self, failed: &Arc<Worker>) {
        warn!("layout backend crashed, clearing handle");
        let mut slot = self.lock_slot();
        if slot.as_ref().is_some_and(|current| Arc::ptr_eq(current, failed)) {
            *slot = None;
        }
    }

    fn lock_slot(&self) -> std::sync::MutexGuard<'_, Option<Arc<Worker>>> {
        // A panic while holding the lock only happens in the tear-down paths
        // above, which leave the slot consistent either way.
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedEngine<F>(F);

    impl<F> LayoutEngine for ScriptedEngine<F>
    where
        F: FnMut(LayoutGraph) -> Result<LayoutGraph, EngineError> + Send,
    {
        fn layout(&mut self, graph: LayoutGraph) -> Result<LayoutGraph, EngineError> {
            (self.0)(graph)
        }
    }

    fn echo_backend(constructions: Arc<AtomicUsize>, config: &BackendConfig) -> Backend {
        Backend::new(
            move || {
                constructions.fetch_add(1, Ordering::SeqCst);
                Box::new(ScriptedEngine(|graph| Ok(graph)))
            },
            config,
        )
    }

    #[test]
    fn worker_is_lazy_and_constructed_once() {
        let constructions = Arc::new(AtomicUsize::new(0));
        let backend = echo_backend(constructions.clone(), &BackendConfig::default());
        assert_eq!(constructions.load(Ordering::SeqCst), 0);
        backend.layout(LayoutGraph::container("root")).expect("first");
        backend.layout(LayoutGraph::container("root")).expect("second");
        assert_eq!(constructions.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn concurrent_first_calls_share_one_worker() {
        let constructions = Arc::new(AtomicUsize::new(0));
        let backend = Arc::new(echo_backend(constructions.clone(), &BackendConfig::default()));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let backend = backend.clone();
            handles.push(thread::spawn(move || {
                backend.layout(LayoutGraph::container("root")).expect("layout")
            }));
        }
        for handle in handles {
            handle.join().expect("join");
        }
        assert_eq!(constructions.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn crash_resets_worker_for_the_next_call() {
        let constructions = Arc::new(AtomicUsize::new(0));
        let count = constructions.clone();
        let backend = Backend::new(
            move || {
                let first = count.fetch_add(1, Ordering::SeqCst) == 0;
                Box::new(ScriptedEngine(move |graph| {
                    if first {
                        panic!("simulated backend crash");
                    }
                    Ok(graph)
                }))
            },
            &BackendConfig::default(),
        );
        let err = backend.layout(LayoutGraph::container("root")).expect_err("crash");
        assert!(matches!(err, LayoutError::BackendCrashed));
        assert!(err.is_retriable());
        // No permanent lock-out: the retry spawns a fresh engine and succeeds.
        backend.layout(LayoutGraph::container("root")).expect("recovered");
        assert_eq!(constructions.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn slow_engine_surfaces_timeout_without_teardown() {
        let constructions = Arc::new(AtomicUsize::new(0));
        let count = constructions.clone();
        let backend = Backend::new(
            move || {
                count.fetch_add(1, Ordering::SeqCst);
                Box::new(ScriptedEngine(|graph| {
                    thread::sleep(Duration::from_millis(80));
                    Ok(graph)
                }))
            },
            &BackendConfig { timeout_ms: 10 },
        );
        let err = backend.layout(LayoutGraph::container("root")).expect_err("timeout");
        assert!(matches!(err, LayoutError::Timeout));
        assert!(err.is_retriable());
        // The worker is still the same one; only the reply was abandoned.
        assert_eq!(constructions.load(Ordering::SeqCst), 1);
        backend.layout(LayoutGraph::container("root")).expect("queued retry");
        assert_eq!(constructions.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn engine_errors_pass_through() {
        let backend = Backend::new(
            || Box::new(ScriptedEngine(|_| Err(EngineError("unknown option".into())))),
            &BackendConfig::default(),
        );
        let err = backend.layout(LayoutGraph::container("root")).expect_err("engine error");
        match err {
            LayoutError::Engine(ref message) => assert_eq!(message, "unknown option"),
            other => panic!("unexpected error: {other}"),
        }
        assert!(!err.is_retriable());
    }

    #[test]
    fn terminate_clears_and_next_call_reinitializes() {
        let constructions = Arc::new(AtomicUsize::new(0));
        let backend = echo_backend(constructions.clone(), &BackendConfig::default());
        backend.layout(LayoutGraph::container("root")).expect("first");
        backend.terminate();
        backend.layout(LayoutGraph::container("root")).expect("after terminate");
        assert_eq!(constructions.load(Ordering::SeqCst), 2);
    }
}
