// SPDX-FileCopyrightText: 2026 Odoobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Small fixed-size worker pool for fire-and-forget dispatches.
//!
//! The pool owns a dedicated multi-thread tokio runtime, built on the first
//! submission. The process-wide instance lives until exit; nothing cancels
//! work once it is submitted.

use std::future::Future;
use std::sync::{Arc, Mutex, OnceLock};

use odoobot_core::ChatbotError;
use tokio::runtime::{Builder, Runtime};
use tokio::task::JoinHandle;
use tracing::info;

/// Worker count used when none is configured.
pub const DEFAULT_WORKERS: usize = 3;

static GLOBAL: OnceLock<Arc<WorkerPool>> = OnceLock::new();

/// Lazily started runtime with a fixed number of worker threads.
#[derive(Debug)]
pub struct WorkerPool {
    workers: usize,
    runtime: Mutex<Option<Arc<Runtime>>>,
}

impl WorkerPool {
    /// Pool with `workers` threads (at least one). No thread starts until
    /// the first [`spawn`](Self::spawn).
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
            runtime: Mutex::new(None),
        }
    }

    /// Process-wide pool. The first caller picks the worker count.
    pub fn global(workers: usize) -> Arc<WorkerPool> {
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(WorkerPool::new(workers))))
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// True once the runtime has been built.
    pub fn is_started(&self) -> bool {
        self.runtime
            .lock()
            .map(|rt| rt.is_some())
            .unwrap_or(false)
    }

    /// Run `future` on the pool.
    pub fn spawn<F>(&self, future: F) -> Result<JoinHandle<F::Output>, ChatbotError>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        Ok(self.runtime()?.spawn(future))
    }

    fn runtime(&self) -> Result<Arc<Runtime>, ChatbotError> {
        let mut slot = self
            .runtime
            .lock()
            .map_err(|_| ChatbotError::Internal("worker pool lock poisoned".into()))?;

        if let Some(runtime) = slot.as_ref() {
            return Ok(Arc::clone(runtime));
        }

        let runtime = Builder::new_multi_thread()
            .worker_threads(self.workers)
            .thread_name("odoobot-worker")
            .enable_all()
            .build()
            .map_err(|e| ChatbotError::Internal(format!("failed to start worker pool: {e}")))?;
        info!(workers = self.workers, "worker pool started");

        let runtime = Arc::new(runtime);
        *slot = Some(Arc::clone(&runtime));
        Ok(runtime)
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new(DEFAULT_WORKERS)
    }
}

impl Drop for WorkerPool {
    // The last reference may be released by a task running on this very
    // runtime, where a blocking shutdown would panic.
    fn drop(&mut self) {
        let slot = match self.runtime.get_mut() {
            Ok(slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(runtime) = slot.and_then(|rt| Arc::try_unwrap(rt).ok()) {
            runtime.shutdown_background();
        }
    }
}
