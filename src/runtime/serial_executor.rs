//! FIFO executor that owns a piece of state and runs jobs against it one
//! at a time.
//!
//! Jobs may suspend. The next job starts only after the previous one has
//! completed, including every `.await` inside it, so all mutations of the
//! state are serialized in submission order without a lock.
//!
//! # Shutdown
//!
//! - [`SerialExecutor::shutdown`] closes the queue, lets already queued jobs
//!   finish, and hands the state back.
//! - Dropping the executor cancels the worker. Queued jobs that have not
//!   started are dropped and their handles resolve to
//!   [`ColorizeError::ExecutorClosed`].

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::{ColorizeError, ColorizeResult};

const LOG_TARGET: &str = "irodori::executor";

/// Boxed future borrowing the executor state for `'a`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

type Job<S> = Box<dyn for<'a> FnOnce(&'a mut S) -> BoxFuture<'a, ()> + Send>;

fn job<S, F>(f: F) -> Job<S>
where
    F: for<'a> FnOnce(&'a mut S) -> BoxFuture<'a, ()> + Send + 'static,
{
    Box::new(f)
}

/// Serializes jobs over a state value owned by a spawned worker task.
pub struct SerialExecutor<S> {
    /// `None` once shutdown has begun
    tx: Option<mpsc::UnboundedSender<Job<S>>>,
    join_handle: Option<JoinHandle<S>>,
    cancel_token: CancellationToken,
}

impl<S: Send + 'static> SerialExecutor<S> {
    /// Spawn the worker on the current tokio runtime.
    pub fn spawn(state: S) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel_token = CancellationToken::new();
        let join_handle = tokio::spawn(worker_loop(state, rx, cancel_token.clone()));

        Self {
            tx: Some(tx),
            join_handle: Some(join_handle),
            cancel_token,
        }
    }

    /// Queue an async job. The returned handle resolves with the job's
    /// output once it has run.
    pub fn submit<R, F>(&self, f: F) -> TaskHandle<R>
    where
        R: Send + 'static,
        F: for<'a> FnOnce(&'a mut S) -> BoxFuture<'a, R> + Send + 'static,
    {
        let (result_tx, result_rx) = oneshot::channel();
        let queued = job::<S, _>(move |state| {
            let fut = f(state);
            Box::pin(async move {
                // The caller may have stopped waiting
                let _ = result_tx.send(fut.await);
            })
        });

        match &self.tx {
            Some(tx) => {
                if tx.send(queued).is_err() {
                    log::debug!(target: LOG_TARGET, "Job submitted to a stopped worker");
                }
            }
            None => {
                log::debug!(target: LOG_TARGET, "Job submitted after shutdown");
            }
        }

        TaskHandle { rx: result_rx }
    }

    /// Queue a synchronous job.
    pub fn run<R, F>(&self, f: F) -> TaskHandle<R>
    where
        R: Send + 'static,
        F: FnOnce(&mut S) -> R + Send + 'static,
    {
        self.submit(move |state| {
            let output = f(state);
            Box::pin(std::future::ready(output))
        })
    }

    /// True once the worker no longer accepts jobs.
    pub fn is_closed(&self) -> bool {
        self.tx.as_ref().is_none_or(|tx| tx.is_closed())
    }

    /// Stop accepting jobs, wait for queued ones, and return the state.
    pub async fn shutdown(mut self) -> ColorizeResult<S> {
        self.tx.take();
        let join_handle = self
            .join_handle
            .take()
            .ok_or(ColorizeError::ExecutorClosed)?;
        join_handle.await.map_err(|e| {
            log::warn!(target: LOG_TARGET, "Worker ended abnormally: {}", e);
            ColorizeError::ExecutorClosed
        })
    }
}

impl<S> Drop for SerialExecutor<S> {
    fn drop(&mut self) {
        // Stop the worker if it was not shut down explicitly
        self.cancel_token.cancel();
    }
}

impl<S> std::fmt::Debug for SerialExecutor<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialExecutor")
            .field("accepting", &self.tx.is_some())
            .field("cancelled", &self.cancel_token.is_cancelled())
            .finish()
    }
}

async fn worker_loop<S>(
    mut state: S,
    mut rx: mpsc::UnboundedReceiver<Job<S>>,
    cancel_token: CancellationToken,
) -> S {
    loop {
        tokio::select! {
            biased;

            _ = cancel_token.cancelled() => {
                log::debug!(target: LOG_TARGET, "Worker cancelled, dropping queued jobs");
                break;
            }

            next = rx.recv() => match next {
                Some(job) => job(&mut state).await,
                None => {
                    log::trace!(target: LOG_TARGET, "Queue closed, worker exiting");
                    break;
                }
            }
        }
    }
    state
}

/// Completion handle for a submitted job.
#[must_use = "a TaskHandle does nothing unless awaited"]
#[derive(Debug)]
pub struct TaskHandle<R> {
    rx: oneshot::Receiver<R>,
}

impl<R> Future for TaskHandle<R> {
    type Output = ColorizeResult<R>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.get_mut().rx)
            .poll(cx)
            .map(|result| result.map_err(|_| ColorizeError::ExecutorClosed))
    }
}
