//! Single ordered channel for every state-changing call made under the shared
//! submitter identity.
//!
//! One worker drains the channel and runs each task to completion before
//! taking the next, so at most one submission is ever outstanding and the
//! dispatch order is exactly the enqueue order. A task's failure (or panic)
//! only affects its own caller.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt};
use tokio::sync::{mpsc, oneshot};

use crate::error::{AppError, Result};

type SubmissionTask = Box<dyn FnOnce() -> BoxFuture<'static, Result<String>> + Send>;

struct QueuedTask {
    label: String,
    run: SubmissionTask,
    reply: oneshot::Sender<Result<SubmissionReceipt>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
    pub submission_id: String,
    /// 1-based dispatch position since the worker started.
    pub queue_position: u64,
}

#[derive(Clone)]
pub struct SubmissionQueue {
    sender: mpsc::UnboundedSender<QueuedTask>,
    pending: Arc<AtomicUsize>,
}

impl SubmissionQueue {
    /// Starts the worker on the current tokio runtime.
    pub fn spawn() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let pending = Arc::new(AtomicUsize::new(0));
        tokio::spawn(run_worker(receiver, pending.clone()));
        Self { sender, pending }
    }

    /// Appends `task` to the tail of the queue.
    ///
    /// The task is placed in the queue before this returns, so the order of
    /// `enqueue` calls is the dispatch order whether or not the returned
    /// future is ever polled. Dropping the future does not cancel the task.
    pub fn enqueue<F, Fut>(
        &self,
        label: impl Into<String>,
        task: F,
    ) -> BoxFuture<'static, Result<SubmissionReceipt>>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<String>> + Send + 'static,
    {
        let label = label.into();
        let (reply, outcome) = oneshot::channel();
        let queued = QueuedTask {
            label: label.clone(),
            run: Box::new(move || task().boxed()),
            reply,
        };

        self.pending.fetch_add(1, Ordering::SeqCst);
        let sent = self.sender.send(queued).map_err(|_| {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            AppError::Internal("Submission queue is closed".to_string())
        });
        tracing::debug!("Enqueued {} (pending {})", label, self.pending());

        async move {
            sent?;
            outcome.await.map_err(|_| {
                AppError::Internal("Submission worker dropped the task".to_string())
            })?
        }
        .boxed()
    }

    /// Tasks enqueued but not yet settled, including the running one.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }
}

async fn run_worker(mut receiver: mpsc::UnboundedReceiver<QueuedTask>, pending: Arc<AtomicUsize>) {
    let mut position: u64 = 0;

    while let Some(task) = receiver.recv().await {
        position += 1;
        let QueuedTask { label, run, reply } = task;
        tracing::debug!("Dispatching #{} {}", position, label);

        let outcome = match AssertUnwindSafe(async move { run().await })
            .catch_unwind()
            .await
        {
            Ok(Ok(submission_id)) => {
                tracing::info!("Settled #{} {} -> {}", position, label, submission_id);
                Ok(SubmissionReceipt {
                    submission_id,
                    queue_position: position,
                })
            }
            Ok(Err(err)) => {
                tracing::warn!("Settled #{} {} with error: {}", position, label, err);
                Err(err)
            }
            Err(_) => {
                tracing::error!("Submission task #{} {} panicked", position, label);
                Err(AppError::Internal("Submission task panicked".to_string()))
            }
        };

        pending.fetch_sub(1, Ordering::SeqCst);
        // the caller may have gone away; the task still ran
        let _ = reply.send(outcome);
    }

    tracing::info!("Submission queue closed after {} tasks", position);
}
