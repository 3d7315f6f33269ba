use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use ethers::types::Address;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::Mutex;

use super::submission_queue::{SubmissionQueue, SubmissionReceipt};
use crate::error::{AppError, Result};

pub type SharedSubmission = Shared<BoxFuture<'static, Result<SubmissionReceipt>>>;

pub struct InflightRun {
    /// True when the caller was attached to an already outstanding
    /// submission instead of creating a new one.
    pub deduped: bool,
    pub handle: SharedSubmission,
}

/// At most one outstanding submission per player. Repeats while one is
/// outstanding share its handle; the entry disappears once it settles.
#[derive(Clone, Default)]
pub struct InflightTable {
    entries: Arc<Mutex<HashMap<Address, SharedSubmission>>>,
}

impl InflightTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn run_once<F, Fut>(
        &self,
        player: Address,
        queue: &SubmissionQueue,
        label: impl Into<String>,
        task: F,
    ) -> InflightRun
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<String>> + Send + 'static,
    {
        let mut entries = self.entries.lock().await;
        if let Some(existing) = entries.get(&player) {
            tracing::debug!("Deduped submission for {:#x}", player);
            return InflightRun {
                deduped: true,
                handle: existing.clone(),
            };
        }

        let submission = queue.enqueue(label, task);
        let table = self.entries.clone();
        // Cleanup runs in its own task so it happens even if every waiter
        // disconnects. It cannot get the lock until this insert is done.
        let driver = tokio::spawn(async move {
            let outcome = submission.await;
            table.lock().await.remove(&player);
            outcome
        });

        let handle = async move {
            driver
                .await
                .map_err(|e| AppError::Internal(format!("In-flight driver failed: {}", e)))?
        }
        .boxed()
        .shared();

        entries.insert(player, handle.clone());
        InflightRun {
            deduped: false,
            handle,
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}
