use std::sync::Arc;

use ethers::types::Address;

use super::{
    inflight::InflightTable,
    onchain::{EthersStateMachine, StateMachine, SubmitterStatus},
    sequence::SequenceTracker,
    submission_queue::{SubmissionQueue, SubmissionReceipt},
};
use crate::{
    config::Config,
    constants::{ERR_BAD_NONCE, ERR_INTENT_EXPIRED},
    crypto::{
        digest::{decode_name, digest_intent, DomainSeparator},
        signature::SignatureVerifier,
    },
    error::{AppError, Result},
    models::{intent::parse_address, Intent},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayResult {
    pub receipt: SubmissionReceipt,
    /// The request was attached to the player's outstanding move instead of
    /// producing its own submission.
    pub deduped: bool,
}

/// The one relaying context of the process: owns the submission queue and
/// the in-flight table for the shared submitter identity.
pub struct RelayerService {
    domain: DomainSeparator,
    state_machine: Arc<dyn StateMachine>,
    sequences: SequenceTracker,
    queue: SubmissionQueue,
    inflight: InflightTable,
}

impl RelayerService {
    pub fn new(domain: DomainSeparator, state_machine: Arc<dyn StateMachine>) -> Self {
        Self {
            domain,
            sequences: SequenceTracker::new(state_machine.clone()),
            state_machine,
            queue: SubmissionQueue::spawn(),
            inflight: InflightTable::new(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let state_machine = EthersStateMachine::from_config(config)?;
        let contract = parse_address(&config.state_machine_address).map_err(|_| {
            AppError::Internal("STATE_MACHINE_ADDRESS is not a valid address".to_string())
        })?;
        let domain = DomainSeparator::new(config.chain_id, contract);
        Ok(Self::new(domain, Arc::new(state_machine)))
    }

    /// Verifies `intent` and submits it in queue order. Moves from a player
    /// that already has one outstanding are collapsed onto it.
    pub async fn relay(&self, intent: Intent) -> Result<RelayResult> {
        self.authorize(&intent).await?;

        let label = match &intent {
            Intent::SetName(rename) => format!(
                "set_name {:#x} seq={} name={:?}",
                rename.player,
                rename.sequence,
                decode_name(&rename.name)
            ),
            other => format!(
                "{} {:#x} seq={}",
                other.kind().as_str(),
                other.player(),
                other.sequence()
            ),
        };
        let state_machine = self.state_machine.clone();

        let result = match intent {
            Intent::Move(intent) => {
                let run = self
                    .inflight
                    .run_once(intent.player, &self.queue, label.clone(), move || async move {
                        state_machine.submit_move(&intent).await
                    })
                    .await;
                RelayResult {
                    receipt: run.handle.await?,
                    deduped: run.deduped,
                }
            }
            Intent::Join(intent) => RelayResult {
                receipt: self
                    .queue
                    .enqueue(label.clone(), move || async move {
                        state_machine.submit_join(&intent).await
                    })
                    .await?,
                deduped: false,
            },
            Intent::SetName(intent) => RelayResult {
                receipt: self
                    .queue
                    .enqueue(label.clone(), move || async move {
                        state_machine.submit_set_name(&intent).await
                    })
                    .await?,
                deduped: false,
            },
        };

        tracing::info!(
            "Relayed {} as #{}{}",
            label,
            result.receipt.queue_position,
            if result.deduped { " (deduped)" } else { "" }
        );
        Ok(result)
    }

    /// Unsigned administrative kick. The contract decides whether the
    /// player is actually inactive.
    pub async fn kick(&self, player: Address) -> Result<SubmissionReceipt> {
        let state_machine = self.state_machine.clone();
        self.queue
            .enqueue(format!("kick {:#x}", player), move || async move {
                state_machine.submit_kick(player).await
            })
            .await
    }

    pub async fn current_sequence(&self, player: Address) -> Result<u64> {
        self.sequences.current(player).await
    }

    pub async fn submitter_status(&self) -> Result<SubmitterStatus> {
        self.state_machine.submitter_status().await
    }

    pub fn queue_depth(&self) -> usize {
        self.queue.pending()
    }

    pub async fn inflight_count(&self) -> usize {
        self.inflight.len().await
    }

    async fn authorize(&self, intent: &Intent) -> Result<()> {
        let now = chrono::Utc::now().timestamp().max(0) as u64;
        if intent.is_expired_at(now) {
            return Err(AppError::Validation(ERR_INTENT_EXPIRED.to_string()));
        }

        let digest = digest_intent(&self.domain, intent);
        if !SignatureVerifier::verify(intent.player(), &digest, intent.signature()) {
            tracing::warn!(
                "Rejected {} for {:#x}: signature does not match",
                intent.kind().as_str(),
                intent.player()
            );
            return Err(AppError::InvalidSignature);
        }

        // Sequences ahead of the counter may still land after queued
        // predecessors; only ones already consumed are rejected here.
        let current = self.sequences.current(intent.player()).await?;
        if intent.sequence() < current {
            tracing::debug!(
                "Stale {} for {:#x}: seq {} < {}",
                intent.kind().as_str(),
                intent.player(),
                intent.sequence(),
                current
            );
            return Err(AppError::OrderingConflict(ERR_BAD_NONCE.to_string()));
        }
        Ok(())
    }
}
