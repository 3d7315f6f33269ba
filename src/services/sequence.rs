use std::sync::Arc;

use ethers::types::Address;

use super::onchain::StateMachine;
use crate::error::Result;

/// Reads per-player sequence counters straight from the state machine.
/// Nothing is cached; the contract is the source of truth.
#[derive(Clone)]
pub struct SequenceTracker {
    state_machine: Arc<dyn StateMachine>,
}

impl SequenceTracker {
    pub fn new(state_machine: Arc<dyn StateMachine>) -> Self {
        Self { state_machine }
    }

    pub async fn current(&self, player: Address) -> Result<u64> {
        self.state_machine.current_sequence(player).await
    }
}
