//! In-memory arena used by tests. Sequence checks and increments happen in a
//! single critical section, like the contract's own `nonces[player]++`.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use ethers::types::{Address, U256};
use tokio::sync::Semaphore;

use super::onchain::{StateMachine, SubmitterStatus};
use crate::{
    constants::ERR_BAD_NONCE,
    error::{AppError, Result},
    models::{JoinIntent, MoveIntent, SetNameIntent},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub kind: &'static str,
    pub player: Address,
    pub sequence: Option<u64>,
}

#[derive(Default)]
struct Ledger {
    sequences: HashMap<Address, u64>,
    joined: HashSet<Address>,
    submissions: u64,
}

pub struct FakeStateMachine {
    ledger: Mutex<Ledger>,
    calls: Mutex<Vec<RecordedCall>>,
    failures: Mutex<Vec<AppError>>,
    gated: AtomicBool,
    gate: Semaphore,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl FakeStateMachine {
    pub fn new() -> Self {
        Self {
            ledger: Mutex::new(Ledger::default()),
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(Vec::new()),
            gated: AtomicBool::new(false),
            gate: Semaphore::new(0),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
        }
    }

    pub fn with_player(self, player: Address, sequence: u64, joined: bool) -> Self {
        {
            let mut ledger = self.ledger.lock().expect("ledger lock");
            ledger.sequences.insert(player, sequence);
            if joined {
                ledger.joined.insert(player);
            }
        }
        self
    }

    /// Submissions block after being recorded until `release` is called.
    pub fn hold(&self) {
        self.gated.store(true, Ordering::SeqCst);
    }

    pub fn release(&self, submissions: usize) {
        self.gate.add_permits(submissions);
    }

    /// The next submission fails with `error` instead of applying.
    pub fn fail_next(&self, error: AppError) {
        self.failures.lock().expect("failures lock").push(error);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn sequence_of(&self, player: Address) -> u64 {
        self.ledger
            .lock()
            .expect("ledger lock")
            .sequences
            .get(&player)
            .copied()
            .unwrap_or(0)
    }

    pub fn is_joined(&self, player: Address) -> bool {
        self.ledger.lock().expect("ledger lock").joined.contains(&player)
    }

    pub fn max_concurrent_submissions(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    async fn apply(
        &self,
        kind: &'static str,
        player: Address,
        sequence: Option<u64>,
        requires_join: bool,
    ) -> Result<String> {
        self.calls.lock().expect("calls lock").push(RecordedCall {
            kind,
            player,
            sequence,
        });

        let running = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(running, Ordering::SeqCst);

        if self.gated.load(Ordering::SeqCst) {
            if let Ok(permit) = self.gate.acquire().await {
                permit.forget();
            }
        }

        let outcome = self.commit(kind, player, sequence, requires_join);
        self.active.fetch_sub(1, Ordering::SeqCst);
        outcome
    }

    fn commit(
        &self,
        kind: &'static str,
        player: Address,
        sequence: Option<u64>,
        requires_join: bool,
    ) -> Result<String> {
        if let Some(error) = self.failures.lock().expect("failures lock").pop() {
            return Err(error);
        }

        let mut ledger = self.ledger.lock().expect("ledger lock");
        if let Some(sequence) = sequence {
            let current = ledger.sequences.get(&player).copied().unwrap_or(0);
            if sequence != current {
                return Err(AppError::OrderingConflict(ERR_BAD_NONCE.to_string()));
            }
            if requires_join && !ledger.joined.contains(&player) {
                return Err(AppError::SubmissionFailure("Not joined".to_string()));
            }
            ledger.sequences.insert(player, current + 1);
        }
        if kind == "join" {
            ledger.joined.insert(player);
        }
        if kind == "kick" {
            ledger.joined.remove(&player);
        }
        ledger.submissions += 1;
        Ok(format!("0x{:064x}", ledger.submissions))
    }
}

#[async_trait]
impl StateMachine for FakeStateMachine {
    async fn current_sequence(&self, player: Address) -> Result<u64> {
        Ok(self.sequence_of(player))
    }

    async fn submit_join(&self, intent: &JoinIntent) -> Result<String> {
        self.apply("join", intent.player, Some(intent.sequence), false)
            .await
    }

    async fn submit_move(&self, intent: &MoveIntent) -> Result<String> {
        self.apply("move", intent.player, Some(intent.sequence), true)
            .await
    }

    async fn submit_set_name(&self, intent: &SetNameIntent) -> Result<String> {
        self.apply("set_name", intent.player, Some(intent.sequence), true)
            .await
    }

    async fn submit_kick(&self, player: Address) -> Result<String> {
        self.apply("kick", player, None, false).await
    }

    async fn submitter_status(&self) -> Result<SubmitterStatus> {
        Ok(SubmitterStatus {
            chain_id: 31337,
            submitter: Address::repeat_byte(0xaa),
            balance: U256::exp10(18),
            state_machine: Address::repeat_byte(0x5f),
        })
    }
}

pub fn player(byte: u8) -> Address {
    Address::repeat_byte(byte)
}
