use std::sync::Arc;

use async_trait::async_trait;
use ethers::{
    contract::{ContractCall, ContractError},
    middleware::SignerMiddleware,
    providers::{Http, Middleware, Provider},
    signers::{LocalWallet, Signer},
    types::{Address, BlockId, BlockNumber, TransactionReceipt, TxHash, U256, U64},
};
use tokio::time::{sleep, Duration};

use crate::{
    config::Config,
    constants::{ERR_BAD_NONCE, ORDERING_CONFLICT_MARKERS},
    error::{AppError, Result},
    models::{intent::parse_address, JoinIntent, MoveIntent, SetNameIntent},
};

ethers::contract::abigen!(
    ArenaContract,
    r#"[
        function nonces(address player) view returns (uint256)
        function joinFor(address player, uint256 nonce, uint256 deadline, bytes signature)
        function moveFor(address player, uint8 dir, uint256 nonce, uint256 deadline, bytes signature)
        function setNameFor(address player, bytes12 name, uint256 nonce, uint256 deadline, bytes signature)
        function kick(address player)
    ]"#
);

type RelayClient = SignerMiddleware<Provider<Http>, LocalWallet>;

/// Identity and funding of the shared submitter account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitterStatus {
    pub chain_id: u64,
    pub submitter: Address,
    pub balance: U256,
    pub state_machine: Address,
}

/// The authoritative arena state machine. It owns per-player sequence
/// counters and is the only writer of game state.
#[async_trait]
pub trait StateMachine: Send + Sync {
    async fn current_sequence(&self, player: Address) -> Result<u64>;

    /// Each submit returns the submission id (transaction hash) once the
    /// submission is confirmed.
    async fn submit_join(&self, intent: &JoinIntent) -> Result<String>;
    async fn submit_move(&self, intent: &MoveIntent) -> Result<String>;
    async fn submit_set_name(&self, intent: &SetNameIntent) -> Result<String>;
    async fn submit_kick(&self, player: Address) -> Result<String>;

    async fn submitter_status(&self) -> Result<SubmitterStatus>;
}

/// Arena contract reached over JSON-RPC, signing with the relayer key.
pub struct EthersStateMachine {
    client: Arc<RelayClient>,
    contract: ArenaContract<RelayClient>,
    chain_id: u64,
    poll_attempts: usize,
    poll_interval: Duration,
}

impl EthersStateMachine {
    pub fn from_config(config: &Config) -> Result<Self> {
        let provider = Provider::<Http>::try_from(config.rpc_url.as_str())
            .map_err(|e| AppError::Internal(format!("Invalid RPC URL: {}", e)))?;
        let wallet = config
            .relayer_private_key
            .trim()
            .parse::<LocalWallet>()
            .map_err(|e| AppError::Internal(format!("Invalid relayer key: {}", e)))?
            .with_chain_id(config.chain_id);
        let state_machine = parse_address(&config.state_machine_address).map_err(|_| {
            AppError::Internal("STATE_MACHINE_ADDRESS is not a valid address".to_string())
        })?;

        let client = Arc::new(SignerMiddleware::new(provider, wallet));
        let contract = ArenaContract::new(state_machine, client.clone());

        Ok(Self {
            client,
            contract,
            chain_id: config.chain_id,
            poll_attempts: config.relayer_poll_attempts.max(1),
            poll_interval: Duration::from_millis(config.relayer_poll_interval_ms.max(1)),
        })
    }

    async fn send_and_confirm(&self, label: &str, call: ContractCall<RelayClient, ()>) -> Result<String> {
        let tx_hash: TxHash = *call.send().await.map_err(classify_contract_error)?;
        tracing::info!("Sent {} tx {:#x}", label, tx_hash);

        let receipt = self.wait_for_receipt(tx_hash).await?;
        let tx_hash_hex = format!("{:#x}", tx_hash);
        if receipt.status != Some(U64::zero()) {
            return Ok(tx_hash_hex);
        }

        // Mined but reverted: the receipt carries no reason, so replay the
        // call against the state of the block it landed in.
        let replay = match receipt.block_number {
            Some(block) => call.block(BlockId::Number(BlockNumber::Number(block))),
            None => call,
        };
        let outcome = replay.call().await;
        tracing::warn!("{} tx {} reverted", label, tx_hash_hex);
        Err(revert_outcome(&tx_hash_hex, outcome))
    }

    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<TransactionReceipt> {
        let mut last_error = "receipt not available yet".to_string();

        for attempt in 0..self.poll_attempts {
            match self.client.get_transaction_receipt(tx_hash).await {
                Ok(Some(receipt)) => return Ok(receipt),
                Ok(None) => {}
                Err(err) => last_error = err.to_string(),
            }
            if attempt + 1 < self.poll_attempts {
                sleep(self.poll_interval).await;
            }
        }

        Err(AppError::SubmissionFailure(format!(
            "Transaction {:#x} not confirmed: {}",
            tx_hash, last_error
        )))
    }
}

#[async_trait]
impl StateMachine for EthersStateMachine {
    async fn current_sequence(&self, player: Address) -> Result<u64> {
        let value = self
            .contract
            .nonces(player)
            .call()
            .await
            .map_err(|e| AppError::BlockchainRPC(e.to_string()))?;
        if value > U256::from(u64::MAX) {
            return Err(AppError::BlockchainRPC(
                "nonces() returned a value beyond u64".to_string(),
            ));
        }
        Ok(value.as_u64())
    }

    async fn submit_join(&self, intent: &JoinIntent) -> Result<String> {
        let call = self.contract.join_for(
            intent.player,
            U256::from(intent.sequence),
            U256::from(intent.expiry),
            intent.signature.clone(),
        );
        self.send_and_confirm("joinFor", call).await
    }

    async fn submit_move(&self, intent: &MoveIntent) -> Result<String> {
        let call = self.contract.move_for(
            intent.player,
            intent.dir.code(),
            U256::from(intent.sequence),
            U256::from(intent.expiry),
            intent.signature.clone(),
        );
        self.send_and_confirm("moveFor", call).await
    }

    async fn submit_set_name(&self, intent: &SetNameIntent) -> Result<String> {
        let call = self.contract.set_name_for(
            intent.player,
            intent.name,
            U256::from(intent.sequence),
            U256::from(intent.expiry),
            intent.signature.clone(),
        );
        self.send_and_confirm("setNameFor", call).await
    }

    async fn submit_kick(&self, player: Address) -> Result<String> {
        let call = self.contract.kick(player);
        self.send_and_confirm("kick", call).await
    }

    async fn submitter_status(&self) -> Result<SubmitterStatus> {
        let submitter = self.client.address();
        let chain_id = self
            .client
            .get_chainid()
            .await
            .map_err(|e| AppError::BlockchainRPC(e.to_string()))?;
        if chain_id != U256::from(self.chain_id) {
            tracing::warn!(
                "RPC reports chain {} but relayer signs for chain {}",
                chain_id,
                self.chain_id
            );
        }
        let balance = self
            .client
            .get_balance(submitter, None)
            .await
            .map_err(|e| AppError::BlockchainRPC(e.to_string()))?;

        Ok(SubmitterStatus {
            chain_id: self.chain_id,
            submitter,
            balance,
            state_machine: self.contract.address(),
        })
    }
}

fn classify_contract_error(err: ContractError<RelayClient>) -> AppError {
    let reason = err.decode_revert::<String>();
    let text = match reason {
        Some(reason) => reason,
        None => err.to_string(),
    };
    classify_submission_error(&text)
}

/// Maps the replay of a reverted transaction to an error. A replay that
/// succeeds means the revert depended on ordering within the block.
fn revert_outcome(tx_hash_hex: &str, replay: std::result::Result<(), ContractError<RelayClient>>) -> AppError {
    match replay {
        Err(err) => classify_contract_error(err),
        Ok(()) => AppError::SubmissionFailure(format!("Transaction reverted: {}", tx_hash_hex)),
    }
}

/// Stale sequences and submitter nonce races are ordering conflicts (409);
/// everything else is a plain submission failure carrying the raw text.
pub fn classify_submission_error(message: &str) -> AppError {
    let lowered = message.to_ascii_lowercase();
    if lowered.contains("bad nonce") {
        return AppError::OrderingConflict(ERR_BAD_NONCE.to_string());
    }
    if ORDERING_CONFLICT_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
    {
        return AppError::OrderingConflict(message.to_string());
    }
    AppError::SubmissionFailure(message.to_string())
}
