use axum::{extract::State, Json};
use serde::Serialize;
use super::AppState;
use crate::error::Result;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub ok: bool,
    pub version: String,
    pub chain_id: u64,
    pub submitter_identity: String,
    /// Wei, as a decimal string.
    pub submitter_balance: String,
    pub state_machine_address: String,
    pub queue_depth: usize,
    pub inflight: usize,
}

pub async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>> {
    let status = state.relayer.submitter_status().await?;

    Ok(Json(HealthResponse {
        ok: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
        chain_id: status.chain_id,
        submitter_identity: format!("{:#x}", status.submitter),
        submitter_balance: status.balance.to_string(),
        state_machine_address: format!("{:#x}", status.state_machine),
        queue_depth: state.relayer.queue_depth(),
        inflight: state.relayer.inflight_count().await,
    }))
}
