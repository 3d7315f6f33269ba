use axum::{
    extract::{Path, State},
    Json,
};

use super::AppState;
use crate::{
    error::Result,
    models::{intent::parse_address, ApiResponse, SequenceResponse},
};

/// GET /sequence/{player}
pub async fn get_sequence(
    State(state): State<AppState>,
    Path(player): Path<String>,
) -> Result<Json<ApiResponse<SequenceResponse>>> {
    let player = parse_address(&player)?;
    let sequence = state.relayer.current_sequence(player).await?;

    Ok(Json(ApiResponse::success(SequenceResponse {
        player: format!("{:#x}", player),
        sequence,
    })))
}
