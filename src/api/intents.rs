use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};

use super::{parse_body, AppState};
use crate::{
    error::Result,
    models::{
        ApiResponse, Intent, JoinIntent, JoinRequest, MoveIntent, MoveRequest, MoveResponse,
        SetNameIntent, SetNameRequest, SubmissionResponse,
    },
};

/// POST /join
pub async fn join(
    State(state): State<AppState>,
    payload: std::result::Result<Json<JoinRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<SubmissionResponse>>> {
    let intent = JoinIntent::try_from(parse_body(payload)?)?;
    let outcome = state.relayer.relay(Intent::Join(intent)).await?;

    Ok(Json(ApiResponse::success(SubmissionResponse {
        submission_id: outcome.receipt.submission_id,
    })))
}

/// POST /set-name
pub async fn set_name(
    State(state): State<AppState>,
    payload: std::result::Result<Json<SetNameRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<SubmissionResponse>>> {
    let intent = SetNameIntent::try_from(parse_body(payload)?)?;
    let outcome = state.relayer.relay(Intent::SetName(intent)).await?;

    Ok(Json(ApiResponse::success(SubmissionResponse {
        submission_id: outcome.receipt.submission_id,
    })))
}

/// POST /move
///
/// A repeat from a player whose previous move is still outstanding gets that
/// move's outcome back with `deduped: true`.
pub async fn move_player(
    State(state): State<AppState>,
    payload: std::result::Result<Json<MoveRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<MoveResponse>>> {
    let intent = MoveIntent::try_from(parse_body(payload)?)?;
    let outcome = state.relayer.relay(Intent::Move(intent)).await?;

    Ok(Json(ApiResponse::success(MoveResponse {
        submission_id: outcome.receipt.submission_id,
        deduped: outcome.deduped,
    })))
}
