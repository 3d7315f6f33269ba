use super::{parse_body, AppState};
use crate::{
    constants::ADMIN_KEY_HEADER,
    error::{AppError, Result},
    models::{intent::parse_address, ApiResponse, KickRequest, SubmissionResponse},
};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, HeaderName},
    Json,
};

// Without RELAYER_ADMIN_KEY the endpoint is open on dev chains only.
fn require_admin_key(headers: &HeaderMap, state: &AppState) -> Result<()> {
    let Some(expected) = state
        .config
        .relayer_admin_key
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
    else {
        if state.config.is_testnet() {
            return Ok(());
        }
        return Err(AppError::AuthError(
            "RELAYER_ADMIN_KEY is not configured; /kick is disabled".to_string(),
        ));
    };

    let header_name = HeaderName::from_static(ADMIN_KEY_HEADER);
    let provided = headers
        .get(&header_name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| {
            AppError::AuthError(format!(
                "Missing admin key. Send header '{}' to access this endpoint.",
                ADMIN_KEY_HEADER
            ))
        })?;

    if provided != expected {
        return Err(AppError::AuthError("Invalid admin key".to_string()));
    }
    Ok(())
}

/// POST /kick
pub async fn kick(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: std::result::Result<Json<KickRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<SubmissionResponse>>> {
    require_admin_key(&headers, &state)?;

    let req = parse_body(payload)?;
    let player = parse_address(&req.player)?;
    tracing::info!("Kick requested for {:#x}", player);
    let receipt = state.relayer.kick(player).await?;

    Ok(Json(ApiResponse::success(SubmissionResponse {
        submission_id: receipt.submission_id,
    })))
}
