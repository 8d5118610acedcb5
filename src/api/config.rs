//! Runtime configuration API handlers

use crate::error::AppError;
use crate::generation::config::{validate_and_apply_config_update, ConfigUpdateRequest};
use crate::generation::GenerationConfig;
use crate::state::AppState;
use crate::tracker::TrackerPolicy;
use axum::{extract::State, response::Json};
use serde::Serialize;

/// Current configuration
#[derive(Debug, Serialize)]
pub struct ConfigResponse {
    /// Generation client settings
    pub generation: GenerationConfig,
    /// Video polling policy
    pub tracker: TrackerPolicy,
}

/// GET /api/config
pub async fn get_config(State(state): State<AppState>) -> Json<ConfigResponse> {
    Json(ConfigResponse {
        generation: state.client().await.config().clone(),
        tracker: state.policy(),
    })
}

/// POST /api/config - Update models or timeout for subsequent requests
///
/// Requests already in flight keep the client they started with.
///
/// # Errors
/// * `Validation` if a field is empty or the timeout is zero; nothing changes
pub async fn update_config(
    State(state): State<AppState>,
    Json(request): Json<ConfigUpdateRequest>,
) -> Result<Json<ConfigResponse>, AppError> {
    let current = state.client().await;
    let updated = validate_and_apply_config_update(current.config().clone(), request)?;
    let client = current.reconfigure(updated)?;
    tracing::info!(
        text_model = %client.config().text_model,
        image_model = %client.config().image_model,
        video_model = %client.config().video_model,
        "Generation config updated"
    );
    state.replace_client(client).await;
    Ok(get_config(State(state)).await)
}
