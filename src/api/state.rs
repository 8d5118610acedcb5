//! Persisted state API handlers
//!
//! Raw JSON access to registered slots. Unregistered names are refused so
//! the HTTP surface cannot create slots no task reads.

use crate::error::AppError;
use crate::state::keys::{self, KeyEntry, KeyInfo};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    response::Json,
};
use serde_json::Value;

fn registered(name: &str) -> Result<&'static KeyEntry, AppError> {
    keys::lookup(name).ok_or_else(|| AppError::UnknownStateKey(name.to_string()))
}

/// GET /api/state - List registered keys with their defaults
pub async fn list_keys() -> Json<Vec<KeyInfo>> {
    Json(keys::describe())
}

/// GET /api/state/:key
///
/// Returns the stored value, or the key's default when nothing usable is stored.
pub async fn get_state(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<Value>, AppError> {
    let entry = registered(&key)?;
    Ok(Json(state.store().load_entry(entry).await))
}

/// PUT /api/state/:key
///
/// # Errors
/// * `UnknownStateKey` if the key is not registered
/// * `InvalidRequest` if the body does not match the key's type
pub async fn put_state(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(value): Json<Value>,
) -> Result<Json<Value>, AppError> {
    let entry = registered(&key)?;
    entry
        .validate(&value)
        .map_err(|e| AppError::InvalidRequest(format!("{}: {}", key, e)))?;
    state.store().store(&entry.raw_key(), &value).await?;
    Ok(Json(value))
}

/// DELETE /api/state/:key - Reset a slot, returning its default
pub async fn reset_state(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<Value>, AppError> {
    let entry = registered(&key)?;
    let value = state
        .store()
        .reset(&entry.raw_key(), entry.default_value())
        .await?;
    Ok(Json(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::state_for;
    use serde_json::json;

    #[tokio::test]
    async fn test_round_trip_and_reset() {
        let state = state_for("http://127.0.0.1:1");
        let key = "leadgen_inputs".to_string();
        let default = get_state(State(state.clone()), Path(key.clone()))
            .await
            .unwrap()
            .0;

        let mut edited = default.clone();
        edited["keyword"] = json!("hub bearing");
        put_state(State(state.clone()), Path(key.clone()), Json(edited.clone()))
            .await
            .unwrap();
        let Json(stored) = get_state(State(state.clone()), Path(key.clone())).await.unwrap();
        assert_eq!(stored["keyword"], "hub bearing");

        let Json(reset) = reset_state(State(state.clone()), Path(key.clone())).await.unwrap();
        assert_eq!(reset, default);
        let Json(after) = get_state(State(state), Path(key)).await.unwrap();
        assert_eq!(after, default);
    }

    #[tokio::test]
    async fn test_wrong_shaped_record_reads_as_default() {
        let state = state_for("http://127.0.0.1:1");
        let entry = keys::lookup("leadgen_inputs").unwrap();
        state
            .store()
            .store(&entry.raw_key(), &json!("just a string"))
            .await
            .unwrap();

        let Json(value) = get_state(State(state), Path("leadgen_inputs".to_string()))
            .await
            .unwrap();

        assert_eq!(value, entry.default_value());
    }

    #[tokio::test]
    async fn test_unknown_key_is_refused() {
        let state = state_for("http://127.0.0.1:1");
        let err = put_state(State(state), Path("scratch".to_string()), Json(json!(1)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UnknownStateKey(_)));
    }

    #[tokio::test]
    async fn test_mistyped_body_is_refused() {
        let state = state_for("http://127.0.0.1:1");
        let err = put_state(
            State(state),
            Path("global_settings".to_string()),
            Json(json!({"enableGlobalInfo": "yes"})),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_list_contains_every_key() {
        let Json(listed) = list_keys().await;
        assert_eq!(listed.len(), keys::ALL.len());
        assert!(listed.iter().any(|k| k.name == "video_script_v3_data"));
    }
}
