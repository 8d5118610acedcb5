//! Video job API handlers
//!
//! Start, poll once, resolve the download URL, or follow a job to the end
//! over SSE. A handle can have at most one tracker at a time; a second
//! tracking request for the same handle gets 409.

use crate::api::{sse_response, to_event, SSE_DONE_SIGNAL};
use crate::error::AppError;
use crate::generation::{Operation, VideoAspectRatio};
use crate::state::AppState;
use crate::tracker::{OperationPoller, OperationTracker};
use async_stream::stream;
use axum::{extract::State, response::Json, response::Response};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Video start request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartVideoRequest {
    /// Scene prompt
    pub prompt: String,
    /// "16:9" or "9:16"
    #[serde(default)]
    pub aspect_ratio: VideoAspectRatio,
}

/// Download URL response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadUrlResponse {
    /// Fetchable URL with the credential appended
    pub download_url: String,
}

/// POST /api/video
pub async fn start_video(
    State(state): State<AppState>,
    Json(request): Json<StartVideoRequest>,
) -> Result<Json<Operation>, AppError> {
    let operation = state
        .client()
        .await
        .start_video_generation(&request.prompt, request.aspect_ratio)
        .await?;
    Ok(Json(operation))
}

/// POST /api/video/poll
///
/// Body is the caller's current snapshot; the response is the next one.
pub async fn poll_video(
    State(state): State<AppState>,
    Json(operation): Json<Operation>,
) -> Result<Json<Operation>, AppError> {
    let next = state.client().await.poll_operation(&operation).await?;
    Ok(Json(next))
}

/// POST /api/video/url
///
/// # Errors
/// * `OperationFailure` (409) if the snapshot is not DONE
pub async fn resolve_url(
    State(state): State<AppState>,
    Json(operation): Json<Operation>,
) -> Result<Json<DownloadUrlResponse>, AppError> {
    let download_url = state.client().await.resolve_download_url(&operation)?;
    Ok(Json(DownloadUrlResponse { download_url }))
}

/// POST /api/video/track - Follow a job until it finishes
///
/// Streams one event per snapshot, then the `TrackedVideo` and `[DONE]`,
/// or `[ERROR] <message>` if the job fails or times out. Closing the
/// connection stops the tracker.
///
/// # Errors
/// * `OperationInUse` if another tracker already follows this handle
pub async fn track_video(
    State(state): State<AppState>,
    Json(operation): Json<Operation>,
) -> Result<Response, AppError> {
    let claim = state
        .registry()
        .claim(&operation.handle)
        .ok_or_else(|| AppError::OperationInUse(operation.handle.clone()))?;

    let poller: Arc<dyn OperationPoller> = Arc::new(state.client().await);
    let tracker = OperationTracker::new(poller, operation, state.policy()).with_claim(claim);
    let mut updates = tracker.subscribe();
    let cancel = CancellationToken::new();
    let guard = cancel.clone().drop_guard();
    let job = tokio::spawn(tracker.track(cancel));

    let events = stream! {
        let _guard = guard;
        while updates.changed().await.is_ok() {
            let snapshot = updates.borrow_and_update().clone();
            yield to_event(&snapshot);
        }

        match job.await {
            Ok(Ok(video)) => {
                yield to_event(&video);
                yield Ok(SSE_DONE_SIGNAL.to_string());
            }
            Ok(Err(e)) => yield Err(AppError::from(e)),
            Err(e) => yield Err(AppError::Internal(anyhow::anyhow!("Tracker task failed: {}", e))),
        }
    };

    sse_response(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::{body_text, sse_events, state_for};
    use crate::generation::OperationStatus;
    use mockito::{Matcher, Server};
    use serde_json::{json, Value};
    use serial_test::serial;

    const START_PATH: &str = "/models/veo-3.1-fast-generate-preview:predictLongRunning";

    #[tokio::test]
    #[serial]
    async fn test_start_and_poll() {
        let mut server = Server::new_async().await;
        let _start = server
            .mock("POST", START_PATH)
            .match_query(Matcher::Any)
            .match_body(Matcher::PartialJson(json!({"parameters": {"aspectRatio": "9:16"}})))
            .with_status(200)
            .with_body(r#"{"name": "operations/v1"}"#)
            .create_async()
            .await;
        let _poll = server
            .mock("GET", "/operations/v1")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"name": "operations/v1", "done": false}"#)
            .create_async()
            .await;
        let state = state_for(&server.url());

        let Json(started) = start_video(
            State(state.clone()),
            Json(StartVideoRequest {
                prompt: "a bearing spinning".to_string(),
                aspect_ratio: VideoAspectRatio::Portrait,
            }),
        )
        .await
        .unwrap();
        assert_eq!(started.status, OperationStatus::Initiated);

        let Json(polled) = poll_video(State(state), Json(started.clone())).await.unwrap();
        assert_eq!(polled.status, OperationStatus::Polling);
        assert_eq!(polled.polls, 1);
        assert_eq!(started.polls, 0);
    }

    #[tokio::test]
    async fn test_url_for_unfinished_job_is_conflict() {
        let state = state_for("http://127.0.0.1:1");
        let err = resolve_url(State(state), Json(Operation::initiated("operations/x")))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::CONFLICT);
    }

    #[tokio::test]
    #[serial]
    async fn test_track_streams_until_done() {
        let mut server = Server::new_async().await;
        let _poll = server
            .mock("GET", "/operations/t1")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(
                r#"{"name": "operations/t1", "done": true,
                    "response": {"generatedVideos": [{"video": {"uri": "https://media/t1"}}]}}"#,
            )
            .create_async()
            .await;
        let state = state_for(&server.url());

        let response = track_video(State(state.clone()), Json(Operation::initiated("operations/t1")))
            .await
            .unwrap();
        let body = body_text(response).await;
        let events = sse_events(&body);

        assert_eq!(events.last().map(String::as_str), Some(SSE_DONE_SIGNAL));
        let video: Value = serde_json::from_str(&events[events.len() - 2]).unwrap();
        assert_eq!(video["downloadUrl"], "https://media/t1?key=test-key");
        assert!(state.registry().is_empty());
    }

    #[tokio::test]
    #[serial]
    async fn test_track_reports_failure() {
        let mut server = Server::new_async().await;
        let _poll = server
            .mock("GET", "/operations/t2")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"name": "operations/t2", "done": true, "error": {"message": "quota"}}"#)
            .create_async()
            .await;
        let state = state_for(&server.url());

        let response = track_video(State(state), Json(Operation::initiated("operations/t2")))
            .await
            .unwrap();
        let body = body_text(response).await;
        let events = sse_events(&body);

        let last = events.last().unwrap();
        assert!(last.starts_with("[ERROR]"), "last event: {}", last);
        assert!(last.contains("quota"));
    }

    #[tokio::test]
    async fn test_second_tracker_for_handle_is_refused() {
        let state = state_for("http://127.0.0.1:1");
        let _held = state.registry().claim("operations/busy").unwrap();

        let err = track_video(State(state), Json(Operation::initiated("operations/busy")))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::OperationInUse(_)));
    }
}
