//! API module
//!
//! HTTP handlers for generation, video tracking, persisted state, runtime
//! configuration and the task orchestrators. Long-running endpoints stream
//! Server-Sent Events terminated by `[DONE]` or `[ERROR] <message>`.

pub mod config;
pub mod generation;
pub mod state;
pub mod tasks;
pub mod video;

use crate::error::AppError;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{Json, Response},
    routing::{delete, get, post},
    Router,
};
use futures_util::{Stream, StreamExt};
use serde::Serialize;

/// Final event of a successful stream
pub const SSE_DONE_SIGNAL: &str = "[DONE]";
/// Prefix of the final event of a failed stream
pub const SSE_ERROR_PREFIX: &str = "[ERROR]";

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always "healthy" when the server answers
    pub status: String,
    /// Crate version
    pub version: String,
    /// Whether an API key is currently available
    pub credentials: bool,
}

/// GET /api/health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        credentials: state.client().await.has_credentials(),
    })
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        // Generation client
        .route("/api/generate/text", post(generation::generate_text))
        .route("/api/generate/structured", post(generation::generate_structured))
        .route("/api/generate/image", post(generation::generate_image))
        .route("/api/generate/reverse-image", post(generation::reverse_image))
        // Video jobs
        .route("/api/video", post(video::start_video))
        .route("/api/video/poll", post(video::poll_video))
        .route("/api/video/url", post(video::resolve_url))
        .route("/api/video/track", post(video::track_video))
        // Persisted state
        .route("/api/state", get(state::list_keys))
        .route(
            "/api/state/:key",
            get(state::get_state)
                .put(state::put_state)
                .delete(state::reset_state),
        )
        // Runtime configuration
        .route("/api/config", get(config::get_config).post(config::update_config))
        // Tasks
        .route(
            "/api/settings",
            get(tasks::get_settings)
                .put(tasks::put_settings)
                .delete(tasks::reset_settings),
        )
        .route(
            "/api/tasks/marketing",
            post(tasks::generate_marketing).merge(tasks::reset_route("marketing")),
        )
        .route(
            "/api/tasks/outreach",
            post(tasks::generate_outreach).merge(tasks::reset_route("outreach")),
        )
        .route(
            "/api/tasks/lead-gen",
            post(tasks::generate_lead_gen).merge(tasks::reset_route("lead-gen")),
        )
        .route(
            "/api/tasks/fission",
            post(tasks::generate_fission).merge(tasks::reset_route("fission")),
        )
        .route(
            "/api/tasks/listing",
            post(tasks::generate_listing).merge(tasks::reset_route("listing")),
        )
        .route(
            "/api/tasks/image",
            post(tasks::generate_image).merge(tasks::reset_route("image")),
        )
        .route(
            "/api/tasks/image/source",
            post(tasks::set_image_source).delete(tasks::clear_image_source),
        )
        .route(
            "/api/tasks/video-script",
            post(tasks::generate_video_script).merge(tasks::reset_route("video-script")),
        )
        .route(
            "/api/tasks/video-script/scenes/:id",
            post(tasks::start_scene),
        )
        .route(
            "/api/tasks/video-script/render-all",
            post(tasks::render_all_scenes),
        )
        .route("/api/tasks/:task", delete(tasks::reset_task))
        .with_state(state)
}

/// Format a stream of event payloads as SSE lines
///
/// Errors become a final `data: [ERROR] <message>` event.
fn format_sse_stream(
    stream: impl Stream<Item = Result<String, AppError>> + Send + 'static,
) -> impl Stream<Item = Result<String, std::io::Error>> {
    stream.map(|event_result| {
        let sse_text = match event_result {
            Ok(data) => format!("data: {}\n\n", data),
            Err(e) => format!("data: {} {}\n\n", SSE_ERROR_PREFIX, e),
        };
        Ok::<_, std::io::Error>(sse_text)
    })
}

/// Wrap an event stream in a `text/event-stream` response
///
/// # Errors
/// * `AppError::Internal` if the response cannot be built
pub(crate) fn sse_response(
    stream: impl Stream<Item = Result<String, AppError>> + Send + 'static,
) -> Result<Response, AppError> {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/event-stream")
        .header(header::CACHE_CONTROL, "no-cache")
        .header(header::CONNECTION, "keep-alive")
        .body(Body::from_stream(format_sse_stream(stream)))
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to build SSE response: {}", e)))
}

/// Serialize an event payload
pub(crate) fn to_event<T: Serialize>(value: &T) -> Result<String, AppError> {
    serde_json::to_string(value)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize event: {}", e)))
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use futures_util::stream;

    #[tokio::test]
    async fn test_health_reports_credentials() {
        let state = test_support::state_for("http://127.0.0.1:1");
        let Json(health) = health_check(State(state)).await;
        assert_eq!(health.status, "healthy");
        assert!(health.credentials);
    }

    #[tokio::test]
    async fn test_sse_response_formats_events_and_errors() {
        let events = stream::iter(vec![
            Ok("{\"a\":1}".to_string()),
            Err(AppError::InvalidRequest("bad".to_string())),
        ]);

        let response = sse_response(events).unwrap();
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/event-stream"
        );

        let body = body_text(response).await;
        assert_eq!(
            sse_events(&body),
            ["{\"a\":1}", "[ERROR] Invalid request: bad"]
        );
    }
}
