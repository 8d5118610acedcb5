//! Task API handlers
//!
//! Each request builds the task orchestrator over the shared client and
//! store, so a config change applies to the next task run. Request bodies
//! are the task's input form; the form is persisted before generating.

use crate::api::{sse_response, to_event, SSE_DONE_SIGNAL};
use crate::error::AppError;
use crate::generation::{GenerationClient, GenerationError, Operation, SourceMedia};
use crate::state::AppState;
use crate::tasks::copywriting::{
    MarketingAssistant, MarketingInputs, OutreachAssistant, OutreachEmail, OutreachInputs,
};
use crate::tasks::image_studio::{ImageStudio, ImageStudioInputs, ImageStudioResults};
use crate::tasks::lead_gen::{LeadGenAssistant, LeadGenInputs, LeadGenResults};
use crate::tasks::product_fission::{FissionInputs, FissionResults, ProductFission};
use crate::tasks::product_listing::{ListingInputs, ListingResults, ProductListing};
use crate::tasks::settings::{GlobalSettings, Settings};
use crate::tasks::video_script::{ScriptData, VideoScriptAssistant, VideoScriptInputs};
use crate::tracker::{BatchProgress, TrackedVideo};
use async_stream::stream;
use axum::{
    extract::{Path, State},
    response::{Json, Response},
    routing::{delete, MethodRouter},
};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

/// Generic message response
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    /// Human-readable message
    pub message: String,
    /// Status indicator
    pub status: String,
}

/// Copy generated by the marketing assistant
#[derive(Debug, Serialize)]
pub struct CopyResponse {
    /// Generated copy
    pub text: String,
}

/// Reference image upload
#[derive(Debug, Deserialize)]
pub struct SourceImageRequest {
    /// Image as a `data:` URL or bare base64
    pub image: String,
}

/// Prompt inverted from an uploaded reference image
#[derive(Debug, Serialize)]
pub struct SourceImageResponse {
    /// Reversed prompt, now also the image studio's prompt input
    pub prompt: String,
}

/// Outcome of one scene in a batch render
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneRender {
    /// Scene id from the script
    pub scene_id: i64,
    /// Finished video
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<TrackedVideo>,
    /// Why the scene has no video
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Event streamed by the batch render endpoint
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RenderEvent {
    /// Aggregate progress
    Progress(BatchProgress),
    /// Per-scene outcomes in scene order, sent once at the end
    Scenes(Vec<SceneRender>),
}

fn video_assistant(state: &AppState, client: GenerationClient) -> VideoScriptAssistant {
    VideoScriptAssistant::new(
        client,
        state.store().clone(),
        state.policy(),
        state.registry().clone(),
    )
}

async fn image_studio(state: &AppState) -> ImageStudio {
    ImageStudio::with_source(
        state.client().await,
        state.store().clone(),
        state.image_source().clone(),
    )
}

/// GET /api/settings
pub async fn get_settings(State(state): State<AppState>) -> Json<GlobalSettings> {
    Json(Settings::new(state.store().clone()).get().await)
}

/// PUT /api/settings
pub async fn put_settings(
    State(state): State<AppState>,
    Json(settings): Json<GlobalSettings>,
) -> Result<Json<GlobalSettings>, AppError> {
    Settings::new(state.store().clone()).set(&settings).await?;
    Ok(Json(settings))
}

/// DELETE /api/settings - Restore defaults
pub async fn reset_settings(
    State(state): State<AppState>,
) -> Result<Json<GlobalSettings>, AppError> {
    let settings = Settings::new(state.store().clone()).reset().await?;
    Ok(Json(settings))
}

/// POST /api/tasks/marketing
pub async fn generate_marketing(
    State(state): State<AppState>,
    Json(inputs): Json<MarketingInputs>,
) -> Result<Json<CopyResponse>, AppError> {
    let assistant = MarketingAssistant::new(state.client().await, state.store().clone());
    let text = assistant.generate(inputs).await?;
    Ok(Json(CopyResponse { text }))
}

/// POST /api/tasks/outreach
pub async fn generate_outreach(
    State(state): State<AppState>,
    Json(inputs): Json<OutreachInputs>,
) -> Result<Json<OutreachEmail>, AppError> {
    let assistant = OutreachAssistant::new(state.client().await, state.store().clone());
    Ok(Json(assistant.generate(inputs).await?))
}

/// POST /api/tasks/lead-gen
pub async fn generate_lead_gen(
    State(state): State<AppState>,
    Json(inputs): Json<LeadGenInputs>,
) -> Result<Json<LeadGenResults>, AppError> {
    let assistant = LeadGenAssistant::new(state.client().await, state.store().clone());
    Ok(Json(assistant.generate(inputs).await?))
}

/// POST /api/tasks/fission
pub async fn generate_fission(
    State(state): State<AppState>,
    Json(inputs): Json<FissionInputs>,
) -> Result<Json<FissionResults>, AppError> {
    let task = ProductFission::new(state.client().await, state.store().clone());
    Ok(Json(task.generate(inputs).await?))
}

/// POST /api/tasks/listing
pub async fn generate_listing(
    State(state): State<AppState>,
    Json(inputs): Json<ListingInputs>,
) -> Result<Json<ListingResults>, AppError> {
    let task = ProductListing::new(state.client().await, state.store().clone());
    Ok(Json(task.generate(inputs).await?))
}

/// POST /api/tasks/image
///
/// Uses the reference image uploaded through `/api/tasks/image/source`, if any.
pub async fn generate_image(
    State(state): State<AppState>,
    Json(inputs): Json<ImageStudioInputs>,
) -> Result<Json<ImageStudioResults>, AppError> {
    let studio = image_studio(&state).await;
    Ok(Json(studio.generate(inputs).await?))
}

/// POST /api/tasks/image/source - Upload a reference image and invert it
pub async fn set_image_source(
    State(state): State<AppState>,
    Json(request): Json<SourceImageRequest>,
) -> Result<Json<SourceImageResponse>, AppError> {
    let studio = image_studio(&state).await;
    let prompt = studio
        .set_source_image(SourceMedia::from_data_url(&request.image))
        .await?;
    Ok(Json(SourceImageResponse { prompt }))
}

/// DELETE /api/tasks/image/source
pub async fn clear_image_source(State(state): State<AppState>) -> Json<MessageResponse> {
    state.image_source().clear().await;
    Json(MessageResponse {
        message: "Reference image removed".to_string(),
        status: "ok".to_string(),
    })
}

/// POST /api/tasks/video-script
pub async fn generate_video_script(
    State(state): State<AppState>,
    Json(inputs): Json<VideoScriptInputs>,
) -> Result<Json<ScriptData>, AppError> {
    let assistant = video_assistant(&state, state.client().await);
    Ok(Json(assistant.generate_script(inputs).await?))
}

/// POST /api/tasks/video-script/scenes/:id - Submit one scene's video job
///
/// Follow the returned operation with `/api/video/track`.
pub async fn start_scene(
    State(state): State<AppState>,
    Path(scene_id): Path<i64>,
) -> Result<Json<Operation>, AppError> {
    let assistant = video_assistant(&state, state.client().await);
    Ok(Json(assistant.start_scene(scene_id).await?))
}

/// POST /api/tasks/video-script/render-all - Render every scene
///
/// Streams `{"progress": ...}` events while the jobs run, then one
/// `{"scenes": [...]}` event and `[DONE]`. Closing the connection stops
/// tracking.
///
/// # Errors
/// * `InvalidRequest` if no script has been generated
pub async fn render_all_scenes(State(state): State<AppState>) -> Result<Response, AppError> {
    let assistant = video_assistant(&state, state.client().await);
    let script = assistant
        .script()
        .await
        .ok_or_else(|| AppError::InvalidRequest("Generate a script first".to_string()))?;
    let supervisor = assistant.supervisor();
    let mut progress = supervisor.subscribe();
    let cancel = CancellationToken::new();
    let guard = cancel.clone().drop_guard();

    let events = stream! {
        let _guard = guard;
        let render = assistant.render_all_scenes(&script, &supervisor, cancel);
        tokio::pin!(render);

        let outcomes = loop {
            let step = tokio::select! {
                outcomes = &mut render => Err(outcomes),
                changed = progress.changed() => Ok(changed.ok().map(|_| *progress.borrow_and_update())),
            };
            match step {
                Ok(Some(update)) => yield to_event(&RenderEvent::Progress(update)),
                Ok(None) => break (&mut render).await,
                Err(outcomes) => break outcomes,
            }
        };

        if progress.has_changed().unwrap_or(false) {
            let update = *progress.borrow_and_update();
            yield to_event(&RenderEvent::Progress(update));
        }
        let scenes = script
            .scenes
            .iter()
            .zip(outcomes)
            .map(|(scene, outcome)| scene_render(scene.id, outcome))
            .collect();
        yield to_event(&RenderEvent::Scenes(scenes));
        yield Ok(SSE_DONE_SIGNAL.to_string());
    };

    sse_response(events)
}

fn scene_render(scene_id: i64, outcome: Result<TrackedVideo, GenerationError>) -> SceneRender {
    match outcome {
        Ok(video) => SceneRender {
            scene_id,
            video: Some(video),
            error: None,
        },
        Err(e) => SceneRender {
            scene_id,
            video: None,
            error: Some(e.to_string()),
        },
    }
}

/// DELETE route resetting one named task
///
/// Static task paths take precedence over `/api/tasks/:task`, so each one
/// carries its own reset.
pub fn reset_route(task: &'static str) -> MethodRouter<AppState> {
    delete(move |state: State<AppState>| reset_task(state, Path(task.to_string())))
}

/// DELETE /api/tasks/:task - Clear a task's form and results
///
/// # Errors
/// * `UnknownTask` if no task has this name
pub async fn reset_task(
    State(state): State<AppState>,
    Path(task): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let client = state.client().await;
    let store = state.store().clone();
    match task.as_str() {
        "marketing" => MarketingAssistant::new(client, store).reset().await?,
        "outreach" => OutreachAssistant::new(client, store).reset().await?,
        "lead-gen" => LeadGenAssistant::new(client, store).reset().await?,
        "fission" => ProductFission::new(client, store).reset().await?,
        "listing" => ProductListing::new(client, store).reset().await?,
        "image" => image_studio(&state).await.reset().await?,
        "video-script" => video_assistant(&state, client).reset().await?,
        _ => return Err(AppError::UnknownTask(task)),
    }
    tracing::info!(task = %task, "Task reset");

    Ok(Json(MessageResponse {
        message: format!("Task '{}' reset", task),
        status: "ok".to_string(),
    }))
}
