//! Generation API handlers
//!
//! Thin HTTP wrappers over `GenerationClient`. Request bodies are camelCase;
//! images travel as `data:` URLs or bare base64.

use crate::error::AppError;
use crate::generation::{ImageOptions, ImageResult, Schema, SourceMedia, TextResult};
use crate::state::AppState;
use axum::{extract::State, response::Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Text generation request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextRequest {
    /// User prompt
    pub prompt: String,
    /// Optional system instruction
    #[serde(default)]
    pub system_instruction: Option<String>,
    /// Ground the answer with live web search
    #[serde(default)]
    pub use_grounded_search: bool,
}

/// Structured generation request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredRequest {
    /// User prompt
    pub prompt: String,
    /// Output schema in the service's `responseSchema` form
    pub schema: Value,
    /// Optional system instruction
    #[serde(default)]
    pub system_instruction: Option<String>,
}

/// Structured generation response
#[derive(Debug, Serialize)]
pub struct StructuredResponse {
    /// Parsed value
    pub value: Value,
    /// Raw text the value was parsed from
    pub raw: String,
}

/// Image generation request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRequest {
    /// User prompt
    pub prompt: String,
    /// Output configuration
    #[serde(default)]
    pub config: Option<ImageOptions>,
    /// Conditioning image as a `data:` URL or bare base64
    #[serde(default)]
    pub source_image: Option<String>,
}

/// Image inversion request
#[derive(Debug, Deserialize)]
pub struct ReverseImageRequest {
    /// Image as a `data:` URL or bare base64
    pub image: String,
}

/// Image inversion response
#[derive(Debug, Serialize)]
pub struct ReverseImageResponse {
    /// Prompt that would reproduce the image
    pub prompt: String,
}

/// POST /api/generate/text
pub async fn generate_text(
    State(state): State<AppState>,
    Json(request): Json<TextRequest>,
) -> Result<Json<TextResult>, AppError> {
    let result = state
        .client()
        .await
        .generate_text(
            &request.prompt,
            request.system_instruction.as_deref(),
            request.use_grounded_search,
        )
        .await?;
    Ok(Json(result))
}

/// POST /api/generate/structured
///
/// # Errors
/// * `InvalidRequest` if the schema is not a supported shape
pub async fn generate_structured(
    State(state): State<AppState>,
    Json(request): Json<StructuredRequest>,
) -> Result<Json<StructuredResponse>, AppError> {
    let schema = Schema::from_response_schema(&request.schema).map_err(AppError::InvalidRequest)?;
    let result = state
        .client()
        .await
        .generate_structured::<Value>(
            &request.prompt,
            &schema,
            request.system_instruction.as_deref(),
        )
        .await?;
    Ok(Json(StructuredResponse {
        value: result.value,
        raw: result.raw,
    }))
}

/// POST /api/generate/image
pub async fn generate_image(
    State(state): State<AppState>,
    Json(request): Json<ImageRequest>,
) -> Result<Json<ImageResult>, AppError> {
    let options = request.config.unwrap_or_default();
    let source = request.source_image.as_deref().map(SourceMedia::from_data_url);
    let result = state
        .client()
        .await
        .generate_image(&request.prompt, &options, source.as_ref())
        .await?;
    Ok(Json(result))
}

/// POST /api/generate/reverse-image
pub async fn reverse_image(
    State(state): State<AppState>,
    Json(request): Json<ReverseImageRequest>,
) -> Result<Json<ReverseImageResponse>, AppError> {
    let media = SourceMedia::from_data_url(&request.image);
    let prompt = state.client().await.reverse_image_prompt(&media).await?;
    Ok(Json(ReverseImageResponse { prompt }))
}
