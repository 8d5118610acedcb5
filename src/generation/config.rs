//! Generation configuration
//!
//! Model names, endpoint and limits for the generation client.

use crate::generation::error::GenerationError;
use serde::{Deserialize, Serialize};
use std::env;

/// Largest accepted conditioning payload (encoded), 5 MiB
pub const MAX_SOURCE_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Generation client configuration
#[derive(Debug, Clone, Serialize)]
pub struct GenerationConfig {
    /// Gemini API base URL
    pub api_base_url: String,
    /// Model used for text and structured generation
    pub text_model: String,
    /// Model used for image synthesis and inversion
    pub image_model: String,
    /// Model used for video jobs
    pub video_model: String,
    /// Requested video resolution
    pub video_resolution: String,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
    /// Ceiling for encoded conditioning images
    pub max_source_image_bytes: usize,
    /// Environment variable holding the API key
    pub api_key_env: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            text_model: "gemini-3-pro-preview".to_string(),
            image_model: "gemini-3-pro-image-preview".to_string(),
            video_model: "veo-3.1-fast-generate-preview".to_string(),
            video_resolution: "720p".to_string(),
            request_timeout_secs: 120,
            max_source_image_bytes: MAX_SOURCE_IMAGE_BYTES,
            api_key_env: "GEMINI_API_KEY".to_string(),
        }
    }
}

impl GenerationConfig {
    /// Defaults overridden by `GEMINI_*` environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_base_url: env::var("GEMINI_API_BASE_URL").unwrap_or(defaults.api_base_url),
            text_model: env::var("GEMINI_TEXT_MODEL").unwrap_or(defaults.text_model),
            image_model: env::var("GEMINI_IMAGE_MODEL").unwrap_or(defaults.image_model),
            video_model: env::var("GEMINI_VIDEO_MODEL").unwrap_or(defaults.video_model),
            request_timeout_secs: env::var("GEMINI_TIMEOUT_SECS")
                .ok()
                .and_then(|t| t.parse().ok())
                .unwrap_or(defaults.request_timeout_secs),
            ..defaults
        }
    }

    /// Same configuration pointed at another endpoint (used by tests)
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.api_base_url = base_url.trim_end_matches('/').to_string();
        self
    }
}

/// Request body for updating generation configuration
#[derive(Debug, Default, Deserialize)]
pub struct ConfigUpdateRequest {
    /// Text model name (optional)
    pub text_model: Option<String>,
    /// Image model name (optional)
    pub image_model: Option<String>,
    /// Video model name (optional)
    pub video_model: Option<String>,
    /// Request timeout in seconds (optional)
    pub request_timeout_secs: Option<u64>,
}

/// Validate and apply configuration updates
///
/// This function validates the update request and applies valid changes to the config.
/// Returns an error if any validation fails.
pub fn validate_and_apply_config_update(
    mut config: GenerationConfig,
    request: ConfigUpdateRequest,
) -> Result<GenerationConfig, GenerationError> {
    if let Some(model) = request.text_model {
        config.text_model = non_empty("text_model", model)?;
    }

    if let Some(model) = request.image_model {
        config.image_model = non_empty("image_model", model)?;
    }

    if let Some(model) = request.video_model {
        config.video_model = non_empty("video_model", model)?;
    }

    if let Some(timeout) = request.request_timeout_secs {
        if timeout == 0 {
            return Err(GenerationError::Validation(
                "request_timeout_secs must be > 0".to_string(),
            ));
        }
        config.request_timeout_secs = timeout;
    }

    Ok(config)
}

fn non_empty(field: &str, value: String) -> Result<String, GenerationError> {
    if value.trim().is_empty() {
        return Err(GenerationError::Validation(format!(
            "{} cannot be empty",
            field
        )));
    }
    Ok(value)
}
