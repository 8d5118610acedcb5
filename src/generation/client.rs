//! Generation client
//!
//! Single facade over the Gemini API for every modality. The client holds no
//! per-request state: credentials are resolved on each call and every method
//! performs one network exchange (none for `resolve_download_url`).

use crate::generation::api_client::{get_json, post_json};
use crate::generation::config::GenerationConfig;
use crate::generation::credentials::{ApiKeyProvider, EnvApiKey};
use crate::generation::error::{GenerationError, ServiceErrorKind};
use crate::generation::gemini_types::{GeminiApiRequest, GeminiApiResponse, OperationResource};
use crate::generation::operation::Operation;
use crate::generation::request::{
    GenerationOutcome, GenerationRequest, ImageOptions, ImageResult, SourceMedia,
    StructuredResult, TextResult, VideoAspectRatio,
};
use crate::generation::schema::Schema;
use crate::generation::{image, structured, text, video};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Client for text, structured, image and video generation
#[derive(Clone)]
pub struct GenerationClient {
    http: reqwest::Client,
    config: Arc<GenerationConfig>,
    credentials: Arc<dyn ApiKeyProvider>,
}

impl std::fmt::Debug for GenerationClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl GenerationClient {
    /// Create a client with an explicit credential source
    ///
    /// # Errors
    /// * `Service(Transport)` if the HTTP client cannot be built
    pub fn new(
        config: GenerationConfig,
        credentials: Arc<dyn ApiKeyProvider>,
    ) -> Result<Self, GenerationError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| {
                GenerationError::service(
                    ServiceErrorKind::Transport,
                    None,
                    format!("Failed to build HTTP client: {}", e),
                )
            })?;

        Ok(Self {
            http,
            config: Arc::new(config),
            credentials,
        })
    }

    /// Create a client reading the key from the configured environment variable
    pub fn from_config(config: GenerationConfig) -> Result<Self, GenerationError> {
        let credentials = Arc::new(EnvApiKey::new(&config.api_key_env));
        Self::new(config, credentials)
    }

    /// Same credentials, new configuration
    pub fn reconfigure(&self, config: GenerationConfig) -> Result<Self, GenerationError> {
        Self::new(config, Arc::clone(&self.credentials))
    }

    /// Active configuration
    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Whether a usable API key is currently available
    pub fn has_credentials(&self) -> bool {
        self.credentials.api_key().is_some()
    }

    fn api_key(&self) -> Result<String, GenerationError> {
        self.credentials.api_key().ok_or_else(|| {
            GenerationError::service(
                ServiceErrorKind::Unauthorized,
                None,
                format!(
                    "No API key configured (set {} or API_KEY)",
                    self.config.api_key_env
                ),
            )
        })
    }

    fn model_url(&self, model: &str, method: &str) -> String {
        format!("{}/models/{}:{}", self.config.api_base_url, model, method)
    }

    async fn generate_content(
        &self,
        model: &str,
        body: &GeminiApiRequest,
    ) -> Result<GeminiApiResponse, GenerationError> {
        let api_key = self.api_key()?;
        let url = self.model_url(model, "generateContent");
        post_json(&self.http, &url, &api_key, body).await
    }

    /// Generate free text, optionally grounded in live web search
    ///
    /// # Arguments
    /// * `prompt` - User prompt
    /// * `system_instruction` - Optional persona or rules
    /// * `use_grounded_search` - Enable web search; sources are returned in service order
    pub async fn generate_text(
        &self,
        prompt: &str,
        system_instruction: Option<&str>,
        use_grounded_search: bool,
    ) -> Result<TextResult, GenerationError> {
        tracing::info!(
            model = %self.config.text_model,
            grounded = use_grounded_search,
            prompt_len = prompt.len(),
            "Generating text"
        );
        let body = text::build_request(prompt, system_instruction, use_grounded_search);
        let response = self.generate_content(&self.config.text_model, &body).await?;
        let result = text::parse_response(&response)?;
        tracing::debug!(
            text_len = result.text.len(),
            sources = result.sources.len(),
            "Text generation complete"
        );
        Ok(result)
    }

    /// Generate data matching `schema`, parsed as `T`
    ///
    /// Only syntactic parse failures are detected; required-property checks
    /// are up to the caller (see [`Schema::validate_required`]).
    pub async fn generate_structured<T: DeserializeOwned>(
        &self,
        prompt: &str,
        schema: &Schema,
        system_instruction: Option<&str>,
    ) -> Result<StructuredResult<T>, GenerationError> {
        tracing::info!(
            model = %self.config.text_model,
            prompt_len = prompt.len(),
            "Generating structured data"
        );
        let body = structured::build_request(prompt, schema, system_instruction);
        let response = self.generate_content(&self.config.text_model, &body).await?;
        structured::parse_response(&response)
    }

    /// Generate images, optionally conditioned on `source_image`
    ///
    /// # Errors
    /// * `Validation` if the source image exceeds the size ceiling (no request is sent)
    pub async fn generate_image(
        &self,
        prompt: &str,
        options: &ImageOptions,
        source_image: Option<&SourceMedia>,
    ) -> Result<ImageResult, GenerationError> {
        if let Some(media) = source_image {
            image::check_source_size(media, self.config.max_source_image_bytes)?;
        }
        tracing::info!(
            model = %self.config.image_model,
            aspect_ratio = %options.aspect_ratio,
            image_size = %options.image_size,
            conditioned = source_image.is_some(),
            "Generating image"
        );
        let body = image::build_request(prompt, options, source_image);
        let response = self.generate_content(&self.config.image_model, &body).await?;
        let result = image::parse_response(&response)?;
        if result.is_empty() {
            tracing::warn!("Image generation returned no images");
        }
        Ok(result)
    }

    /// Describe an image as a text-to-image prompt
    ///
    /// An empty string means the service produced no usable inversion.
    pub async fn reverse_image_prompt(
        &self,
        source: &SourceMedia,
    ) -> Result<String, GenerationError> {
        image::check_source_size(source, self.config.max_source_image_bytes)?;
        tracing::info!(model = %self.config.image_model, "Inverting image to prompt");
        let body = image::build_reverse_request(source);
        let response = self.generate_content(&self.config.image_model, &body).await?;
        image::parse_reverse_response(&response)
    }

    /// Submit a video job and return its INITIATED snapshot
    pub async fn start_video_generation(
        &self,
        prompt: &str,
        aspect_ratio: VideoAspectRatio,
    ) -> Result<Operation, GenerationError> {
        let api_key = self.api_key()?;
        tracing::info!(
            model = %self.config.video_model,
            aspect_ratio = %aspect_ratio,
            "Starting video generation"
        );
        let body = video::build_request(prompt, aspect_ratio, &self.config.video_resolution);
        let url = self.model_url(&self.config.video_model, "predictLongRunning");
        let resource: OperationResource = post_json(&self.http, &url, &api_key, &body).await?;
        let operation = video::operation_from_start(&resource)?;
        tracing::info!(handle = %operation.handle, "Video job accepted");
        Ok(operation)
    }

    /// Check a job once and return the next snapshot
    ///
    /// The input snapshot is never modified. Terminal snapshots are returned
    /// unchanged without contacting the service.
    pub async fn poll_operation(&self, operation: &Operation) -> Result<Operation, GenerationError> {
        if operation.is_terminal() {
            return Ok(operation.clone());
        }
        let api_key = self.api_key()?;
        let url = format!("{}/{}", self.config.api_base_url, operation.handle);
        let resource: OperationResource = get_json(&self.http, &url, &api_key).await?;
        let next = video::next_snapshot(operation, &resource)?;
        tracing::debug!(
            handle = %next.handle,
            status = %next.status,
            polls = next.polls,
            "Polled video job"
        );
        Ok(next)
    }

    /// Fetchable URL (credential appended) for a DONE snapshot
    pub fn resolve_download_url(&self, operation: &Operation) -> Result<String, GenerationError> {
        let api_key = self.api_key()?;
        video::resolve_download_url(operation, &api_key)
    }

    /// Route any request variant to its modality
    pub async fn dispatch(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationOutcome, GenerationError> {
        tracing::debug!(modality = %request.modality(), "Dispatching generation request");
        match request {
            GenerationRequest::Text {
                prompt,
                system_instruction,
                use_grounded_search,
            } => self
                .generate_text(prompt, system_instruction.as_deref(), *use_grounded_search)
                .await
                .map(GenerationOutcome::Text),
            GenerationRequest::Structured {
                prompt,
                schema,
                system_instruction,
            } => self
                .generate_structured::<Value>(prompt, schema, system_instruction.as_deref())
                .await
                .map(GenerationOutcome::Structured),
            GenerationRequest::Image {
                prompt,
                config,
                source_image,
            } => self
                .generate_image(prompt, config, source_image.as_ref())
                .await
                .map(GenerationOutcome::Image),
            GenerationRequest::ReverseImage { image: source } => self
                .reverse_image_prompt(source)
                .await
                .map(GenerationOutcome::Prompt),
            GenerationRequest::Video {
                prompt,
                aspect_ratio,
            } => self
                .start_video_generation(prompt, *aspect_ratio)
                .await
                .map(GenerationOutcome::Operation),
        }
    }
}
