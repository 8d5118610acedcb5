//! Image studio
//!
//! Prompted image generation with an optional reference image. The reference
//! image lives in memory only; it is never written to the state store.
//! Uploading a reference immediately inverts it into a prompt, which replaces
//! the prompt input.

use crate::error::AppError;
use crate::generation::image::check_source_size;
use crate::generation::{GenerationClient, GenerationError, ImageOptions, SourceMedia};
use crate::state::keys::{IMAGE_INPUTS, IMAGE_RESULTS};
use crate::state::StateStore;
use crate::tasks::TaskSlots;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Image generation form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageStudioInputs {
    /// Text prompt
    pub prompt: String,
    /// Aspect ratio, e.g. "1:1"
    pub aspect_ratio: String,
    /// Output size, e.g. "1K"
    pub image_size: String,
}

impl Default for ImageStudioInputs {
    fn default() -> Self {
        let options = ImageOptions::default();
        Self {
            prompt: String::new(),
            aspect_ratio: options.aspect_ratio,
            image_size: options.image_size,
        }
    }
}

impl ImageStudioInputs {
    fn options(&self) -> ImageOptions {
        ImageOptions {
            aspect_ratio: self.aspect_ratio.clone(),
            image_size: self.image_size.clone(),
        }
    }
}

/// Image studio output
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageStudioResults {
    /// Generated images as `data:` URLs
    pub images: Vec<String>,
    /// Prompt inverted from the last reference image
    pub reversed_prompt: String,
}

/// Shared in-memory holder for the reference image
#[derive(Debug, Clone, Default)]
pub struct SourceImage {
    media: Arc<RwLock<Option<SourceMedia>>>,
}

impl SourceImage {
    /// Empty holder
    pub fn new() -> Self {
        Self::default()
    }

    /// Current reference image
    pub async fn get(&self) -> Option<SourceMedia> {
        self.media.read().await.clone()
    }

    async fn set(&self, media: SourceMedia) {
        *self.media.write().await = Some(media);
    }

    /// Drop the reference image
    pub async fn clear(&self) {
        *self.media.write().await = None;
    }
}

/// Image generation task
#[derive(Debug, Clone)]
pub struct ImageStudio {
    client: GenerationClient,
    slots: TaskSlots<ImageStudioInputs, ImageStudioResults>,
    source: SourceImage,
}

impl ImageStudio {
    /// Create the task with its own reference image holder
    pub fn new(client: GenerationClient, store: StateStore) -> Self {
        Self::with_source(client, store, SourceImage::new())
    }

    /// Create the task around a shared reference image holder
    pub fn with_source(client: GenerationClient, store: StateStore, source: SourceImage) -> Self {
        Self {
            client,
            slots: TaskSlots::new(store, IMAGE_INPUTS, IMAGE_RESULTS),
            source,
        }
    }

    /// Persisted form
    pub async fn inputs(&self) -> ImageStudioInputs {
        self.slots.inputs().await
    }

    /// Persist the form
    pub async fn set_inputs(&self, inputs: &ImageStudioInputs) -> Result<(), AppError> {
        Ok(self.slots.set_inputs(inputs).await?)
    }

    /// Last output
    pub async fn results(&self) -> ImageStudioResults {
        self.slots.results().await
    }

    /// Current reference image
    pub async fn source_image(&self) -> Option<SourceMedia> {
        self.source.get().await
    }

    /// Remove the reference image
    pub async fn clear_source_image(&self) {
        self.source.clear().await;
    }

    /// Use `media` as the reference image and invert it into a prompt
    ///
    /// The image is kept even if inversion fails. On success the reversed
    /// prompt is stored in the results and replaces the prompt input.
    ///
    /// # Errors
    /// * `Validation` if the image exceeds the size ceiling (the image is not kept)
    pub async fn set_source_image(&self, media: SourceMedia) -> Result<String, AppError> {
        check_source_size(&media, self.client.config().max_source_image_bytes)?;
        self.source.set(media.clone()).await;

        let reversed = match self.client.reverse_image_prompt(&media).await {
            Ok(prompt) => prompt,
            Err(e) => {
                tracing::warn!(error = %e, "Reference image inversion failed");
                return Err(e.into());
            }
        };

        let mut results = self.slots.results().await;
        results.reversed_prompt = reversed.clone();
        self.slots.set_results(&results).await?;

        let mut inputs = self.slots.inputs().await;
        inputs.prompt = reversed.clone();
        self.slots.set_inputs(&inputs).await?;

        Ok(reversed)
    }

    /// Generate images from the prompt, conditioned on the reference image if any
    ///
    /// # Errors
    /// * `Validation` if the prompt is blank (nothing is sent)
    pub async fn generate(&self, inputs: ImageStudioInputs) -> Result<ImageStudioResults, AppError> {
        if inputs.prompt.trim().is_empty() {
            return Err(GenerationError::Validation("Please enter a prompt first.".to_string()).into());
        }
        self.slots.set_inputs(&inputs).await?;

        let source = self.source.get().await;
        let generated = self
            .client
            .generate_image(&inputs.prompt, &inputs.options(), source.as_ref())
            .await?;

        let mut results = self.slots.results().await;
        results.images = generated.images.iter().map(|i| i.to_data_url()).collect();
        self.slots.set_results(&results).await?;
        Ok(results)
    }

    /// Clear form, output and reference image
    pub async fn reset(&self) -> Result<(), AppError> {
        let cleared = self.slots.reset().await;
        self.source.clear().await;
        Ok(cleared?)
    }
}
