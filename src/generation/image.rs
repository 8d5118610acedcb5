//! Image modality: synthesis, conditioning and prompt inversion

use crate::generation::api_client::check_prompt_feedback;
use crate::generation::error::GenerationError;
use crate::generation::gemini_types::{
    GeminiApiRequest, GeminiApiResponse, GenerationConfig, ImageConfig, RequestContent,
    RequestPart,
};
use crate::generation::request::{ImageArtifact, ImageOptions, ImageResult, SourceMedia};

/// Instruction sent alongside an image to invert it into a prompt
pub const REVERSE_PROMPT_INSTRUCTION: &str = "Act as an expert prompt engineer. Analyze this product image and provide a highly detailed text-to-image prompt in English. Describe the product, materials, lighting, background, and camera angle. Output ONLY the prompt string.";

/// Reject conditioning payloads above `limit` encoded bytes
pub fn check_source_size(media: &SourceMedia, limit: usize) -> Result<(), GenerationError> {
    let size = media.encoded_len();
    if size > limit {
        return Err(GenerationError::Validation(format!(
            "Source image is {} bytes, larger than the {} byte limit",
            size, limit
        )));
    }
    if size == 0 {
        return Err(GenerationError::Validation(
            "Source image is empty".to_string(),
        ));
    }
    Ok(())
}

/// Build an image synthesis body; the source image goes ahead of the prompt
pub fn build_request(
    prompt: &str,
    options: &ImageOptions,
    source_image: Option<&SourceMedia>,
) -> GeminiApiRequest {
    let mut parts = Vec::with_capacity(2);
    if let Some(media) = source_image {
        parts.push(RequestPart::inline(&media.mime_type, &media.data));
    }
    parts.push(RequestPart::text(prompt));

    GeminiApiRequest {
        contents: vec![RequestContent::user(parts)],
        system_instruction: None,
        tools: Vec::new(),
        generation_config: Some(GenerationConfig {
            image_config: Some(ImageConfig {
                aspect_ratio: options.aspect_ratio.clone(),
                image_size: options.image_size.clone(),
            }),
            ..Default::default()
        }),
    }
}

/// Collect every inline image of the first candidate, in order
pub fn parse_response(response: &GeminiApiResponse) -> Result<ImageResult, GenerationError> {
    check_prompt_feedback(response)?;

    let images = response
        .first_parts()
        .iter()
        .filter_map(|part| part.inline_data.as_ref())
        .map(|inline| ImageArtifact {
            mime_type: inline.mime_type.clone(),
            data: inline.data.clone(),
        })
        .collect();

    Ok(ImageResult { images })
}

/// Build an image-to-prompt inversion body
pub fn build_reverse_request(image: &SourceMedia) -> GeminiApiRequest {
    GeminiApiRequest {
        contents: vec![RequestContent::user(vec![
            RequestPart::inline(&image.mime_type, &image.data),
            RequestPart::text(REVERSE_PROMPT_INSTRUCTION),
        ])],
        ..Default::default()
    }
}

/// Extract the inverted prompt; empty means "no usable inversion"
pub fn parse_reverse_response(response: &GeminiApiResponse) -> Result<String, GenerationError> {
    check_prompt_feedback(response)?;
    Ok(response.text().trim().to_string())
}
