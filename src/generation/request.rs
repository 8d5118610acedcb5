//! Generation requests and results
//!
//! `GenerationRequest` is the closed set of request variants dispatched through
//! `GenerationClient::dispatch`. Only the `Structured` variant carries a schema.

use crate::generation::operation::Operation;
use crate::generation::schema::Schema;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Default MIME type when a payload does not say what it is
const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

/// Modality of a request, used for logging and model selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Modality {
    /// Free text
    Text,
    /// Free text augmented with web search
    GroundedText,
    /// Schema-constrained data
    Structured,
    /// Image synthesis or image-to-text inversion
    Image,
    /// Long-running video job
    Video,
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Modality::Text => "text",
            Modality::GroundedText => "grounded-text",
            Modality::Structured => "structured",
            Modality::Image => "image",
            Modality::Video => "video",
        };
        f.write_str(label)
    }
}

/// A generation request, one variant per modality
#[derive(Debug, Clone)]
pub enum GenerationRequest {
    /// Plain or grounded text
    Text {
        /// User prompt
        prompt: String,
        /// Optional system instruction
        system_instruction: Option<String>,
        /// Enable live web search grounding
        use_grounded_search: bool,
    },
    /// Schema-constrained structured data
    Structured {
        /// User prompt
        prompt: String,
        /// Output shape declared to the service
        schema: Schema,
        /// Optional system instruction
        system_instruction: Option<String>,
    },
    /// Image synthesis, optionally conditioned on a source image
    Image {
        /// User prompt
        prompt: String,
        /// Output configuration
        config: ImageOptions,
        /// Conditioning image, sent ahead of the prompt
        source_image: Option<SourceMedia>,
    },
    /// Image-to-prompt inversion
    ReverseImage {
        /// Image to describe
        image: SourceMedia,
    },
    /// Video job start
    Video {
        /// Scene prompt
        prompt: String,
        /// Output orientation
        aspect_ratio: VideoAspectRatio,
    },
}

impl GenerationRequest {
    /// Modality of this request
    pub fn modality(&self) -> Modality {
        match self {
            GenerationRequest::Text {
                use_grounded_search: true,
                ..
            } => Modality::GroundedText,
            GenerationRequest::Text { .. } => Modality::Text,
            GenerationRequest::Structured { .. } => Modality::Structured,
            GenerationRequest::Image { .. } | GenerationRequest::ReverseImage { .. } => {
                Modality::Image
            }
            GenerationRequest::Video { .. } => Modality::Video,
        }
    }
}

/// Result of `GenerationClient::dispatch`
#[derive(Debug, Clone)]
pub enum GenerationOutcome {
    /// Text (with sources when grounded)
    Text(TextResult),
    /// Parsed structured value
    Structured(StructuredResult),
    /// Generated images
    Image(ImageResult),
    /// Inverted prompt text
    Prompt(String),
    /// Accepted video job
    Operation(Operation),
}

/// A cited web source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// Source URI
    pub uri: String,
    /// Source title (empty when the service gave none)
    pub title: String,
}

/// Text generation result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextResult {
    /// Generated text, empty when the service produced none
    pub text: String,
    /// Grounding citations in service order
    #[serde(default)]
    pub sources: Vec<Source>,
}

/// Structured generation result
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredResult<T = Value> {
    /// Parsed value
    pub value: T,
    /// Raw text the value was parsed from
    pub raw: String,
}

/// Image generation result; zero images is valid
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageResult {
    /// Images in service order
    pub images: Vec<ImageArtifact>,
}

impl ImageResult {
    /// True when the service produced no usable image
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// A generated image, self-describing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageArtifact {
    /// MIME type, e.g. "image/png"
    pub mime_type: String,
    /// Base64-encoded bytes
    pub data: String,
}

impl ImageArtifact {
    /// `data:` URL suitable for direct display
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    /// Decoded image bytes
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(&self.data)
    }
}

/// Conditioning media supplied by the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMedia {
    /// MIME type of the payload
    pub mime_type: String,
    /// Base64-encoded bytes
    pub data: String,
}

impl SourceMedia {
    /// Encode raw bytes
    pub fn from_bytes(mime_type: &str, bytes: &[u8]) -> Self {
        Self {
            mime_type: mime_type.to_string(),
            data: STANDARD.encode(bytes),
        }
    }

    /// Wrap an already-encoded payload
    pub fn from_base64(mime_type: &str, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.to_string(),
            data: data.into(),
        }
    }

    /// Accept either a `data:<mime>;base64,<payload>` URL or bare base64
    ///
    /// Bare payloads are assumed to be JPEG.
    pub fn from_data_url(input: &str) -> Self {
        match input.split_once("base64,") {
            Some((prefix, payload)) => {
                let mime_type = prefix
                    .strip_prefix("data:")
                    .map(|m| m.trim_end_matches(';'))
                    .filter(|m| !m.is_empty())
                    .unwrap_or(DEFAULT_IMAGE_MIME);
                Self::from_base64(mime_type, payload)
            }
            None => Self::from_base64(DEFAULT_IMAGE_MIME, input),
        }
    }

    /// Size of the encoded payload in bytes
    pub fn encoded_len(&self) -> usize {
        self.data.len()
    }
}

/// Image output configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageOptions {
    /// Aspect ratio, e.g. "1:1", "3:4", "16:9"
    pub aspect_ratio: String,
    /// Output size, e.g. "1K", "2K", "4K"
    pub image_size: String,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            aspect_ratio: "1:1".to_string(),
            image_size: "1K".to_string(),
        }
    }
}

/// Supported video orientations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VideoAspectRatio {
    /// Landscape
    #[serde(rename = "16:9")]
    Landscape,
    /// Portrait
    #[default]
    #[serde(rename = "9:16")]
    Portrait,
}

impl VideoAspectRatio {
    /// Wire representation
    pub fn as_str(self) -> &'static str {
        match self {
            VideoAspectRatio::Landscape => "16:9",
            VideoAspectRatio::Portrait => "9:16",
        }
    }

    /// Pick an orientation from a free-form description such as "9:16 Portrait"
    pub fn from_description(description: &str) -> Self {
        if description.contains("9:16") || description.contains("Portrait") {
            VideoAspectRatio::Portrait
        } else {
            VideoAspectRatio::Landscape
        }
    }
}

impl fmt::Display for VideoAspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_data_url_extracts_mime_and_payload() {
        let media = SourceMedia::from_data_url("data:image/png;base64,iVBORw0KGgo=");
        assert_eq!(media.mime_type, "image/png");
        assert_eq!(media.data, "iVBORw0KGgo=");
    }

    #[test]
    fn test_from_data_url_bare_payload_defaults_to_jpeg() {
        let media = SourceMedia::from_data_url("/9j/4AAQ");
        assert_eq!(media.mime_type, "image/jpeg");
        assert_eq!(media.data, "/9j/4AAQ");
    }

    #[test]
    fn test_artifact_data_url_and_decode() {
        let artifact = ImageArtifact {
            mime_type: "image/png".to_string(),
            data: STANDARD.encode(b"png-bytes"),
        };
        assert!(artifact.to_data_url().starts_with("data:image/png;base64,"));
        assert_eq!(artifact.decode().unwrap(), b"png-bytes");
    }

    #[test]
    fn test_video_aspect_ratio_from_description() {
        assert_eq!(
            VideoAspectRatio::from_description("9:16 (TikTok)"),
            VideoAspectRatio::Portrait
        );
        assert_eq!(
            VideoAspectRatio::from_description("Portrait"),
            VideoAspectRatio::Portrait
        );
        assert_eq!(
            VideoAspectRatio::from_description("16:9"),
            VideoAspectRatio::Landscape
        );
        let json = serde_json::to_string(&VideoAspectRatio::Portrait).unwrap();
        assert_eq!(json, "\"9:16\"");
    }

    #[test]
    fn test_grounded_text_modality() {
        let request = GenerationRequest::Text {
            prompt: "p".to_string(),
            system_instruction: None,
            use_grounded_search: true,
        };
        assert_eq!(request.modality(), Modality::GroundedText);
    }
}
