//! Gemini API wire types
//!
//! Structs that mirror the Gemini REST JSON format for `generateContent`,
//! `predictLongRunning` and operation polling. Field names are camelCase on
//! the wire.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request body for `models/{model}:generateContent`
#[derive(Serialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct GeminiApiRequest {
    /// Conversation contents (a single user turn here)
    pub contents: Vec<RequestContent>,
    /// Optional system instruction
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<RequestContent>,
    /// Tools enabled for this call (web search grounding)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Tool>,
    /// Optional generation configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

/// Content structure for requests
#[derive(Serialize, Debug, Clone)]
pub struct RequestContent {
    /// Author role; omitted for system instructions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// List of content parts
    pub parts: Vec<RequestPart>,
}

impl RequestContent {
    /// A user turn with the given parts
    pub fn user(parts: Vec<RequestPart>) -> Self {
        Self {
            role: Some("user".to_string()),
            parts,
        }
    }

    /// A system instruction made of one text part
    pub fn system(text: &str) -> Self {
        Self {
            role: None,
            parts: vec![RequestPart::text(text)],
        }
    }
}

/// A single request part: either text or inline media
#[derive(Serialize, Debug, Clone)]
#[serde(untagged)]
pub enum RequestPart {
    /// Plain text
    Text {
        /// The text content
        text: String,
    },
    /// Base64 media
    InlineData {
        /// The media payload
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

impl RequestPart {
    /// Text part
    pub fn text(text: &str) -> Self {
        RequestPart::Text {
            text: text.to_string(),
        }
    }

    /// Inline media part
    pub fn inline(mime_type: &str, data: &str) -> Self {
        RequestPart::InlineData {
            inline_data: InlineData {
                mime_type: mime_type.to_string(),
                data: data.to_string(),
            },
        }
    }
}

/// Base64 inline payload
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    /// MIME type of the payload
    pub mime_type: String,
    /// Base64-encoded bytes
    pub data: String,
}

/// Tool declaration
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    /// Live web search augmentation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub google_search: Option<GoogleSearch>,
}

impl Tool {
    /// The web search tool
    pub fn web_search() -> Self {
        Self {
            google_search: Some(GoogleSearch {}),
        }
    }
}

/// Empty marker object for the search tool
#[derive(Serialize, Debug, Clone)]
pub struct GoogleSearch {}

/// Generation configuration for requests
#[derive(Serialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    /// MIME type to force for response (e.g., "application/json")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
    /// Output schema for structured mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<Value>,
    /// Image output configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_config: Option<ImageConfig>,
}

/// Image output configuration
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ImageConfig {
    /// Aspect ratio such as "1:1" or "16:9"
    pub aspect_ratio: String,
    /// Output size such as "1K", "2K", "4K"
    pub image_size: String,
}

/// Top-level `generateContent` response
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct GeminiApiResponse {
    /// List of candidate responses from the model
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    /// Optional feedback about the prompt (e.g., if it was blocked)
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

impl GeminiApiResponse {
    /// Parts of the first candidate, empty when there is none
    pub fn first_parts(&self) -> &[Part] {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.as_slice())
            .unwrap_or(&[])
    }

    /// Concatenated text of the first candidate (never null)
    pub fn text(&self) -> String {
        self.first_parts()
            .iter()
            .filter(|part| !part.thought.unwrap_or(false))
            .filter_map(|part| part.text.as_deref())
            .collect()
    }
}

/// A single candidate response from the model
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// The content of this candidate; absent when generation was cut off
    #[serde(default)]
    pub content: Option<Content>,
    /// Why the model stopped generating (if applicable)
    #[serde(default)]
    pub finish_reason: Option<String>,
    /// Web grounding citations
    #[serde(default)]
    pub grounding_metadata: Option<GroundingMetadata>,
}

/// Content structure containing parts of the response
#[derive(Deserialize, Debug, Default)]
pub struct Content {
    /// List of content parts
    #[serde(default)]
    pub parts: Vec<Part>,
    /// Role of the content (e.g., "model")
    #[serde(default)]
    pub role: Option<String>,
}

/// A single part of response content
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    /// Text content, if this is a text part
    #[serde(default)]
    pub text: Option<String>,
    /// Inline media, if this is a media part
    #[serde(default)]
    pub inline_data: Option<InlineData>,
    /// Marks model "thinking" parts that are not part of the answer
    #[serde(default)]
    pub thought: Option<bool>,
}

/// Grounding metadata attached to a candidate
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct GroundingMetadata {
    /// Retrieved sources, in service order
    #[serde(default)]
    pub grounding_chunks: Vec<GroundingChunk>,
}

/// One grounding source
#[derive(Deserialize, Debug, Default)]
pub struct GroundingChunk {
    /// Web source, when the chunk came from search
    #[serde(default)]
    pub web: Option<WebChunk>,
}

/// A web citation
#[derive(Deserialize, Debug, Default)]
pub struct WebChunk {
    /// Source URI
    #[serde(default)]
    pub uri: Option<String>,
    /// Source title
    #[serde(default)]
    pub title: Option<String>,
}

/// Feedback about the prompt (e.g., if it was blocked)
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    /// Reason the prompt was blocked (if applicable)
    #[serde(default)]
    pub block_reason: Option<String>,
}

/// Request body for `models/{model}:predictLongRunning`
#[derive(Serialize, Debug)]
pub struct VideoApiRequest {
    /// One instance per job
    pub instances: Vec<VideoInstance>,
    /// Job parameters
    pub parameters: VideoParameters,
}

/// Video prompt instance
#[derive(Serialize, Debug)]
pub struct VideoInstance {
    /// Text prompt
    pub prompt: String,
}

/// Video job parameters
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct VideoParameters {
    /// "16:9" or "9:16"
    pub aspect_ratio: String,
    /// e.g. "720p"
    pub resolution: String,
    /// Number of videos requested
    pub sample_count: u32,
}

/// Long-running operation resource (start and poll responses)
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct OperationResource {
    /// Resource name used as the polling handle
    #[serde(default)]
    pub name: Option<String>,
    /// Whether the job is finished
    #[serde(default)]
    pub done: bool,
    /// Job result
    #[serde(default)]
    pub response: Option<OperationResponse>,
    /// Job failure
    #[serde(default)]
    pub error: Option<OperationErrorBody>,
}

impl OperationResource {
    /// First generated video URI, whichever envelope the service used
    pub fn first_video_uri(&self) -> Option<&str> {
        let response = self.response.as_ref()?;
        response
            .generated_videos
            .iter()
            .chain(
                response
                    .generate_video_response
                    .iter()
                    .flat_map(|r| r.generated_samples.iter()),
            )
            .find_map(|v| v.video.as_ref().and_then(|m| m.uri.as_deref()))
    }
}

/// Result envelope of a finished job
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct OperationResponse {
    /// SDK-style envelope
    #[serde(default)]
    pub generated_videos: Vec<GeneratedVideo>,
    /// REST-style envelope
    #[serde(default)]
    pub generate_video_response: Option<GenerateVideoResponse>,
}

/// REST-style nested video list
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct GenerateVideoResponse {
    /// Generated samples
    #[serde(default)]
    pub generated_samples: Vec<GeneratedVideo>,
}

/// One generated video
#[derive(Deserialize, Debug, Default)]
pub struct GeneratedVideo {
    /// Media reference
    #[serde(default)]
    pub video: Option<VideoMedia>,
}

/// Media reference for a generated video
#[derive(Deserialize, Debug, Default)]
pub struct VideoMedia {
    /// Download URI (needs the API key appended)
    #[serde(default)]
    pub uri: Option<String>,
}

/// Error object of a failed job
#[derive(Deserialize, Debug, Default)]
pub struct OperationErrorBody {
    /// Status code
    #[serde(default)]
    pub code: Option<i64>,
    /// Failure message
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serializes_camel_case() {
        let request = GeminiApiRequest {
            contents: vec![RequestContent::user(vec![RequestPart::text("hi")])],
            system_instruction: Some(RequestContent::system("be brief")),
            tools: vec![Tool::web_search()],
            generation_config: Some(GenerationConfig {
                response_mime_type: Some("application/json".to_string()),
                ..Default::default()
            }),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "be brief");
        assert!(json["systemInstruction"].get("role").is_none());
        assert!(json["tools"][0]["googleSearch"].is_object());
        assert_eq!(
            json["generationConfig"]["responseMimeType"],
            "application/json"
        );
    }

    #[test]
    fn test_empty_tools_are_omitted() {
        let request = GeminiApiRequest {
            contents: vec![RequestContent::user(vec![RequestPart::text("hi")])],
            ..Default::default()
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("tools").is_none());
        assert!(json.get("generationConfig").is_none());
    }

    #[test]
    fn test_inline_part_serializes_inline_data() {
        let json = serde_json::to_value(RequestPart::inline("image/png", "AAAA")).unwrap();
        assert_eq!(json["inlineData"]["mimeType"], "image/png");
        assert_eq!(json["inlineData"]["data"], "AAAA");
    }

    #[test]
    fn test_response_text_skips_thoughts() {
        let body = r#"{
            "candidates": [{
                "content": {"parts": [
                    {"text": "thinking...", "thought": true},
                    {"text": "Hello "},
                    {"text": "world"}
                ], "role": "model"}
            }]
        }"#;
        let parsed: GeminiApiResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.text(), "Hello world");
    }

    #[test]
    fn test_operation_uri_from_either_envelope() {
        let sdk: OperationResource = serde_json::from_str(
            r#"{"done": true, "response": {"generatedVideos": [{"video": {"uri": "X"}}]}}"#,
        )
        .unwrap();
        assert_eq!(sdk.first_video_uri(), Some("X"));

        let rest: OperationResource = serde_json::from_str(
            r#"{"done": true, "response": {"generateVideoResponse": {"generatedSamples": [{"video": {"uri": "Y"}}]}}}"#,
        )
        .unwrap();
        assert_eq!(rest.first_video_uri(), Some("Y"));
    }
}
