//! Structured (schema-constrained) modality
//!
//! The schema is declared to the service; the answer is only re-parsed as
//! JSON. A single parse failure is terminal for the call.

use crate::generation::api_client::check_prompt_feedback;
use crate::generation::error::GenerationError;
use crate::generation::gemini_types::{
    GeminiApiRequest, GeminiApiResponse, GenerationConfig, RequestContent, RequestPart,
};
use crate::generation::request::StructuredResult;
use crate::generation::schema::Schema;
use serde::de::DeserializeOwned;

const JSON_MIME_TYPE: &str = "application/json";

/// Build a `generateContent` body declaring `schema` as the output shape
pub fn build_request(
    prompt: &str,
    schema: &Schema,
    system_instruction: Option<&str>,
) -> GeminiApiRequest {
    GeminiApiRequest {
        contents: vec![RequestContent::user(vec![RequestPart::text(prompt)])],
        system_instruction: system_instruction.map(RequestContent::system),
        tools: Vec::new(),
        generation_config: Some(GenerationConfig {
            response_mime_type: Some(JSON_MIME_TYPE.to_string()),
            response_schema: Some(schema.to_response_schema()),
            image_config: None,
        }),
    }
}

/// Parse the response text as `T`
///
/// # Errors
/// * `Service(Rejected)` if the prompt was blocked
/// * `SchemaParse` if the text is empty or does not deserialize; `raw` carries the text
pub fn parse_response<T: DeserializeOwned>(
    response: &GeminiApiResponse,
) -> Result<StructuredResult<T>, GenerationError> {
    check_prompt_feedback(response)?;

    let raw = response.text();
    if raw.trim().is_empty() {
        return Err(GenerationError::SchemaParse {
            message: "service returned no content".to_string(),
            raw,
        });
    }

    match serde_json::from_str::<T>(&raw) {
        Ok(value) => Ok(StructuredResult { value, raw }),
        Err(e) => {
            tracing::warn!(
                error = %e,
                raw_len = raw.len(),
                "Structured response failed to parse"
            );
            Err(GenerationError::SchemaParse {
                message: e.to_string(),
                raw,
            })
        }
    }
}
