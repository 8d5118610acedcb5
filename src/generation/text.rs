//! Text and grounded-text modality

use crate::generation::api_client::check_prompt_feedback;
use crate::generation::error::GenerationError;
use crate::generation::gemini_types::{
    GeminiApiRequest, GeminiApiResponse, RequestContent, RequestPart, Tool,
};
use crate::generation::request::{Source, TextResult};

/// Build a `generateContent` body for plain or grounded text
pub fn build_request(
    prompt: &str,
    system_instruction: Option<&str>,
    use_grounded_search: bool,
) -> GeminiApiRequest {
    GeminiApiRequest {
        contents: vec![RequestContent::user(vec![RequestPart::text(prompt)])],
        system_instruction: system_instruction.map(RequestContent::system),
        tools: if use_grounded_search {
            vec![Tool::web_search()]
        } else {
            Vec::new()
        },
        generation_config: None,
    }
}

/// Normalise a response into a `TextResult`
///
/// Missing content yields an empty string, never an error. Sources keep the
/// service's order; chunks without a web URI are skipped.
pub fn parse_response(response: &GeminiApiResponse) -> Result<TextResult, GenerationError> {
    check_prompt_feedback(response)?;

    let sources = response
        .candidates
        .first()
        .and_then(|c| c.grounding_metadata.as_ref())
        .map(|meta| {
            meta.grounding_chunks
                .iter()
                .filter_map(|chunk| chunk.web.as_ref())
                .filter_map(|web| {
                    web.uri.as_ref().map(|uri| Source {
                        uri: uri.clone(),
                        title: web.title.clone().unwrap_or_default(),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(TextResult {
        text: response.text(),
        sources,
    })
}
