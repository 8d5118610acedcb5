//! Gemini API transport
//!
//! Direct HTTP exchange with the Gemini REST API. Every function here performs
//! exactly one request and maps transport, status and envelope failures onto
//! `GenerationError::Service`.

use crate::generation::error::{GenerationError, ServiceErrorKind};
use crate::generation::gemini_types::GeminiApiResponse;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// POST a JSON body and decode the JSON answer
///
/// # Arguments
/// * `client` - Shared HTTP client
/// * `url` - Full endpoint URL (without credentials)
/// * `api_key` - Key appended as the `key` query parameter
/// * `body` - Request payload
///
/// # Errors
/// * `Service(Transport)` if the request could not be sent or the body read
/// * `Service(Unauthorized | RateLimited | Rejected)` for non-2xx statuses
/// * `Service(InvalidResponse)` if the 2xx body is not the expected JSON
pub async fn post_json<B, R>(
    client: &reqwest::Client,
    url: &str,
    api_key: &str,
    body: &B,
) -> Result<R, GenerationError>
where
    B: Serialize + ?Sized,
    R: DeserializeOwned,
{
    tracing::debug!(url = %url, "POST to Gemini API");

    let response = client
        .post(url)
        .query(&[("key", api_key)])
        .json(body)
        .send()
        .await
        .map_err(|e| {
            GenerationError::service(
                ServiceErrorKind::Transport,
                None,
                format!("Failed to send HTTP request to Gemini API: {}", e),
            )
        })?;

    decode_response(response).await
}

/// GET a resource and decode the JSON answer
///
/// Same error mapping as [`post_json`].
pub async fn get_json<R>(
    client: &reqwest::Client,
    url: &str,
    api_key: &str,
) -> Result<R, GenerationError>
where
    R: DeserializeOwned,
{
    tracing::debug!(url = %url, "GET from Gemini API");

    let response = client
        .get(url)
        .query(&[("key", api_key)])
        .send()
        .await
        .map_err(|e| {
            GenerationError::service(
                ServiceErrorKind::Transport,
                None,
                format!("Failed to send HTTP request to Gemini API: {}", e),
            )
        })?;

    decode_response(response).await
}

async fn decode_response<R: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<R, GenerationError> {
    // Check HTTP status
    let status = response.status();
    if !status.is_success() {
        let status_code = status.as_u16();
        let error_body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read error body".to_string());

        tracing::error!(
            status_code = status_code,
            error_body = %error_body,
            "Gemini API returned error status"
        );

        let kind = match status_code {
            401 | 403 => ServiceErrorKind::Unauthorized,
            429 => ServiceErrorKind::RateLimited,
            _ => ServiceErrorKind::Rejected,
        };
        return Err(GenerationError::service(
            kind,
            Some(status_code),
            format!(
                "Gemini API returned error status {}: {}",
                status_code, error_body
            ),
        ));
    }

    let response_body = response.text().await.map_err(|e| {
        GenerationError::service(
            ServiceErrorKind::Transport,
            Some(status.as_u16()),
            format!("Failed to read response body from Gemini API: {}", e),
        )
    })?;

    serde_json::from_str(&response_body).map_err(|e| {
        GenerationError::service(
            ServiceErrorKind::InvalidResponse,
            Some(status.as_u16()),
            format!(
                "Failed to parse JSON response from Gemini API: {} - Response body: {}",
                e, response_body
            ),
        )
    })
}

/// Reject responses whose prompt was blocked by the service
pub fn check_prompt_feedback(response: &GeminiApiResponse) -> Result<(), GenerationError> {
    if let Some(reason) = response
        .prompt_feedback
        .as_ref()
        .and_then(|feedback| feedback.block_reason.as_ref())
    {
        return Err(GenerationError::service(
            ServiceErrorKind::Rejected,
            None,
            format!("Gemini API blocked the prompt: {}", reason),
        ));
    }
    Ok(())
}
