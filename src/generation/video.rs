//! Video modality: job start, status mapping and download URLs

use crate::generation::error::{
    FailureReason, GenerationError, ServiceErrorKind, NO_RESULT_DETAIL,
};
use crate::generation::gemini_types::{
    OperationResource, VideoApiRequest, VideoInstance, VideoParameters,
};
use crate::generation::operation::{Operation, OperationStatus};
use crate::generation::request::VideoAspectRatio;

/// Build a `predictLongRunning` body for a single video
pub fn build_request(
    prompt: &str,
    aspect_ratio: VideoAspectRatio,
    resolution: &str,
) -> VideoApiRequest {
    VideoApiRequest {
        instances: vec![VideoInstance {
            prompt: prompt.to_string(),
        }],
        parameters: VideoParameters {
            aspect_ratio: aspect_ratio.as_str().to_string(),
            resolution: resolution.to_string(),
            sample_count: 1,
        },
    }
}

/// Turn the start response into an INITIATED snapshot
///
/// A response without a resource name cannot be tracked and is reported as
/// an invalid service response.
pub fn operation_from_start(resource: &OperationResource) -> Result<Operation, GenerationError> {
    match resource.name.as_deref().filter(|n| !n.is_empty()) {
        Some(name) => Ok(Operation::initiated(name)),
        None => Err(GenerationError::service(
            ServiceErrorKind::InvalidResponse,
            None,
            "video job accepted without an operation name",
        )),
    }
}

/// Map a poll response onto the next snapshot
///
/// INITIATED snapshots pass through POLLING first so every produced snapshot
/// respects the forward-only lifecycle. Terminal snapshots are returned as-is.
pub fn next_snapshot(
    previous: &Operation,
    resource: &OperationResource,
) -> Result<Operation, GenerationError> {
    if previous.is_terminal() {
        return Ok(previous.clone());
    }

    let mut polling = if previous.status == OperationStatus::Initiated {
        previous.advance(OperationStatus::Polling)?
    } else {
        previous.clone()
    };
    polling.polls += 1;

    if let Some(error) = &resource.error {
        let message = error
            .message
            .clone()
            .unwrap_or_else(|| format!("error code {}", error.code.unwrap_or_default()));
        return Ok(polling.failed(message));
    }

    if !resource.done {
        return polling.advance(OperationStatus::Polling);
    }

    match resource.first_video_uri() {
        Some(uri) => {
            let mut done = polling.advance(OperationStatus::Done)?;
            done.result_location = Some(uri.to_string());
            Ok(done)
        }
        None => Ok(polling.failed(NO_RESULT_DETAIL)),
    }
}

/// Append the credential to a raw media URI
pub fn download_url(location: &str, api_key: &str) -> String {
    let separator = if location.contains('?') { '&' } else { '?' };
    format!("{}{}key={}", location, separator, api_key)
}

/// Fetchable URL for a DONE snapshot
///
/// # Errors
/// * `OperationFailure(NotReady)` if the snapshot is not DONE or has no location
pub fn resolve_download_url(operation: &Operation, api_key: &str) -> Result<String, GenerationError> {
    if operation.status != OperationStatus::Done {
        return Err(GenerationError::operation(
            &operation.handle,
            FailureReason::NotReady(format!("status is {}", operation.status)),
        ));
    }
    match operation.result_location.as_deref() {
        Some(location) => Ok(download_url(location, api_key)),
        None => Err(GenerationError::operation(
            &operation.handle,
            FailureReason::NotReady("no result location".to_string()),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resource(body: &str) -> OperationResource {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn test_request_shape() {
        let json = serde_json::to_value(build_request(
            "a drone shot",
            VideoAspectRatio::Portrait,
            "720p",
        ))
        .unwrap();
        assert_eq!(json["instances"][0]["prompt"], "a drone shot");
        assert_eq!(json["parameters"]["aspectRatio"], "9:16");
        assert_eq!(json["parameters"]["sampleCount"], 1);
    }

    #[test]
    fn test_start_requires_name() {
        assert!(operation_from_start(&resource(r#"{"done": false}"#)).is_err());
        let op = operation_from_start(&resource(r#"{"name": "models/veo/operations/1"}"#)).unwrap();
        assert_eq!(op.status, OperationStatus::Initiated);
    }

    #[test]
    fn test_not_done_keeps_polling() {
        let op = Operation::initiated("h");
        let next = next_snapshot(&op, &resource(r#"{"name": "h", "done": false}"#)).unwrap();
        assert_eq!(next.status, OperationStatus::Polling);
        assert_eq!(next.polls, 1);
    }

    #[test]
    fn test_done_with_uri_from_either_envelope() {
        let op = Operation::initiated("h");
        let sdk = r#"{"done": true, "response": {"generatedVideos": [{"video": {"uri": "X"}}]}}"#;
        let rest = r#"{"done": true, "response": {"generateVideoResponse": {"generatedSamples": [{"video": {"uri": "Y"}}]}}}"#;
        let done = next_snapshot(&op, &resource(sdk)).unwrap();
        assert_eq!(done.status, OperationStatus::Done);
        assert_eq!(done.result_location.as_deref(), Some("X"));
        let done = next_snapshot(&op, &resource(rest)).unwrap();
        assert_eq!(done.result_location.as_deref(), Some("Y"));
    }

    #[test]
    fn test_done_without_video_fails() {
        let op = Operation::initiated("h");
        let failed = next_snapshot(&op, &resource(r#"{"done": true, "response": {}}"#)).unwrap();
        assert_eq!(failed.status, OperationStatus::Failed);
        assert!(failed.error.unwrap().contains("without a video"));
    }

    #[test]
    fn test_service_error_fails() {
        let op = Operation::initiated("h");
        let failed = next_snapshot(
            &op,
            &resource(r#"{"done": true, "error": {"code": 3, "message": "unsafe prompt"}}"#),
        )
        .unwrap();
        assert_eq!(failed.status, OperationStatus::Failed);
        assert!(failed.error.unwrap().contains("unsafe prompt"));
    }

    #[test]
    fn test_download_url_separator() {
        assert_eq!(download_url("https://v/file", "K"), "https://v/file?key=K");
        assert_eq!(
            download_url("https://v/file?alt=media", "K"),
            "https://v/file?alt=media&key=K"
        );
    }

    #[test]
    fn test_resolve_requires_done() {
        let op = Operation::initiated("h");
        let err = resolve_download_url(&op, "K").unwrap_err();
        assert!(err.to_string().contains("status is INITIATED"));
    }
}
