//! Error mapping for assistant API responses
//!
//! Non-success responses always become `AssistantError::Api` with the body
//! kept verbatim. When the body is the API's JSON error envelope, its type,
//! code and message are lifted into the error context.

use reqwest::StatusCode;
use serde_json::Value;

use super::{AssistantError, ErrorContext};

/// Map a non-success assistant API response to an AssistantError
pub fn map_api_error(status: StatusCode, body: &str, context: &mut ErrorContext) -> AssistantError {
    context.status_code = Some(status.as_u16());
    context.add("category", classify_http_error(status));

    if let Ok(json) = serde_json::from_str::<Value>(body) {
        extract_error_envelope(&json, context);
    }

    AssistantError::api(status.as_u16(), body)
}

/// Copy `error.type`, `error.code` and `error.message` into the context
fn extract_error_envelope(json: &Value, context: &mut ErrorContext) {
    let Some(error) = json.get("error") else {
        return;
    };

    if let Some(error_type) = error.get("type").and_then(|t| t.as_str()) {
        context.add("error_type", error_type);
    }

    if let Some(code) = error.get("code").and_then(|c| c.as_str()) {
        context.error_code = Some(code.to_string());
    }

    if let Some(message) = error.get("message").and_then(|m| m.as_str()) {
        context.add("error_message", message);
    }
}

/// Helper function to classify HTTP errors by category
pub fn classify_http_error(status: StatusCode) -> &'static str {
    match status.as_u16() {
        400 => "validation",
        401 => "authentication",
        403 => "authorization",
        404 => "not_found",
        408 => "timeout",
        429 => "rate_limit",
        500..=599 => "server",
        _ => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_envelope_is_lifted_into_context() {
        let body = r#"{"error":{"message":"No thread found with id 'thread_x'.","type":"invalid_request_error","code":"not_found"}}"#;
        let mut context = ErrorContext::for_service("assistants");

        let error = map_api_error(StatusCode::NOT_FOUND, body, &mut context);

        assert_eq!(error.status_code(), Some(404));
        assert_eq!(error.body(), Some(body));
        assert_eq!(context.error_code.as_deref(), Some("not_found"));
        assert_eq!(context.data.get("error_type").map(String::as_str), Some("invalid_request_error"));
        assert_eq!(context.data.get("category").map(String::as_str), Some("not_found"));
    }

    #[test]
    fn test_plain_body_is_kept_verbatim() {
        let mut context = ErrorContext::for_service("assistants");
        let error = map_api_error(StatusCode::BAD_GATEWAY, "upstream connect error", &mut context);

        assert!(error.is_api());
        assert_eq!(error.body(), Some("upstream connect error"));
        assert!(context.error_code.is_none());
        assert_eq!(context.data.get("category").map(String::as_str), Some("server"));
    }
}
