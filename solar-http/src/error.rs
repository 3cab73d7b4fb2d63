//! Turning failed HTTP responses into [`ApiError`]s.

use reqwest::StatusCode;
use serde_json::Value;
use solar_core::ApiError;

/// Pulls the human-readable message out of an error body.
///
/// Looks at `error`, then the first message under `errors` (the service's
/// per-field validation map), then `detail`. Returns `None` when the body
/// is not JSON or carries none of them.
pub fn extract_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let object = value.as_object()?;

    if let Some(error) = object.get("error").and_then(first_text) {
        return Some(error);
    }
    if let Some(errors) = object.get("errors") {
        let first = match errors {
            Value::Object(fields) => fields.values().next(),
            Value::Array(items) => items.first(),
            other => Some(other),
        };
        return Some(
            first
                .and_then(first_text)
                .unwrap_or_else(|| "Validation error".to_string()),
        );
    }
    object.get("detail").and_then(first_text)
}

/// Text of a string, or of the first string inside a list.
fn first_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Array(items) => items.iter().find_map(first_text),
        _ => None,
    }
}

/// Maps a non-success status and its body to the matching error.
pub fn error_for_status(status: StatusCode, body: &str) -> ApiError {
    let message = extract_error_message(body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
    });

    match status {
        StatusCode::NOT_FOUND => ApiError::NotFound,
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => ApiError::Validation(message),
        _ => ApiError::Server {
            status: status.as_u16(),
            message,
        },
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    // =========================================================================
    // extract_error_message
    // =========================================================================

    #[test]
    fn error_key_wins() {
        let body = r#"{"error": "Error al crear la simulación", "errors": {"a": ["b"]}, "detail": "c"}"#;
        assert_eq!(
            extract_error_message(body).as_deref(),
            Some("Error al crear la simulación")
        );
    }

    #[test]
    fn first_field_of_errors_map_in_body_order() {
        let body = r#"{"errors": {"user_phone": ["too short"], "user_email": ["invalid"]}, "success": false}"#;
        assert_eq!(extract_error_message(body).as_deref(), Some("too short"));
    }

    #[test]
    fn errors_list_is_supported() {
        let body = r#"{"errors": ["Provide one simulation parameter"]}"#;
        assert_eq!(
            extract_error_message(body).as_deref(),
            Some("Provide one simulation parameter")
        );
    }

    #[test]
    fn empty_errors_falls_back_to_generic_text() {
        assert_eq!(
            extract_error_message(r#"{"errors": {}}"#).as_deref(),
            Some("Validation error")
        );
    }

    #[test]
    fn detail_is_last_resort() {
        assert_eq!(
            extract_error_message(r#"{"detail": "Not found."}"#).as_deref(),
            Some("Not found.")
        );
    }

    #[test]
    fn non_json_body_has_no_message() {
        assert_eq!(extract_error_message("<html>502</html>"), None);
        assert_eq!(extract_error_message(r#"{"success": false}"#), None);
    }

    // =========================================================================
    // error_for_status
    // =========================================================================

    #[test]
    fn bad_request_is_a_validation_error() {
        let err = error_for_status(
            StatusCode::BAD_REQUEST,
            r#"{"errors": {"monthly_bill_local_currency": ["must be positive"]}}"#,
        );
        assert_eq!(err, ApiError::Validation("must be positive".to_string()));
    }

    #[test]
    fn not_found_maps_to_not_found() {
        assert_eq!(
            error_for_status(StatusCode::NOT_FOUND, r#"{"detail": "Not found."}"#),
            ApiError::NotFound
        );
    }

    #[test]
    fn server_error_without_body_uses_status_text() {
        assert_eq!(
            error_for_status(StatusCode::BAD_GATEWAY, ""),
            ApiError::Server {
                status: 502,
                message: "Bad Gateway".to_string(),
            }
        );
    }
}
