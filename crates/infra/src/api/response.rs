//! Response interpretation
//!
//! Turns a [`RawResponse`] into the decoded body or an [`ApiError`]. The 401
//! refresh path is handled by the client before anything reaches here.

use agentcore_domain::{ApiError, Verb};
use serde_json::{Map, Value};

use crate::http::{RawResponse, TransportError};

/// Body fields checked, in order, for a server-supplied error message
const MESSAGE_FIELDS: &[&str] = &["detail", "message", "error"];

/// Decode a response
///
/// - 2xx with JSON → the decoded body
/// - 2xx with no body (204 included) → `{}`
/// - 2xx with anything else → `InvalidResponse`
/// - non-2xx → an error classified by status
pub fn interpret(verb: Verb, endpoint: &str, raw: &RawResponse) -> Result<Value, ApiError> {
    if raw.is_success() {
        return decode_success(verb, endpoint, raw);
    }

    let body = error_body(raw);
    let message = error_message(raw.status, body.as_ref());
    Err(ApiError::from_status(verb, endpoint, raw.status, message, body))
}

fn decode_success(verb: Verb, endpoint: &str, raw: &RawResponse) -> Result<Value, ApiError> {
    if raw.body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Map::new()));
    }

    serde_json::from_slice(&raw.body).map_err(|err| {
        ApiError::invalid_response(
            verb,
            endpoint,
            raw.status,
            format!("invalid JSON in response body: {err}"),
            Some(Value::String(raw.text())),
        )
    })
}

/// Parsed JSON when possible, raw text otherwise
fn error_body(raw: &RawResponse) -> Option<Value> {
    if raw.body.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    Some(serde_json::from_slice(&raw.body).unwrap_or_else(|_| Value::String(raw.text())))
}

/// Best-effort message: `detail`, `message`, `error`, then raw text, then the status
pub fn error_message(status: u16, body: Option<&Value>) -> String {
    let from_field = body.and_then(Value::as_object).and_then(|object| {
        MESSAGE_FIELDS.iter().find_map(|field| match object.get(*field)? {
            Value::String(text) if !text.is_empty() => Some(text.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        })
    });

    from_field
        .or_else(|| match body? {
            Value::String(text) => Some(text.trim().to_string()),
            other => Some(other.to_string()),
        })
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| format!("HTTP {status}"))
}

/// Map a failure to obtain any response
pub fn transport_error(verb: Verb, endpoint: &str, err: &TransportError) -> ApiError {
    if err.is_timeout() {
        ApiError::timeout(verb, endpoint, err.to_string())
    } else {
        ApiError::network(verb, endpoint, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use agentcore_domain::ApiErrorKind;
    use serde_json::json;

    use super::*;

    const ENDPOINT: &str = "/api/projects/";

    #[test]
    fn test_json_body_is_decoded() {
        let raw = RawResponse::json(200, &json!([{"id": 1}]));
        assert_eq!(interpret(Verb::Get, ENDPOINT, &raw).unwrap(), json!([{"id": 1}]));
    }

    #[test]
    fn test_no_content_is_empty_object() {
        let raw = RawResponse::new(204, "");
        assert_eq!(interpret(Verb::Delete, ENDPOINT, &raw).unwrap(), json!({}));
    }

    #[test]
    fn test_non_json_success_is_invalid_response() {
        let raw = RawResponse::new(200, "<html>");
        let err = interpret(Verb::Get, ENDPOINT, &raw).unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::InvalidResponse);
        assert!(err.message.contains("invalid JSON"));
        assert_eq!(err.status_code, Some(200));
        assert_eq!(err.body, Some(json!("<html>")));
    }

    #[test]
    fn test_detail_field_is_the_message() {
        let raw = RawResponse::json(422, &json!({"detail": "bad"}));
        let err = interpret(Verb::Post, ENDPOINT, &raw).unwrap_err();
        assert_eq!(err.message, "bad");
        assert_eq!(err.status_code, Some(422));
        assert_eq!(err.body, Some(json!({"detail": "bad"})));
        assert_eq!(err.kind, ApiErrorKind::Client);
    }

    #[test]
    fn test_message_and_error_fields() {
        assert_eq!(error_message(400, Some(&json!({"message": "m"}))), "m");
        assert_eq!(error_message(400, Some(&json!({"error": "e", "x": 1}))), "e");
        assert_eq!(
            error_message(400, Some(&json!({"error": {"code": "E1"}}))),
            r#"{"code":"E1"}"#
        );
    }

    #[test]
    fn test_fallback_to_raw_text_then_status() {
        let raw = RawResponse::new(502, "Bad Gateway\n");
        let err = interpret(Verb::Get, ENDPOINT, &raw).unwrap_err();
        assert_eq!(err.message, "Bad Gateway");
        assert_eq!(err.kind, ApiErrorKind::Server);

        let raw = RawResponse::new(503, "");
        let err = interpret(Verb::Get, ENDPOINT, &raw).unwrap_err();
        assert_eq!(err.message, "HTTP 503");
        assert_eq!(err.body, None);
    }

    #[test]
    fn test_field_errors_fall_back_to_json_text() {
        let body = json!({"name": ["This field is required."]});
        assert_eq!(error_message(400, Some(&body)), body.to_string());
    }

    #[test]
    fn test_transport_errors_have_no_status() {
        let err = transport_error(Verb::Get, ENDPOINT, &TransportError::Connect("DNS".into()));
        assert_eq!(err.kind, ApiErrorKind::Network);
        assert_eq!(err.status_code, None);
        assert!(err.message.contains("DNS"));

        let err =
            transport_error(Verb::Get, ENDPOINT, &TransportError::Timeout(Duration::from_secs(30)));
        assert_eq!(err.kind, ApiErrorKind::Timeout);
    }
}
