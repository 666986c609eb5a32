//! Failure taxonomy for registry API calls.
//!
//! Every non-2xx response is reduced to a single message using a fixed priority: the JSON
//! `error` string the backend attaches to validation failures, else the raw body, else a generic
//! `HTTP {status}` line. The status code then picks the variant.

use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The backend rejected a create/update payload (400 or 422).
    #[error("{message}")]
    Validation { status: u16, message: String },
    /// The targeted record does not exist (404).
    #[error("{message}")]
    NotFound { message: String },
    /// Any other non-2xx status.
    #[error("{message}")]
    UnexpectedStatus { status: u16, message: String },
    /// No response reached the client.
    #[error("network error: {0}")]
    Transport(String),
    /// A 2xx response whose body could not be decoded.
    #[error("failed to decode response: {0}")]
    Decode(String),
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl ApiError {
    /// Classifies a non-success response.
    ///
    /// # Arguments
    /// * `status` - HTTP status code of the response
    /// * `body` - Response body as text (possibly empty)
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = extract_error_message(status, body);
        match status {
            404 => ApiError::NotFound { message },
            400 | 422 => ApiError::Validation { status, message },
            _ => ApiError::UnexpectedStatus { status, message },
        }
    }

    /// Text shown to the operator.
    ///
    /// Server-provided messages are passed through verbatim; transport and decode failures get a
    /// short prefix so the operator can tell them apart from backend validation.
    pub fn operator_message(&self) -> String {
        match self {
            ApiError::Validation { message, .. }
            | ApiError::NotFound { message }
            | ApiError::UnexpectedStatus { message, .. } => message.clone(),
            ApiError::Transport(detail) => format!("Error de red: {detail}"),
            ApiError::Decode(detail) => format!("Respuesta inválida del servidor: {detail}"),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Validation { status, .. } | ApiError::UnexpectedStatus { status, .. } => {
                Some(*status)
            }
            ApiError::NotFound { .. } => Some(404),
            ApiError::Transport(_) | ApiError::Decode(_) => None,
        }
    }
}

/// Extracts the operator-facing message from an error response body.
pub fn extract_error_message(status: u16, body: &str) -> String {
    if let Ok(Value::Object(obj)) = serde_json::from_str::<Value>(body) {
        if let Some(Value::String(message)) = obj.get("error") {
            if !message.trim().is_empty() {
                return message.clone();
            }
        }
    }

    let raw = body.trim();
    if !raw.is_empty() {
        return raw.to_string();
    }

    format!("HTTP {status}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structured_error_is_passed_through_verbatim() {
        let err = ApiError::from_status(400, r#"{"error": "glucose_mgdl must be numeric"}"#);
        assert_eq!(
            err,
            ApiError::Validation {
                status: 400,
                message: "glucose_mgdl must be numeric".into()
            }
        );
        assert_eq!(err.operator_message(), "glucose_mgdl must be numeric");
    }

    #[test]
    fn test_falls_back_to_raw_body() {
        assert_eq!(
            extract_error_message(500, "<h1>Internal Server Error</h1>\n"),
            "<h1>Internal Server Error</h1>"
        );
        // JSON without an `error` key is still shown as the raw body.
        assert_eq!(
            extract_error_message(409, r#"{"detail":"conflict"}"#),
            r#"{"detail":"conflict"}"#
        );
    }

    #[test]
    fn test_falls_back_to_status_line() {
        assert_eq!(extract_error_message(502, ""), "HTTP 502");
        assert_eq!(extract_error_message(503, "  \n"), "HTTP 503");
    }

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            ApiError::from_status(404, ""),
            ApiError::NotFound { message } if message == "HTTP 404"
        ));
        assert!(matches!(
            ApiError::from_status(422, "bad"),
            ApiError::Validation { status: 422, .. }
        ));
        assert!(matches!(
            ApiError::from_status(500, ""),
            ApiError::UnexpectedStatus { status: 500, .. }
        ));
    }

    #[test]
    fn test_transport_operator_message_keeps_detail() {
        let err = ApiError::Transport("connection refused".into());
        assert_eq!(err.operator_message(), "Error de red: connection refused");
        assert_eq!(err.status(), None);
    }
}
