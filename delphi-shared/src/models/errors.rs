use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error body returned by the backend.
///
/// `FastAPI` backends send `{"detail": ...}` where `detail` is either a string
/// or a list of validation problems; other backends send
/// `{"message": ..., "details": ...}`. Both shapes are accepted.
#[derive(Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct ErrorResponse {
    /// `FastAPI` style detail payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<Value>,
    /// The main error message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Optional additional details about the error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    /// Flattens whichever shape the backend used into one line, or `None`
    /// when the body carried nothing useful.
    #[must_use]
    pub fn summary(&self) -> Option<String> {
        if let Some(detail) = &self.detail {
            return match detail {
                Value::String(text) => Some(text.clone()),
                Value::Array(items) => {
                    let parts: Vec<String> = items
                        .iter()
                        .map(|item| {
                            item.get("msg")
                                .and_then(Value::as_str)
                                .map_or_else(|| item.to_string(), str::to_string)
                        })
                        .collect();
                    Some(parts.join("; "))
                }
                Value::Null => None,
                other => Some(other.to_string()),
            };
        }
        match (&self.message, &self.details) {
            (Some(message), Some(details)) => Some(format!("{message}: {details}")),
            (Some(message), None) => Some(message.clone()),
            (None, Some(details)) => Some(details.clone()),
            (None, None) => None,
        }
    }
}

impl std::fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.summary() {
            Some(summary) => f.write_str(&summary),
            None => f.write_str("unknown error"),
        }
    }
}

impl std::error::Error for ErrorResponse {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fastapi_string_detail() {
        let error: ErrorResponse =
            serde_json::from_str(r#"{"detail":"Tweet not found"}"#).unwrap();
        assert_eq!(error.summary().as_deref(), Some("Tweet not found"));
        assert_eq!(error.to_string(), "Tweet not found");
    }

    #[test]
    fn test_fastapi_validation_detail() {
        let json = r#"{"detail":[{"loc":["body","text"],"msg":"field required","type":"missing"},{"msg":"too long"}]}"#;
        let error: ErrorResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            error.summary().as_deref(),
            Some("field required; too long")
        );
    }

    #[test]
    fn test_message_and_details() {
        let error: ErrorResponse =
            serde_json::from_str(r#"{"message":"Bot limit reached","details":"max 3 bots"}"#)
                .unwrap();
        assert_eq!(error.to_string(), "Bot limit reached: max 3 bots");

        let error: ErrorResponse = serde_json::from_str(r#"{"details":"only details"}"#).unwrap();
        assert_eq!(error.to_string(), "only details");
    }

    #[test]
    fn test_empty_body_has_no_summary() {
        let error: ErrorResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(error.summary(), None);
        assert_eq!(error.to_string(), "unknown error");
    }

    #[test]
    fn test_error_response_as_error() {
        let error: ErrorResponse = serde_json::from_str(r#"{"message":"Error trait test"}"#).unwrap();
        let error_trait: &dyn std::error::Error = &error;
        assert!(error_trait.to_string().contains("Error trait test"));
    }
}
