use chrono::{DateTime, Local, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Represents a single posted message (a "tweet") as returned by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    /// Opaque identifier assigned by the backend.
    pub id: String,

    /// The message text.
    pub text: String,

    /// Display name of the author.
    pub author: String,

    /// Creation time exactly as the backend reported it.
    #[serde(default)]
    pub timestamp: String,

    /// Identifier of the message this one replies to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

impl Message {
    /// Parses the backend timestamp.
    ///
    /// The backend emits either RFC 3339 values or naive ISO-8601 values
    /// (which are treated as UTC).
    #[must_use]
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.timestamp.trim();
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Some(parsed.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
            .ok()
            .map(|naive| naive.and_utc())
    }

    /// Human readable creation time in local time, or `Just now` when the
    /// timestamp is missing or unparseable.
    #[must_use]
    pub fn display_time(&self) -> String {
        self.created_at().map_or_else(
            || "Just now".to_string(),
            |ts| {
                ts.with_timezone(&Local)
                    .format("%Y-%m-%d %H:%M:%S")
                    .to_string()
            },
        )
    }
}

/// Errors raised when a submission is rejected before reaching the backend.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    /// Text is empty or whitespace.
    #[error("message text must not be empty")]
    EmptyText,
    /// No author name; usually nobody is logged in.
    #[error("author must not be empty; run `delphi login <name>` first")]
    EmptyAuthor,
}

/// Payload for creating a new message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewMessage {
    /// The message text.
    pub text: String,

    /// Display name of the author.
    pub author: String,

    /// Message being replied to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

impl NewMessage {
    /// A top-level message.
    #[must_use]
    pub fn new(text: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            author: author.into(),
            parent_id: None,
        }
    }

    /// Turns the message into a reply to `parent_id`.
    #[must_use]
    pub fn replying_to(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    /// Rejects blank text or author.
    ///
    /// # Errors
    /// Returns the first [`InputError`] found.
    pub fn validate(&self) -> Result<(), InputError> {
        if self.text.trim().is_empty() {
            return Err(InputError::EmptyText);
        }
        if self.author.trim().is_empty() {
            return Err(InputError::EmptyAuthor);
        }
        Ok(())
    }
}

/// Body returned by `POST /api/tweets`.
///
/// Newer backends wrap the created message as `{"tweet": {...}}`, older ones
/// return it bare.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum CreateMessageResponse {
    /// `{"tweet": {...}}`
    Wrapped {
        /// The created message.
        tweet: Message,
    },
    /// The message object itself.
    Bare(Message),
}

impl CreateMessageResponse {
    /// The created message, whichever shape it arrived in.
    #[must_use]
    pub fn into_message(self) -> Message {
        match self {
            Self::Wrapped { tweet } => tweet,
            Self::Bare(message) => message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn message(timestamp: &str) -> Message {
        Message {
            id: "m-1".to_string(),
            text: "hello @delphibot".to_string(),
            author: "ada".to_string(),
            timestamp: timestamp.to_string(),
            parent_id: None,
        }
    }

    #[test]
    fn test_deserialize_backend_tweet_with_extra_fields() {
        let json = r#"{
            "id": "a1",
            "text": "hi",
            "author": "ada",
            "timestamp": "2024-11-02T10:15:30.123456",
            "parent_id": null,
            "thread_id": null,
            "mentions": [],
            "responses": ["b2"],
            "is_existing": false
        }"#;
        let parsed: Message = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.id, "a1");
        assert_eq!(parsed.parent_id, None);
    }

    #[test]
    fn test_created_at_accepts_naive_and_rfc3339() {
        let expected = Utc.with_ymd_and_hms(2024, 11, 2, 10, 15, 30).unwrap();

        let naive = message("2024-11-02T10:15:30");
        assert_eq!(naive.created_at(), Some(expected));

        let zoned = message("2024-11-02T12:15:30+02:00");
        assert_eq!(zoned.created_at(), Some(expected));

        let spaced = message("2024-11-02 10:15:30.5");
        assert!(spaced.created_at().is_some());
    }

    #[test]
    fn test_display_time_falls_back_for_garbage() {
        assert_eq!(message("not a date").display_time(), "Just now");
        assert_eq!(message("").display_time(), "Just now");
    }

    #[test]
    fn test_new_message_omits_missing_parent() {
        let payload = NewMessage::new("hi", "ada");
        let json = serde_json::to_string(&payload).unwrap();
        assert_eq!(json, r#"{"text":"hi","author":"ada"}"#);

        let reply = NewMessage::new("hi", "ada").replying_to("p1");
        let json = serde_json::to_string(&reply).unwrap();
        assert!(json.contains(r#""parent_id":"p1""#));
    }

    #[test]
    fn test_new_message_validation() {
        assert_eq!(NewMessage::new("  ", "ada").validate(), Err(InputError::EmptyText));
        assert_eq!(NewMessage::new("hi", "").validate(), Err(InputError::EmptyAuthor));
        assert!(NewMessage::new("hi", "ada").validate().is_ok());
    }

    #[test]
    fn test_create_response_wrapped_and_bare() {
        let wrapped = r#"{"tweet":{"id":"1","text":"t","author":"a","timestamp":"x"}}"#;
        let bare = r#"{"id":"1","text":"t","author":"a","timestamp":"x"}"#;

        let a: CreateMessageResponse = serde_json::from_str(wrapped).unwrap();
        let b: CreateMessageResponse = serde_json::from_str(bare).unwrap();
        assert_eq!(a.into_message(), b.into_message());
    }
}
