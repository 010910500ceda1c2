use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};

/// Step of the bot reply pipeline for one message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DebugStep {
    /// The backend picked up the mention.
    Started,
    /// The bot is reading the tweet.
    Analyzing,
    /// The bot is writing its reply.
    Generating,
    /// The reply was posted.
    Completed,
    /// The pipeline gave up; see [`DebugInfo::error`].
    Error,
    /// Any step this client does not know.
    #[serde(other)]
    Unknown,
}

impl DebugStep {
    /// `completed` and `error` end the pipeline.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }
}

impl Display for DebugStep {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let label = match self {
            Self::Started => "started",
            Self::Analyzing => "analyzing",
            Self::Generating => "generating",
            Self::Completed => "completed",
            Self::Error => "error",
            Self::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// Intermediate state of the reply pipeline, from `GET /api/debug/{id}`.
///
/// The backend answers `{}` until it has a record for the message, so every
/// field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DebugInfo {
    /// Current step, absent before the backend has a record.
    #[serde(default)]
    pub step: Option<DebugStep>,
    /// Prompt used to analyze the tweet.
    #[serde(default)]
    pub analysis_prompt: Option<String>,
    /// Model output of the analysis.
    #[serde(default)]
    pub analysis_response: Option<String>,
    /// Prompt used to write the reply.
    #[serde(default)]
    pub final_prompt: Option<String>,
    /// The reply text.
    #[serde(default)]
    pub final_response: Option<String>,
    /// Failure reason for an `error` step.
    #[serde(default)]
    pub error: Option<String>,
}

impl DebugInfo {
    /// Whether the current step ends the pipeline.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.step.is_some_and(DebugStep::is_terminal)
    }

    /// Error text to show for an `error` step.
    #[must_use]
    pub fn error_message(&self) -> String {
        self.error
            .clone()
            .filter(|text| !text.trim().is_empty())
            .unwrap_or_else(|| "Failed to process bot response".to_string())
    }

    /// Labelled, non-empty text sections in pipeline order.
    #[must_use]
    pub fn sections(&self) -> Vec<(&'static str, &str)> {
        [
            ("Analysis prompt", &self.analysis_prompt),
            ("Analysis response", &self.analysis_response),
            ("Final prompt", &self.final_prompt),
            ("Final response", &self.final_response),
            ("Error", &self.error),
        ]
        .into_iter()
        .filter_map(|(label, value)| {
            value
                .as_deref()
                .filter(|text| !text.is_empty())
                .map(|text| (label, text))
        })
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_means_no_step_yet() {
        let info: DebugInfo = serde_json::from_str("{}").unwrap();
        assert_eq!(info, DebugInfo::default());
        assert!(!info.is_terminal());
    }

    #[test]
    fn test_unknown_step_tag_is_tolerated() {
        let info: DebugInfo = serde_json::from_str(r#"{"step":"retrieving"}"#).unwrap();
        assert_eq!(info.step, Some(DebugStep::Unknown));
        assert!(!info.is_terminal());
    }

    #[test]
    fn test_terminal_steps() {
        assert!(DebugStep::Completed.is_terminal());
        assert!(DebugStep::Error.is_terminal());
        assert!(!DebugStep::Started.is_terminal());
        assert!(!DebugStep::Analyzing.is_terminal());
        assert!(!DebugStep::Generating.is_terminal());
    }

    #[test]
    fn test_completed_payload() {
        let json = r#"{
            "step": "completed",
            "analysis_prompt": "ap",
            "analysis_response": "ar",
            "final_prompt": "fp",
            "final_response": "fr"
        }"#;
        let info: DebugInfo = serde_json::from_str(json).unwrap();
        assert!(info.is_terminal());
        let labels: Vec<&str> = info.sections().into_iter().map(|(label, _)| label).collect();
        assert_eq!(
            labels,
            vec![
                "Analysis prompt",
                "Analysis response",
                "Final prompt",
                "Final response"
            ]
        );
    }

    #[test]
    fn test_error_message_default() {
        let info = DebugInfo {
            step: Some(DebugStep::Error),
            ..DebugInfo::default()
        };
        assert_eq!(info.error_message(), "Failed to process bot response");

        let info = DebugInfo {
            error: Some("rate limited".into()),
            ..info
        };
        assert_eq!(info.error_message(), "rate limited");
    }
}
