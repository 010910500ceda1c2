use serde::{Deserialize, Serialize};

/// A simulated bot that answers `@mentions`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Bot {
    /// Backend identifier, used by the per-bot toggle route.
    pub id: String,
    /// Handle the bot answers to, without the `@`.
    pub name: String,
    /// Whether the bot currently answers mentions.
    pub is_active: bool,
    /// Creation time as reported by the backend.
    #[serde(default)]
    pub timestamp: String,
    /// Bots seeded by the backend rather than created by a user.
    #[serde(default)]
    pub is_existing: bool,
}

/// Process status reported by `GET /` and the toggle endpoints.
///
/// Single-bot backends only send `active`; multi-bot backends also list
/// every bot with its own flag.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BotStatus {
    /// Whether any bot is answering.
    pub active: bool,
    /// Per-bot flags, empty on single-bot backends.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bots: Vec<Bot>,
}

impl BotStatus {
    /// Names of the bots that currently answer mentions.
    ///
    /// When the backend does not list bots, `fallback` stands in for the
    /// single default bot.
    #[must_use]
    pub fn active_names<'a>(&'a self, fallback: &'a [String]) -> Vec<&'a str> {
        if self.bots.is_empty() {
            if self.active {
                fallback.iter().map(String::as_str).collect()
            } else {
                Vec::new()
            }
        } else {
            self.bots
                .iter()
                .filter(|bot| bot.is_active)
                .map(|bot| bot.name.as_str())
                .collect()
        }
    }
}

/// Body of the toggle routes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToggleRequest {
    /// Desired state.
    pub active: bool,
}

/// Body of `POST /api/bots`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateBotRequest {
    /// Handle for the new bot.
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bot(name: &str, active: bool) -> Bot {
        Bot {
            id: format!("id-{name}"),
            name: name.to_string(),
            is_active: active,
            timestamp: String::new(),
            is_existing: false,
        }
    }

    #[test]
    fn test_bot_uses_camel_case_on_the_wire() {
        let json = r#"{"id":"b1","name":"delphibot","isActive":true,"timestamp":"t","isExisting":true}"#;
        let parsed: Bot = serde_json::from_str(json).unwrap();
        assert!(parsed.is_active);
        assert!(parsed.is_existing);

        let out = serde_json::to_string(&parsed).unwrap();
        assert!(out.contains("\"isActive\":true"));
    }

    #[test]
    fn test_single_bot_status_parses() {
        let status: BotStatus = serde_json::from_str(r#"{"active":true}"#).unwrap();
        assert!(status.active);
        assert!(status.bots.is_empty());
    }

    #[test]
    fn test_active_names_single_bot_backend() {
        let fallback = vec!["delphibot".to_string()];
        let on = BotStatus {
            active: true,
            bots: Vec::new(),
        };
        let off = BotStatus::default();

        assert_eq!(on.active_names(&fallback), vec!["delphibot"]);
        assert!(off.active_names(&fallback).is_empty());
    }

    #[test]
    fn test_active_names_multi_bot_backend() {
        let status = BotStatus {
            active: true,
            bots: vec![bot("delphibot", true), bot("oracle", false), bot("sibyl", true)],
        };
        assert_eq!(status.active_names(&[]), vec!["delphibot", "sibyl"]);
    }
}
