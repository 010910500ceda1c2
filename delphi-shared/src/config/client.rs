use serde::{Deserialize, Serialize};
use std::{env, fs, path::PathBuf, time::Duration};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::mention::DEFAULT_BOT;
use crate::monitor::PollSettings;

const DEFAULT_BACKEND_URL: &str = "http://localhost:8000/";

/// Failure loading or validating a [`ClientConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read configuration file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid YAML for this schema.
    #[error("invalid YAML configuration: {0}")]
    Yaml(#[from] serde_yml::Error),
    /// The file is not valid JSON for this schema.
    #[error("invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),
    /// The file extension is neither YAML nor JSON.
    #[error("Unsupported configuration format. Use 'yaml' or 'json'.")]
    UnsupportedFormat,
    /// A `DELPHI_*` variable holds an unusable value.
    #[error("Invalid {var} value: {value}")]
    InvalidEnv { var: &'static str, value: String },
    /// The backend URL does not parse.
    #[error("invalid backend URL '{value}': {source}")]
    InvalidUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },
    /// Every validation problem found.
    #[error("invalid configuration: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

/// Output format for log lines.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Default level when `RUST_LOG` is not set.
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Text,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Delay between two debug-state requests.
    pub interval_ms: u64,
    /// Requests before the sequence is declared timed out.
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        let settings = PollSettings::default();
        Self {
            interval_ms: u64::try_from(settings.interval.as_millis()).unwrap_or(1_000),
            max_attempts: settings.max_attempts,
        }
    }
}

impl PollConfig {
    #[must_use]
    pub const fn settings(&self) -> PollSettings {
        PollSettings {
            interval: Duration::from_millis(self.interval_ms),
            max_attempts: self.max_attempts,
        }
    }
}

/// Configuration for the Delphi console.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the tweet bot backend.
    pub backend_url: Url,

    /// Polling budget for the bot pipeline.
    #[serde(default)]
    pub poll: PollConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Bots to look for in `@mentions` when the backend does not list them.
    #[serde(default = "default_bot_names")]
    pub bot_names: Vec<String>,
}

fn default_bot_names() -> Vec<String> {
    vec![DEFAULT_BOT.to_string()]
}

fn parse_backend_url(value: &str) -> Result<Url, ConfigError> {
    // Without a trailing slash `Url::join` would drop the last path segment.
    let normalized = if value.ends_with('/') {
        value.to_string()
    } else {
        format!("{value}/")
    };
    Url::parse(&normalized).map_err(|source| ConfigError::InvalidUrl {
        value: value.to_string(),
        source,
    })
}

impl ClientConfig {
    /// Generates a default configuration.
    ///
    /// # Panics
    /// Only if the built-in default URL literal stops parsing.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            backend_url: Url::parse(DEFAULT_BACKEND_URL).expect("default backend URL is valid"),
            poll: PollConfig::default(),
            logging: LoggingConfig::default(),
            bot_names: default_bot_names(),
        }
    }

    /// Loads the configuration from a file, environment variables, or defaults.
    ///
    /// Precedence: `server_override`, then file values, then `DELPHI_*`
    /// environment variables for settings still at their default, then the
    /// built-in defaults.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] when the file cannot be read or parsed, an
    /// environment value is malformed, or the result fails validation.
    pub fn load_config(
        config_path: Option<PathBuf>,
        server_override: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let defaults = Self::with_defaults();
        let mut config = defaults.clone();

        if let Some(path) = config_path {
            let content = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
                path: path.clone(),
                source,
            })?;
            config = match path.extension().and_then(|ext| ext.to_str()) {
                Some("yaml" | "yml") => serde_yml::from_str(&content)?,
                Some("json") => serde_json::from_str(&content)?,
                _ => return Err(ConfigError::UnsupportedFormat),
            };
            config.backend_url = parse_backend_url(config.backend_url.as_str())?;
            debug!(path = %path.display(), "loaded configuration file");
        }

        if config.backend_url == defaults.backend_url
            && let Ok(url) = env::var("DELPHI_BACKEND_URL")
        {
            config.backend_url = parse_backend_url(&url)?;
        }
        if config.logging.level == defaults.logging.level
            && let Ok(level) = env::var("DELPHI_LOG_LEVEL")
        {
            config.logging.level = level;
        }
        if config.poll.interval_ms == defaults.poll.interval_ms
            && let Ok(value) = env::var("DELPHI_POLL_INTERVAL_MS")
        {
            config.poll.interval_ms = value.parse().map_err(|_| ConfigError::InvalidEnv {
                var: "DELPHI_POLL_INTERVAL_MS",
                value,
            })?;
        }
        if config.poll.max_attempts == defaults.poll.max_attempts
            && let Ok(value) = env::var("DELPHI_POLL_MAX_ATTEMPTS")
        {
            config.poll.max_attempts = value.parse().map_err(|_| ConfigError::InvalidEnv {
                var: "DELPHI_POLL_MAX_ATTEMPTS",
                value,
            })?;
        }

        if let Some(server) = server_override {
            config.backend_url = parse_backend_url(server)?;
        }

        config.validate().map_err(ConfigError::Invalid)?;
        Ok(config)
    }

    /// Validate the complete configuration.
    ///
    /// # Errors
    /// Returns every problem found.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if !matches!(self.backend_url.scheme(), "http" | "https") {
            errors.push(format!(
                "Backend URL must use http or https: {}",
                self.backend_url
            ));
        }
        if self.poll.interval_ms == 0 {
            errors.push("Poll interval must be greater than 0.".to_string());
        }
        if self.poll.max_attempts == 0 {
            errors.push("Poll attempts must be greater than 0.".to_string());
        }
        if self.bot_names.iter().any(|name| name.trim().is_empty()) {
            errors.push("Bot names must not be empty.".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
