//! HTTP client for the tweet bot backend.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use shared::models::{
    Bot, BotStatus, CreateBotRequest, CreateMessageResponse, DebugInfo, ErrorResponse,
    InputError, Message, NewMessage, ToggleRequest,
};
use shared::monitor::DebugSource;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

const USER_AGENT: &str = "delphi-cli";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Failure talking to the backend.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The reqwest client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    /// The base URL is not a hierarchical `http(s)` URL.
    #[error("backend URL {0} cannot carry a path")]
    InvalidUrl(Url),
    /// The request never got a response.
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    /// The backend answered with a non-success status.
    #[error("{endpoint} returned {status}: {detail}")]
    Status {
        endpoint: String,
        status: StatusCode,
        detail: String,
    },
    /// The response body did not match the expected JSON.
    #[error("unexpected response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    /// The payload failed local validation and was not sent.
    #[error(transparent)]
    InvalidInput(#[from] InputError),
}

impl GatewayError {
    /// HTTP status reported by the backend, when the request got that far.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Thin client over the backend's JSON API.
#[derive(Clone, Debug)]
pub struct Gateway {
    base_url: Url,
    client: Client,
}

impl Gateway {
    /// Creates a gateway for the backend at `base_url`.
    ///
    /// # Errors
    /// Fails when the URL cannot carry a path or the HTTP client cannot be
    /// built.
    pub fn new(base_url: Url) -> Result<Self, GatewayError> {
        if base_url.cannot_be_a_base() {
            return Err(GatewayError::InvalidUrl(base_url));
        }
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(GatewayError::Client)?;
        Ok(Self { base_url, client })
    }

    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Builds `<base>/<segments...>`, percent-encoding each segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, GatewayError> {
        let mut url = self.base_url.clone();
        if !segments.is_empty() {
            url.path_segments_mut()
                .map_err(|()| GatewayError::InvalidUrl(self.base_url.clone()))?
                .pop_if_empty()
                .extend(segments);
        }
        Ok(url)
    }

    async fn send(&self, request: RequestBuilder, endpoint: &Url) -> Result<Response, GatewayError> {
        let label = endpoint.path().to_string();
        debug!(endpoint = %label, "sending backend request");
        let response = request
            .send()
            .await
            .map_err(|source| {
                warn!(endpoint = %label, error = %source, "backend unreachable");
                GatewayError::Transport {
                    endpoint: label.clone(),
                    source,
                }
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorResponse>(&body)
            .ok()
            .and_then(|error| error.summary())
            .unwrap_or_else(|| {
                if body.trim().is_empty() {
                    status
                        .canonical_reason()
                        .unwrap_or("request rejected")
                        .to_string()
                } else {
                    body.trim().to_string()
                }
            });
        warn!(endpoint = %label, %status, %detail, "backend rejected request");
        Err(GatewayError::Status {
            endpoint: label,
            status,
            detail,
        })
    }

    async fn decode<T: DeserializeOwned>(
        response: Response,
        endpoint: &Url,
    ) -> Result<T, GatewayError> {
        response
            .json::<T>()
            .await
            .map_err(|source| GatewayError::Decode {
                endpoint: endpoint.path().to_string(),
                source,
            })
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: Url) -> Result<T, GatewayError> {
        let response = self.send(self.client.get(endpoint.clone()), &endpoint).await?;
        Self::decode(response, &endpoint).await
    }

    /// `GET /api/tweets`. Order is whatever the backend chose; replies may
    /// precede their parents.
    ///
    /// # Errors
    /// Transport, status, or decode failures.
    pub async fn fetch_messages(&self) -> Result<Vec<Message>, GatewayError> {
        let endpoint = self.endpoint(&["api", "tweets"])?;
        // A fresh backend answers `null` before the first tweet exists.
        let messages: Option<Vec<Message>> = self.get_json(endpoint).await?;
        let messages = messages.unwrap_or_default();
        debug!(count = messages.len(), "fetched messages");
        Ok(messages)
    }

    /// `POST /api/tweets`.
    ///
    /// # Errors
    /// [`GatewayError::InvalidInput`] for blank text or author, otherwise
    /// transport, status, or decode failures.
    pub async fn create_message(&self, payload: &NewMessage) -> Result<Message, GatewayError> {
        payload.validate()?;
        let endpoint = self.endpoint(&["api", "tweets"])?;
        let response = self
            .send(self.client.post(endpoint.clone()).json(payload), &endpoint)
            .await?;
        let created: CreateMessageResponse = Self::decode(response, &endpoint).await?;
        let message = created.into_message();
        debug!(id = %message.id, parent = ?message.parent_id, "created message");
        Ok(message)
    }

    /// `DELETE /api/tweets/clear`.
    ///
    /// # Errors
    /// Transport or status failures.
    pub async fn clear_messages(&self) -> Result<(), GatewayError> {
        let endpoint = self.endpoint(&["api", "tweets", "clear"])?;
        self.send(self.client.delete(endpoint.clone()), &endpoint)
            .await?;
        Ok(())
    }

    /// `GET /` on the backend root.
    ///
    /// # Errors
    /// Transport, status, or decode failures.
    pub async fn status(&self) -> Result<BotStatus, GatewayError> {
        let endpoint = self.endpoint(&[])?;
        self.get_json(endpoint).await
    }

    /// Sets the active flag of one bot, or of the default bot when `bot` is
    /// `None`.
    ///
    /// # Errors
    /// Transport, status, or decode failures.
    pub async fn toggle_bot(&self, bot: Option<&str>, active: bool) -> Result<BotStatus, GatewayError> {
        let endpoint = match bot {
            Some(id) => self.endpoint(&["api", "bots", id, "toggle"])?,
            None => self.endpoint(&["toggle"])?,
        };
        let response = self
            .send(
                self.client
                    .post(endpoint.clone())
                    .json(&ToggleRequest { active }),
                &endpoint,
            )
            .await?;
        Self::decode(response, &endpoint).await
    }

    /// `GET /api/bots`.
    ///
    /// # Errors
    /// Transport, status, or decode failures.
    pub async fn list_bots(&self) -> Result<Vec<Bot>, GatewayError> {
        let endpoint = self.endpoint(&["api", "bots"])?;
        self.get_json(endpoint).await
    }

    /// `POST /api/bots`. The backend caps how many bots may exist and answers
    /// with a 4xx once the cap is reached.
    ///
    /// # Errors
    /// Transport, status, or decode failures.
    pub async fn create_bot(&self, name: &str) -> Result<Vec<Bot>, GatewayError> {
        let endpoint = self.endpoint(&["api", "bots"])?;
        let response = self
            .send(
                self.client.post(endpoint.clone()).json(&CreateBotRequest {
                    name: name.to_string(),
                }),
                &endpoint,
            )
            .await?;
        Self::decode(response, &endpoint).await
    }

    /// `GET /api/debug/{id}`.
    ///
    /// # Errors
    /// Transport, status, or decode failures.
    pub async fn debug_state(&self, message_id: &str) -> Result<DebugInfo, GatewayError> {
        let endpoint = self.endpoint(&["api", "debug", message_id])?;
        self.get_json(endpoint).await
    }
}

#[async_trait]
impl DebugSource for Gateway {
    type Error = GatewayError;

    async fn debug_state(&self, message_id: &str) -> Result<DebugInfo, GatewayError> {
        Gateway::debug_state(self, message_id).await
    }
}
