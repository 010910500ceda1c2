//! In-process mock of the tweet bot backend for tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use serde_json::json;
use shared::mention::{DEFAULT_BOT, mentions};
use shared::models::{
    Bot, BotStatus, CreateBotRequest, DebugInfo, DebugStep, Message, NewMessage, ToggleRequest,
};
use tokio::net::TcpListener;
use url::Url;

use crate::gateway::Gateway;

pub const MAX_BOTS: usize = 3;

#[derive(Debug, Default)]
pub struct MockState {
    pub tweets: Vec<Message>,
    pub active: bool,
    pub bots: Vec<Bot>,
    pub debug: HashMap<String, VecDeque<DebugInfo>>,
    pub replied: HashSet<String>,
    pub next_id: u32,
    /// When set, every pipeline ends in this error instead of a reply.
    pub pipeline_error: Option<String>,
    /// Wrap created tweets as `{"tweet": ...}` like the current backend.
    pub wrap_created: bool,
    /// Delay before answering `GET /api/tweets`.
    pub feed_delay: Option<Duration>,
}

pub type SharedMock = Arc<Mutex<MockState>>;

fn step(step: DebugStep) -> DebugInfo {
    DebugInfo {
        step: Some(step),
        ..DebugInfo::default()
    }
}

impl MockState {
    fn allocate_id(&mut self) -> String {
        self.next_id += 1;
        format!("t{}", self.next_id)
    }

    pub fn push_tweet(&mut self, text: &str, author: &str, parent: Option<&str>) -> Message {
        let message = Message {
            id: self.allocate_id(),
            text: text.to_string(),
            author: author.to_string(),
            timestamp: format!("2024-11-02T10:{:02}:00", self.next_id % 60),
            parent_id: parent.map(str::to_string),
        };
        // Newest first, like the real feed.
        self.tweets.insert(0, message.clone());
        message
    }

    fn status(&self) -> BotStatus {
        BotStatus {
            active: self.active,
            bots: self.bots.clone(),
        }
    }
}

async fn get_status(State(state): State<SharedMock>) -> Json<BotStatus> {
    let guard = state.lock().unwrap();
    Json(guard.status())
}

async fn toggle(
    State(state): State<SharedMock>,
    Json(body): Json<ToggleRequest>,
) -> Json<BotStatus> {
    let mut guard = state.lock().unwrap();
    guard.active = body.active;
    Json(guard.status())
}

async fn toggle_named(
    State(state): State<SharedMock>,
    Path(id): Path<String>,
    Json(body): Json<ToggleRequest>,
) -> Response {
    let mut guard = state.lock().unwrap();
    let Some(bot) = guard.bots.iter_mut().find(|bot| bot.id == id) else {
        return (StatusCode::NOT_FOUND, Json(json!({"detail": "Bot not found"}))).into_response();
    };
    bot.is_active = body.active;
    let any_active = guard.bots.iter().any(|bot| bot.is_active);
    guard.active = any_active;
    Json(guard.status()).into_response()
}

async fn list_tweets(State(state): State<SharedMock>) -> Json<Vec<Message>> {
    let delay = state.lock().unwrap().feed_delay;
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    let guard = state.lock().unwrap();
    Json(guard.tweets.clone())
}

async fn create_tweet(
    State(state): State<SharedMock>,
    Json(body): Json<NewMessage>,
) -> Response {
    let mut guard = state.lock().unwrap();
    let created = guard.push_tweet(&body.text, &body.author, body.parent_id.as_deref());

    let names: Vec<String> = if guard.bots.is_empty() {
        if guard.active {
            vec![DEFAULT_BOT.to_string()]
        } else {
            Vec::new()
        }
    } else {
        guard
            .bots
            .iter()
            .filter(|bot| bot.is_active)
            .map(|bot| bot.name.clone())
            .collect()
    };
    if names.iter().any(|name| mentions(&body.text, name)) {
        let last = match &guard.pipeline_error {
            Some(error) => DebugInfo {
                error: Some(error.clone()),
                ..step(DebugStep::Error)
            },
            None => DebugInfo {
                analysis_prompt: Some("analyze".into()),
                analysis_response: Some("looks friendly".into()),
                final_prompt: Some("respond".into()),
                final_response: Some("Hello from delphibot".into()),
                ..step(DebugStep::Completed)
            },
        };
        guard.debug.insert(
            created.id.clone(),
            VecDeque::from(vec![
                step(DebugStep::Started),
                step(DebugStep::Analyzing),
                step(DebugStep::Generating),
                last,
            ]),
        );
    }

    if guard.wrap_created {
        Json(json!({ "tweet": created })).into_response()
    } else {
        Json(created).into_response()
    }
}

async fn clear_tweets(State(state): State<SharedMock>) -> Json<serde_json::Value> {
    let mut guard = state.lock().unwrap();
    guard.tweets.clear();
    guard.debug.clear();
    Json(json!({"status": "success"}))
}

async fn get_debug(State(state): State<SharedMock>, Path(id): Path<String>) -> Json<DebugInfo> {
    let mut guard = state.lock().unwrap();
    let info = match guard.debug.get_mut(&id) {
        Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or_default(),
        Some(queue) => queue.front().cloned().unwrap_or_default(),
        None => DebugInfo::default(),
    };
    if info.step == Some(DebugStep::Completed) && guard.replied.insert(id.clone()) {
        let reply = info.final_response.clone().unwrap_or_default();
        guard.push_tweet(&reply, DEFAULT_BOT, Some(&id));
    }
    Json(info)
}

async fn list_bots(State(state): State<SharedMock>) -> Json<Vec<Bot>> {
    let guard = state.lock().unwrap();
    Json(guard.bots.clone())
}

async fn create_bot(
    State(state): State<SharedMock>,
    Json(body): Json<CreateBotRequest>,
) -> Response {
    let mut guard = state.lock().unwrap();
    if guard.bots.len() >= MAX_BOTS {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"detail": format!("Maximum of {MAX_BOTS} bots reached")})),
        )
            .into_response();
    }
    let id = guard.allocate_id();
    guard.bots.push(Bot {
        id: format!("bot-{id}"),
        name: body.name,
        is_active: false,
        timestamp: "2024-11-02T10:00:00".into(),
        is_existing: false,
    });
    Json(guard.bots.clone()).into_response()
}

pub fn router(state: SharedMock) -> Router {
    Router::new()
        .route("/", get(get_status))
        .route("/toggle", post(toggle))
        .route("/api/tweets", get(list_tweets).post(create_tweet))
        .route("/api/tweets/clear", delete(clear_tweets))
        .route("/api/debug/{id}", get(get_debug))
        .route("/api/bots", get(list_bots).post(create_bot))
        .route("/api/bots/{id}/toggle", post(toggle_named))
        .with_state(state)
}

/// Serves the mock on an ephemeral port and returns its base URL.
pub async fn spawn_backend(state: SharedMock) -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(state);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    Url::parse(&format!("http://{addr}/")).unwrap()
}

pub async fn mock_gateway(state: MockState) -> (Gateway, SharedMock) {
    let shared = Arc::new(Mutex::new(state));
    let url = spawn_backend(shared.clone()).await;
    (Gateway::new(url).unwrap(), shared)
}

/// A base URL nothing listens on.
pub async fn dead_url() -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    Url::parse(&format!("http://{addr}/")).unwrap()
}
