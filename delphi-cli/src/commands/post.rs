use anyhow::{Context, Result};
use clap::Args;
use shared::config::ClientConfig;
use shared::mention::mentioned_bots;
use shared::models::{
    BotStatus, DebugInfo, DebugStep, Message, NewMessage, ThreadedMessage, organize_threads,
};
use shared::monitor::{PollMonitor, PollOutcome, PollState};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::session;
use crate::gateway::{Gateway, GatewayError};
use crate::render::{render_debug, render_forest, render_poll_state};

#[derive(Args, Debug)]
#[command(about = "Post a tweet, optionally as a reply")]
pub struct PostArgs {
    /// Tweet text
    pub text: String,

    /// Identifier of the tweet to reply to
    #[arg(long)]
    pub parent: Option<String>,

    /// Post under this name instead of the logged-in one
    #[arg(long)]
    pub author: Option<String>,

    /// Return right after posting instead of waiting for bot replies
    #[arg(long)]
    pub no_follow: bool,
}

#[derive(Args, Debug)]
#[command(about = "Reply to an existing tweet")]
pub struct ReplyArgs {
    /// Identifier of the tweet to reply to
    pub parent: String,

    /// Reply text
    pub text: String,

    /// Post under this name instead of the logged-in one
    #[arg(long)]
    pub author: Option<String>,

    /// Return right after posting instead of waiting for bot replies
    #[arg(long)]
    pub no_follow: bool,
}

impl From<ReplyArgs> for PostArgs {
    fn from(args: ReplyArgs) -> Self {
        Self {
            text: args.text,
            parent: Some(args.parent),
            author: args.author,
            no_follow: args.no_follow,
        }
    }
}

/// What happened to one submission.
#[derive(Debug)]
pub struct PostReport {
    pub message: Message,
    /// Active bots the tweet mentions.
    pub mentioned: Vec<String>,
    /// Set when the bot pipeline was followed.
    pub outcome: Option<PollOutcome>,
    /// Feed re-fetched after a completed reply.
    pub feed: Option<Vec<ThreadedMessage>>,
}

/// Posts `payload` and, when it mentions an active bot and `follow` is set,
/// polls the pipeline until it finishes.
///
/// A failed status lookup counts as "no bot active"; a failed re-fetch after
/// completion leaves `feed` empty. Neither fails the submission.
///
/// # Errors
/// Invalid input or a rejected/failed create request.
pub async fn submit<F>(
    gateway: &Gateway,
    config: &ClientConfig,
    payload: NewMessage,
    follow: bool,
    cancel: &CancellationToken,
    on_update: F,
) -> Result<PostReport, GatewayError>
where
    F: FnMut(&PollState, &DebugInfo) + Send,
{
    payload.validate()?;

    let status = gateway.status().await.unwrap_or_else(|err| {
        warn!(error = %err, "failed to check bot status");
        BotStatus::default()
    });
    let active = status.active_names(&config.bot_names);
    let mentioned: Vec<String> = mentioned_bots(&payload.text, &active)
        .into_iter()
        .map(str::to_string)
        .collect();

    let message = gateway.create_message(&payload).await?;
    info!(id = %message.id, mentioned = ?mentioned, "tweet posted");

    if mentioned.is_empty() || !follow {
        return Ok(PostReport {
            message,
            mentioned,
            outcome: None,
            feed: None,
        });
    }

    let mut monitor = PollMonitor::new(config.poll.settings());
    let outcome = monitor.run(gateway, &message.id, cancel, on_update).await;

    let feed = if matches!(outcome, PollOutcome::Completed(_)) {
        match gateway.fetch_messages().await {
            Ok(messages) => Some(organize_threads(&messages)),
            Err(err) => {
                warn!(error = %err, "failed to reload tweets");
                None
            }
        }
    } else {
        None
    };

    Ok(PostReport {
        message,
        mentioned,
        outcome: Some(outcome),
        feed,
    })
}

/// Cancels `token` on Ctrl+C until the returned handle is aborted.
pub fn cancel_on_ctrl_c(token: &CancellationToken) -> tokio::task::JoinHandle<()> {
    let token = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    })
}

pub async fn handle_post(gateway: &Gateway, config: &ClientConfig, args: PostArgs) -> Result<()> {
    let author = session::resolve_author(args.author.as_deref())?;
    let mut payload = NewMessage::new(args.text, author);
    if let Some(parent) = args.parent {
        payload = payload.replying_to(parent);
    }

    let cancel = CancellationToken::new();
    let watcher = cancel_on_ctrl_c(&cancel);
    let mut last_step: Option<DebugStep> = None;
    let result = submit(gateway, config, payload, !args.no_follow, &cancel, |state, info| {
        if info.step != last_step {
            last_step = info.step;
            if info.step.is_some() {
                eprintln!("[bot] {}", render_poll_state(state));
            }
        }
    })
    .await;
    watcher.abort();

    let report = result.context("failed to submit tweet")?;
    println!("Posted tweet {}", report.message.id);

    if !report.mentioned.is_empty() && args.no_follow {
        println!(
            "Mentioned @{}; run `delphi debug {} --follow` to watch the reply.",
            report.mentioned.join(", @"),
            report.message.id
        );
    }

    match report.outcome {
        Some(PollOutcome::Completed(info)) => {
            println!();
            print!("{}", render_debug(&info));
            if let Some(feed) = &report.feed {
                println!();
                print!("{}", render_forest(feed));
            }
        }
        Some(PollOutcome::Failed(reason)) => {
            eprintln!("error: bot did not reply: {reason}");
        }
        Some(PollOutcome::TimedOut { attempts }) => {
            eprintln!("error: no bot reply after {attempts} polls; giving up");
        }
        Some(PollOutcome::Cancelled) => {
            eprintln!("stopped waiting; run `delphi debug {} --follow` to resume", report.message.id);
        }
        None => {}
    }

    Ok(())
}
