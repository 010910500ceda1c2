use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use shared::models::{Message, ThreadedMessage, organize_threads};
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::post::cancel_on_ctrl_c;

use crate::gateway::{Gateway, GatewayError};
use crate::render::{forest_summary, render_forest};

#[derive(Args, Debug)]
#[command(about = "Show the tweet feed as reply threads")]
pub struct FeedArgs {
    /// Keep refreshing the feed until Ctrl+C
    #[arg(long, short)]
    pub watch: bool,

    /// Refresh period for --watch, in milliseconds
    #[arg(long, default_value_t = 2_000, value_parser = clap::value_parser!(u64).range(100..))]
    pub interval_ms: u64,

    /// Print the threads as JSON instead of text
    #[arg(long)]
    pub json: bool,
}

/// Fetches the feed and organizes it into threads.
///
/// # Errors
/// Any gateway failure while fetching.
pub async fn load_forest(gateway: &Gateway) -> Result<Vec<ThreadedMessage>, GatewayError> {
    let messages = gateway.fetch_messages().await?;
    debug!(count = messages.len(), "feed fetched");
    Ok(organize_threads(&messages))
}

fn print_forest(forest: &[ThreadedMessage], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(forest)?);
    } else {
        print!("{}", render_forest(forest));
        if !forest.is_empty() {
            println!("\n{}", forest_summary(forest));
        }
    }
    Ok(())
}

pub async fn handle_feed(gateway: &Gateway, args: &FeedArgs) -> Result<()> {
    let messages = gateway
        .fetch_messages()
        .await
        .context("failed to fetch messages")?;
    print_forest(&organize_threads(&messages), args.json)?;

    if args.watch {
        let cancel = CancellationToken::new();
        let watcher = cancel_on_ctrl_c(&cancel);
        let period = Duration::from_millis(args.interval_ms);
        let result = watch(gateway, period, &cancel, messages, |messages| {
            println!("\n--- updated ---");
            print_forest(&organize_threads(messages), args.json)
        })
        .await;
        watcher.abort();
        result?;
    }
    Ok(())
}

/// Re-fetches the feed every `period` and calls `on_change` whenever it
/// differs from the last one seen, until `cancel` fires. Cancellation also
/// interrupts a fetch in flight. Transient fetch failures are logged and
/// retried on the next tick.
async fn watch<F>(
    gateway: &Gateway,
    period: Duration,
    cancel: &CancellationToken,
    mut last: Vec<Message>,
    mut on_change: F,
) -> Result<()>
where
    F: FnMut(&[Message]) -> Result<()>,
{
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return Ok(()),
            _ = ticker.tick() => {}
        }

        let fetched = tokio::select! {
            biased;
            () = cancel.cancelled() => return Ok(()),
            result = gateway.fetch_messages() => result,
        };

        match fetched {
            Ok(messages) if messages != last => {
                on_change(&messages)?;
                last = messages;
            }
            Ok(_) => {}
            Err(err) => warn!(error = %err, "failed to refresh feed"),
        }
    }
}
