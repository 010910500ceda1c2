use anyhow::{Context, Result, bail};
use clap::Args;
use shared::config::ClientConfig;
use shared::models::{DebugInfo, DebugStep};
use shared::monitor::{PollMonitor, PollOutcome};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::post::cancel_on_ctrl_c;
use crate::gateway::Gateway;
use crate::render::render_debug;

#[derive(Args, Debug)]
#[command(about = "Show what a bot is doing behind the scenes for a tweet")]
pub struct DebugArgs {
    /// Identifier of the tweet that mentioned the bot
    pub id: String,

    /// Poll until the bot finishes instead of printing one snapshot
    #[arg(long, short)]
    pub follow: bool,
}

pub async fn handle_debug(gateway: &Gateway, config: &ClientConfig, args: &DebugArgs) -> Result<()> {
    if !args.follow {
        let info = gateway
            .debug_state(&args.id)
            .await
            .context("failed to get debug information")?;
        print!("{}", render_debug(&info));
        return Ok(());
    }

    let cancel = CancellationToken::new();
    let watcher = cancel_on_ctrl_c(&cancel);
    let mut last_step: Option<DebugStep> = None;
    let (outcome, panel) = follow(gateway, config, &args.id, &cancel, |info| {
        if info.step != last_step && !info.is_terminal() {
            last_step = info.step;
            println!("{}", render_debug(info));
        }
    })
    .await;
    watcher.abort();

    match outcome {
        PollOutcome::Completed(_) => {
            print!("{panel}");
            Ok(())
        }
        PollOutcome::Failed(reason) => {
            print!("{panel}");
            bail!("bot failed: {reason}")
        }
        PollOutcome::TimedOut { attempts } => {
            bail!("bot did not finish after {attempts} polls")
        }
        PollOutcome::Cancelled => Ok(()),
    }
}

/// Polls the pipeline for `id` until it settles. Returns the outcome and the
/// rendered panel for the last payload seen.
async fn follow<F>(
    gateway: &Gateway,
    config: &ClientConfig,
    id: &str,
    cancel: &CancellationToken,
    mut on_progress: F,
) -> (PollOutcome, String)
where
    F: FnMut(&DebugInfo) + Send,
{
    let mut monitor = PollMonitor::new(config.poll.settings());
    let outcome = monitor
        .run(gateway, id, cancel, |_, info| on_progress(info))
        .await;
    debug!(id, state = ?monitor.state(), "stopped following pipeline");
    (outcome, render_debug(monitor.latest()))
}
