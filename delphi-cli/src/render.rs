//! Plain-text rendering of feeds, bots, and pipeline state.

use shared::models::{Bot, BotStatus, DebugInfo, ThreadedMessage, flatten_forest};
use shared::monitor::PollState;

const INDENT: &str = "    ";

/// Renders the reply forest as an indented conversation.
#[must_use]
pub fn render_forest(forest: &[ThreadedMessage]) -> String {
    if forest.is_empty() {
        return "No tweets yet.\n".to_string();
    }

    let mut out = String::new();
    for (level, message) in flatten_forest(forest) {
        if level == 0 && !out.is_empty() {
            out.push('\n');
        }
        let indent = INDENT.repeat(level);
        let marker = if level == 0 { "" } else { "↳ " };
        out.push_str(&format!(
            "{indent}{marker}{author} · {time} [{id}]\n",
            author = message.author,
            time = message.display_time(),
            id = message.id,
        ));
        for line in message.text.lines() {
            out.push_str(&format!("{indent}  {line}\n"));
        }
    }
    out
}

/// One-line summary of a forest.
#[must_use]
pub fn forest_summary(forest: &[ThreadedMessage]) -> String {
    let total: usize = forest.iter().map(ThreadedMessage::len).sum();
    let deepest = forest.iter().map(ThreadedMessage::depth).max().unwrap_or(0);
    format!(
        "{total} tweets in {} threads, deepest {deepest} levels",
        forest.len()
    )
}

#[must_use]
pub fn render_status(status: &BotStatus) -> String {
    let label = if status.active { "active" } else { "inactive" };
    let mut out = format!("Bot status: {label}\n");
    for bot in &status.bots {
        out.push_str(&render_bot_line(bot));
    }
    out
}

fn render_bot_line(bot: &Bot) -> String {
    let flag = if bot.is_active { "on " } else { "off" };
    let origin = if bot.is_existing { " (built-in)" } else { "" };
    format!("  [{flag}] @{} id={}{origin}\n", bot.name, bot.id)
}

#[must_use]
pub fn render_bots(bots: &[Bot]) -> String {
    if bots.is_empty() {
        return "No bots configured.\n".to_string();
    }
    bots.iter().map(render_bot_line).collect()
}

/// The "behind the scenes" panel for one message.
#[must_use]
pub fn render_debug(info: &DebugInfo) -> String {
    let step = info
        .step
        .map_or_else(|| "pending".to_string(), |step| step.to_string());
    let mut out = format!("Current Step: {step}\n");
    for (label, text) in info.sections() {
        out.push_str(&format!("\n{label}:\n"));
        for line in text.lines() {
            out.push_str(&format!("{INDENT}{line}\n"));
        }
    }
    out
}

/// Short progress line for a polling state.
#[must_use]
pub fn render_poll_state(state: &PollState) -> String {
    match state {
        PollState::Idle => "waiting to poll".to_string(),
        PollState::Polling { attempts, step } => {
            let step = step.map_or_else(|| "pending".to_string(), |step| step.to_string());
            format!("step: {step} (poll {attempts})")
        }
        PollState::Completed(_) => "step: completed".to_string(),
        PollState::Failed(reason) => format!("step: error ({reason})"),
        PollState::TimedOut { attempts } => {
            format!("gave up waiting for the bot after {attempts} polls")
        }
    }
}
