use std::io::{self, BufRead, Write};
use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;

use super::feed::load_forest;
use super::session;
use crate::gateway::Gateway;
use crate::render::render_forest;

const CONFIRM_PROMPT: &str =
    "Are you sure you want to clear all created tweets? This action cannot be undone.";

#[derive(Args, Debug)]
#[command(about = "Delete every tweet on the backend")]
pub struct ClearArgs {
    /// Skip the confirmation prompt
    #[arg(long, short)]
    pub yes: bool,
}

/// Asks `prompt` on `output` and reads a yes/no answer from `input`.
/// Anything other than "y" or "yes" declines.
pub fn confirm<R: BufRead, W: Write>(prompt: &str, input: &mut R, output: &mut W) -> Result<bool> {
    write!(output, "{prompt} [y/N] ")?;
    output.flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

/// Deletes every tweet, then forgets the stored author at `session_path` so
/// the next post starts from a fresh login.
pub async fn handle_clear(gateway: &Gateway, args: &ClearArgs, session_path: &Path) -> Result<()> {
    if !args.yes {
        let stdin = io::stdin();
        let confirmed = confirm(CONFIRM_PROMPT, &mut stdin.lock(), &mut io::stderr())?;
        if !confirmed {
            println!("Nothing cleared.");
            return Ok(());
        }
    }

    gateway
        .clear_messages()
        .await
        .context("failed to clear tweets")?;
    println!("Tweets cleared successfully");
    if session::clear_session(session_path)? {
        println!("Logged out; run `delphi login <name>` before posting again.");
    }

    let forest = load_forest(gateway)
        .await
        .context("failed to fetch messages")?;
    print!("{}", render_forest(&forest));
    Ok(())
}
