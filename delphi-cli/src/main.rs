//! Command-line client for the Delphi tweet bot backend.

use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use clap_complete::Shell;
use dotenv::dotenv;
use shared::config::ClientConfig;
use tracing::debug;

use crate::commands::{
    bots::{BotsCommand, ToggleArgs},
    clear::ClearArgs,
    debug::DebugArgs,
    feed::FeedArgs,
    post::{PostArgs, ReplyArgs},
    session::{self, LoginArgs},
};
use crate::gateway::Gateway;

mod commands;
mod gateway;
mod logging;
mod render;

#[cfg(test)]
mod test_support;

/// Delphi CLI
#[derive(Parser)]
#[command(name = "delphi", version)]
#[command(about = "Post tweets, follow reply threads, and watch bots answer", long_about = None)]
struct Cli {
    /// Path to a configuration file (YAML or JSON)
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Backend base URL, overriding the configuration
    #[arg(long, global = true)]
    server: Option<String>,

    /// Log more (-v info, -vv debug, -vvv trace)
    #[arg(long, short, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Remember the name to post tweets under
    Login(LoginArgs),
    /// Forget the stored name
    Logout,
    /// Print the stored name
    Whoami,
    /// Show the tweet feed as reply threads
    Feed(FeedArgs),
    /// Post a tweet
    Post(PostArgs),
    /// Reply to a tweet
    Reply(ReplyArgs),
    /// Show whether the bots are active
    Status,
    /// Turn a bot on or off
    Toggle(ToggleArgs),
    /// Manage named bots
    #[command(subcommand)]
    Bots(BotsCommand),
    /// Show a bot's pipeline for one tweet
    Debug(DebugArgs),
    /// Delete every tweet
    Clear(ClearArgs),

    /// Generate a configuration file
    Config {
        /// Format of the configuration file to generate (yaml or json)
        #[arg(long, short, default_value = "yaml")]
        format: String,

        /// Where to write the file; defaults to config.<format> in the working directory
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Generate shell completion scripts for the CLI
    Completion {
        /// The shell to generate the completion script for
        #[arg(long, short, value_enum)]
        shell: Shell,
    },
}

fn verbosity_level(verbose: u8) -> Option<&'static str> {
    match verbose {
        0 => None,
        1 => Some("info"),
        2 => Some("debug"),
        _ => Some("trace"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();

    // Commands that never talk to the backend.
    match &cli.command {
        Commands::Completion { shell } => {
            commands::completion::generate_completion(*shell);
            return Ok(());
        }
        Commands::Config {
            format,
            output,
            force,
        } => {
            commands::config::generate_config(format, output.as_deref(), *force)?;
            return Ok(());
        }
        Commands::Login(args) => return session::login(args),
        Commands::Logout => return session::logout(),
        Commands::Whoami => return session::whoami(),
        _ => {}
    }

    let config_path = cli.config.clone().or_else(session::default_config_path);
    let mut config = ClientConfig::load_config(config_path, cli.server.as_deref())?;
    if let Some(level) = verbosity_level(cli.verbose) {
        config.logging.level = level.to_string();
    }
    logging::initialize_tracing(&config.logging);
    let gateway = Gateway::new(config.backend_url.clone())?;
    debug!(backend = %gateway.base_url(), "configuration loaded");

    match cli.command {
        Commands::Feed(args) => commands::feed::handle_feed(&gateway, &args).await,
        Commands::Post(args) => commands::post::handle_post(&gateway, &config, args).await,
        Commands::Reply(args) => {
            commands::post::handle_post(&gateway, &config, args.into()).await
        }
        Commands::Status => commands::bots::handle_status(&gateway).await,
        Commands::Toggle(args) => commands::bots::handle_toggle(&gateway, &args).await,
        Commands::Bots(command) => commands::bots::handle_bots(&gateway, &command).await,
        Commands::Debug(args) => commands::debug::handle_debug(&gateway, &config, &args).await,
        Commands::Clear(args) => {
            commands::clear::handle_clear(&gateway, &args, &session::session_path()).await
        }
        Commands::Completion { .. }
        | Commands::Config { .. }
        | Commands::Login(_)
        | Commands::Logout
        | Commands::Whoami => Ok(()),
    }
}
