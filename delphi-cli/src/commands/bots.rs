use anyhow::{Context, Result, bail};
use clap::{Args, Subcommand, ValueEnum};
use reqwest::StatusCode;
use shared::models::BotStatus;
use tracing::info;

use crate::gateway::Gateway;
use crate::render::{render_bots, render_status};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Switch {
    On,
    Off,
}

#[derive(Args, Debug)]
#[command(about = "Turn a bot on or off")]
pub struct ToggleArgs {
    /// Desired state; flips the current state when omitted
    #[arg(value_enum)]
    pub state: Option<Switch>,

    /// Identifier of a named bot instead of the default one
    #[arg(long)]
    pub bot: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum BotsCommand {
    /// List configured bots
    List,
    /// Create a new bot (starts inactive)
    Create {
        /// Handle the bot answers to, without the leading @
        name: String,
    },
}

pub async fn handle_status(gateway: &Gateway) -> Result<()> {
    let status = gateway
        .status()
        .await
        .context("failed to check bot status")?;
    print!("{}", render_status(&status));
    Ok(())
}

/// Works out the state a toggle should request.
///
/// # Errors
/// Fails when `bot` names an unknown bot.
pub fn desired_state(status: &BotStatus, args: &ToggleArgs) -> Result<bool> {
    if let Some(state) = args.state {
        return Ok(state == Switch::On);
    }
    match &args.bot {
        None => Ok(!status.active),
        Some(id) => match status.bots.iter().find(|bot| &bot.id == id) {
            Some(bot) => Ok(!bot.is_active),
            None => bail!("unknown bot '{id}'"),
        },
    }
}

pub async fn handle_toggle(gateway: &Gateway, args: &ToggleArgs) -> Result<()> {
    let desired = if args.state.is_some() {
        desired_state(&BotStatus::default(), args)?
    } else {
        let mut status = gateway
            .status()
            .await
            .context("failed to check bot status")?;
        if args.bot.is_some() && status.bots.is_empty() {
            status.bots = gateway.list_bots().await.context("failed to list bots")?;
        }
        desired_state(&status, args)?
    };

    let status = match gateway.toggle_bot(args.bot.as_deref(), desired).await {
        Ok(status) => status,
        Err(err) if err.status() == Some(StatusCode::NOT_FOUND) && args.bot.is_some() => {
            bail!("unknown bot '{}'", args.bot.as_deref().unwrap_or_default())
        }
        Err(err) => return Err(err).context("failed to toggle bot status"),
    };
    info!(bot = ?args.bot, active = desired, "bot toggled");

    if desired {
        println!("Bot has been activated");
    } else {
        println!("Bot has been deactivated");
    }
    print!("{}", render_status(&status));
    Ok(())
}

pub async fn handle_bots(gateway: &Gateway, command: &BotsCommand) -> Result<()> {
    let bots = match command {
        BotsCommand::List => gateway.list_bots().await.context("failed to list bots")?,
        BotsCommand::Create { name } => {
            let name = name.trim().trim_start_matches('@');
            if name.is_empty() {
                bail!("bot name must not be empty");
            }
            let bots = gateway
                .create_bot(name)
                .await
                .context("failed to create bot")?;
            println!("Created @{name}");
            bots
        }
    };
    print!("{}", render_bots(&bots));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockState, mock_gateway};
    use shared::models::Bot;

    fn args(state: Option<Switch>, bot: Option<&str>) -> ToggleArgs {
        ToggleArgs {
            state,
            bot: bot.map(str::to_string),
        }
    }

    #[test]
    fn test_explicit_state_wins() {
        let status = BotStatus {
            active: true,
            bots: Vec::new(),
        };
        assert!(desired_state(&status, &args(Some(Switch::On), None)).unwrap());
        assert!(!desired_state(&status, &args(Some(Switch::Off), None)).unwrap());
    }

    #[test]
    fn test_missing_state_flips() {
        let status = BotStatus {
            active: true,
            bots: vec![Bot {
                id: "b1".into(),
                name: "oracle".into(),
                is_active: false,
                timestamp: String::new(),
                is_existing: false,
            }],
        };
        assert!(!desired_state(&status, &args(None, None)).unwrap());
        assert!(desired_state(&status, &args(None, Some("b1"))).unwrap());
        assert!(desired_state(&status, &args(None, Some("b9"))).is_err());
    }

    #[tokio::test]
    async fn test_toggle_flips_backend_state() {
        let (gateway, state) = mock_gateway(MockState::default()).await;

        handle_toggle(&gateway, &args(None, None)).await.unwrap();
        assert!(state.lock().unwrap().active);

        handle_toggle(&gateway, &args(None, None)).await.unwrap();
        assert!(!state.lock().unwrap().active);
    }

    #[tokio::test]
    async fn test_toggle_unknown_named_bot() {
        let (gateway, _state) = mock_gateway(MockState::default()).await;

        let err = handle_toggle(&gateway, &args(Some(Switch::On), Some("ghost")))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "unknown bot 'ghost'");
    }

    #[tokio::test]
    async fn test_create_strips_at_sign() {
        let (gateway, state) = mock_gateway(MockState::default()).await;

        handle_bots(
            &gateway,
            &BotsCommand::Create {
                name: "@oracle".into(),
            },
        )
        .await
        .unwrap();

        assert_eq!(state.lock().unwrap().bots[0].name, "oracle");
    }
}
