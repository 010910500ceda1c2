use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use clap::Args;
use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Name to post tweets under
    pub name: String,
}

/// Username remembered between invocations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    pub author: String,
}

pub fn config_dir() -> PathBuf {
    BaseDirs::new()
        .map(|dirs| dirs.config_dir().join("delphi"))
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn session_path() -> PathBuf {
    config_dir().join("session.json")
}

/// Config file picked up when `--config` is not given, if it exists.
pub fn default_config_path() -> Option<PathBuf> {
    let path = config_dir().join("config.yaml");
    path.exists().then_some(path)
}

pub fn login(args: &LoginArgs) -> Result<()> {
    let path = session_path();
    let session = save_session(&path, &args.name)?;
    println!("Posting as {}", session.author);
    println!("session stored at {}", path.display());
    Ok(())
}

pub fn logout() -> Result<()> {
    let path = session_path();
    if clear_session(&path)? {
        println!("Removed session at {}", path.display());
    } else {
        println!("No session found at {}", path.display());
    }
    Ok(())
}

pub fn whoami() -> Result<()> {
    match load_session(&session_path())? {
        Some(session) => println!("{}", session.author),
        None => println!("Not logged in. Run `delphi login <name>`."),
    }
    Ok(())
}

/// The author to post as: an explicit name wins over the stored session.
pub fn resolve_author(explicit: Option<&str>) -> Result<String> {
    if let Some(name) = explicit {
        return Ok(name.trim().to_string());
    }
    Ok(load_session(&session_path())?
        .map(|session| session.author)
        .unwrap_or_default())
}

pub fn save_session(path: &Path, name: &str) -> Result<Session> {
    let author = name.trim();
    if author.is_empty() {
        bail!("name must not be empty");
    }
    ensure_parent(path)?;
    let session = Session {
        author: author.to_string(),
    };
    fs::write(path, serde_json::to_vec_pretty(&session)?)
        .with_context(|| format!("failed to write session at {}", path.display()))?;
    debug!(path = %path.display(), "session saved");
    Ok(session)
}

pub fn load_session(path: &Path) -> Result<Option<Session>> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read session {}", path.display()))?;
    let session: Session = serde_json::from_str(&contents)
        .with_context(|| format!("corrupt session file {}; run `delphi logout`", path.display()))?;
    Ok(Some(session))
}

pub fn clear_session(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(false);
    }
    fs::remove_file(path)
        .with_context(|| format!("failed to remove session {}", path.display()))?;
    Ok(true)
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create session directory {}", parent.display()))?;
    }
    Ok(())
}
