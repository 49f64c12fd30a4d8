use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::Session;

/// What the CLI keeps between runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSession {
    pub session: Session,
    pub saved_at: DateTime<Utc>,
}

pub fn get_config_dir() -> anyhow::Result<PathBuf> {
    let config_dir = if let Ok(custom_dir) = std::env::var("PORTFOLIO_CLI_CONFIG_DIR") {
        PathBuf::from(custom_dir)
    } else {
        let home = std::env::var("HOME").map_err(|_| anyhow::anyhow!("HOME environment variable not set"))?;
        PathBuf::from(home).join(".config").join("portfolio").join("cli")
    };

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

fn session_file() -> anyhow::Result<PathBuf> {
    Ok(get_config_dir()?.join("session.json"))
}

pub fn load_session() -> anyhow::Result<Option<StoredSession>> {
    let file = session_file()?;
    if !file.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(file)?;
    let stored: StoredSession = serde_json::from_str(&content)?;
    Ok(Some(stored))
}

pub fn save_session(session: &Session) -> anyhow::Result<()> {
    let stored = StoredSession {
        session: session.clone(),
        saved_at: Utc::now(),
    };
    let content = serde_json::to_string_pretty(&stored)?;
    fs::write(session_file()?, content)?;
    Ok(())
}

pub fn clear_session() -> anyhow::Result<()> {
    let file = session_file()?;
    if file.exists() {
        fs::remove_file(file)?;
    }
    Ok(())
}
