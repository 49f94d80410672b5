use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use tokio::fs;

pub const DEFAULT_PORT: u16 = 3010;

#[derive(Parser, Debug, Default)]
#[command(name = "chat-server", version, about = "WebSocket chat endpoint serving /chat")]
pub struct Cli {
    /// JSON config file
    #[arg(short, long, env = "CHAT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to listen on, overrides the config file
    #[arg(long, env = "CHAT_BIND")]
    pub bind: Option<SocketAddr>,

    /// File that receives the chat history, overrides the config file
    #[arg(long, env = "CHAT_HISTORY_FILE")]
    pub history_file: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub bind: SocketAddr,
    /// Frame sent to every client right after the upgrade.
    pub greeting: Option<String>,
    /// Prepended to every frame before it is broadcast back.
    pub reply_prefix: String,
    pub history_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT)),
            greeting: None,
            reply_prefix: String::new(),
            history_file: None,
        }
    }
}

impl AppConfig {
    /// File values first, then command line and environment overrides.
    pub async fn resolve(cli: &Cli) -> Result<Self> {
        let mut config = match &cli.config {
            Some(path) => load_config(path).await?,
            None => AppConfig::default(),
        };

        if let Some(bind) = cli.bind {
            config.bind = bind;
        }
        if let Some(path) = &cli.history_file {
            config.history_file = Some(path.clone());
        }

        Ok(config)
    }
}

pub async fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config: AppConfig = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config {}", path.display()))?;
    Ok(config)
}
