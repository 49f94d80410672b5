use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use url::Url;

use crate::error::{ChatError, Result};
use crate::render::{Converter, HtmlConverter, TerminalConverter};

pub const DEFAULT_URL: &str = "ws://localhost:3010/chat";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RenderMode {
    /// Markdown reflowed for the terminal
    Terminal,
    /// Markdown converted to HTML markup
    Html,
}

#[derive(Parser, Debug)]
#[command(name = "chat-client", version, about = "Terminal chat client over a WebSocket channel")]
pub struct Cli {
    /// Chat endpoint
    #[arg(short, long, env = "CHAT_URL", default_value = DEFAULT_URL)]
    pub url: String,

    /// Show your own messages in the list as they are sent
    #[arg(long, env = "CHAT_LOCAL_ECHO")]
    pub local_echo: bool,

    /// Escape raw HTML found in incoming Markdown
    #[arg(long, env = "CHAT_SANITIZE")]
    pub sanitize: bool,

    /// How incoming Markdown is rendered
    #[arg(long, value_enum, default_value_t = RenderMode::Terminal)]
    pub render: RenderMode,

    /// Log file, the terminal itself is taken by the UI
    #[arg(long, env = "CHAT_LOG_FILE", default_value = "chat-client.log")]
    pub log_file: PathBuf,
}

/// Behaviour switches of the client core.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClientOptions {
    pub local_echo: bool,
}

impl Cli {
    pub fn endpoint(&self) -> Result<Url> {
        parse_endpoint(&self.url)
    }

    pub fn options(&self) -> ClientOptions {
        ClientOptions {
            local_echo: self.local_echo,
        }
    }

    pub fn converter(&self) -> Box<dyn Converter> {
        match self.render {
            RenderMode::Terminal => Box::new(TerminalConverter),
            RenderMode::Html => Box::new(HtmlConverter::new(self.sanitize)),
        }
    }
}

pub fn parse_endpoint(raw: &str) -> Result<Url> {
    let url = Url::parse(raw)?;
    match url.scheme() {
        "ws" | "wss" => Ok(url),
        other => Err(ChatError::UnsupportedScheme(other.to_string())),
    }
}
