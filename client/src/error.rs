use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChatError {
    /// The handshake never completed or was refused.
    #[error("Channel unavailable: {0}")]
    ChannelUnavailable(#[from] tokio_tungstenite::tungstenite::Error),

    /// The channel is gone; the frame was not transmitted.
    #[error("Channel closed")]
    ChannelClosed,

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Unsupported scheme '{0}', expected ws or wss")]
    UnsupportedScheme(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ChatError>;
