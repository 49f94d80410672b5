use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Origin {
    User,
    Bot,
}

impl Origin {
    pub fn label(self) -> &'static str {
        match self {
            Origin::User => "You",
            Origin::Bot => "Bot",
        }
    }
}

/// One unit of chat content. The body is the raw Markdown text as typed or
/// as received over the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub origin: Origin,
    pub body: String,
}

impl Message {
    pub fn user(body: impl Into<String>) -> Self {
        Self {
            origin: Origin::User,
            body: body.into(),
        }
    }

    pub fn bot(body: impl Into<String>) -> Self {
        Self {
            origin: Origin::Bot,
            body: body.into(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatHistory {
    pub messages: Vec<Message>,
}

/// Lifecycle of the single channel a client owns.
///
/// `Connecting` is the state right after the channel is constructed.
/// `Closed` is terminal: nothing leaves it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    #[default]
    Connecting,
    Open,
    Closed,
}

impl ConnectionState {
    pub fn can_transition_to(self, next: ConnectionState) -> bool {
        matches!(
            (self, next),
            (ConnectionState::Connecting, ConnectionState::Open)
                | (ConnectionState::Connecting, ConnectionState::Closed)
                | (ConnectionState::Open, ConnectionState::Closed)
        )
    }

    /// Text shown in the status indicator.
    pub fn label(self) -> &'static str {
        match self {
            ConnectionState::Connecting => "Connecting...",
            ConnectionState::Open => "Connected",
            ConnectionState::Closed => "Disconnected",
        }
    }

    /// Visual class of the status indicator.
    pub fn class(self) -> &'static str {
        match self {
            ConnectionState::Connecting => "connecting",
            ConnectionState::Open => "connected",
            ConnectionState::Closed => "disconnected",
        }
    }

    pub fn is_terminal(self) -> bool {
        self == ConnectionState::Closed
    }
}
