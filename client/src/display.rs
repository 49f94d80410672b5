use chat_shared::{ConnectionState, Message};
use ratatui::text::Line;

/// A message together with the converter's output for its body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub message: Message,
    pub content: String,
    /// Styled lines for the terminal; `None` means `content` is drawn as is.
    pub lines: Option<Vec<Line<'static>>>,
}

/// Where the client puts what the user sees.
pub trait Display {
    fn append_message(&mut self, message: RenderedMessage);
    fn set_status(&mut self, state: ConnectionState);
    fn scroll_to_latest(&mut self);
}

/// Display state drawn by the terminal UI.
#[derive(Debug)]
pub struct TerminalDisplay {
    endpoint: String,
    messages: Vec<RenderedMessage>,
    status: ConnectionState,
    selected: Option<usize>,
}

impl TerminalDisplay {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            messages: Vec::new(),
            status: ConnectionState::default(),
            selected: None,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn messages(&self) -> &[RenderedMessage] {
        &self.messages
    }

    pub fn status(&self) -> ConnectionState {
        self.status
    }

    /// Entry the list is scrolled to.
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.selected = self.selected.map(|i| i.saturating_sub(lines));
    }

    pub fn scroll_down(&mut self, lines: usize) {
        if let Some(last) = self.messages.len().checked_sub(1) {
            self.selected = self.selected.map(|i| (i + lines).min(last));
        }
    }
}

impl Display for TerminalDisplay {
    fn append_message(&mut self, message: RenderedMessage) {
        self.messages.push(message);
    }

    fn set_status(&mut self, state: ConnectionState) {
        self.status = state;
    }

    fn scroll_to_latest(&mut self) {
        self.selected = self.messages.len().checked_sub(1);
    }
}
