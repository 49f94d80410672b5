use chat_shared::{ConnectionState, Message};
use crossterm::event::KeyEvent;

use crate::config::ClientOptions;
use crate::display::{Display, RenderedMessage};
use crate::input::{InputAction, InputField};
use crate::render::Converter;
use crate::transport::{Channel, ChannelEvent};

/// Owns one channel to the chat endpoint and everything the user sees of it.
///
/// All methods run on the UI loop; channel callbacks and key presses are
/// handled one after the other, never concurrently. None of them return
/// errors: transport failures are logged and otherwise show up only as the
/// "Disconnected" status.
pub struct ChatConnectionClient<D: Display, C: Channel> {
    display: D,
    channel: C,
    input: InputField,
    converter: Box<dyn Converter>,
    options: ClientOptions,
    state: ConnectionState,
    initialized: bool,
}

impl<D: Display, C: Channel> ChatConnectionClient<D, C> {
    pub fn new(
        display: D,
        channel: C,
        converter: Box<dyn Converter>,
        options: ClientOptions,
    ) -> Self {
        Self {
            display,
            channel,
            input: InputField::new(),
            converter,
            options,
            state: ConnectionState::default(),
            initialized: false,
        }
    }

    /// Bind the submit behaviour, focus the input and publish the initial
    /// status. Later calls do nothing.
    pub fn initialize(&mut self) {
        if self.initialized {
            return;
        }
        self.initialized = true;
        self.input.focus();
        self.display.set_status(self.state);
    }

    pub fn send_current_input(&mut self) {
        let text = self.input.value().to_string();
        self.input.clear();

        if self.options.local_echo {
            self.append(Message::user(text.clone()));
        }

        // Not guarded on state: a closed channel fails at the transport
        if let Err(e) = self.channel.transmit(text) {
            tracing::warn!("frame not sent ({:?}): {}", self.state, e);
        }

        self.input.focus();
    }

    pub fn on_channel_open(&mut self) {
        self.transition(ConnectionState::Open);
    }

    pub fn on_channel_close(&mut self) {
        self.transition(ConnectionState::Closed);
    }

    pub fn on_channel_message(&mut self, raw: &str) {
        self.append(Message::bot(raw));
    }

    pub fn handle_event(&mut self, event: ChannelEvent) {
        match event {
            ChannelEvent::Opened => self.on_channel_open(),
            ChannelEvent::Frame(text) => self.on_channel_message(&text),
            ChannelEvent::Closed => self.on_channel_close(),
        }
    }

    /// Route a key press to the input field. Enter submits. Returns whether
    /// the key was used; nothing is bound before [`initialize`](Self::initialize).
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if !self.initialized {
            return false;
        }
        match self.input.handle_key(key) {
            InputAction::Submit => {
                self.send_current_input();
                true
            }
            InputAction::Edited => true,
            InputAction::Ignored => false,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut D {
        &mut self.display
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn input(&self) -> &InputField {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut InputField {
        &mut self.input
    }

    fn transition(&mut self, next: ConnectionState) {
        if self.state.is_terminal() {
            tracing::debug!("channel already closed, ignoring {:?}", next);
            return;
        }
        if !self.state.can_transition_to(next) {
            tracing::debug!("ignoring {:?} -> {:?}", self.state, next);
            return;
        }
        tracing::info!("connection {:?} -> {:?}", self.state, next);
        self.state = next;
        self.display.set_status(next);
    }

    fn append(&mut self, message: Message) {
        let content = self.converter.convert(&message.body);
        let lines = self.converter.styled_lines(&message.body);
        self.display.append_message(RenderedMessage {
            message,
            content,
            lines,
        });
        self.display.scroll_to_latest();
    }
}
