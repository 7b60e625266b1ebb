//! Application state machine.
//!
//! This module defines the [`App`] state machine, which manages the interactive
//! state of the application completely decoupled from I/O and protocol
//! mechanics.
//!
//! This is a pure state machine: it consumes [`crate::AppEvent`] inputs and
//! produces [`crate::AppAction`] instructions for the runtime to execute.
//!
//! # Responsibilities
//!
//! - Owns the input line and its cursor, and decides what Enter means: a
//!   username on the login screen, a prompt answer, a slash command or a chat
//!   message.
//! - Mirrors the session (username, conversation, messages, typing status)
//!   from events. It never changes those on its own; the client is the source
//!   of truth.
//! - Holds UI-only state: prompts, the login error alert, the status line and
//!   terminal dimensions.

use parley_core::{Conversation, Message};

use crate::{AppAction, AppEvent, ConnectionState, KeyInput, PromptKind, Screen};

/// Application state machine.
///
/// Pure state machine that processes events and produces actions.
/// No I/O dependencies - fully testable in simulation.
#[derive(Debug, Clone)]
pub struct App {
    /// Server base URL, shown in the status bar.
    server: String,
    /// Channel state.
    connection: ConnectionState,
    /// Logged-in username. `None` when logged out.
    username: Option<String>,
    /// Current room or private chat.
    conversation: Option<Conversation>,
    /// Messages in arrival order.
    messages: Vec<Message>,
    /// Peer typing status. Empty when nobody is typing.
    typing_status: String,
    /// Input line buffer.
    input: String,
    /// Cursor position in characters.
    cursor: usize,
    /// Pending prompt. The input line holds its answer.
    prompt: Option<PromptKind>,
    /// Modal alert. Swallows the next key press.
    alert: Option<String>,
    /// Terminal dimensions (columns, rows).
    terminal_size: (u16, u16),
    /// Transient status message. `None` if no message.
    status_message: Option<String>,
}

impl App {
    /// Create a new App on the login screen.
    pub fn new(server: String) -> Self {
        Self {
            server,
            connection: ConnectionState::Disconnected,
            username: None,
            conversation: None,
            messages: Vec::new(),
            typing_status: String::new(),
            input: String::new(),
            cursor: 0,
            prompt: None,
            alert: None,
            terminal_size: (80, 24),
            status_message: None,
        }
    }

    /// Process an event and return actions.
    pub fn handle(&mut self, event: AppEvent) -> Vec<AppAction> {
        match event {
            AppEvent::Key(key) => self.handle_key(key),
            AppEvent::Tick => vec![],
            AppEvent::Resize(cols, rows) => {
                self.terminal_size = (cols, rows);
                vec![AppAction::Render]
            },
            AppEvent::LoggedIn { username } => {
                self.status_message = Some(format!("Logged in as {username}"));
                self.username = Some(username);
                self.connection = ConnectionState::Connecting;
                vec![AppAction::Render]
            },
            AppEvent::Connected => {
                self.connection = ConnectionState::Connected;
                vec![AppAction::Render]
            },
            AppEvent::LoggedOut => {
                self.reset_session();
                vec![AppAction::Render]
            },
            AppEvent::RoomJoined { room } => {
                self.status_message = Some(format!("Joined room {room}"));
                self.conversation = Some(Conversation::Room(room));
                vec![AppAction::Render]
            },
            AppEvent::PrivateChatStarted { recipient } => {
                self.status_message = Some(format!("Private chat with {recipient}"));
                self.conversation = Some(Conversation::Private(recipient));
                vec![AppAction::Render]
            },
            AppEvent::HistoryLoaded { messages } => {
                self.messages = messages;
                vec![AppAction::Render]
            },
            AppEvent::MessageReceived { message } => {
                self.messages.push(message);
                vec![AppAction::Render]
            },
            AppEvent::TypingStatus { status } => {
                self.typing_status = status;
                vec![AppAction::Render]
            },
            AppEvent::LoginRejected { reason } => {
                self.alert = Some(reason);
                vec![AppAction::Render]
            },
            AppEvent::ChannelLost { reason } => {
                self.status_message = Some(format!("Disconnected: {reason}"));
                vec![AppAction::Render]
            },
            AppEvent::Error { message } => {
                self.status_message = Some(format!("Error: {message}"));
                vec![AppAction::Render]
            },
        }
    }

    /// Log in under `username`.
    pub fn login(&mut self, username: String) -> Vec<AppAction> {
        self.status_message = Some("Logging in...".into());
        vec![AppAction::Login { username }, AppAction::Render]
    }

    /// Join (or create) a room.
    pub fn join_room(&self, room_name: String) -> Vec<AppAction> {
        vec![AppAction::JoinRoom { room_name }, AppAction::Render]
    }

    /// Start a private chat.
    pub fn start_private_chat(&self, recipient: String) -> Vec<AppAction> {
        vec![AppAction::StartPrivateChat { recipient }, AppAction::Render]
    }

    /// Send a message in the current conversation.
    pub fn send_message(&self, text: String) -> Vec<AppAction> {
        vec![AppAction::SendMessage { text }, AppAction::Render]
    }

    /// End the session.
    pub fn logout(&self) -> Vec<AppAction> {
        vec![AppAction::Logout, AppAction::Render]
    }

    /// Quit the application.
    pub fn quit(&self) -> Vec<AppAction> {
        vec![AppAction::Quit]
    }

    /// Ask the user a question. The answer arrives on Enter.
    pub fn open_prompt(&mut self, kind: PromptKind) -> Vec<AppAction> {
        self.prompt = Some(kind);
        self.clear_input();
        vec![AppAction::Render]
    }

    fn handle_key(&mut self, key: KeyInput) -> Vec<AppAction> {
        if self.alert.take().is_some() {
            return vec![AppAction::Render];
        }

        match key {
            KeyInput::Char(c) => {
                let at = self.byte_offset();
                self.input.insert(at, c);
                self.cursor += 1;
                self.edited()
            },
            KeyInput::Backspace => {
                if self.cursor == 0 {
                    return vec![];
                }
                self.cursor -= 1;
                let at = self.byte_offset();
                self.input.remove(at);
                self.edited()
            },
            KeyInput::Delete => {
                if self.cursor >= self.input_len() {
                    return vec![];
                }
                let at = self.byte_offset();
                self.input.remove(at);
                self.edited()
            },
            KeyInput::Left => {
                self.cursor = self.cursor.saturating_sub(1);
                vec![AppAction::Render]
            },
            KeyInput::Right => {
                self.cursor = (self.cursor + 1).min(self.input_len());
                vec![AppAction::Render]
            },
            KeyInput::Home => {
                self.cursor = 0;
                vec![AppAction::Render]
            },
            KeyInput::End => {
                self.cursor = self.input_len();
                vec![AppAction::Render]
            },
            KeyInput::Enter => self.handle_enter(),
            KeyInput::Esc => {
                if self.prompt.take().is_some() {
                    self.clear_input();
                    vec![AppAction::Render]
                } else {
                    self.quit()
                }
            },
        }
    }

    /// Message input edits count as typing; command lines and prompts do not.
    fn edited(&self) -> Vec<AppAction> {
        let composing = self.screen() == Screen::Chat
            && self.prompt.is_none()
            && !self.input.starts_with('/');

        if composing {
            vec![AppAction::Keystroke, AppAction::Render]
        } else {
            vec![AppAction::Render]
        }
    }

    /// Handle Enter key (answer prompt, log in, run command or send message).
    fn handle_enter(&mut self) -> Vec<AppAction> {
        if self.input.is_empty() {
            return vec![];
        }

        let text = std::mem::take(&mut self.input);
        self.cursor = 0;

        if let Some(kind) = self.prompt.take() {
            return match kind {
                PromptKind::RoomName => self.join_room(text),
                PromptKind::Recipient => self.start_private_chat(text),
            };
        }

        if let Some(command) = text.strip_prefix('/') {
            return self.handle_command(command);
        }

        match self.screen() {
            Screen::Login => self.login(text),
            Screen::Lobby => {
                self.status_message =
                    Some("Join a room (/join) or start a chat (/dm) first".into());
                vec![AppAction::Render]
            },
            Screen::Chat => self.send_message(text),
        }
    }

    /// Handle slash commands.
    fn handle_command(&mut self, command: &str) -> Vec<AppAction> {
        let (name, arg) = command.split_once(char::is_whitespace).unwrap_or((command, ""));
        let arg = arg.trim();

        match (name, self.screen()) {
            ("quit" | "q", _) => self.quit(),
            (_, Screen::Login) => {
                self.status_message = Some("Enter a username to log in".into());
                vec![AppAction::Render]
            },
            ("join", _) if arg.is_empty() => self.open_prompt(PromptKind::RoomName),
            ("join", _) => self.join_room(arg.to_string()),
            ("dm" | "private", _) if arg.is_empty() => self.open_prompt(PromptKind::Recipient),
            ("dm" | "private", _) => self.start_private_chat(arg.to_string()),
            ("logout", _) => self.logout(),
            _ => {
                self.status_message = Some(format!("Unknown command: /{name}"));
                vec![AppAction::Render]
            },
        }
    }

    fn reset_session(&mut self) {
        self.connection = ConnectionState::Disconnected;
        self.username = None;
        self.conversation = None;
        self.messages.clear();
        self.typing_status.clear();
        self.prompt = None;
        self.clear_input();
    }

    fn clear_input(&mut self) {
        self.input.clear();
        self.cursor = 0;
    }

    fn input_len(&self) -> usize {
        self.input.chars().count()
    }

    fn byte_offset(&self) -> usize {
        self.input.char_indices().nth(self.cursor).map_or(self.input.len(), |(i, _)| i)
    }

    /// Screen to show.
    pub fn screen(&self) -> Screen {
        match (&self.username, &self.conversation) {
            (None, _) => Screen::Login,
            (Some(_), None) => Screen::Lobby,
            (Some(_), Some(_)) => Screen::Chat,
        }
    }

    /// Server base URL.
    pub fn server(&self) -> &str {
        &self.server
    }

    /// Channel state.
    pub fn connection_state(&self) -> ConnectionState {
        self.connection
    }

    /// Logged-in username. `None` when logged out.
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Current room or private chat.
    pub fn conversation(&self) -> Option<&Conversation> {
        self.conversation.as_ref()
    }

    /// Messages in arrival order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Peer typing status. Empty when nobody is typing.
    pub fn typing_status(&self) -> &str {
        &self.typing_status
    }

    /// Input buffer contents.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Cursor position in characters.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Pending prompt.
    pub fn prompt(&self) -> Option<PromptKind> {
        self.prompt
    }

    /// Alert text, while one is showing.
    pub fn alert(&self) -> Option<&str> {
        self.alert.as_deref()
    }

    /// Terminal dimensions (columns, rows).
    pub fn terminal_size(&self) -> (u16, u16) {
        self.terminal_size
    }

    /// Transient status message. `None` if no message.
    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }
}
