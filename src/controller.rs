//! Orchestrates user actions against the backend.
//!
//! The controller owns the session, the conversation cache and the state of
//! the message pane. Create, select, delete and send are mutually exclusive
//! through the session's busy flag; actions attempted while busy are dropped.

use crate::api::ChatBackend;
use crate::events::{Message, Role};
use crate::session::Session;
use crate::store::{ConversationStore, ListStatus};
use crate::streaming::{AnswerStream, Polled, StreamEvent, StreamOutcome, StreamState};

pub const NEW_CONVERSATION_TITLE: &str = "New Conversation";
pub const FALLBACK_TITLE: &str = "Conversation";
pub const NO_SELECTION_TITLE: &str = "Select or create a conversation";
pub const SEND_FAILED_ALERT: &str = "Error sending message. Please try again.";

/// What the message pane shows instead of a thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    /// Nothing selected yet
    Welcome,
    /// Freshly created conversation
    Greeting,
    /// Selected conversation has no history
    NoMessages,
    /// The active conversation was deleted
    Deleted,
    /// History could not be fetched
    LoadFailed,
}

impl Placeholder {
    pub fn text(&self) -> &'static str {
        match self {
            Placeholder::Welcome => NO_SELECTION_TITLE,
            Placeholder::Greeting => "👋 Hello! How can I help you today?",
            Placeholder::NoMessages => "No messages yet. Start chatting!",
            Placeholder::Deleted => "Conversation deleted. Create a new one!",
            Placeholder::LoadFailed => "Error loading conversation",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Settled,
    /// Waiting for the first fragment
    Pending,
    Streaming,
    Failed,
}

/// One message as shown in the pane
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEntry {
    pub role: Role,
    pub text: String,
    pub state: EntryState,
}

impl ChatEntry {
    pub fn settled(message: Message) -> Self {
        Self {
            role: message.role,
            text: message.text,
            state: EntryState::Settled,
        }
    }

    fn pending_answer() -> Self {
        Self {
            role: Role::Ai,
            text: String::new(),
            state: EntryState::Pending,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessagePanel {
    Placeholder(Placeholder),
    Thread(Vec<ChatEntry>),
}

struct ActiveStream {
    stream: AnswerStream,
    state: StreamState,
}

pub struct UiController<B: ChatBackend> {
    backend: B,
    store: ConversationStore,
    session: Session,
    panel: MessagePanel,
    title: String,
    alert: Option<String>,
    /// Informational popup, e.g. command help
    info: Option<String>,
    pending_delete: Option<String>,
    active_stream: Option<ActiveStream>,
    /// Lines scrolled up from the newest content
    scroll_back: usize,
    sidebar_cursor: usize,
    show_sidebar: bool,
}

impl<B: ChatBackend> UiController<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            store: ConversationStore::new(),
            session: Session::new(),
            panel: MessagePanel::Placeholder(Placeholder::Welcome),
            title: NO_SELECTION_TITLE.to_string(),
            alert: None,
            info: None,
            pending_delete: None,
            active_stream: None,
            scroll_back: 0,
            sidebar_cursor: 0,
            show_sidebar: true,
        }
    }

    /// Reload the conversation list; an empty list bootstraps a new conversation.
    pub async fn reload(&mut self) {
        self.refresh_list().await;
        if self.store.status() == ListStatus::Loaded && self.store.is_empty() {
            tracing::info!("no conversations yet, creating one");
            self.create().await;
        }
    }

    async fn refresh_list(&mut self) {
        if let Err(err) = self.store.refresh(&self.backend).await {
            tracing::error!(error = %err, "failed to load conversations");
        }
        self.sidebar_cursor = self
            .sidebar_cursor
            .min(self.store.len().saturating_sub(1));
    }

    /// Start a new conversation. Returns false if dropped or failed.
    ///
    /// The new conversation stays out of the list until its first message:
    /// the backend only records a conversation once it has one.
    pub async fn create(&mut self) -> bool {
        if !self.session.try_begin() {
            tracing::debug!("create dropped: busy");
            return false;
        }

        let created = match self.store.generate_id(&self.backend).await {
            Ok(chat_id) => {
                tracing::info!(%chat_id, "created conversation");
                self.session.activate(chat_id);
                self.panel = MessagePanel::Placeholder(Placeholder::Greeting);
                self.title = NEW_CONVERSATION_TITLE.to_string();
                self.scroll_back = 0;
                // Still busy here, so an empty list cannot bootstrap again.
                self.refresh_list().await;
                true
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to create conversation");
                self.show_alert("Error creating new conversation. Please try again.");
                false
            }
        };

        self.session.finish();
        created
    }

    /// Switch to a conversation and load its history.
    ///
    /// No-op if it is already active or another action is running.
    pub async fn select(&mut self, chat_id: &str) -> bool {
        if self.session.is_active(chat_id) {
            return false;
        }
        if !self.session.try_begin() {
            tracing::debug!(chat_id, "select dropped: busy");
            return false;
        }

        let selected = match self.store.fetch_messages(&self.backend, chat_id).await {
            Ok(messages) => {
                tracing::debug!(chat_id, count = messages.len(), "conversation loaded");
                self.session.activate(chat_id);
                self.title = self
                    .store
                    .find(chat_id)
                    .map(|c| c.title.clone())
                    .unwrap_or_else(|| FALLBACK_TITLE.to_string());
                self.panel = if messages.is_empty() {
                    MessagePanel::Placeholder(Placeholder::NoMessages)
                } else {
                    MessagePanel::Thread(messages.into_iter().map(ChatEntry::settled).collect())
                };
                self.scroll_back = 0;
                if let Some(position) = self.store.position(chat_id) {
                    self.sidebar_cursor = position;
                }
                true
            }
            Err(err) => {
                tracing::error!(chat_id, error = %err, "failed to load messages");
                self.panel = MessagePanel::Placeholder(Placeholder::LoadFailed);
                false
            }
        };

        self.session.finish();
        selected
    }

    /// Ask the user to confirm deleting a conversation
    pub fn request_delete(&mut self, chat_id: &str) {
        if self.session.is_busy() {
            return;
        }
        self.pending_delete = Some(chat_id.to_string());
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    /// Delete the conversation awaiting confirmation
    pub async fn confirm_delete(&mut self) -> bool {
        match self.pending_delete.take() {
            Some(chat_id) => self.delete(&chat_id).await,
            None => false,
        }
    }

    /// Delete a conversation the user already confirmed.
    pub async fn delete(&mut self, chat_id: &str) -> bool {
        if !self.session.try_begin() {
            tracing::debug!(chat_id, "delete dropped: busy");
            return false;
        }

        let deleted = match self.store.remove(&self.backend, chat_id).await {
            Ok(()) => {
                tracing::info!(chat_id, "deleted conversation");
                if self.session.is_active(chat_id) {
                    self.session.deactivate();
                    self.panel = MessagePanel::Placeholder(Placeholder::Deleted);
                    self.title = NO_SELECTION_TITLE.to_string();
                    self.scroll_back = 0;
                }
                true
            }
            Err(err) => {
                tracing::error!(chat_id, error = %err, "failed to delete conversation");
                self.show_alert("Error deleting conversation.");
                false
            }
        };

        self.session.finish();
        if deleted {
            self.reload().await;
        }
        deleted
    }

    /// Send a question to the active conversation and start streaming the answer.
    ///
    /// Returns false when the question is blank, nothing is active, another
    /// action is running, or the stream could not be opened.
    pub async fn send(&mut self, question: &str) -> bool {
        let question = question.trim();
        let Some(chat_id) = self.session.current_chat_id().map(str::to_string) else {
            return false;
        };
        if question.is_empty() || !self.session.try_begin() {
            return false;
        }

        self.with_thread(|entries| {
            entries.push(ChatEntry::settled(Message::user(question)));
            entries.push(ChatEntry::pending_answer());
        });
        self.scroll_back = 0;

        match self.backend.stream_answer(&chat_id, question).await {
            Ok(stream) => {
                self.active_stream = Some(ActiveStream {
                    stream,
                    state: StreamState::new(),
                });
                true
            }
            Err(err) => {
                tracing::error!(%chat_id, error = %err, "failed to open answer stream");
                self.set_answer(String::new(), EntryState::Failed);
                self.show_alert(SEND_FAILED_ALERT);
                self.session.finish();
                false
            }
        }
    }

    /// Apply whatever the answer stream has delivered without waiting.
    ///
    /// Returns true while the stream is still open.
    pub async fn pump_stream(&mut self) -> bool {
        loop {
            let Some(active) = self.active_stream.as_mut() else {
                return false;
            };
            let event = match active.stream.try_next() {
                Polled::Event(event) => Some(event),
                Polled::Pending => return true,
                Polled::Closed => None,
            };
            if let Some(outcome) = self.apply_stream_event(event) {
                self.finish_stream(outcome).await;
                return false;
            }
        }
    }

    /// Wait until the current answer stream settles.
    pub async fn wait_stream(&mut self) {
        loop {
            let Some(active) = self.active_stream.as_mut() else {
                return;
            };
            let event = active.stream.next_event().await;
            if let Some(outcome) = self.apply_stream_event(event) {
                self.finish_stream(outcome).await;
                return;
            }
        }
    }

    /// `None` means the channel closed.
    fn apply_stream_event(&mut self, event: Option<StreamEvent>) -> Option<StreamOutcome> {
        let active = self.active_stream.as_mut()?;
        let outcome = match event {
            Some(event) => active.state.apply(event).cloned(),
            None => Some(active.state.close().clone()),
        };
        if outcome.is_none() {
            let text = active.state.text().to_string();
            self.set_answer(text, EntryState::Streaming);
            self.scroll_back = 0;
        }
        outcome
    }

    async fn finish_stream(&mut self, outcome: StreamOutcome) {
        // Dropping the stream releases the channel.
        self.active_stream = None;

        let succeeded = match outcome {
            StreamOutcome::Completed(text) => {
                tracing::info!(chars = text.len(), "answer complete");
                self.set_answer(text, EntryState::Settled);
                true
            }
            StreamOutcome::Failed(reason) => {
                tracing::warn!(%reason, "answer stream failed");
                self.set_answer(String::new(), EntryState::Failed);
                self.show_alert(SEND_FAILED_ALERT);
                false
            }
        };
        self.scroll_back = 0;

        if succeeded {
            // The first answer gives the conversation its server-side title.
            self.refresh_list().await;
            if let Some(chat_id) = self.session.current_chat_id() {
                if let Some(conversation) = self.store.find(chat_id) {
                    self.title = conversation.title.clone();
                }
            }
        }
        self.session.finish();
    }

    /// Edit the thread shown in the pane, replacing any placeholder
    fn with_thread<R>(&mut self, edit: impl FnOnce(&mut Vec<ChatEntry>) -> R) -> R {
        let mut entries = match std::mem::replace(&mut self.panel, MessagePanel::Thread(Vec::new())) {
            MessagePanel::Thread(entries) => entries,
            MessagePanel::Placeholder(_) => Vec::new(),
        };
        let result = edit(&mut entries);
        self.panel = MessagePanel::Thread(entries);
        result
    }

    /// Update the answer currently being produced
    fn set_answer(&mut self, text: String, state: EntryState) {
        self.with_thread(|entries| {
            let entry = entries.iter_mut().rev().find(|entry| {
                entry.role == Role::Ai
                    && matches!(entry.state, EntryState::Pending | EntryState::Streaming)
            });
            if let Some(entry) = entry {
                entry.text = text;
                entry.state = state;
            }
        });
    }

    fn show_alert(&mut self, message: &str) {
        self.alert = Some(message.to_string());
    }

    pub fn show_info(&mut self, text: impl Into<String>) {
        self.info = Some(text.into());
    }

    /// Close the alert or info popup
    pub fn dismiss_alert(&mut self) {
        self.alert = None;
        self.info = None;
    }

    pub fn move_cursor(&mut self, delta: isize) {
        let len = self.store.len();
        if len == 0 {
            self.sidebar_cursor = 0;
            return;
        }
        let next = self.sidebar_cursor as isize + delta;
        self.sidebar_cursor = next.clamp(0, len as isize - 1) as usize;
    }

    /// Id of the conversation under the sidebar cursor
    pub fn conversation_under_cursor(&self) -> Option<String> {
        self.store
            .get(self.sidebar_cursor)
            .map(|c| c.conversation_id.clone())
    }

    pub fn toggle_sidebar(&mut self) {
        self.show_sidebar = !self.show_sidebar;
    }

    pub fn set_show_sidebar(&mut self, show: bool) {
        self.show_sidebar = show;
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.scroll_back = self.scroll_back.saturating_add(lines);
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll_back = self.scroll_back.saturating_sub(lines);
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn panel(&self) -> &MessagePanel {
        &self.panel
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn alert(&self) -> Option<&str> {
        self.alert.as_deref()
    }

    pub fn info(&self) -> Option<&str> {
        self.info.as_deref()
    }

    pub fn pending_delete(&self) -> Option<&str> {
        self.pending_delete.as_deref()
    }

    pub fn is_streaming(&self) -> bool {
        self.active_stream.is_some()
    }

    pub fn input_enabled(&self) -> bool {
        self.session.input_enabled()
    }

    pub fn scroll_back(&self) -> usize {
        self.scroll_back
    }

    pub fn sidebar_cursor(&self) -> usize {
        self.sidebar_cursor
    }

    pub fn show_sidebar(&self) -> bool {
        self.show_sidebar
    }
}
