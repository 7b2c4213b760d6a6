//! View model: a pure projection of controller state for drawing.

use crate::api::ChatBackend;
use crate::controller::{EntryState, MessagePanel, UiController};
use crate::events::Role;
use crate::format::relative_time;
use crate::render::{render, sanitize};
use crate::store::ListStatus;
use chrono::{DateTime, Utc};
use ratatui::text::Text;

pub const ANSWER_FAILED_TEXT: &str = "Error receiving response. Please try again.";

#[derive(Debug, Clone, PartialEq)]
pub struct ViewModel {
    pub title: String,
    /// `None` while the sidebar is collapsed
    pub sidebar: Option<SidebarView>,
    pub messages: MessagesView,
    pub composer: ComposerView,
    pub modal: Option<ModalView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidebarView {
    pub items: Vec<SidebarItem>,
    /// Shown in place of the items
    pub placeholder: Option<&'static str>,
    pub cursor: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidebarItem {
    pub title: String,
    pub date: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MessagesView {
    Placeholder(&'static str),
    Thread {
        entries: Vec<MessageView>,
        scroll_back: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct MessageView {
    pub role: Role,
    pub body: Text<'static>,
    pub state: EntryState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComposerView {
    pub enabled: bool,
    pub busy: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalView {
    Alert(String),
    Info(String),
    ConfirmDelete { title: String },
}

impl ViewModel {
    /// Project the controller's state as of `now`.
    ///
    /// Message bodies are re-rendered from their full text on every call.
    pub fn build<B: ChatBackend>(controller: &UiController<B>, now: DateTime<Utc>) -> Self {
        let session = controller.session();
        let store = controller.store();

        let sidebar = controller.show_sidebar().then(|| {
            let placeholder = match store.status() {
                ListStatus::NotLoaded => Some("Loading conversations…"),
                ListStatus::Failed => Some("Error loading conversations"),
                ListStatus::Loaded if store.is_empty() => Some("No conversations yet"),
                ListStatus::Loaded => None,
            };
            let items = if placeholder.is_some() {
                Vec::new()
            } else {
                store
                    .conversations()
                    .iter()
                    .map(|conv| SidebarItem {
                        title: sanitize(&conv.title).replace('\n', " "),
                        date: relative_time(conv.last_message_time, now),
                        active: session.is_active(&conv.conversation_id),
                    })
                    .collect()
            };
            SidebarView {
                items,
                placeholder,
                cursor: controller.sidebar_cursor(),
            }
        });

        let messages = match controller.panel() {
            MessagePanel::Placeholder(placeholder) => MessagesView::Placeholder(placeholder.text()),
            MessagePanel::Thread(entries) => MessagesView::Thread {
                entries: entries
                    .iter()
                    .map(|entry| MessageView {
                        role: entry.role,
                        body: match entry.state {
                            EntryState::Failed => Text::raw(ANSWER_FAILED_TEXT),
                            _ => render(entry.role, &entry.text),
                        },
                        state: entry.state,
                    })
                    .collect(),
                scroll_back: controller.scroll_back(),
            },
        };

        let modal = if let Some(message) = controller.alert() {
            Some(ModalView::Alert(message.to_string()))
        } else if let Some(text) = controller.info() {
            Some(ModalView::Info(text.to_string()))
        } else {
            controller.pending_delete().map(|chat_id| ModalView::ConfirmDelete {
                title: store
                    .find(chat_id)
                    .map(|c| sanitize(&c.title))
                    .unwrap_or_else(|| sanitize(chat_id)),
            })
        };

        ViewModel {
            title: sanitize(controller.title()),
            sidebar,
            messages,
            composer: ComposerView {
                enabled: controller.input_enabled(),
                busy: session.is_busy(),
            },
            modal,
        }
    }
}
