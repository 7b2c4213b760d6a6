//! Client-side cache of the conversation list.
//!
//! The cache is always replaced wholesale from the backend, never patched.

use crate::api::ChatBackend;
use crate::error::Result;
use crate::events::{Conversation, Message};

/// Whether the cached list reflects the last load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListStatus {
    #[default]
    NotLoaded,
    Loaded,
    Failed,
}

#[derive(Debug, Clone, Default)]
pub struct ConversationStore {
    conversations: Vec<Conversation>,
    status: ListStatus,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the full list and replace the cache.
    ///
    /// On failure the previous cache is kept but the list is marked failed.
    pub async fn refresh<B: ChatBackend + ?Sized>(&mut self, backend: &B) -> Result<()> {
        match backend.list_conversations().await {
            Ok(conversations) => {
                tracing::debug!(count = conversations.len(), "conversation list loaded");
                self.conversations = conversations;
                self.status = ListStatus::Loaded;
                Ok(())
            }
            Err(err) => {
                self.status = ListStatus::Failed;
                Err(err)
            }
        }
    }

    /// Ask the backend for a new conversation id
    pub async fn generate_id<B: ChatBackend + ?Sized>(&self, backend: &B) -> Result<String> {
        backend.generate_chat_id().await
    }

    pub async fn fetch_messages<B: ChatBackend + ?Sized>(
        &self,
        backend: &B,
        chat_id: &str,
    ) -> Result<Vec<Message>> {
        backend.messages(chat_id).await
    }

    pub async fn remove<B: ChatBackend + ?Sized>(&self, backend: &B, chat_id: &str) -> Result<()> {
        backend.delete_conversation(chat_id).await
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn status(&self) -> ListStatus {
        self.status
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn find(&self, chat_id: &str) -> Option<&Conversation> {
        self.conversations
            .iter()
            .find(|c| c.conversation_id == chat_id)
    }

    pub fn position(&self, chat_id: &str) -> Option<usize> {
        self.conversations
            .iter()
            .position(|c| c.conversation_id == chat_id)
    }

    pub fn get(&self, index: usize) -> Option<&Conversation> {
        self.conversations.get(index)
    }
}
