//! Shared test backend

#![allow(dead_code)]

use async_trait::async_trait;
use chatdeck::api::ChatBackend;
use chatdeck::error::{ClientError, Result};
use chatdeck::events::{Conversation, Message};
use chatdeck::streaming::{AnswerStream, StreamEvent};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Calls {
    pub list: usize,
    pub create: usize,
    pub messages: usize,
    pub delete: usize,
    pub stream: usize,
}

#[derive(Default)]
pub struct FakeState {
    pub conversations: Vec<Conversation>,
    pub messages: HashMap<String, Vec<Message>>,
    pub next_ids: VecDeque<String>,
    pub answers: VecDeque<Vec<StreamEvent>>,
    pub fail_list: bool,
    pub fail_create: bool,
    pub fail_messages: bool,
    pub fail_delete: bool,
    pub fail_stream: bool,
    pub calls: Calls,
}

/// In-memory backend; conversations appear in the list once they get an answer
#[derive(Clone, Default)]
pub struct FakeBackend {
    pub state: Arc<Mutex<FakeState>>,
}

pub fn api_error() -> ClientError {
    ClientError::Api {
        status: 500,
        message: "boom".to_string(),
    }
}

impl FakeBackend {
    pub fn with_conversations(ids: &[(&str, &str)]) -> Self {
        let backend = Self::default();
        backend.state.lock().unwrap().conversations = ids
            .iter()
            .map(|(id, title)| conversation(id, title))
            .collect();
        backend
    }

    pub fn calls(&self) -> Calls {
        self.state.lock().unwrap().calls
    }

    pub fn queue_id(&self, id: &str) {
        self.state.lock().unwrap().next_ids.push_back(id.to_string());
    }

    pub fn queue_answer(&self, events: Vec<StreamEvent>) {
        self.state.lock().unwrap().answers.push_back(events);
    }

    pub fn set_messages(&self, chat_id: &str, messages: Vec<Message>) {
        self.state
            .lock()
            .unwrap()
            .messages
            .insert(chat_id.to_string(), messages);
    }

    pub fn update(&self, f: impl FnOnce(&mut FakeState)) {
        f(&mut self.state.lock().unwrap());
    }
}

pub fn conversation(id: &str, title: &str) -> Conversation {
    Conversation {
        conversation_id: id.to_string(),
        title: title.to_string(),
        last_message_time: None,
    }
}

#[async_trait]
impl ChatBackend for FakeBackend {
    async fn list_conversations(&self) -> Result<Vec<Conversation>> {
        let mut state = self.state.lock().unwrap();
        state.calls.list += 1;
        if state.fail_list {
            return Err(api_error());
        }
        Ok(state.conversations.clone())
    }

    async fn generate_chat_id(&self) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        state.calls.create += 1;
        if state.fail_create {
            return Err(api_error());
        }
        let n = state.calls.create;
        Ok(state
            .next_ids
            .pop_front()
            .unwrap_or_else(|| format!("generated-{}", n)))
    }

    async fn messages(&self, chat_id: &str) -> Result<Vec<Message>> {
        let mut state = self.state.lock().unwrap();
        state.calls.messages += 1;
        if state.fail_messages {
            return Err(api_error());
        }
        Ok(state.messages.get(chat_id).cloned().unwrap_or_default())
    }

    async fn delete_conversation(&self, chat_id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.delete += 1;
        if state.fail_delete {
            return Err(api_error());
        }
        state.conversations.retain(|c| c.conversation_id != chat_id);
        state.messages.remove(chat_id);
        Ok(())
    }

    async fn stream_answer(&self, chat_id: &str, question: &str) -> Result<AnswerStream> {
        let mut state = self.state.lock().unwrap();
        state.calls.stream += 1;
        if state.fail_stream {
            return Err(ClientError::Stream("connection refused".to_string()));
        }
        if !state.conversations.iter().any(|c| c.conversation_id == chat_id) {
            state.conversations.insert(0, conversation(chat_id, question));
        }

        let events = state.answers.pop_front().unwrap_or_default();
        let (tx, stream) = AnswerStream::channel(events.len().max(1));
        for event in events {
            tx.try_send(event).unwrap();
        }
        // Sender dropped here: the stream closes after the queued events.
        Ok(stream)
    }
}

pub fn fragment(text: &str) -> StreamEvent {
    StreamEvent::Fragment(text.to_string())
}
