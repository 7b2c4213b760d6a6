//! Remote conversation store.
//!
//! [`ChatBackend`] is the seam between the controller and the network; the
//! HTTP implementation talks to the chat REST endpoints and consumes the
//! server-sent answer stream.

use crate::config::Config;
use crate::error::{ClientError, Result};
use crate::events::{Conversation, Message};
use crate::streaming::{AnswerStream, SseDecoder, StreamEvent};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::ACCEPT;
use tokio::sync::mpsc;
use tokio::time::Duration;
use url::Url;

/// Operations the client needs from the remote store
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// All conversations, in the order the backend lists them
    async fn list_conversations(&self) -> Result<Vec<Conversation>>;

    /// A fresh conversation id
    async fn generate_chat_id(&self) -> Result<String>;

    /// History of one conversation, oldest first
    async fn messages(&self, chat_id: &str) -> Result<Vec<Message>>;

    /// Delete a conversation with its messages
    async fn delete_conversation(&self, chat_id: &str) -> Result<()>;

    /// Ask a question and stream the answer
    async fn stream_answer(&self, chat_id: &str, question: &str) -> Result<AnswerStream>;
}

/// HTTP implementation of [`ChatBackend`]
#[derive(Debug, Clone)]
pub struct HttpBackend {
    base_url: Url,
    client: reqwest::Client,
    stream_client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(config: &Config) -> Result<Self> {
        let base_url = Url::parse(&config.api_base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::BaseUrl(config.api_base_url.clone()));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        // Answers can take arbitrarily long; only bound the connect phase.
        let stream_client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            base_url,
            client,
            stream_client,
        })
    }

    /// Append path segments to the base URL, percent-encoding each one
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ClientError::BaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn stream_url(&self, chat_id: &str, question: &str) -> Result<Url> {
        let mut url = self.endpoint(&["stream"])?;
        url.query_pairs_mut()
            .append_pair("chatId", chat_id)
            .append_pair("question", question);
        Ok(url)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let message = response.text().await.unwrap_or_default();
            Err(ClientError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }

    /// Drive one SSE response body into the channel
    async fn pump_events(response: reqwest::Response, tx: mpsc::Sender<StreamEvent>) {
        let mut body = response.bytes_stream();
        let mut decoder = SseDecoder::new();

        while let Some(chunk) = body.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(err) => {
                    tracing::warn!(error = %err, "answer stream transport error");
                    let _ = tx.send(StreamEvent::Failed(err.to_string())).await;
                    return;
                }
            };

            for event in decoder.push(&chunk) {
                if let Some(event) = event.into_stream_event() {
                    let terminal = !matches!(event, StreamEvent::Fragment(_));
                    if tx.send(event).await.is_err() {
                        tracing::debug!("answer stream receiver dropped");
                        return;
                    }
                    if terminal {
                        return;
                    }
                }
            }
        }

        if let Some(event) = decoder.finish().and_then(|e| e.into_stream_event()) {
            let _ = tx.send(event).await;
        }
        // Dropping the sender closes the stream without an explicit marker.
    }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    async fn list_conversations(&self) -> Result<Vec<Conversation>> {
        let url = self.endpoint(&["conversations"])?;
        tracing::debug!(%url, "listing conversations");
        let response = Self::check(self.client.get(url).send().await?).await?;
        Ok(response.json().await?)
    }

    async fn generate_chat_id(&self) -> Result<String> {
        let url = self.endpoint(&["generate-chat-id"])?;
        let response = Self::check(self.client.get(url).send().await?).await?;
        let id = response.text().await?.trim().to_string();
        if id.is_empty() {
            return Err(ClientError::Api {
                status: 200,
                message: "empty conversation id".to_string(),
            });
        }
        Ok(id)
    }

    async fn messages(&self, chat_id: &str) -> Result<Vec<Message>> {
        let url = self.endpoint(&[chat_id, "messages"])?;
        let response = Self::check(self.client.get(url).send().await?).await?;
        Ok(response.json().await?)
    }

    async fn delete_conversation(&self, chat_id: &str) -> Result<()> {
        let url = self.endpoint(&[chat_id, "messages"])?;
        Self::check(self.client.delete(url).send().await?).await?;
        Ok(())
    }

    async fn stream_answer(&self, chat_id: &str, question: &str) -> Result<AnswerStream> {
        let url = self.stream_url(chat_id, question)?;
        tracing::info!(chat_id, "opening answer stream");

        let response = self
            .stream_client
            .get(url)
            .header(ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|err| ClientError::Stream(err.to_string()))?;
        let response = Self::check(response).await?;

        let (tx, stream) = AnswerStream::channel(1000);
        tokio::spawn(Self::pump_events(response, tx));
        Ok(stream)
    }
}
