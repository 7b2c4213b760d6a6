use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;

/// Events produced while an answer is streaming
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Next piece of answer text
    Fragment(String),
    /// The server marked the answer as complete
    Done,
    /// The transport failed or the server reported an error
    Failed(String),
}

/// How a finished answer stream settled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamOutcome {
    Completed(String),
    Failed(String),
}

/// Receiving half of one question/answer exchange.
///
/// Yields fragments in arrival order. The stream ends after a terminal
/// event, or when the producer goes away without sending one.
#[derive(Debug)]
pub struct AnswerStream {
    rx: mpsc::Receiver<StreamEvent>,
}

/// Result of a non-blocking poll on an [`AnswerStream`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Polled {
    Event(StreamEvent),
    Pending,
    Closed,
}

impl AnswerStream {
    pub fn new(rx: mpsc::Receiver<StreamEvent>) -> Self {
        Self { rx }
    }

    /// Create a connected sender/stream pair
    pub fn channel(capacity: usize) -> (mpsc::Sender<StreamEvent>, Self) {
        let (tx, rx) = mpsc::channel(capacity);
        (tx, Self::new(rx))
    }

    /// Take the next event without waiting
    pub fn try_next(&mut self) -> Polled {
        match self.rx.try_recv() {
            Ok(event) => Polled::Event(event),
            Err(TryRecvError::Empty) => Polled::Pending,
            Err(TryRecvError::Disconnected) => Polled::Closed,
        }
    }

    /// Wait for the next event; `None` once the producer is gone
    pub async fn next_event(&mut self) -> Option<StreamEvent> {
        self.rx.recv().await
    }
}

/// Accumulated state of the answer being streamed
#[derive(Debug, Clone, Default)]
pub struct StreamState {
    /// Full answer so far
    text_buffer: String,
    /// Whether any fragment carried text
    has_content: bool,
    outcome: Option<StreamOutcome>,
}

impl StreamState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one event. Returns the outcome once the stream has settled.
    pub fn apply(&mut self, event: StreamEvent) -> Option<&StreamOutcome> {
        if self.outcome.is_some() {
            return self.outcome.as_ref();
        }
        match event {
            StreamEvent::Fragment(delta) => {
                if !delta.is_empty() {
                    self.has_content = true;
                }
                self.text_buffer.push_str(&delta);
                None
            }
            // An explicit end marker settles the question of empty answers.
            StreamEvent::Done => {
                let text = self.text_buffer.clone();
                self.settle(StreamOutcome::Completed(text))
            }
            StreamEvent::Failed(reason) => {
                if self.has_content {
                    tracing::warn!(%reason, "answer stream broke off; keeping partial answer");
                    let text = self.text_buffer.clone();
                    self.settle(StreamOutcome::Completed(text))
                } else {
                    self.settle(StreamOutcome::Failed(reason))
                }
            }
        }
    }

    /// The channel closed without a terminal event
    pub fn close(&mut self) -> &StreamOutcome {
        let has_content = self.has_content;
        let text = &self.text_buffer;
        self.outcome.get_or_insert_with(|| {
            if has_content {
                StreamOutcome::Completed(text.clone())
            } else {
                StreamOutcome::Failed("stream closed without content".to_string())
            }
        })
    }

    fn settle(&mut self, outcome: StreamOutcome) -> Option<&StreamOutcome> {
        self.outcome = Some(outcome);
        self.outcome.as_ref()
    }

    pub fn text(&self) -> &str {
        &self.text_buffer
    }
}

/// One dispatched server-sent event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    pub event: Option<String>,
    pub data: String,
}

/// Incremental `text/event-stream` decoder.
///
/// Bytes are buffered until a whole line is available, so multi-byte
/// characters split across network chunks decode correctly.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of the body, returning every event it completed
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();

        while let Some(newline_pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=newline_pos).collect();
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim_end_matches(['\n', '\r']);
            if let Some(event) = self.process_line(line) {
                events.push(event);
            }
        }

        events
    }

    /// Flush a trailing line and any event left without a blank line
    pub fn finish(&mut self) -> Option<SseEvent> {
        if !self.buffer.is_empty() {
            let raw = std::mem::take(&mut self.buffer);
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim_end_matches('\r').to_string();
            if let Some(event) = self.process_line(&line) {
                return Some(event);
            }
        }
        self.dispatch()
    }

    fn process_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "data" => self.data.push(value.to_string()),
            "event" => self.event = Some(value.to_string()),
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }
        let data = std::mem::take(&mut self.data).join("\n");
        Some(SseEvent { event, data })
    }
}

#[derive(Deserialize)]
struct FragmentPayload {
    value: Option<String>,
}

impl SseEvent {
    /// Interpret the event as part of an answer stream.
    ///
    /// Unparseable fragment payloads are logged and skipped.
    pub fn into_stream_event(self) -> Option<StreamEvent> {
        match self.event.as_deref() {
            Some("done") => Some(StreamEvent::Done),
            Some("error") => Some(StreamEvent::Failed(self.data)),
            None | Some("message") => match serde_json::from_str::<FragmentPayload>(&self.data) {
                Ok(payload) => Some(StreamEvent::Fragment(payload.value.unwrap_or_default())),
                Err(err) => {
                    tracing::warn!(error = %err, data = %self.data, "skipping unparseable fragment");
                    None
                }
            },
            Some(other) => {
                tracing::debug!(event = other, "ignoring unknown stream event");
                None
            }
        }
    }
}
