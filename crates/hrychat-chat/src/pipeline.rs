//! Streaming response pipeline.
//!
//! Pulls fragments from a provider one at a time, forwards each as a chunk
//! immediately, and finishes with a terminal chunk carrying the message id
//! and any extracted citations. A provider failure ends the stream with an
//! error event and no terminal chunk.

use std::pin::Pin;
use std::sync::Arc;

use futures::Stream;
use hrychat_core::{AppConfig, Error, Result};
use tokio_stream::StreamExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::citations::CitationTable;
use crate::providers::{FragmentEvent, FragmentStream, Provider};
use crate::selector::select_provider;
use crate::types::{ChatChunk, ChatMessage, Citation, ErrorPayload, GenerationParams, Message};

/// One event of the client-facing stream.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Message(ChatChunk),
    Error(ErrorPayload),
}

impl StreamEvent {
    /// Event name on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            StreamEvent::Message(_) => "message",
            StreamEvent::Error(_) => "error",
        }
    }

    /// JSON payload on the wire.
    pub fn to_json(&self) -> serde_json::Result<String> {
        match self {
            StreamEvent::Message(chunk) => serde_json::to_string(chunk),
            StreamEvent::Error(payload) => serde_json::to_string(payload),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Message(chunk) if chunk.done)
    }
}

pub type EventStream = Pin<Box<dyn Stream<Item = StreamEvent> + Send>>;

/// Accumulates fragments and frames them as chunks.
#[derive(Debug, Clone, Default)]
pub struct StreamAccumulator {
    /// Reference table for the terminal chunk; `None` disables extraction.
    citations: Option<Arc<CitationTable>>,
}

impl StreamAccumulator {
    pub fn new(citations: Option<Arc<CitationTable>>) -> Self {
        Self { citations }
    }

    /// Frame `fragments` as chunk events.
    ///
    /// Fragments are pulled strictly one at a time with no read-ahead.
    /// Dropping the returned stream stops pulling and drops the provider
    /// stream, which aborts any in-flight remote call.
    pub fn run(&self, message_id: String, mut fragments: FragmentStream) -> EventStream {
        let citations = self.citations.clone();

        Box::pin(async_stream::stream! {
            let mut guard = CompletionGuard::new(&message_id);
            let mut buffer = String::new();
            let mut count = 0usize;

            loop {
                match fragments.next().await {
                    Some(FragmentEvent::Text(text)) => {
                        buffer.push_str(&text);
                        count += 1;
                        yield StreamEvent::Message(ChatChunk::fragment(text));
                    }
                    Some(FragmentEvent::Done) | None => break,
                    Some(FragmentEvent::Error(e)) => {
                        warn!("Stream {} failed after {} fragments: {}", message_id, count, e);
                        guard.finished = true;
                        yield StreamEvent::from(e);
                        return;
                    }
                }
            }

            let citations = citations.map(|table| table.extract(&buffer));
            info!(
                "Stream {} complete: {} fragments, {} citations",
                message_id,
                count,
                citations.as_ref().map_or(0, Vec::len)
            );
            guard.finished = true;
            yield StreamEvent::Message(ChatChunk::terminal(message_id.clone(), citations));
        })
    }

    /// Drain `fragments` without incremental emission.
    pub async fn collect(
        &self,
        mut fragments: FragmentStream,
    ) -> Result<(String, Option<Vec<Citation>>)> {
        let mut buffer = String::new();
        while let Some(event) = fragments.next().await {
            match event {
                FragmentEvent::Text(text) => buffer.push_str(&text),
                FragmentEvent::Done => break,
                FragmentEvent::Error(e) => return Err(e),
            }
        }
        let citations = self.citations.as_ref().map(|table| table.extract(&buffer));
        Ok((buffer, citations))
    }
}

/// Logs streams dropped before reaching a terminal or error event.
struct CompletionGuard {
    message_id: String,
    finished: bool,
}

impl CompletionGuard {
    fn new(message_id: &str) -> Self {
        Self {
            message_id: message_id.to_string(),
            finished: false,
        }
    }
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        if !self.finished {
            debug!("Stream {} dropped before completion", self.message_id);
        }
    }
}

/// Provider plus accumulator: one full response cycle per request.
#[derive(Debug)]
pub struct ChatPipeline {
    provider: Provider,
    accumulator: StreamAccumulator,
}

impl ChatPipeline {
    pub fn new(provider: Provider, citations: Option<Arc<CitationTable>>) -> Self {
        Self {
            provider,
            accumulator: StreamAccumulator::new(citations),
        }
    }

    /// Select the provider from configuration. Citations are extracted only
    /// in mock mode, where the marker syntax is a property of the canned data.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let provider = select_provider(config)?;
        let citations = config.mock_mode.then(CitationTable::builtin);
        Ok(Self::new(provider, citations))
    }

    pub fn provider(&self) -> &Provider {
        &self.provider
    }

    /// Stream one response as chunk events.
    pub fn run(&self, history: Vec<ChatMessage>, params: GenerationParams) -> EventStream {
        let message_id = Uuid::new_v4().to_string();
        debug!("Starting stream {} with {} history messages", message_id, history.len());
        let fragments = self.provider.stream(history, params);
        self.accumulator.run(message_id, fragments)
    }

    /// Produce one complete assistant message.
    pub async fn complete(&self, history: Vec<ChatMessage>, params: GenerationParams) -> Result<Message> {
        let message_id = Uuid::new_v4().to_string();
        let fragments = self.provider.stream(history, params);
        let (content, citations) = self.accumulator.collect(fragments).await.map_err(|e| {
            warn!("Completion {} failed: {}", message_id, e);
            e
        })?;
        Ok(Message::assistant(message_id, content, citations))
    }
}

impl From<Error> for StreamEvent {
    fn from(e: Error) -> Self {
        StreamEvent::Error(ErrorPayload { error: e.to_string() })
    }
}
