//! Content providers: the mock generator and network-backed LLM streams.
//!
//! Each provider turns a role/content history into a finite, non-restartable
//! stream of text fragments. Network providers read SSE from their APIs:
//! OpenAI and Groq share one format, Anthropic uses its own.

use std::pin::Pin;

use futures::Stream;
use hrychat_core::{Error, ProviderKind};
use reqwest::{Client, RequestBuilder, Response};
use serde_json::json;
use tokio_stream::StreamExt;
use tracing::{debug, warn};

use crate::mock::MockProvider;
use crate::sse::SseLineBuffer;
use crate::types::{ChatMessage, GenerationParams, Role};

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1";
pub const ANTHROPIC_VERSION: &str = "2023-06-01";
/// Anthropic requires `max_tokens`; used when the request leaves it unset.
pub const ANTHROPIC_DEFAULT_MAX_TOKENS: u32 = 4096;

/// One pulled item: a fragment, end of sequence, or a failure.
#[derive(Debug)]
pub enum FragmentEvent {
    Text(String),
    Done,
    Error(Error),
}

/// Boxed stream type for returning different provider implementations.
pub type FragmentStream = Pin<Box<dyn Stream<Item = FragmentEvent> + Send>>;

/// Closed set of content providers.
#[derive(Debug)]
pub enum Provider {
    Mock(MockProvider),
    OpenAICompat(OpenAICompatProvider),
    Anthropic(AnthropicProvider),
}

impl Provider {
    /// Stream fragments for `history`. Nothing is requested until first poll
    /// for network providers; dropping the stream aborts any in-flight call.
    pub fn stream(&self, history: Vec<ChatMessage>, params: GenerationParams) -> FragmentStream {
        match self {
            Provider::Mock(p) => p.stream(),
            Provider::OpenAICompat(p) => Box::pin(p.stream(history, params)),
            Provider::Anthropic(p) => Box::pin(p.stream(history, params)),
        }
    }

    pub fn kind(&self) -> ProviderKind {
        match self {
            Provider::Mock(_) => ProviderKind::Mock,
            Provider::OpenAICompat(p) => p.kind,
            Provider::Anthropic(_) => ProviderKind::Anthropic,
        }
    }

    pub fn is_mock(&self) -> bool {
        matches!(self, Provider::Mock(_))
    }
}

/// Shared connection settings for a network provider.
#[derive(Clone)]
pub struct RemoteEndpoint {
    pub base_url: String,
    pub model: String,
    pub api_key: String,
}

impl std::fmt::Debug for RemoteEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteEndpoint")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &"[redacted]")
            .finish()
    }
}

/// Send a streaming request. Transport failures and non-2xx statuses are
/// provider errors; the latter carry the status and response body.
async fn open_stream(request: RequestBuilder) -> Result<Response, Error> {
    let response = request
        .send()
        .await
        .map_err(|e| Error::Provider(format!("Request failed: {}", e)))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(Error::Provider(format!("API error {}: {}", status, body)));
    }
    Ok(response)
}

/// Decode an upstream SSE body into fragment events using `parse` for each
/// `data:` payload, including a final line with no trailing newline.
///
/// Ends after `Done` or the first error. A body that closes without a
/// terminator ends with `Done`.
fn read_event_stream(
    response: Response,
    parse: fn(&str) -> Option<FragmentEvent>,
) -> FragmentStream {
    Box::pin(async_stream::stream! {
        let mut body = response.bytes_stream();
        let mut lines = SseLineBuffer::new();

        loop {
            let (payloads, finished) = match body.next().await {
                Some(Ok(bytes)) => (lines.push(&bytes), false),
                Some(Err(e)) => {
                    yield FragmentEvent::Error(Error::Provider(format!("Stream read error: {}", e)));
                    return;
                }
                None => (lines.finish().into_iter().collect::<Vec<_>>(), true),
            };

            for data in payloads {
                match parse(&data) {
                    Some(FragmentEvent::Done) => {
                        yield FragmentEvent::Done;
                        return;
                    }
                    Some(FragmentEvent::Error(e)) => {
                        warn!("Upstream stream error: {}", e);
                        yield FragmentEvent::Error(e);
                        return;
                    }
                    Some(event) => {
                        yield event;
                    }
                    None => {}
                }
            }

            if finished {
                yield FragmentEvent::Done;
                return;
            }
        }
    })
}

/// OpenAI-compatible chat completions (OpenAI, Groq).
#[derive(Debug, Clone)]
pub struct OpenAICompatProvider {
    kind: ProviderKind,
    client: Client,
    endpoint: RemoteEndpoint,
}

impl OpenAICompatProvider {
    pub fn new(kind: ProviderKind, client: Client, endpoint: RemoteEndpoint) -> Self {
        Self {
            kind,
            client,
            endpoint,
        }
    }

    pub fn endpoint(&self) -> &RemoteEndpoint {
        &self.endpoint
    }

    fn stream(
        &self,
        history: Vec<ChatMessage>,
        params: GenerationParams,
    ) -> impl Stream<Item = FragmentEvent> + Send + 'static {
        let client = self.client.clone();
        let url = format!("{}/chat/completions", self.endpoint.base_url);
        let model = self.endpoint.model.clone();
        let api_key = self.endpoint.api_key.clone();

        let msgs: Vec<serde_json::Value> = history
            .iter()
            .map(|m| json!({"role": m.role, "content": m.content}))
            .collect();

        async_stream::stream! {
            let mut body = json!({
                "model": model,
                "messages": msgs,
                "temperature": params.temperature,
                "stream": true,
            });
            if let Some(max_tokens) = params.max_tokens {
                body["max_tokens"] = json!(max_tokens);
            }

            debug!("Streaming from {} with model {}", url, model);

            let request = client.post(&url).bearer_auth(&api_key).json(&body);
            let response = match open_stream(request).await {
                Ok(r) => r,
                Err(e) => {
                    yield FragmentEvent::Error(e);
                    return;
                }
            };

            let mut events = read_event_stream(response, parse_openai_data);
            while let Some(event) = events.next().await {
                yield event;
            }
        }
    }
}

/// Interpret one OpenAI-format `data:` payload. Empty deltas yield `None`.
fn parse_openai_data(data: &str) -> Option<FragmentEvent> {
    if data.trim() == "[DONE]" {
        return Some(FragmentEvent::Done);
    }
    let parsed: serde_json::Value = serde_json::from_str(data).ok()?;
    if let Some(err) = parsed.get("error").filter(|e| !e.is_null()) {
        let msg = err["message"].as_str().unwrap_or("Unknown error");
        return Some(FragmentEvent::Error(Error::Provider(msg.to_string())));
    }
    parsed["choices"][0]["delta"]["content"]
        .as_str()
        .filter(|content| !content.is_empty())
        .map(|content| FragmentEvent::Text(content.to_string()))
}

/// Anthropic Messages API.
#[derive(Debug, Clone)]
pub struct AnthropicProvider {
    client: Client,
    endpoint: RemoteEndpoint,
}

impl AnthropicProvider {
    pub fn new(client: Client, endpoint: RemoteEndpoint) -> Self {
        Self { client, endpoint }
    }

    pub fn endpoint(&self) -> &RemoteEndpoint {
        &self.endpoint
    }

    fn stream(
        &self,
        history: Vec<ChatMessage>,
        params: GenerationParams,
    ) -> impl Stream<Item = FragmentEvent> + Send + 'static {
        let client = self.client.clone();
        let url = format!("{}/messages", self.endpoint.base_url);
        let model = self.endpoint.model.clone();
        let api_key = self.endpoint.api_key.clone();

        // System turns go in the top-level `system` field, joined in order
        let system_parts: Vec<&str> = history
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect();
        let system_msg = (!system_parts.is_empty()).then(|| system_parts.join("\n\n"));

        let conv_msgs: Vec<serde_json::Value> = history
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| json!({"role": m.role, "content": m.content}))
            .collect();

        async_stream::stream! {
            let mut body = json!({
                "model": model,
                "messages": conv_msgs,
                "temperature": params.temperature,
                "max_tokens": params.max_tokens.unwrap_or(ANTHROPIC_DEFAULT_MAX_TOKENS),
                "stream": true,
            });

            if let Some(sys) = system_msg {
                body["system"] = json!(sys);
            }

            debug!("Streaming from Anthropic with model {}", model);

            let request = client
                .post(&url)
                .header("x-api-key", &api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&body);
            let response = match open_stream(request).await {
                Ok(r) => r,
                Err(e) => {
                    yield FragmentEvent::Error(e);
                    return;
                }
            };

            let mut events = read_event_stream(response, parse_anthropic_data);
            while let Some(event) = events.next().await {
                yield event;
            }
        }
    }
}

/// Interpret one Anthropic `data:` payload.
fn parse_anthropic_data(data: &str) -> Option<FragmentEvent> {
    let parsed: serde_json::Value = serde_json::from_str(data).ok()?;
    match parsed["type"].as_str() {
        Some("content_block_delta") => parsed["delta"]["text"]
            .as_str()
            .filter(|text| !text.is_empty())
            .map(|text| FragmentEvent::Text(text.to_string())),
        Some("message_stop") => Some(FragmentEvent::Done),
        Some("error") => {
            let msg = parsed["error"]["message"]
                .as_str()
                .unwrap_or("Unknown error");
            Some(FragmentEvent::Error(Error::Provider(msg.to_string())))
        }
        _ => None,
    }
}
