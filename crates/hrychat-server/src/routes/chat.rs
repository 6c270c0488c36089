//! Chat routes: SSE streaming and one-shot completion.

use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, KeepAliveStream, Sse};
use axum::routing::post;
use axum::{Json, Router};
use futures::Stream;
use hrychat_chat::{ChatRequest, Message, StreamEvent};
use tokio_stream::StreamExt;
use tracing::{debug, error};

use crate::error::ApiError;
use crate::state::AppState;

type SseStream = Pin<Box<dyn Stream<Item = Result<Event, Infallible>> + Send>>;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/chat", post(stream_chat))
        .route("/chat/complete", post(complete_chat))
}

// ---------------------------------------------------------------
// Streaming chat (SSE)
// ---------------------------------------------------------------

/// Stream `message` events carrying chunks, ending with a `done` chunk, or
/// an `error` event on provider failure. Dropping the connection drops the
/// stream, which stops the provider.
async fn stream_chat(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Sse<KeepAliveStream<SseStream>>, ApiError> {
    let Json(req) = payload?;
    req.validate()?;
    debug!(
        "Chat stream request: {} messages, conversation {:?}",
        req.messages.len(),
        req.conversation_id
    );

    let events = state.pipeline.run(req.history(), req.params());
    let sse_stream: SseStream = Box::pin(events.map(|event| Ok(to_sse_event(&event))));

    Ok(Sse::new(sse_stream).keep_alive(KeepAlive::default()))
}

fn to_sse_event(event: &StreamEvent) -> Event {
    let data = event.to_json().unwrap_or_else(|e| {
        error!("Failed to encode stream event: {}", e);
        serde_json::json!({ "error": "encoding failure" }).to_string()
    });
    Event::default().event(event.name()).data(data)
}

// ---------------------------------------------------------------
// Non-streaming chat
// ---------------------------------------------------------------

async fn complete_chat(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<Message>, ApiError> {
    let Json(req) = payload?;
    req.validate()?;
    let message = state.pipeline.complete(req.history(), req.params()).await?;
    Ok(Json(message))
}
