//! Conversation CRUD over the in-memory store. Whole-record semantics only.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use hrychat_chat::Conversation;

use crate::error::ApiError;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/conversations",
            get(list_conversations).post(create_conversation),
        )
        .route(
            "/conversations/{id}",
            get(get_conversation)
                .put(replace_conversation)
                .delete(delete_conversation),
        )
}

async fn list_conversations(State(state): State<Arc<AppState>>) -> Json<Vec<Conversation>> {
    Json(state.conversations.list())
}

async fn get_conversation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Conversation>, ApiError> {
    Ok(Json(state.conversations.get(&id)?))
}

/// Upsert by the body's id.
async fn create_conversation(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Conversation>, JsonRejection>,
) -> Result<Json<Conversation>, ApiError> {
    let Json(conversation) = payload?;
    Ok(Json(state.conversations.upsert(conversation)))
}

async fn replace_conversation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<Conversation>, JsonRejection>,
) -> Result<Json<Conversation>, ApiError> {
    let Json(conversation) = payload?;
    Ok(Json(state.conversations.replace(&id, conversation)?))
}

async fn delete_conversation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.conversations.delete(&id)?;
    Ok(Json(serde_json::json!({ "message": "Conversation deleted" })))
}
