//! Public configuration route. Never exposes credentials.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use hrychat_core::PublicConfig;

use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/config", get(get_config))
}

async fn get_config(State(state): State<Arc<AppState>>) -> Json<PublicConfig> {
    Json(state.config.to_public())
}
