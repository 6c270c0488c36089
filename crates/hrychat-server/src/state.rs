//! Shared application state.

use hrychat_chat::{ChatPipeline, ConversationStore};
use hrychat_core::{AppConfig, Result};

/// Shared application state accessible from all route handlers.
///
/// Built once at startup and torn down when the server exits.
pub struct AppState {
    pub config: AppConfig,
    pub pipeline: ChatPipeline,
    pub conversations: ConversationStore,
}

impl AppState {
    /// Select the provider from `config`. Fails on configuration errors.
    pub fn new(config: AppConfig) -> Result<Self> {
        let pipeline = ChatPipeline::from_config(&config)?;
        Ok(Self::with_pipeline(config, pipeline))
    }

    /// Use an explicitly constructed pipeline.
    pub fn with_pipeline(config: AppConfig, pipeline: ChatPipeline) -> Self {
        Self {
            config,
            pipeline,
            conversations: ConversationStore::new(),
        }
    }
}
