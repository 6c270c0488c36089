//! Provider selection from process configuration.

use std::time::Duration;

use hrychat_core::{AppConfig, Error, ProviderKind, Result};
use reqwest::Client;
use tracing::{info, warn};

use crate::mock::MockProvider;
use crate::providers::{
    AnthropicProvider, OpenAICompatProvider, Provider, RemoteEndpoint, ANTHROPIC_BASE_URL,
    GROQ_BASE_URL, OPENAI_BASE_URL,
};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Resolve configuration to a concrete provider.
///
/// Mock mode always wins. Otherwise the provider name picks a network
/// variant, and unrecognized names fall back to the mock provider.
/// A network variant without an API key is a configuration error.
pub fn select_provider(config: &AppConfig) -> Result<Provider> {
    if config.mock_mode {
        info!("Mock mode enabled, using canned responses");
        return Ok(Provider::Mock(MockProvider::new()));
    }

    let provider = match config.provider_kind() {
        Some(kind @ (ProviderKind::OpenAI | ProviderKind::Groq)) => Provider::OpenAICompat(
            OpenAICompatProvider::new(kind, build_client()?, remote_endpoint(config, kind)?),
        ),
        Some(ProviderKind::Anthropic) => Provider::Anthropic(AnthropicProvider::new(
            build_client()?,
            remote_endpoint(config, ProviderKind::Anthropic)?,
        )),
        Some(ProviderKind::Mock) => Provider::Mock(MockProvider::new()),
        None => {
            warn!(
                "Unknown provider {:?}, falling back to mock provider",
                config.provider
            );
            Provider::Mock(MockProvider::new())
        }
    };

    info!("Selected provider {} (model {})", provider.kind(), config.model);
    Ok(provider)
}

/// Default API root for a network provider kind.
pub fn default_base_url(kind: ProviderKind) -> &'static str {
    match kind {
        ProviderKind::Groq => GROQ_BASE_URL,
        ProviderKind::Anthropic => ANTHROPIC_BASE_URL,
        ProviderKind::OpenAI | ProviderKind::Mock => OPENAI_BASE_URL,
    }
}

fn remote_endpoint(config: &AppConfig, kind: ProviderKind) -> Result<RemoteEndpoint> {
    if config.api_key.trim().is_empty() {
        return Err(Error::Config(format!(
            "LLM_API_KEY is required for provider {}",
            kind
        )));
    }
    Ok(RemoteEndpoint {
        base_url: config
            .base_url
            .clone()
            .unwrap_or_else(|| default_base_url(kind).to_string()),
        model: config.model.clone(),
        api_key: config.api_key.clone(),
    })
}

fn build_client() -> Result<Client> {
    Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))
}
