//! HRY Chat Core — error type, environment configuration, provider kinds.

pub mod config;
pub mod error;

pub use config::{AppConfig, ProviderKind, PublicConfig};
pub use error::{Error, Result};
