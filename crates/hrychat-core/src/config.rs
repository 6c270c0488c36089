//! Environment configuration with `.env` key-value overrides.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

pub const DEFAULT_APP_NAME: &str = "HRY Chat";
pub const DEFAULT_PROVIDER: &str = "openai";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_CORS_ORIGINS: &[&str] = &["http://localhost:3000", "http://127.0.0.1:3000"];

/// Environment variable naming the key-value override file.
pub const ENV_FILE_VAR: &str = "HRYCHAT_ENV_FILE";
const DEFAULT_ENV_FILE: &str = ".env";

/// Content provider identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAI,
    Groq,
    Anthropic,
    Mock,
}

impl ProviderKind {
    /// Parse a configured provider name. Unknown names yield `None`.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "openai" => Some(Self::OpenAI),
            "groq" => Some(Self::Groq),
            "anthropic" => Some(Self::Anthropic),
            "mock" => Some(Self::Mock),
            _ => None,
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::OpenAI => write!(f, "openai"),
            ProviderKind::Groq => write!(f, "groq"),
            ProviderKind::Anthropic => write!(f, "anthropic"),
            ProviderKind::Mock => write!(f, "mock"),
        }
    }
}

/// Process-wide configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub app_name: String,
    pub debug: bool,
    /// Provider name as configured (may be unrecognized).
    pub provider: String,
    pub api_key: String,
    /// Remote endpoint root; `None` uses the provider's default.
    pub base_url: Option<String>,
    pub model: String,
    pub mock_mode: bool,
    pub cors_origins: Vec<String>,
    pub host: String,
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_name: DEFAULT_APP_NAME.into(),
            debug: false,
            provider: DEFAULT_PROVIDER.into(),
            api_key: String::new(),
            base_url: None,
            model: DEFAULT_MODEL.into(),
            mock_mode: true,
            cors_origins: DEFAULT_CORS_ORIGINS.iter().map(|s| s.to_string()).collect(),
            host: DEFAULT_HOST.into(),
            port: DEFAULT_PORT,
        }
    }
}

/// Configuration safe to expose to clients (no credentials).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublicConfig {
    pub provider: String,
    pub model: String,
    pub mock_mode: bool,
    pub app_name: String,
}

impl AppConfig {
    /// Build configuration from a key-value map. Missing keys take defaults.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self> {
        let defaults = Self::default();
        let get = |key: &str| vars.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());

        let debug = match get("DEBUG") {
            Some(v) => parse_bool("DEBUG", v)?,
            None => defaults.debug,
        };
        let mock_mode = match get("MOCK_MODE") {
            Some(v) => parse_bool("MOCK_MODE", v)?,
            None => defaults.mock_mode,
        };
        let port = match get("PORT") {
            Some(v) => v
                .parse::<u16>()
                .map_err(|_| Error::Config(format!("PORT must be a port number, got {:?}", v)))?,
            None => defaults.port,
        };
        let cors_origins = match get("CORS_ORIGINS") {
            Some(v) => parse_list("CORS_ORIGINS", v)?,
            None => defaults.cors_origins,
        };

        Ok(Self {
            app_name: get("APP_NAME").map(String::from).unwrap_or(defaults.app_name),
            debug,
            provider: get("LLM_PROVIDER").map(String::from).unwrap_or(defaults.provider),
            api_key: get("LLM_API_KEY").map(String::from).unwrap_or_default(),
            base_url: get("LLM_BASE_URL").map(|s| s.trim_end_matches('/').to_string()),
            model: get("LLM_MODEL").map(String::from).unwrap_or(defaults.model),
            mock_mode,
            cors_origins,
            host: get("HOST").map(String::from).unwrap_or(defaults.host),
            port,
        })
    }

    /// Load from the optional `.env` file, then the process environment.
    ///
    /// Process environment variables win over file entries.
    pub fn load() -> Result<Self> {
        let env_file = std::env::var(ENV_FILE_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_ENV_FILE));

        let mut vars = load_env_file(&env_file)?;
        vars.extend(std::env::vars());

        Self::from_vars(&vars)
    }

    /// Recognized provider kind, if the configured name is known.
    pub fn provider_kind(&self) -> Option<ProviderKind> {
        ProviderKind::parse(&self.provider)
    }

    pub fn to_public(&self) -> PublicConfig {
        PublicConfig {
            provider: self.provider.clone(),
            model: self.model.clone(),
            mock_mode: self.mock_mode,
            app_name: self.app_name.clone(),
        }
    }

    /// Socket address string for the listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Read a `KEY=VALUE` file. A missing file yields an empty map.
pub fn load_env_file(path: &Path) -> Result<HashMap<String, String>> {
    match std::fs::read_to_string(path) {
        Ok(contents) => {
            debug!("Reading overrides from {}", path.display());
            Ok(parse_env_file(&contents))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
        Err(e) => Err(e.into()),
    }
}

/// Parse `.env` contents: `#` comments, optional `export ` prefix, optional quotes.
pub fn parse_env_file(contents: &str) -> HashMap<String, String> {
    let mut vars = HashMap::new();
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        vars.insert(key.to_string(), unquote(value.trim()).to_string());
    }
    vars
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(Error::Config(format!(
            "{} must be a boolean, got {:?}",
            key, value
        ))),
    }
}

/// Accept either a JSON array of strings or a comma-separated list.
fn parse_list(key: &str, value: &str) -> Result<Vec<String>> {
    if value.starts_with('[') {
        return serde_json::from_str::<Vec<String>>(value)
            .map_err(|e| Error::Config(format!("{} is not a JSON string array: {}", key, e)));
    }
    Ok(value
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_vars(&HashMap::new()).unwrap();
        assert_eq!(config.app_name, "HRY Chat");
        assert_eq!(config.provider, "openai");
        assert_eq!(config.model, "gpt-4o-mini");
        assert!(config.mock_mode);
        assert!(config.api_key.is_empty());
        assert!(config.base_url.is_none());
        assert_eq!(config.port, 8000);
        assert_eq!(config.cors_origins.len(), 2);
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_vars(&vars(&[
            ("LLM_PROVIDER", "anthropic"),
            ("LLM_API_KEY", "sk-test"),
            ("LLM_BASE_URL", "https://proxy.local/v1/"),
            ("MOCK_MODE", "off"),
            ("PORT", "9001"),
            ("CORS_ORIGINS", "https://a.example, https://b.example"),
        ]))
        .unwrap();
        assert_eq!(config.provider_kind(), Some(ProviderKind::Anthropic));
        assert_eq!(config.api_key, "sk-test");
        assert_eq!(config.base_url.as_deref(), Some("https://proxy.local/v1"));
        assert!(!config.mock_mode);
        assert_eq!(config.port, 9001);
        assert_eq!(
            config.cors_origins,
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
    }

    #[test]
    fn test_cors_json_array() {
        let config =
            AppConfig::from_vars(&vars(&[("CORS_ORIGINS", r#"["http://x:1","http://y:2"]"#)]))
                .unwrap();
        assert_eq!(config.cors_origins, vec!["http://x:1", "http://y:2"]);
    }

    #[test]
    fn test_bad_bool_is_config_error() {
        let err = AppConfig::from_vars(&vars(&[("MOCK_MODE", "maybe")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_bad_port_is_config_error() {
        let err = AppConfig::from_vars(&vars(&[("PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_unknown_provider_kind() {
        let config = AppConfig::from_vars(&vars(&[("LLM_PROVIDER", "azure")])).unwrap();
        assert_eq!(config.provider, "azure");
        assert_eq!(config.provider_kind(), None);
    }

    #[test]
    fn test_public_config_hides_key() {
        let config = AppConfig::from_vars(&vars(&[("LLM_API_KEY", "sk-secret")])).unwrap();
        let json = serde_json::to_string(&config.to_public()).unwrap();
        assert!(!json.contains("sk-secret"));
        assert!(json.contains("\"mock_mode\":true"));
        assert!(json.contains("\"app_name\":\"HRY Chat\""));
    }

    #[test]
    fn test_parse_env_file() {
        let parsed = parse_env_file(
            "# comment\n\nAPP_NAME=\"Quoted Name\"\nexport LLM_MODEL='gpt-4o'\nMOCK_MODE = false\ngarbage line\n",
        );
        assert_eq!(parsed.get("APP_NAME").map(String::as_str), Some("Quoted Name"));
        assert_eq!(parsed.get("LLM_MODEL").map(String::as_str), Some("gpt-4o"));
        assert_eq!(parsed.get("MOCK_MODE").map(String::as_str), Some("false"));
        assert_eq!(parsed.len(), 3);
    }

    #[test]
    fn test_load_env_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "LLM_PROVIDER=groq\nMOCK_MODE=0\n").unwrap();

        let vars = load_env_file(&path).unwrap();
        let config = AppConfig::from_vars(&vars).unwrap();
        assert_eq!(config.provider_kind(), Some(ProviderKind::Groq));
        assert!(!config.mock_mode);

        let missing = load_env_file(&dir.path().join("absent.env")).unwrap();
        assert!(missing.is_empty());
    }
}
