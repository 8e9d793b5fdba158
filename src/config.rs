//! Configuration file parser for ~/.config/onta/config.toml.
//!
//! The config file is optional: a missing file yields `Config::default()`.
//! Unknown keys are accepted and logged as a warning, since they are usually
//! typos.
use secrecy::SecretString;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Environment variable that overrides `api_token` from the file.
pub const TOKEN_ENV_VAR: &str = "ONTA_API_TOKEN";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Configuration Struct
// ============================================================================

/// Client configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
/// The custom `Debug` impl masks `api_token`.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend root, e.g. `http://192.168.1.20:3000`.
    pub base_url: String,

    /// Id of the signed-in user. Required by the home and date screens.
    pub user_id: Option<String>,

    /// Upper bound for a single request, in seconds.
    pub request_timeout_secs: u64,

    /// Bearer token sent with title and priority updates.
    /// `ONTA_API_TOKEN` takes precedence.
    pub api_token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            user_id: None,
            request_timeout_secs: 15,
            api_token: None,
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("base_url", &self.base_url)
            .field("user_id", &self.user_id)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Config {
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 4] =
        ["base_url", "user_id", "request_timeout_secs", "api_token"];

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)`
    /// - Unknown keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        Self::parse(&content)
    }

    /// Parse TOML text. Blank text yields the defaults.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(content)?;
        tracing::info!(base_url = %config.base_url, "Loaded configuration");
        Ok(config)
    }

    /// Token from the environment, falling back to the file.
    pub fn api_token(&self) -> Option<SecretString> {
        self.api_token_with_env(std::env::var(TOKEN_ENV_VAR).ok())
    }

    fn api_token_with_env(&self, env_token: Option<String>) -> Option<SecretString> {
        env_token
            .filter(|t| !t.trim().is_empty())
            .or_else(|| self.api_token.clone())
            .map(SecretString::from)
    }

    /// User id with blank values treated as missing.
    pub fn user_id(&self) -> Option<&str> {
        self.user_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.base_url, "http://localhost:3000");
        assert!(config.user_id.is_none());
        assert_eq!(config.request_timeout_secs, 15);
        assert!(config.api_token.is_none());
    }

    #[test]
    fn test_missing_file_returns_default() {
        let path = Path::new("/tmp/onta_test_nonexistent_config.toml");
        let config = Config::load(path).unwrap();
        assert_eq!(config.base_url, "http://localhost:3000");
    }

    #[test]
    fn test_whitespace_only_returns_default() {
        let config = Config::parse("   \n  \n  ").unwrap();
        assert_eq!(config.request_timeout_secs, 15);
    }

    #[test]
    fn test_partial_config_uses_defaults_for_missing() {
        let config = Config::parse("user_id = \"42\"\n").unwrap();
        assert_eq!(config.user_id(), Some("42"));
        assert_eq!(config.base_url, "http://localhost:3000");
    }

    #[test]
    fn test_full_config_from_file() {
        let dir = std::env::temp_dir().join("onta_config_test_full");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        let content = r#"
base_url = "http://192.168.1.20:3000"
user_id = "7"
request_timeout_secs = 30
api_token = "tok-123"
"#;
        std::fs::write(&path, content).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.base_url, "http://192.168.1.20:3000");
        assert_eq!(config.user_id(), Some("7"));
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.api_token.as_deref(), Some("tok-123"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let err = Config::parse("this is not [valid toml").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("Invalid TOML"));
    }

    #[test]
    fn test_wrong_type_returns_error() {
        assert!(Config::parse("request_timeout_secs = \"soon\"\n").is_err());
    }

    #[test]
    fn test_unknown_keys_accepted() {
        let config = Config::parse("user_id = \"1\"\ntheme = \"dark\"\n").unwrap();
        assert_eq!(config.user_id(), Some("1"));
    }

    #[test]
    fn test_too_large_file_rejected() {
        let dir = std::env::temp_dir().join("onta_config_test_too_large");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "a".repeat(1_048_577)).unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::TooLarge(_)));
        assert!(err.to_string().contains("too large"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_blank_user_id_is_missing() {
        let config = Config::parse("user_id = \"  \"\n").unwrap();
        assert_eq!(config.user_id(), None);
    }

    #[test]
    fn test_zero_timeout_clamped() {
        let config = Config::parse("request_timeout_secs = 0\n").unwrap();
        assert_eq!(config.request_timeout(), Duration::from_secs(1));
    }

    #[test]
    fn test_env_token_takes_precedence() {
        let mut config = Config::default();
        config.api_token = Some("from-file".to_string());

        let token = config.api_token_with_env(Some("from-env".to_string()));
        assert_eq!(token.unwrap().expose_secret(), "from-env");

        let token = config.api_token_with_env(Some("  ".to_string()));
        assert_eq!(token.unwrap().expose_secret(), "from-file");

        assert!(Config::default().api_token_with_env(None).is_none());
    }

    #[test]
    fn test_debug_masks_api_token() {
        let mut config = Config::default();
        config.api_token = Some("super-secret-token".to_string());

        let debug_output = format!("{:?}", config);
        assert!(!debug_output.contains("super-secret-token"));
        assert!(debug_output.contains("[REDACTED]"));
    }
}
