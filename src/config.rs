//! Configuration module for sharedrop.

use serde::Deserialize;
use std::path::Path;

use crate::{Result, SharedropError};

/// Number of bytes in one mebibyte.
const MIB: u64 = 1024 * 1024;

/// Web API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    /// Host address to bind.
    #[serde(default = "default_web_host")]
    pub host: String,
    /// Port number for the API.
    #[serde(default = "default_web_port")]
    pub port: u16,
    /// CORS allowed origins.
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// JWT secret key (must be set).
    #[serde(default)]
    pub jwt_secret: String,
    /// Token lifetime in seconds.
    #[serde(default = "default_token_expiry")]
    pub token_expiry_secs: u64,
    /// Rate limit for login and register endpoints (requests per minute per IP).
    #[serde(default = "default_login_rate_limit")]
    pub login_rate_limit: u32,
    /// Trust `X-Forwarded-For` / `X-Real-IP` for client IPs (behind a reverse proxy only).
    #[serde(default)]
    pub trust_proxy_headers: bool,
}

fn default_web_host() -> String {
    "0.0.0.0".to_string()
}

fn default_web_port() -> u16 {
    3001
}

fn default_token_expiry() -> u64 {
    86_400 // 24 hours
}

fn default_login_rate_limit() -> u32 {
    10
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: default_web_host(),
            port: default_web_port(),
            cors_origins: vec![],
            jwt_secret: String::new(),
            token_expiry_secs: default_token_expiry(),
            login_rate_limit: default_login_rate_limit(),
            trust_proxy_headers: false,
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "data/sharedrop.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Blob storage and share id configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FilesConfig {
    /// Path to the blob storage directory.
    #[serde(default = "default_storage_path")]
    pub storage_path: String,
    /// Random bytes per share id (hex-encoded, so twice as many characters).
    #[serde(default = "default_share_id_bytes")]
    pub share_id_bytes: usize,
    /// Attempts at drawing an unused share id before the commit fails.
    #[serde(default = "default_share_id_attempts")]
    pub share_id_attempts: u32,
    /// Interval between orphan sweeps in seconds (0 disables the sweeper).
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
    /// Minimum age in seconds before an unreferenced blob may be reclaimed.
    #[serde(default = "default_orphan_grace")]
    pub orphan_grace_secs: u64,
}

fn default_storage_path() -> String {
    "data/uploads".to_string()
}

fn default_share_id_bytes() -> usize {
    4
}

fn default_share_id_attempts() -> u32 {
    8
}

fn default_sweep_interval() -> u64 {
    3600
}

fn default_orphan_grace() -> u64 {
    3600
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            storage_path: default_storage_path(),
            share_id_bytes: default_share_id_bytes(),
            share_id_attempts: default_share_id_attempts(),
            sweep_interval_secs: default_sweep_interval(),
            orphan_grace_secs: default_orphan_grace(),
        }
    }
}

/// Upload ceilings per tier.
#[derive(Debug, Clone, Deserialize)]
pub struct QuotaConfig {
    /// Free tier ceiling in MiB.
    #[serde(default = "default_free_limit")]
    pub free_limit_mb: u64,
    /// Pro tier ceiling in MiB.
    #[serde(default = "default_pro_limit")]
    pub pro_limit_mb: u64,
}

fn default_free_limit() -> u64 {
    500
}

fn default_pro_limit() -> u64 {
    5 * 1024
}

impl QuotaConfig {
    /// Free tier ceiling in bytes.
    pub fn free_limit_bytes(&self) -> u64 {
        self.free_limit_mb.saturating_mul(MIB)
    }

    /// Pro tier ceiling in bytes.
    pub fn pro_limit_bytes(&self) -> u64 {
        self.pro_limit_mb.saturating_mul(MIB)
    }
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            free_limit_mb: default_free_limit(),
            pro_limit_mb: default_pro_limit(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file. Empty means console only.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/sharedrop.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Web API configuration.
    #[serde(default)]
    pub web: WebConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Blob storage configuration.
    #[serde(default)]
    pub files: FilesConfig,
    /// Tier ceilings.
    #[serde(default)]
    pub quota: QuotaConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(SharedropError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| SharedropError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `SHAREDROP_JWT_SECRET`: Override the JWT secret key
    pub fn apply_env_overrides(&mut self) {
        if let Ok(jwt_secret) = std::env::var("SHAREDROP_JWT_SECRET") {
            if !jwt_secret.is_empty() {
                self.web.jwt_secret = jwt_secret;
            }
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.web.jwt_secret.is_empty() {
            return Err(SharedropError::Config(
                "jwt_secret is not set. \
                 Set it in config.toml or via SHAREDROP_JWT_SECRET environment variable."
                    .to_string(),
            ));
        }
        if self.web.token_expiry_secs == 0 {
            return Err(SharedropError::Config(
                "token_expiry_secs must be greater than zero".to_string(),
            ));
        }
        if self.quota.free_limit_mb == 0 || self.quota.pro_limit_mb == 0 {
            return Err(SharedropError::Config(
                "tier limits must be greater than zero".to_string(),
            ));
        }
        if self.quota.free_limit_mb > self.quota.pro_limit_mb {
            return Err(SharedropError::Config(
                "free_limit_mb must not exceed pro_limit_mb".to_string(),
            ));
        }
        if self.files.share_id_bytes < crate::file::MIN_SHARE_ID_BYTES {
            return Err(SharedropError::Config(format!(
                "share_id_bytes must be at least {}",
                crate::file::MIN_SHARE_ID_BYTES
            )));
        }
        if self.files.share_id_attempts == 0 {
            return Err(SharedropError::Config(
                "share_id_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.web.jwt_secret = "secret".to_string();
        config
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.web.host, "0.0.0.0");
        assert_eq!(config.web.port, 3001);
        assert!(config.web.cors_origins.is_empty());
        assert!(config.web.jwt_secret.is_empty());
        assert_eq!(config.web.token_expiry_secs, 86_400);
        assert!(!config.web.trust_proxy_headers);
        assert_eq!(config.database.path, "data/sharedrop.db");
        assert_eq!(config.files.storage_path, "data/uploads");
        assert_eq!(config.files.share_id_bytes, 4);
        assert_eq!(config.files.share_id_attempts, 8);
        assert_eq!(config.quota.free_limit_mb, 500);
        assert_eq!(config.quota.pro_limit_mb, 5120);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.file, "logs/sharedrop.log");
    }

    #[test]
    fn test_quota_bytes() {
        let quota = QuotaConfig::default();
        assert_eq!(quota.free_limit_bytes(), 500 * 1024 * 1024);
        assert_eq!(quota.pro_limit_bytes(), 5 * 1024 * 1024 * 1024);
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[web]
host = "127.0.0.1"
port = 8080
cors_origins = ["http://localhost:5173"]
jwt_secret = "test-secret-key"
token_expiry_secs = 600
login_rate_limit = 3
trust_proxy_headers = true

[database]
path = "custom/db.sqlite"

[files]
storage_path = "custom/blobs"
share_id_bytes = 8
share_id_attempts = 4
sweep_interval_secs = 60
orphan_grace_secs = 120

[quota]
free_limit_mb = 100
pro_limit_mb = 1000

[logging]
level = "debug"
file = ""
"#;

        let config = Config::parse(toml).unwrap();
        assert_eq!(config.web.host, "127.0.0.1");
        assert_eq!(config.web.port, 8080);
        assert_eq!(config.web.cors_origins, vec!["http://localhost:5173"]);
        assert_eq!(config.web.jwt_secret, "test-secret-key");
        assert_eq!(config.web.token_expiry_secs, 600);
        assert_eq!(config.web.login_rate_limit, 3);
        assert!(config.web.trust_proxy_headers);
        assert_eq!(config.database.path, "custom/db.sqlite");
        assert_eq!(config.files.storage_path, "custom/blobs");
        assert_eq!(config.files.share_id_bytes, 8);
        assert_eq!(config.files.share_id_attempts, 4);
        assert_eq!(config.files.sweep_interval_secs, 60);
        assert_eq!(config.files.orphan_grace_secs, 120);
        assert_eq!(config.quota.free_limit_mb, 100);
        assert_eq!(config.quota.pro_limit_mb, 1000);
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.file.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_config_uses_defaults() {
        let config = Config::parse("[quota]\nfree_limit_mb = 10\n").unwrap();
        assert_eq!(config.quota.free_limit_mb, 10);
        assert_eq!(config.quota.pro_limit_mb, 5120);
        assert_eq!(config.web.port, 3001);
    }

    #[test]
    fn test_parse_invalid_toml() {
        let result = Config::parse("this is not [valid toml");
        assert!(matches!(result, Err(SharedropError::Config(_))));
    }

    #[test]
    fn test_validate_requires_secret() {
        let config = Config::default();
        assert!(config.validate().is_err());
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_inverted_tiers() {
        let mut config = valid_config();
        config.quota.free_limit_mb = 10_000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_short_share_ids() {
        let mut config = valid_config();
        config.files.share_id_bytes = 2;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_attempts() {
        let mut config = valid_config();
        config.files.share_id_attempts = 0;
        assert!(config.validate().is_err());
    }
}
