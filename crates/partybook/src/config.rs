//! Configuration management for partybook.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use lettre::message::Mailbox;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "partybook";

/// Default cart database file name.
const DATABASE_FILE_NAME: &str = "cart.db";

/// Plain environment names accepted for the mail section, next to the
/// prefixed `PARTYBOOK_MAIL__*` form.
const MAIL_ENV_KEYS: &[&str] = &[
    "SMTP_HOST",
    "SMTP_PORT",
    "SMTP_USER",
    "SMTP_PASS",
    "MAIL_FROM",
    "MAIL_TO",
];

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Plain mail variables (`SMTP_HOST`, `MAIL_TO`, ...)
/// 2. Environment variables prefixed with `PARTYBOOK_`, nested with `__`
/// 3. TOML config file at `~/.config/partybook/config.toml`
/// 4. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server configuration.
    pub server: ServerConfig,
    /// Outbound mail configuration.
    pub mail: MailConfig,
    /// Booking rate limit configuration.
    pub rate_limit: RateLimitConfig,
    /// Local cart storage configuration.
    pub cart: CartConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to listen on.
    pub bind_addr: String,
    /// Origins allowed by CORS. Empty means any origin.
    pub cors_origins: Vec<String>,
}

/// Outbound mail configuration.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    /// SMTP relay host.
    pub smtp_host: String,
    /// SMTP relay port.
    pub smtp_port: u16,
    /// SMTP username. No authentication when unset.
    pub smtp_user: Option<String>,
    /// SMTP password. Never serialized back out.
    #[serde(skip_serializing)]
    pub smtp_pass: Option<String>,
    /// Upgrade the connection with STARTTLS.
    pub starttls: bool,
    /// Sender mailbox, e.g. `Party Bookings <bookings@example.com>`.
    pub mail_from: String,
    /// Destination inbox for booking notifications.
    pub mail_to: String,
    /// Upper bound on a single delivery attempt, in seconds.
    pub timeout_secs: u64,
}

/// Booking rate limit configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Length of the sliding window in seconds.
    pub window_secs: u64,
    /// Accepted submissions per client within one window.
    pub max_requests: usize,
    /// How often idle client keys are evicted, in seconds.
    pub sweep_interval_secs: u64,
}

/// Local cart storage configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CartConfig {
    /// Path to the cart database.
    /// Defaults to `~/.local/share/partybook/cart.db`
    pub database_path: Option<PathBuf>,
    /// Key the cart is stored under.
    pub storage_key: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:5000".to_string(),
            cors_origins: Vec::new(),
        }
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: 587,
            smtp_user: None,
            smtp_pass: None,
            starttls: true,
            mail_from: "Party Bookings <bookings@example.com>".to_string(),
            mail_to: "owner@example.com".to_string(),
            timeout_secs: 10,
        }
    }
}

// Hand-written so the password never ends up in logs.
impl std::fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_user", &self.smtp_user)
            .field("smtp_pass", &self.smtp_pass.as_ref().map(|_| "***"))
            .field("starttls", &self.starttls)
            .field("mail_from", &self.mail_from)
            .field("mail_to", &self.mail_to)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_secs: 60,
            max_requests: 3,
            sweep_interval_secs: 300,
        }
    }
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            database_path: None, // Will be resolved to default at runtime
            storage_key: "prennedy-cart".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("PARTYBOOK_").split("__"))
            .merge(
                Env::raw()
                    .only(MAIL_ENV_KEYS)
                    .map(|key| format!("mail.{}", key.as_str().to_ascii_lowercase()).into()),
            );

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.rate_limit.window_secs == 0 {
            return Err(Error::config("window_secs must be greater than 0"));
        }

        if self.rate_limit.max_requests == 0 {
            return Err(Error::config("max_requests must be greater than 0"));
        }

        if self.rate_limit.sweep_interval_secs == 0 {
            return Err(Error::config("sweep_interval_secs must be greater than 0"));
        }

        if self.mail.smtp_port == 0 {
            return Err(Error::config("smtp_port must be greater than 0"));
        }

        if self.mail.timeout_secs == 0 {
            return Err(Error::config("timeout_secs must be greater than 0"));
        }

        for (name, value) in [
            ("mail_from", &self.mail.mail_from),
            ("mail_to", &self.mail.mail_to),
        ] {
            if value.parse::<Mailbox>().is_err() {
                return Err(Error::config(format!("{name} is not a valid mailbox: {value}")));
            }
        }

        if self.cart.storage_key.trim().is_empty() {
            return Err(Error::config("storage_key cannot be empty"));
        }

        Ok(())
    }

    /// Get the cart database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.cart
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the rate limit window as a Duration.
    #[must_use]
    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit.window_secs)
    }

    /// Get the idle-key sweep interval as a Duration.
    #[must_use]
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.rate_limit.sweep_interval_secs)
    }

    /// Get the mail delivery timeout as a Duration.
    #[must_use]
    pub fn delivery_timeout(&self) -> Duration {
        Duration::from_secs(self.mail.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.server.bind_addr, "0.0.0.0:5000");
        assert!(config.server.cors_origins.is_empty());
        assert_eq!(config.mail.smtp_host, "smtp.gmail.com");
        assert_eq!(config.mail.smtp_port, 587);
        assert!(config.mail.starttls);
        assert_eq!(config.rate_limit.window_secs, 60);
        assert_eq!(config.rate_limit.max_requests, 3);
        assert_eq!(config.cart.storage_key, "prennedy-cart");
    }

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_window() {
        let mut config = Config::default();
        config.rate_limit.window_secs = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("window_secs"));
    }

    #[test]
    fn test_validate_zero_max_requests() {
        let mut config = Config::default();
        config.rate_limit.max_requests = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("max_requests"));
    }

    #[test]
    fn test_validate_zero_timeout() {
        let mut config = Config::default();
        config.mail.timeout_secs = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("timeout_secs"));
    }

    #[test]
    fn test_validate_bad_mailbox() {
        let mut config = Config::default();
        config.mail.mail_to = "not a mailbox".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("mail_to"));
    }

    #[test]
    fn test_validate_empty_storage_key() {
        let mut config = Config::default();
        config.cart.storage_key = "  ".to_string();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_database_path_default() {
        let config = Config::default();
        assert!(config.database_path().to_string_lossy().contains("cart.db"));
    }

    #[test]
    fn test_database_path_custom() {
        let mut config = Config::default();
        config.cart.database_path = Some(PathBuf::from("/custom/cart.sqlite"));

        assert_eq!(config.database_path(), PathBuf::from("/custom/cart.sqlite"));
    }

    #[test]
    fn test_durations() {
        let config = Config::default();

        assert_eq!(config.rate_limit_window(), Duration::from_secs(60));
        assert_eq!(config.sweep_interval(), Duration::from_secs(300));
        assert_eq!(config.delivery_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_mail_debug_hides_password() {
        let mail = MailConfig {
            smtp_pass: Some("hunter2".to_string()),
            ..MailConfig::default()
        };
        let debug_str = format!("{mail:?}");
        assert!(!debug_str.contains("hunter2"));
        assert!(debug_str.contains("***"));
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("partybook"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[rate_limit]\nmax_requests = 5\n\n[server]\nbind_addr = \"127.0.0.1:9000\"\n",
        )
        .unwrap();

        let config = Config::load_from(Some(path)).unwrap();
        assert_eq!(config.rate_limit.max_requests, 5);
        assert_eq!(config.server.bind_addr, "127.0.0.1:9000");
        assert_eq!(config.rate_limit.window_secs, 60);
    }

    #[test]
    fn test_load_rejects_invalid_file_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[rate_limit]\nwindow_secs = 0\n").unwrap();

        assert!(Config::load_from(Some(path)).is_err());
    }

    #[test]
    fn test_rate_limit_config_deserialize() {
        let json = r#"{"window_secs": 30}"#;
        let rate_limit: RateLimitConfig = serde_json::from_str(json).unwrap();
        assert_eq!(rate_limit.window_secs, 30);
        assert_eq!(rate_limit.max_requests, 3);
    }
}
