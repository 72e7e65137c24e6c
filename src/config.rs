//! # Configuration Management
//!
//! Centralized configuration for the Hotline protocol core.
//!
//! ## Configuration Sources
//! - TOML files via `from_file()`
//! - Direct instantiation with defaults
//! - Environment overrides via `from_env()`
//!
//! ## Sections
//! - **codec**: inbound size limit and trailing-byte policy
//! - **credentials**: bcrypt cost for new password hashes
//! - **client**: server address, identity and timeouts for [`crate::service::client::Client`]
//! - **logging**: options for [`crate::utils::logging::init_logging`]

use crate::account::credential::{DEFAULT_COST, MAX_COST, MIN_COST};
use crate::core::field_block::DecodeMode;
use crate::error::{ProtocolError, Result};
use crate::utils::timeout;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use tracing::Level;

/// Protocol version sent in the connection handshake
pub const PROTOCOL_VERSION: u16 = 1;

/// Protocol sub-version sent in the connection handshake
pub const PROTOCOL_SUBVERSION: u16 = 2;

/// Conventional Hotline server port
pub const DEFAULT_PORT: u16 = 5500;

/// Largest inbound transaction body accepted by default (1 MB)
pub const MAX_TRANSACTION_SIZE: usize = 1024 * 1024;

/// Main configuration structure that contains all configurable settings
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ProtocolConfig {
    #[serde(default)]
    pub codec: CodecConfig,

    #[serde(default)]
    pub credentials: CredentialConfig,

    #[serde(default)]
    pub client: ClientConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ProtocolConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to open config file: {e}")))?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to read config file: {e}")))?;

        Self::from_toml(&contents)
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to parse TOML: {e}")))
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("HOTLINE_SERVER_ADDRESS") {
            config.client.address = addr;
        }

        if let Ok(cost) = std::env::var("HOTLINE_BCRYPT_COST") {
            config.credentials.bcrypt_cost = cost
                .parse()
                .map_err(|e| ProtocolError::ConfigError(format!("Invalid HOTLINE_BCRYPT_COST: {e}")))?;
        }

        if let Ok(size) = std::env::var("HOTLINE_MAX_TRANSACTION_SIZE") {
            config.codec.max_transaction_size = size.parse().map_err(|e| {
                ProtocolError::ConfigError(format!("Invalid HOTLINE_MAX_TRANSACTION_SIZE: {e}"))
            })?;
        }

        if let Ok(mode) = std::env::var("HOTLINE_DECODE_MODE") {
            config.codec.decode_mode = match mode.to_ascii_lowercase().as_str() {
                "strict" => DecodeMode::Strict,
                "lenient" => DecodeMode::Lenient,
                other => {
                    return Err(ProtocolError::ConfigError(format!(
                        "Invalid HOTLINE_DECODE_MODE: {other} (expected 'strict' or 'lenient')"
                    )))
                }
            };
        }

        Ok(config)
    }

    /// Apply overrides to the default configuration
    pub fn default_with_overrides<F>(mutator: F) -> Self
    where
        F: FnOnce(&mut Self),
    {
        let mut config = Self::default();
        mutator(&mut config);
        config
    }

    /// Generate example configuration file content
    pub fn example_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|_| String::from("# Failed to generate example config"))
    }

    /// Save configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to write config file: {e}")))?;

        Ok(())
    }

    /// Validate the configuration for common issues and misconfigurations
    ///
    /// Returns a list of validation errors. Empty list means configuration is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        errors.extend(self.codec.validate());
        errors.extend(self.credentials.validate());
        errors.extend(self.client.validate());
        errors.extend(self.logging.validate());
        errors
    }

    /// Validate and return Result - convenience method
    pub fn validate_strict(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ProtocolError::ConfigError(format!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }
}

/// Codec configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CodecConfig {
    /// Largest transaction body accepted from a peer
    pub max_transaction_size: usize,

    /// Whether bytes after a field block are an error or ignored
    pub decode_mode: DecodeMode,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_transaction_size: MAX_TRANSACTION_SIZE,
            decode_mode: DecodeMode::Lenient,
        }
    }
}

impl CodecConfig {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        // An empty field block is two bytes
        if self.max_transaction_size < 2 {
            errors.push("Max transaction size too small (minimum: 2 bytes)".to_string());
        } else if self.max_transaction_size > u32::MAX as usize {
            errors.push(format!(
                "Max transaction size too large: {} bytes (maximum: {})",
                self.max_transaction_size,
                u32::MAX
            ));
        }

        errors
    }
}

/// Password hashing configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CredentialConfig {
    /// bcrypt cost factor for newly hashed passwords
    pub bcrypt_cost: u32,
}

impl Default for CredentialConfig {
    fn default() -> Self {
        Self {
            bcrypt_cost: DEFAULT_COST,
        }
    }
}

impl CredentialConfig {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if !(MIN_COST..=MAX_COST).contains(&self.bcrypt_cost) {
            errors.push(format!(
                "Invalid bcrypt cost: {} (valid range: {MIN_COST}-{MAX_COST})",
                self.bcrypt_cost
            ));
        } else if self.bcrypt_cost < 8 {
            errors.push(format!(
                "WARNING: bcrypt cost {} is only suitable for tests",
                self.bcrypt_cost
            ));
        }

        errors
    }
}

/// Client-specific configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientConfig {
    /// Target server address
    pub address: String,

    /// Display name sent at login
    pub user_name: String,

    /// Icon shown next to the user name
    pub icon_id: u16,

    /// Timeout for connecting and completing the handshake
    #[serde(with = "duration_serde")]
    pub connection_timeout: Duration,

    /// Timeout for waiting for reply transactions
    #[serde(with = "duration_serde")]
    pub response_timeout: Duration,

    /// Interval between keep-alive transactions
    #[serde(with = "duration_serde")]
    pub keepalive_interval: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            address: format!("127.0.0.1:{DEFAULT_PORT}"),
            user_name: String::from("unnamed"),
            icon_id: 414,
            connection_timeout: timeout::DEFAULT_TIMEOUT,
            response_timeout: timeout::RESPONSE_TIMEOUT,
            keepalive_interval: timeout::KEEPALIVE_INTERVAL,
        }
    }
}

impl ClientConfig {
    /// Validate client configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.address.is_empty() {
            errors.push("Client address cannot be empty".to_string());
        } else if self.address.parse::<std::net::SocketAddr>().is_err() {
            errors.push(format!(
                "Invalid client address format: '{}' (expected format: '127.0.0.1:5500')",
                self.address
            ));
        }

        if self.user_name.is_empty() {
            errors.push("User name cannot be empty".to_string());
        } else if self.user_name.len() > u16::MAX as usize {
            errors.push("User name too long to fit in a field".to_string());
        }

        if self.connection_timeout.as_millis() < 100 {
            errors.push("Connection timeout too short (minimum: 100ms)".to_string());
        } else if self.connection_timeout.as_secs() > 300 {
            errors.push("Connection timeout too long (maximum: 300s)".to_string());
        }

        if self.response_timeout.as_millis() < 100 {
            errors.push("Response timeout too short (minimum: 100ms)".to_string());
        }

        if self.keepalive_interval.as_secs() < 1 {
            errors.push("Keep-alive interval too short (minimum: 1s)".to_string());
        } else if self.keepalive_interval.as_secs() > 3600 {
            errors.push("Keep-alive interval too long (maximum: 1 hour)".to_string());
        }

        errors
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Application name for logs
    pub app_name: String,

    /// Log level
    #[serde(with = "log_level_serde")]
    pub log_level: Level,

    /// Whether to use JSON formatting for logs
    pub json_format: bool,

    /// Whether to include span events (enter/exit) in output
    pub span_events: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            app_name: String::from("hotline-protocol"),
            log_level: Level::INFO,
            json_format: false,
            span_events: false,
        }
    }
}

impl LoggingConfig {
    /// Validate logging configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.app_name.is_empty() {
            errors.push("Application name cannot be empty".to_string());
        } else if self.app_name.len() > 64 {
            errors.push(format!(
                "Application name too long: {} characters (maximum: 64)",
                self.app_name.len()
            ));
        }

        errors
    }
}

/// Helper module for Duration serialization/deserialization
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis = duration.as_millis() as u64;
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

/// Helper module for tracing::Level serialization/deserialization
mod log_level_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::str::FromStr;
    use tracing::Level;

    pub fn serialize<S>(level: &Level, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        level.to_string().to_ascii_lowercase().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Level, D::Error>
    where
        D: Deserializer<'de>,
    {
        let level_str = String::deserialize(deserializer)?;
        Level::from_str(&level_str)
            .map_err(|_| serde::de::Error::custom(format!("Invalid log level: {level_str}")))
    }
}
