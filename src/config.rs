//! # Configuration Management Module
//!
//! ## Purpose
//! Centralized configuration management for the decision search proxy,
//! supporting TOML files and environment variable overrides with validation
//! and type-safe access to all system settings.
//!
//! ## Input/Output Specification
//! - **Input**: Configuration files (TOML), environment variables
//! - **Output**: Validated configuration structs with defaults and overrides
//! - **Validation**: Type checking, range validation, dependency verification
//!
//! ## Configuration Sources (in order of precedence)
//! 1. Environment variables (highest priority)
//! 2. Configuration files
//! 3. Default values (lowest priority)
//!
//! ## Usage
//! ```rust,no_run
//! use yargitay_search::config::Config;
//!
//! let config = Config::from_file("config.toml").unwrap();
//! println!("Server port: {}", config.server.port);
//! ```

use crate::errors::{Result, SearchError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main configuration structure containing all system settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server and API configuration
    pub server: ServerConfig,
    /// Upstream decision backend settings
    pub upstream: UpstreamConfig,
    /// Outbound rate limiting
    pub rate_limit: RateLimitConfig,
    /// Retry and backoff policy
    pub retry: RetryConfig,
    /// Logging and monitoring
    pub logging: LoggingConfig,
}

/// Server and API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server bind address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
}

/// Upstream decision backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL of the Yargıtay decision search backend
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// User-Agent header sent with every upstream request
    pub user_agent: String,
}

/// Outbound rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Minimum spacing between outbound requests in milliseconds
    pub min_delay_ms: u64,
    /// Maximum spacing between outbound requests in milliseconds
    pub max_delay_ms: u64,
}

/// Retry and backoff configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per upstream operation (including the first)
    pub max_attempts: u32,
    /// Initial backoff delay in milliseconds; doubled after each failed attempt
    pub initial_backoff_ms: u64,
    /// Backoff ceiling in milliseconds
    pub max_backoff_ms: u64,
}

/// Logging and monitoring configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Enable structured JSON logging
    pub json_format: bool,
}

impl RateLimitConfig {
    pub fn min_delay(&self) -> Duration {
        Duration::from_millis(self.min_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}

impl RetryConfig {
    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        Self::from_file("config.toml")
    }

    /// Load configuration from a specific file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::warn!("Configuration file not found: {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| SearchError::Config {
            message: format!("Failed to read config file {:?}: {}", path, e),
        })?;

        let mut config: Config = toml::from_str(&content).map_err(|e| SearchError::Config {
            message: format!("Failed to parse config file {:?}: {}", path, e),
        })?;

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(host) = std::env::var("YARGITAY_SEARCH_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("YARGITAY_SEARCH_PORT") {
            self.server.port = port.parse().map_err(|_| SearchError::Config {
                message: "Invalid port number in YARGITAY_SEARCH_PORT".to_string(),
            })?;
        }
        if let Ok(base_url) = std::env::var("YARGITAY_SEARCH_UPSTREAM_URL") {
            self.upstream.base_url = base_url;
        }
        if let Ok(level) = std::env::var("YARGITAY_SEARCH_LOG_LEVEL") {
            self.logging.level = level;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(SearchError::Config {
                message: "server.port cannot be zero".to_string(),
            });
        }

        if self.upstream.base_url.is_empty() {
            return Err(SearchError::Config {
                message: "upstream.base_url cannot be empty".to_string(),
            });
        }

        if self.rate_limit.min_delay_ms > self.rate_limit.max_delay_ms {
            return Err(SearchError::Config {
                message: "rate_limit.min_delay_ms cannot exceed rate_limit.max_delay_ms"
                    .to_string(),
            });
        }

        if self.retry.max_attempts == 0 {
            return Err(SearchError::Config {
                message: "retry.max_attempts must be at least 1".to_string(),
            });
        }

        if self.retry.initial_backoff_ms > self.retry.max_backoff_ms {
            return Err(SearchError::Config {
                message: "retry.initial_backoff_ms cannot exceed retry.max_backoff_ms".to_string(),
            });
        }

        // Backoff starts where the normal request spacing ends, so retries
        // never undercut the rate limiter
        if self.retry.initial_backoff_ms < self.rate_limit.max_delay_ms {
            return Err(SearchError::Config {
                message: "retry.initial_backoff_ms must be at least rate_limit.max_delay_ms"
                    .to_string(),
            });
        }

        Ok(())
    }

    /// Get configuration as TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| SearchError::Config {
            message: format!("Failed to serialize config to TOML: {}", e),
        })
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = self.to_toml()?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                enable_cors: true,
            },
            upstream: UpstreamConfig {
                base_url: "https://karararama.yargitay.gov.tr".to_string(),
                timeout_seconds: 30,
                user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36"
                    .to_string(),
            },
            rate_limit: RateLimitConfig {
                min_delay_ms: 2_000,
                max_delay_ms: 5_000,
            },
            retry: RetryConfig {
                max_attempts: 4,
                initial_backoff_ms: 5_000,
                max_backoff_ms: 60_000,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                json_format: false,
            },
        }
    }
}
