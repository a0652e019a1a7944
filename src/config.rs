//! Service configuration management
//!
//! This module handles loading configuration from environment variables.
//! Missing required values are fatal; poll intervals below the floor are
//! corrected when the scheduler reads them.

use std::env;
use std::time::Duration;

use crate::constants::{
    DEFAULT_DATABASE_MAX_CONNECTIONS, DEFAULT_IDLE_INTERVAL_SECONDS, DEFAULT_JUDGE_TIMEOUT_SECONDS,
    DEFAULT_NOTIFY_CHANNEL_PREFIX, DEFAULT_OPERATIONAL_INTERVAL_SECONDS,
    DEFAULT_RECOVERY_INTERVAL_SECONDS, DEFAULT_SERVER_HOST, DEFAULT_SERVER_PORT,
    MIN_INTERVAL_SECONDS,
};

/// Main service configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub environment: String,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub judge: JudgeConfig,
    pub scheduler: SchedulerConfig,
    pub workers: WorkerConfig,
}

/// HTTP server configuration (submission intake, health, metrics)
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub rust_log: String,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Redis configuration
#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: String,
    /// Prefix of the pub/sub channels results are published on
    pub channel_prefix: String,
}

/// Judge service configuration
#[derive(Debug, Clone)]
pub struct JudgeConfig {
    pub url: String,
    pub timeout_seconds: u64,
}

/// Lifecycle scheduler poll intervals, in seconds as configured
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub operational_interval_seconds: i64,
    pub idle_interval_seconds: i64,
    pub recovery_interval_seconds: i64,
}

/// Worker pool configuration
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Lower bound of the pool size; the backlog at startup may raise it
    pub min_pool_size: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            server: ServerConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
            redis: RedisConfig::from_env()?,
            judge: JudgeConfig::from_env()?,
            scheduler: SchedulerConfig::from_env()?,
            workers: WorkerConfig::from_env()?,
        })
    }
}

impl ServerConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: env::var("SERVER_HOST").unwrap_or_else(|_| DEFAULT_SERVER_HOST.to_string()),
            port: parse_or("SERVER_PORT", DEFAULT_SERVER_PORT)?,
            rust_log: env::var("RUST_LOG")
                .unwrap_or_else(|_| "contest_scheduler=debug,sqlx=warn".to_string()),
        })
    }
}

impl DatabaseConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            url: required("DATABASE_URL")?,
            max_connections: parse_or("DATABASE_MAX_CONNECTIONS", DEFAULT_DATABASE_MAX_CONNECTIONS)?,
        })
    }
}

impl RedisConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            url: env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            channel_prefix: env::var("NOTIFY_CHANNEL_PREFIX")
                .unwrap_or_else(|_| DEFAULT_NOTIFY_CHANNEL_PREFIX.to_string()),
        })
    }
}

impl JudgeConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            url: required("JUDGE_URL")?,
            timeout_seconds: parse_or("JUDGE_TIMEOUT_SECONDS", DEFAULT_JUDGE_TIMEOUT_SECONDS)?,
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.max(1))
    }
}

impl SchedulerConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            operational_interval_seconds: parse_or(
                "SCHEDULER_OPERATIONAL_INTERVAL_SECONDS",
                DEFAULT_OPERATIONAL_INTERVAL_SECONDS,
            )?,
            idle_interval_seconds: parse_or(
                "SCHEDULER_IDLE_INTERVAL_SECONDS",
                DEFAULT_IDLE_INTERVAL_SECONDS,
            )?,
            recovery_interval_seconds: parse_or(
                "SCHEDULER_RECOVERY_INTERVAL_SECONDS",
                DEFAULT_RECOVERY_INTERVAL_SECONDS,
            )?,
        })
    }

    /// Interval between cycles while competitions are open
    pub fn operational_interval(&self) -> Duration {
        floored(
            "operational",
            self.operational_interval_seconds,
            DEFAULT_OPERATIONAL_INTERVAL_SECONDS,
        )
    }

    /// Interval between cycles while nothing is open
    pub fn idle_interval(&self) -> Duration {
        floored("idle", self.idle_interval_seconds, DEFAULT_IDLE_INTERVAL_SECONDS)
    }

    /// Back-off after a failed cycle, strictly longer than either poll
    /// interval. A configured value that is not is added on top of the
    /// longer poll interval.
    pub fn recovery_interval(&self) -> Duration {
        let configured = floored(
            "recovery",
            self.recovery_interval_seconds,
            DEFAULT_RECOVERY_INTERVAL_SECONDS,
        );
        let longest_poll = self.operational_interval().max(self.idle_interval());

        if configured > longest_poll {
            configured
        } else {
            longest_poll + configured
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            operational_interval_seconds: DEFAULT_OPERATIONAL_INTERVAL_SECONDS,
            idle_interval_seconds: DEFAULT_IDLE_INTERVAL_SECONDS,
            recovery_interval_seconds: DEFAULT_RECOVERY_INTERVAL_SECONDS,
        }
    }
}

impl WorkerConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            min_pool_size: parse_or("WORKER_MIN_POOL_SIZE", num_cpus::get())?,
        })
    }
}

fn floored(name: &str, seconds: i64, default: i64) -> Duration {
    if seconds < MIN_INTERVAL_SECONDS {
        tracing::warn!(
            interval = name,
            configured = seconds,
            fallback = default,
            "Scheduler interval below {}s, using default",
            MIN_INTERVAL_SECONDS
        );
        return Duration::from_secs(default as u64);
    }
    Duration::from_secs(seconds as u64)
}

fn required(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::Missing(key.to_string()))
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        Err(_) => Ok(default),
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(String),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}
