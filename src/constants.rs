//! Application-wide constants
//!
//! This module contains all constant values used throughout the service.
//! Constants are grouped by their purpose for better organization.

// =============================================================================
// SERVER DEFAULTS
// =============================================================================

/// Default server host address
pub const DEFAULT_SERVER_HOST: &str = "0.0.0.0";

/// Default server port
pub const DEFAULT_SERVER_PORT: u16 = 8080;

/// Largest accepted request body in bytes
pub const MAX_REQUEST_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Request timeout in seconds
pub const REQUEST_TIMEOUT_SECONDS: u64 = 30;

// =============================================================================
// DATABASE DEFAULTS
// =============================================================================

/// Default maximum database connections in the pool
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 20;

// =============================================================================
// SCHEDULER DEFAULTS
// =============================================================================

/// Poll interval in seconds while at least one competition is open
pub const DEFAULT_OPERATIONAL_INTERVAL_SECONDS: i64 = 1;

/// Poll interval in seconds while no competition is open
pub const DEFAULT_IDLE_INTERVAL_SECONDS: i64 = 30;

/// Back-off in seconds after a failed scheduler cycle
pub const DEFAULT_RECOVERY_INTERVAL_SECONDS: i64 = 60;

/// Smallest accepted poll interval in seconds
pub const MIN_INTERVAL_SECONDS: i64 = 1;

// =============================================================================
// JUDGE DEFAULTS
// =============================================================================

/// Default timeout for a single grading request in seconds
pub const DEFAULT_JUDGE_TIMEOUT_SECONDS: u64 = 30;

// =============================================================================
// NOTIFICATIONS
// =============================================================================

/// Default prefix of the Redis pub/sub channels the realtime hub listens on
pub const DEFAULT_NOTIFY_CHANNEL_PREFIX: &str = "contest";

/// Broadcast group names
pub mod groups {
    pub const ADMINS: &str = "admins";
    pub const REVIEWERS: &str = "reviewers";
}
