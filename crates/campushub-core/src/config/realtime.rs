//! Real-time engine configuration.

use serde::{Deserialize, Serialize};

/// Real-time (WebSocket) engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Outbound buffer size per connection.
    #[serde(default = "default_channel_buffer")]
    pub channel_buffer_size: usize,
    /// WebSocket ping interval in seconds.
    #[serde(default = "default_ping_interval")]
    pub ping_interval_seconds: u64,
    /// Silence window after which a connection is considered dead.
    #[serde(default = "default_ping_timeout")]
    pub ping_timeout_seconds: u64,
    /// Maximum channel subscriptions per connection.
    #[serde(default = "default_max_subscriptions")]
    pub max_subscriptions_per_connection: usize,
    /// Retry attempts when connect-time channel resolution hits a store outage.
    #[serde(default = "default_retry_attempts")]
    pub resolver_retry_attempts: u32,
    /// Backoff between resolution retries in milliseconds.
    #[serde(default = "default_retry_backoff")]
    pub resolver_retry_backoff_ms: u64,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            channel_buffer_size: default_channel_buffer(),
            ping_interval_seconds: default_ping_interval(),
            ping_timeout_seconds: default_ping_timeout(),
            max_subscriptions_per_connection: default_max_subscriptions(),
            resolver_retry_attempts: default_retry_attempts(),
            resolver_retry_backoff_ms: default_retry_backoff(),
        }
    }
}

fn default_channel_buffer() -> usize {
    256
}

fn default_ping_interval() -> u64 {
    30
}

fn default_ping_timeout() -> u64 {
    60
}

fn default_max_subscriptions() -> usize {
    100
}

fn default_retry_attempts() -> u32 {
    5
}

fn default_retry_backoff() -> u64 {
    2000
}
