//! Ping/pong heartbeat for connection keepalive.
//!
//! Transport-level silence past the keepalive window is an implicit
//! disconnect: the loop marks the connection closed and returns, and the
//! transport task feeds the normal unregister path.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time;
use tracing::{debug, warn};

use campushub_core::config::realtime::RealtimeConfig;

use crate::signal::types::ServerEvent;

use super::handle::ConnectionHandle;

/// Heartbeat timing configuration.
#[derive(Debug, Clone)]
pub struct HeartbeatConfig {
    /// Interval between pings.
    pub ping_interval: Duration,
    /// Silence window before the connection is considered dead.
    pub ping_timeout: Duration,
}

impl From<&RealtimeConfig> for HeartbeatConfig {
    fn from(config: &RealtimeConfig) -> Self {
        Self {
            ping_interval: Duration::from_secs(config.ping_interval_seconds),
            ping_timeout: Duration::from_secs(config.ping_timeout_seconds),
        }
    }
}

/// Runs the heartbeat loop for one connection.
///
/// Sends periodic pings and checks pong freshness. Returns once the
/// connection is closed or times out; the caller performs cleanup.
pub async fn run_heartbeat(handle: Arc<ConnectionHandle>, config: HeartbeatConfig) {
    let mut interval = time::interval(config.ping_interval);
    // The first tick fires immediately; skip it so a fresh connection
    // is not pinged before it finishes the handshake.
    interval.tick().await;

    loop {
        interval.tick().await;

        if !handle.is_alive() {
            break;
        }

        let elapsed = Utc::now() - handle.last_pong();
        if let Ok(elapsed) = elapsed.to_std() {
            if elapsed > config.ping_timeout {
                warn!(
                    conn_id = %handle.id,
                    elapsed = ?elapsed,
                    "Heartbeat timeout, marking connection dead"
                );
                handle.mark_closed();
                break;
            }
        }

        let ping = ServerEvent::Ping {
            timestamp: Utc::now().timestamp_millis(),
        };
        if !handle.send(ping) {
            debug!(conn_id = %handle.id, "Ping send failed, marking connection dead");
            handle.mark_closed();
            break;
        }
    }

    debug!(conn_id = %handle.id, "Heartbeat loop ended");
}
