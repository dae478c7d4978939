//! Top-level realtime engine that ties together all subsystems.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::info;

use campushub_core::config::realtime::RealtimeConfig;
use campushub_directory::DirectoryStore;

use crate::bridge::event_bridge::EventBridge;
use crate::channel::registry::ChannelRegistry;
use crate::channel::resolver::MembershipResolver;
use crate::connection::manager::ConnectionManager;
use crate::connection::registry::ConnectionRegistry;
use crate::metrics::EngineMetrics;
use crate::presence::tracker::PresenceTracker;
use crate::signal::relay::EphemeralRelay;
use crate::signal::router::EventRouter;

/// Central realtime engine coordinating all subsystems.
///
/// Constructed once at process start and passed by handle; there are no
/// ambient globals. [`RealtimeEngine::reset`] exists for test isolation.
#[derive(Clone)]
pub struct RealtimeEngine {
    /// Connection lifecycle manager.
    pub connections: Arc<ConnectionManager>,
    /// Live connection registry.
    pub registry: Arc<ConnectionRegistry>,
    /// Channel registry.
    pub channels: Arc<ChannelRegistry>,
    /// Presence tracker.
    pub presence: Arc<PresenceTracker>,
    /// Membership resolver.
    pub resolver: Arc<MembershipResolver>,
    /// Event router.
    pub router: Arc<EventRouter>,
    /// Fan-out bridge for collaborator-produced events.
    pub bridge: Arc<EventBridge>,
    /// Metrics collector.
    pub metrics: Arc<EngineMetrics>,
    /// Engine configuration.
    pub config: RealtimeConfig,
    /// Shutdown signal sender.
    shutdown_tx: broadcast::Sender<()>,
}

impl std::fmt::Debug for RealtimeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeEngine").finish()
    }
}

impl RealtimeEngine {
    /// Creates a new realtime engine with all subsystems.
    pub fn new(config: RealtimeConfig, directory: Arc<dyn DirectoryStore>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        let metrics = Arc::new(EngineMetrics::new());
        let registry = Arc::new(ConnectionRegistry::new());
        let channels = Arc::new(ChannelRegistry::new());
        let presence = Arc::new(PresenceTracker::new());
        let resolver = Arc::new(MembershipResolver::new(directory.clone()));
        let router = Arc::new(EventRouter::new(
            registry.clone(),
            channels.clone(),
            metrics.clone(),
        ));
        let relay = Arc::new(EphemeralRelay::new(router.clone(), directory));
        let bridge = Arc::new(EventBridge::new(router.clone()));
        let connections = Arc::new(ConnectionManager::new(
            config.clone(),
            registry.clone(),
            channels.clone(),
            presence.clone(),
            resolver.clone(),
            router.clone(),
            relay,
            metrics.clone(),
        ));

        info!("Realtime engine initialized");

        Self {
            connections,
            registry,
            channels,
            presence,
            resolver,
            router,
            bridge,
            metrics,
            config,
            shutdown_tx,
        }
    }

    /// Returns a shutdown receiver for graceful shutdown coordination.
    pub fn shutdown_receiver(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Initiates a graceful shutdown of the realtime engine.
    pub fn shutdown(&self) {
        info!("Shutting down realtime engine");
        let _ = self.shutdown_tx.send(());
        self.connections.close_all();
        info!("Realtime engine shut down");
    }

    /// Clears all connection, channel, and presence state. Test isolation
    /// only; live connections are closed without notification.
    pub fn reset(&self) {
        for handle in self.registry.all_connections() {
            handle.mark_closed();
        }
        self.registry.clear();
        self.channels.clear();
        self.presence.clear();
    }
}
