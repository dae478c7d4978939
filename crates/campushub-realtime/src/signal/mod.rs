//! Signals — typed message definitions, scoped routing, ephemeral relay.

pub mod relay;
pub mod router;
pub mod types;

pub use relay::EphemeralRelay;
pub use router::EventRouter;
pub use types::{ClientAction, CloseReason, ServerEvent, Signal, SignalKind, SignalScope};
