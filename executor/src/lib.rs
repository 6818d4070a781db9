//! Synchronization executor for collaborative mesh editing.
//!
//! A peer edits its local [`mesh::Scene`] optimistically and tells the other
//! peers about it through the relay. This crate is the part in between: it
//! turns local edits into wire messages ([`Executor`]'s `emit_*` helpers),
//! queues them while the connection is not yet open, and applies messages
//! arriving from the relay to the local scene.
//!
//! OWN-EDIT SUPPRESSION
//! ====================
//! The relay echoes every message back to its sender. Edits and leaves
//! carrying the local user id were already applied when they were made, so
//! their echoes are dropped. Creates, locks and presence updates are applied
//! on echo, since the sender waits for them.
//!
//! The websocket side lives in [`transport`]: a tokio task that owns the
//! socket and talks to the host over channels, preserving per-connection
//! order.

mod apply;
pub mod config;
mod emit;
pub mod error;
pub mod executor;
pub mod transport;

pub use config::{ExecutorConfig, Role};
pub use error::ExecutorError;
pub use executor::{ChatLine, ConnectionState, Executor, Outcome, SendOutcome};
pub use transport::{TransportEvent, spawn_transport};
