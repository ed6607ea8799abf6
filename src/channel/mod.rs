//! # Persistent event channel: manager, registry, transport seam.
//!
//! This module contains the client-resident transport layer:
//! - [`ChannelManager`] — connection lifecycle, fixed-interval capped
//!   reconnection, join replay, dispatch and emit;
//! - [`SubscriptionRegistry`] — event-type → at-most-one handler map with
//!   last-writer-wins registration (exposed through the manager's `on`/`off`);
//! - [`Transport`]/[`Connection`] — the seam to the real socket;
//! - [`ConnectionState`] — the passive status indicator.
//!
//! ## Wiring
//! ```text
//! Transport::connect() ─► Connection ─► serve(): ┌─ recv ─► Envelope ─► registry.dispatch
//!                                                └─ send ◄─ emit()/join frames
//! ```

mod manager;
mod registry;
mod state;
mod transport;

pub use manager::ChannelManager;
pub use registry::{EventHandler, SubscriptionRegistry};
pub use state::ConnectionState;
pub use transport::{Connection, Session, Transport};
