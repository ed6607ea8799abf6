//! # Connection state of the persistent event channel.
//!
//! Exactly one [`ConnectionState`] exists per channel manager. Transitions
//! happen only inside the manager; callers observe it passively (a status
//! indicator), never set it.
//!
//! ## State machine
//! ```text
//! Disconnected ──connect()──► Connecting ──handshake ok──► Open
//!      ▲                          │                          │
//!      │◄──── handshake failed ───┘                          │
//!      │◄──────────────── socket error/close ────────────────┘
//!      │
//!      │  after fixed retry delay (until the attempt cap):
//!      └──────────────────► Connecting
//!
//! disconnect(): any ──► Closing ──► Disconnected   (no further reconnects)
//! ```

/// Lifecycle state of the event channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    /// No connection; automatic reconnection may be armed or parked.
    Disconnected,
    /// A handshake is in flight.
    Connecting,
    /// Connected; outbound emits are delivered and inbound frames dispatched.
    Open,
    /// Caller-initiated teardown in progress.
    Closing,
}

impl ConnectionState {
    /// Short stable label (snake_case) for logs/telemetry.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Open => "open",
            ConnectionState::Closing => "closing",
        }
    }
}
