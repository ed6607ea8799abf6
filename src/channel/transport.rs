//! # Transport seam for the persistent event channel.
//!
//! The channel manager never talks to a socket directly; it drives a
//! [`Transport`] that produces [`Connection`]s. Production code plugs in a
//! WebSocket (or Socket.IO-style) implementation; tests plug in a scripted
//! fake. The remote side holds no memory of prior subscriptions across a
//! dropped connection, which is why the manager re-sends its join frames on
//! every (re)connect.

use async_trait::async_trait;

use crate::error::TransportError;
use crate::events::Frame;

/// Session identity required to open the channel.
///
/// Without a session the manager refuses to connect (fire-and-forget: it logs
/// and stays `Disconnected`).
#[derive(Clone, Debug)]
pub struct Session {
    /// Opaque session credential presented during the handshake.
    pub token: String,
    /// Tourist id used to join the per-tourist tracking room.
    pub tourist_id: String,
}

/// One established bidirectional connection.
///
/// The manager owns the connection exclusively and calls `send`/`recv` from a
/// single I/O task, so implementations need `&mut self` only.
#[async_trait]
pub trait Connection: Send {
    /// Writes one frame to the remote side.
    async fn send(&mut self, frame: Frame) -> Result<(), TransportError>;

    /// Reads the next inbound frame.
    ///
    /// Returns `Ok(None)` on a clean remote close. Any error tears the
    /// connection down and arms the retry policy.
    async fn recv(&mut self) -> Result<Option<Frame>, TransportError>;
}

/// Factory for connections to the remote event source.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Performs one connection handshake with the given credential.
    ///
    /// The manager bounds this call with its configured handshake timeout.
    async fn connect(&self, credential: &str) -> Result<Box<dyn Connection>, TransportError>;
}
