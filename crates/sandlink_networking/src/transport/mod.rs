//! # Transport Layer
//!
//! Ordered duplex frame stream underneath a session.
//!
//! ## Design
//!
//! - One frame in, one message out; framing belongs to the transport
//! - Sends are fire-and-forget: no acknowledgement is awaited
//! - `recv` yielding `None` means the remote end is gone

use std::future::Future;

use tokio::sync::mpsc;

use crate::error::TransportError;

/// Default capacity of each direction of a [`ChannelTransport`] pair.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Byte-stream collaborator.
pub trait Transport {
    /// Sends one frame.
    fn send(&mut self, frame: Vec<u8>) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Waits for the next frame. `None` once the remote end has closed.
    fn recv(&mut self) -> impl Future<Output = Option<Vec<u8>>> + Send;

    /// Closes the local end. Idempotent.
    fn close(&mut self) -> impl Future<Output = ()> + Send;
}

/// Transport statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TransportStats {
    /// Frames sent.
    pub frames_sent: u64,
    /// Frames received.
    pub frames_received: u64,
    /// Bytes sent.
    pub bytes_sent: u64,
    /// Bytes received.
    pub bytes_received: u64,
    /// Send errors.
    pub send_errors: u64,
}

/// In-memory transport over tokio channels.
///
/// Used by the loopback binary and the integration tests; a socket-backed
/// transport plugs into the same trait.
#[derive(Debug)]
pub struct ChannelTransport {
    outbound: Option<mpsc::Sender<Vec<u8>>>,
    inbound: mpsc::Receiver<Vec<u8>>,
    stats: TransportStats,
}

impl ChannelTransport {
    /// Builds two connected ends.
    #[must_use]
    pub fn pair(capacity: usize) -> (Self, Self) {
        let (a_tx, a_rx) = mpsc::channel(capacity.max(1));
        let (b_tx, b_rx) = mpsc::channel(capacity.max(1));
        (Self::new(a_tx, b_rx), Self::new(b_tx, a_rx))
    }

    fn new(outbound: mpsc::Sender<Vec<u8>>, inbound: mpsc::Receiver<Vec<u8>>) -> Self {
        Self {
            outbound: Some(outbound),
            inbound,
            stats: TransportStats::default(),
        }
    }

    /// Returns statistics.
    #[must_use]
    pub const fn stats(&self) -> &TransportStats {
        &self.stats
    }

    /// Resets statistics.
    pub fn reset_stats(&mut self) {
        self.stats = TransportStats::default();
    }

    /// Returns true once `close` has been called.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.outbound.is_none()
    }
}

impl Transport for ChannelTransport {
    async fn send(&mut self, frame: Vec<u8>) -> Result<(), TransportError> {
        let len = frame.len() as u64;
        let result = match &self.outbound {
            Some(outbound) => outbound.send(frame).await.map_err(|_| TransportError::Closed),
            None => Err(TransportError::Closed),
        };
        if result.is_ok() {
            self.stats.frames_sent += 1;
            self.stats.bytes_sent += len;
        } else {
            self.stats.send_errors += 1;
        }
        result
    }

    async fn recv(&mut self) -> Option<Vec<u8>> {
        let frame = self.inbound.recv().await?;
        self.stats.frames_received += 1;
        self.stats.bytes_received += frame.len() as u64;
        Some(frame)
    }

    async fn close(&mut self) {
        // Dropping the sender ends the peer's stream once it drains.
        self.outbound = None;
        self.inbound.close();
    }
}
