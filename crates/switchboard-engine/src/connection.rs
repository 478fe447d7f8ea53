//! A client connection: identity, framed messenger, and liveness.

use std::fmt;
use std::io;
use std::net::SocketAddr;

use switchboard_protocol::{Message, Messenger, MessengerError, Opcode, Value};
use switchboard_transport::{ConnectionId, TransportError};
use tokio::net::TcpStream;

/// One accepted client socket.
///
/// Owned by whichever phase context holds the player it belongs to. The
/// event loop only ever borrows it: to wait on readiness and to drain its
/// messenger.
///
/// The two directions die separately. A peer that half-closes its side
/// is no longer read but is still written to; a write failure or a hard
/// read error ends both.
pub struct Connection {
    id: ConnectionId,
    peer: SocketAddr,
    messenger: Messenger,
    open: bool,
    reading: bool,
}

impl Connection {
    /// Wraps a freshly accepted stream.
    pub fn new(stream: TcpStream, peer: SocketAddr) -> Self {
        Self {
            id: ConnectionId::next(),
            peer,
            messenger: Messenger::new(stream),
            open: true,
            reading: true,
        }
    }

    /// The connection's id.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// The remote address.
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Returns `false` once the connection was closed locally or found dead.
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Returns `true` while the peer may still send something.
    pub fn is_readable(&self) -> bool {
        self.open && self.reading
    }

    /// Sends one message.
    ///
    /// A write failure parks the connection.
    pub fn send(&mut self, opcode: impl Into<Opcode>, args: Vec<Value>) -> Result<(), MessengerError> {
        if !self.open {
            return Err(TransportError::ConnectionClosed(format!("{} is closed", self.id)).into());
        }
        let result = self.messenger.send(&Message::new(opcode, args));
        if let Err(MessengerError::Transport(_)) = &result {
            self.park();
        }
        result
    }

    /// Sends one message, logging instead of failing.
    ///
    /// Notifications are fire-and-forget: a peer that cannot be written to
    /// is noticed by the read side, not by whoever broadcasts.
    pub fn notify(&mut self, opcode: impl Into<Opcode>, args: Vec<Value>) {
        let opcode = opcode.into();
        if let Err(e) = self.send(opcode, args) {
            tracing::warn!(conn = %self.id, peer = %self.peer, %opcode, error = %e, "send failed");
        }
    }

    /// Reads the next complete message, if any. See [`Messenger::receive`].
    pub fn receive(&mut self) -> Result<Option<Message>, MessengerError> {
        self.messenger.receive()
    }

    /// Writes queued output.
    pub fn flush(&mut self) -> Result<(), TransportError> {
        self.messenger.flush()
    }

    /// Returns `true` while sent bytes are still waiting for the socket.
    pub fn has_pending_output(&self) -> bool {
        self.messenger.has_pending_output()
    }

    /// Flushes what the socket will take and stops using the connection.
    ///
    /// The socket itself is released when the `Connection` is dropped.
    pub fn close(&mut self) {
        if !self.open {
            return;
        }
        if let Err(e) = self.messenger.flush() {
            tracing::debug!(conn = %self.id, error = %e, "flush on close failed");
        }
        self.open = false;
        tracing::debug!(conn = %self.id, peer = %self.peer, "connection closed");
    }

    /// Marks the connection dead after a write failure or a hard read
    /// error.
    pub(crate) fn park(&mut self) {
        self.open = false;
    }

    /// Stops reading after the peer's end-of-file. Writes still go out.
    pub(crate) fn shut_read(&mut self) {
        self.reading = false;
    }

    /// Resolves when the socket may have bytes to read.
    pub async fn readable(&self) -> io::Result<()> {
        self.messenger.socket().readable().await
    }

    /// Resolves when the socket may accept more bytes.
    pub async fn writable(&self) -> io::Result<()> {
        self.messenger.socket().writable().await
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("peer", &self.peer)
            .field("open", &self.open)
            .field("reading", &self.reading)
            .finish()
    }
}
