//! Transport layer for Switchboard.
//!
//! Provides the listening endpoint ([`TcpTransport`]), connection identity
//! ([`ConnectionId`]), and the [`Socket`] seam that the framing layer reads
//! and writes through.
//!
//! Everything here is non-blocking: reads and writes either make progress
//! immediately or report [`std::io::ErrorKind::WouldBlock`]. Waiting for
//! readiness is the event loop's job, not the socket's.

mod error;
mod tcp;

pub use error::TransportError;
pub use tcp::TcpTransport;

use std::fmt;
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identifier for a connection.
///
/// Plays the role a file descriptor plays for an epoll loop: the event loop
/// tags every decoded message with the id of the connection it came from,
/// and handlers use it to find the owning player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Allocates the next process-unique id.
    pub fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// A byte stream that can be read and written without blocking.
///
/// Both methods follow the `try_*` convention of `tokio::net::TcpStream`:
/// `Ok(0)` from `try_read` means the peer closed the stream, and
/// `WouldBlock` means "nothing right now, come back after readiness".
///
/// There is no peek: framing is done with an explicit
/// header/payload state machine on top of plain reads.
pub trait Socket: Send + Sync + 'static {
    /// Reads whatever is available into `buf`.
    fn try_read(&self, buf: &mut [u8]) -> io::Result<usize>;

    /// Writes as much of `buf` as the socket will take right now.
    fn try_write(&self, buf: &[u8]) -> io::Result<usize>;
}

impl Socket for tokio::net::TcpStream {
    fn try_read(&self, buf: &mut [u8]) -> io::Result<usize> {
        tokio::net::TcpStream::try_read(self, buf)
    }

    fn try_write(&self, buf: &[u8]) -> io::Result<usize> {
        tokio::net::TcpStream::try_write(self, buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_new_and_into_inner() {
        let id = ConnectionId::new(42);
        assert_eq!(id.into_inner(), 42);
    }

    #[test]
    fn test_connection_id_display() {
        let id = ConnectionId::new(7);
        assert_eq!(id.to_string(), "conn-7");
    }

    #[test]
    fn test_connection_id_next_is_unique_and_increasing() {
        let a = ConnectionId::next();
        let b = ConnectionId::next();
        assert_ne!(a, b);
        assert!(b > a);
    }

    #[test]
    fn test_connection_id_hash_works_as_map_key() {
        use std::collections::HashMap;
        let mut map = HashMap::new();
        map.insert(ConnectionId::new(1), "alice");
        map.insert(ConnectionId::new(2), "bob");
        assert_eq!(map[&ConnectionId::new(1)], "alice");
    }
}
