//! Byte-stream transports used to deliver syslog lines.
//!
//! The client only relies on the [`Transport`] trait: connect, close, and a
//! blocking write. [`SocketTransport`] implements it over TCP (optionally
//! wrapped in TLS) and Unix domain sockets.

use std::{io, time::Duration};

use thiserror::Error;

mod socket;


pub use socket::{Endpoint, SocketTransport, TcpEndpoint, TlsOptions, UnixEndpoint};

/// Transport-level failure while connecting, writing, or closing.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// A write or close was attempted without an active connection.
    #[error("syslog client is not connected")]
    NotConnected,
    /// The underlying socket reported an error.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// The transport accepted only part of a line.
    #[error("short write: {written} of {expected} bytes sent")]
    ShortWrite { written: usize, expected: usize },
}

/// Blocking byte-stream collaborator driven by the client.
///
/// Implementations own connection state. Callers serialise access; a single
/// transport is never written from two threads at once.
pub trait Transport: Send {
    /// Establish the connection, bounding the attempt by `timeout`.
    ///
    /// Local transports that connect or fail without waiting on a peer, such
    /// as Unix domain sockets, may ignore `timeout` for the dial itself.
    fn connect(&mut self, timeout: Duration) -> Result<(), ConnectionError>;

    /// Release the connection. Closing an idle transport succeeds.
    fn close(&mut self) -> Result<(), ConnectionError>;

    /// Send `buf`, returning the number of bytes written.
    fn write(&mut self, buf: &[u8]) -> Result<usize, ConnectionError>;

    /// Whether a connection is currently established.
    fn is_connected(&self) -> bool;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn connect(&mut self, timeout: Duration) -> Result<(), ConnectionError> {
        (**self).connect(timeout)
    }

    fn close(&mut self) -> Result<(), ConnectionError> {
        (**self).close()
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize, ConnectionError> {
        (**self).write(buf)
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }
}
