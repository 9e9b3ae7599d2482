//! Stream sockets carrying newline-framed syslog lines.
//!
//! Lines go to a remote collector over TCP (optionally TLS, as used for
//! syslog on port 6514) or to a local daemon over a Unix stream socket such
//! as `/dev/log`.

use std::{
    io::{self, Write},
    net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs},
    path::PathBuf,
    time::Duration,
};

use log::debug;
use native_tls::{TlsConnector, TlsStream};

#[cfg(unix)]
use std::os::unix::net::UnixStream;

use super::{ConnectionError, Transport};

/// Syslog collector a [`SocketTransport`] dials.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Endpoint {
    /// TCP destination with optional TLS.
    Tcp(TcpEndpoint),
    /// Unix domain stream socket.
    Unix(UnixEndpoint),
}

/// Remote syslog collector reached over TCP.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TcpEndpoint {
    /// Collector hostname or IP address.
    pub host: String,
    /// Collector port, conventionally 514 (plain) or 6514 (TLS).
    pub port: u16,
    /// TLS settings; `None` sends lines in clear text.
    pub tls: Option<TlsOptions>,
}

impl TcpEndpoint {
    fn socket_addrs(&self) -> io::Result<Vec<SocketAddr>> {
        (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map(|iter| iter.collect())
    }
}

/// Local syslog daemon listening on a Unix stream socket.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnixEndpoint {
    /// Socket path, for example `/dev/log`.
    pub path: PathBuf,
}

/// TLS settings for a collector accepting syslog over TLS.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TlsOptions {
    /// Name checked against the collector certificate.
    pub domain: String,
    /// Skip certificate validation when true (intended for tests).
    pub insecure_skip_verify: bool,
}

impl TlsOptions {
    fn connector(&self) -> io::Result<TlsConnector> {
        let mut builder = TlsConnector::builder();
        if self.insecure_skip_verify {
            builder.danger_accept_invalid_certs(true);
            builder.danger_accept_invalid_hostnames(true);
        }
        builder.build().map_err(io::Error::other)
    }
}

/// Open stream to the collector; TLS streams are boxed to keep the enum small.
enum ActiveConnection {
    PlainTcp(TcpStream),
    Tls(Box<TlsStream<TcpStream>>),
    #[cfg(unix)]
    Unix(UnixStream),
}

impl ActiveConnection {
    fn set_write_timeout(&mut self, timeout: Duration) -> io::Result<()> {
        match self {
            ActiveConnection::PlainTcp(stream) => stream.set_write_timeout(Some(timeout)),
            ActiveConnection::Tls(stream) => stream.get_ref().set_write_timeout(Some(timeout)),
            #[cfg(unix)]
            ActiveConnection::Unix(stream) => stream.set_write_timeout(Some(timeout)),
        }
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        match self {
            ActiveConnection::PlainTcp(stream) => stream.write_all(buf),
            ActiveConnection::Tls(stream) => stream.write_all(buf),
            #[cfg(unix)]
            ActiveConnection::Unix(stream) => stream.write_all(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            ActiveConnection::PlainTcp(stream) => stream.flush(),
            ActiveConnection::Tls(stream) => stream.flush(),
            #[cfg(unix)]
            ActiveConnection::Unix(stream) => stream.flush(),
        }
    }

    fn shutdown(self) -> io::Result<()> {
        let result = match self {
            ActiveConnection::PlainTcp(stream) => stream.shutdown(Shutdown::Both),
            ActiveConnection::Tls(mut stream) => stream.shutdown(),
            #[cfg(unix)]
            ActiveConnection::Unix(stream) => stream.shutdown(Shutdown::Both),
        };
        match result {
            // The peer may already have gone away.
            Err(err) if err.kind() == io::ErrorKind::NotConnected => Ok(()),
            other => other,
        }
    }
}

fn connect_tcp(config: &TcpEndpoint, timeout: Duration) -> io::Result<TcpStream> {
    let addrs = config.socket_addrs()?;
    let mut last_err = None;
    for addr in addrs {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => {
                stream.set_nonblocking(false)?;
                return Ok(stream);
            }
            Err(err) => last_err = Some(err),
        }
    }
    Err(last_err.unwrap_or_else(|| {
        io::Error::new(
            io::ErrorKind::NotFound,
            format!("no addresses resolved for {}:{}", config.host, config.port),
        )
    }))
}

fn connect_endpoint(endpoint: &Endpoint, timeout: Duration) -> io::Result<ActiveConnection> {
    match endpoint {
        Endpoint::Tcp(config) => {
            let stream = connect_tcp(config, timeout)?;
            if let Some(tls) = &config.tls {
                let connector = tls.connector()?;
                stream.set_read_timeout(Some(timeout))?;
                stream.set_write_timeout(Some(timeout))?;
                let stream = connector
                    .connect(&tls.domain, stream)
                    .map_err(io::Error::other)?;
                let tcp_ref = stream.get_ref();
                tcp_ref.set_read_timeout(None)?;
                tcp_ref.set_write_timeout(None)?;
                Ok(ActiveConnection::Tls(Box::new(stream)))
            } else {
                Ok(ActiveConnection::PlainTcp(stream))
            }
        }
        Endpoint::Unix(config) => {
            // A local socket connects or fails at once, so there is no dial to bound.
            #[cfg(unix)]
            {
                let stream = UnixStream::connect(&config.path)?;
                Ok(ActiveConnection::Unix(stream))
            }
            #[cfg(not(unix))]
            {
                let _ = (config, timeout);
                Err(io::Error::new(
                    io::ErrorKind::Unsupported,
                    "unix domain sockets are not supported on this platform",
                ))
            }
        }
    }
}

/// Blocking transport over a TCP, TLS, or Unix stream socket.
pub struct SocketTransport {
    endpoint: Endpoint,
    write_timeout: Duration,
    connection: Option<ActiveConnection>,
}

impl SocketTransport {
    /// Create an idle transport for `endpoint`.
    pub fn new(endpoint: Endpoint, write_timeout: Duration) -> Self {
        Self {
            endpoint,
            write_timeout,
            connection: None,
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }
}

impl Transport for SocketTransport {
    /// Dial the endpoint. For TCP, `timeout` bounds both the connect and the
    /// TLS handshake; a Unix socket dial does not wait and ignores it. The
    /// configured write timeout applies to every endpoint. An existing
    /// connection is replaced.
    fn connect(&mut self, timeout: Duration) -> Result<(), ConnectionError> {
        if let Some(previous) = self.connection.take()
            && let Err(err) = previous.shutdown()
        {
            debug!("syslog transport: closing stale connection failed: {err}");
        }
        let mut connection = connect_endpoint(&self.endpoint, timeout)?;
        connection.set_write_timeout(self.write_timeout)?;
        self.connection = Some(connection);
        Ok(())
    }

    fn close(&mut self) -> Result<(), ConnectionError> {
        match self.connection.take() {
            Some(connection) => connection.shutdown().map_err(ConnectionError::from),
            None => Ok(()),
        }
    }

    /// Write and flush the whole buffer. A failed write drops the connection
    /// so the next [`connect`](Transport::connect) redials.
    fn write(&mut self, buf: &[u8]) -> Result<usize, ConnectionError> {
        let Some(connection) = self.connection.as_mut() else {
            return Err(ConnectionError::NotConnected);
        };
        let result = connection
            .write_all(buf)
            .and_then(|()| connection.flush());
        match result {
            Ok(()) => Ok(buf.len()),
            Err(err) => {
                self.connection = None;
                Err(err.into())
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.connection.is_some()
    }
}

impl std::fmt::Debug for SocketTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SocketTransport")
            .field("endpoint", &self.endpoint)
            .field("write_timeout", &self.write_timeout)
            .field("connected", &self.connection.is_some())
            .finish()
    }
}
