//! A transport that records writes in memory for test assertions.

use std::{io, sync::Arc, time::Duration};

use parking_lot::Mutex;

use crate::transport::{ConnectionError, Transport};

#[derive(Debug, Default)]
struct State {
    connected: bool,
    refuse_connect: bool,
    fail_after: Option<usize>,
    short_writes: bool,
    writes: Vec<Vec<u8>>,
    connects: usize,
    closes: usize,
    last_timeout: Option<Duration>,
}

/// In-memory [`Transport`] whose clones share state.
///
/// Keep a clone outside the client to inspect what was written.
#[derive(Clone, Debug, Default)]
pub struct MemoryTransport {
    state: Arc<Mutex<State>>,
}

impl MemoryTransport {
    /// Create an idle transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every write after `writes` successful ones with a broken pipe.
    pub fn fail_after(self, writes: usize) -> Self {
        self.state.lock().fail_after = Some(writes);
        self
    }

    /// Accept only half of every buffer.
    pub fn with_short_writes(self) -> Self {
        self.state.lock().short_writes = true;
        self
    }

    /// Refuse every connection attempt.
    pub fn refuse_connections(self) -> Self {
        self.state.lock().refuse_connect = true;
        self
    }

    /// Every successful write, decoded as UTF-8.
    pub fn lines(&self) -> Vec<String> {
        self.state
            .lock()
            .writes
            .iter()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
            .collect()
    }

    /// Number of successful writes.
    pub fn write_count(&self) -> usize {
        self.state.lock().writes.len()
    }

    pub fn connect_count(&self) -> usize {
        self.state.lock().connects
    }

    pub fn close_count(&self) -> usize {
        self.state.lock().closes
    }

    /// Timeout passed to the most recent `connect` call.
    pub fn last_connect_timeout(&self) -> Option<Duration> {
        self.state.lock().last_timeout
    }
}

impl Transport for MemoryTransport {
    fn connect(&mut self, timeout: Duration) -> Result<(), ConnectionError> {
        let mut state = self.state.lock();
        state.connects += 1;
        state.last_timeout = Some(timeout);
        if state.refuse_connect {
            return Err(io::Error::new(io::ErrorKind::ConnectionRefused, "refused").into());
        }
        state.connected = true;
        Ok(())
    }

    fn close(&mut self) -> Result<(), ConnectionError> {
        let mut state = self.state.lock();
        state.closes += 1;
        state.connected = false;
        Ok(())
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize, ConnectionError> {
        let mut state = self.state.lock();
        if !state.connected {
            return Err(ConnectionError::NotConnected);
        }
        if state.fail_after.is_some_and(|limit| state.writes.len() >= limit) {
            state.connected = false;
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "peer went away").into());
        }
        let accepted = if state.short_writes {
            buf.len() / 2
        } else {
            buf.len()
        };
        state.writes.push(buf[..accepted].to_vec());
        Ok(accepted)
    }

    fn is_connected(&self) -> bool {
        self.state.lock().connected
    }
}
