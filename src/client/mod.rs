//! Syslog output client.
//!
//! [`SyslogClient`] owns the per-output defaults (program, facility, severity
//! and the hostname resolved once at construction) alongside the transport it
//! writes to. It is driven by a single output worker: calls block for the
//! duration of the transport I/O and a client is not shared between threads
//! without external serialisation.

use std::{fmt, sync::Arc, time::Duration};

use log::{debug, warn};

use crate::{
    formatter::{SyslogDefaults, SyslogFormatter},
    metrics::{GlobalShippedLines, ShippedLines},
    rate_limited_warner::RateLimitedWarner,
    transport::{ConnectionError, Transport},
};

mod hostname;
mod publish;


pub use hostname::{UNKNOWN_HOSTNAME, resolve_hostname};
pub use publish::{BatchError, BatchReport, PublishError, RejectedEvent};

/// Timeout used by [`SyslogClient::connect_default`] unless configured.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Client turning events into syslog lines on a transport.
pub struct SyslogClient<T: Transport> {
    transport: T,
    formatter: SyslogFormatter,
    shipped: Arc<dyn ShippedLines>,
    warner: RateLimitedWarner,
    connect_timeout: Duration,
}

impl<T: Transport> SyslogClient<T> {
    /// Create a client, resolving the local hostname once.
    pub fn new(transport: T, program: impl Into<String>, priority: u64, severity: u64) -> Self {
        Self::with_defaults(
            transport,
            SyslogDefaults {
                program: program.into(),
                priority,
                severity,
                hostname: resolve_hostname(),
            },
        )
    }

    /// Create a client from fully specified defaults.
    pub fn with_defaults(transport: T, defaults: SyslogDefaults) -> Self {
        Self {
            transport,
            formatter: SyslogFormatter::new(defaults),
            shipped: Arc::new(GlobalShippedLines),
            warner: RateLimitedWarner::default(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Report shipped lines to `sink` instead of the process-wide counter.
    pub fn with_shipped_lines(mut self, sink: Arc<dyn ShippedLines>) -> Self {
        self.shipped = sink;
        self
    }

    /// Override how often rejected-event warnings are logged.
    pub fn with_warn_interval(mut self, interval: Duration) -> Self {
        self.warner = RateLimitedWarner::new(interval);
        self
    }

    /// Set the timeout used by [`connect_default`](Self::connect_default).
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    pub fn defaults(&self) -> &SyslogDefaults {
        self.formatter.defaults()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    /// Connect the transport; `timeout` bounds the attempt.
    pub fn connect(&mut self, timeout: Duration) -> Result<(), ConnectionError> {
        debug!("syslog: connect (timeout {timeout:?})");
        self.transport.connect(timeout)
    }

    /// Connect the transport using the configured connect timeout.
    pub fn connect_default(&mut self) -> Result<(), ConnectionError> {
        self.connect(self.connect_timeout)
    }

    /// Close the transport connection.
    pub fn close(&mut self) -> Result<(), ConnectionError> {
        debug!("syslog: close connection");
        self.warner.flush(|count| {
            warn!("syslog output rejected {count} malformed events before close");
        });
        self.transport.close()
    }
}

impl<T: Transport> fmt::Debug for SyslogClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyslogClient")
            .field("defaults", self.formatter.defaults())
            .field("connect_timeout", &self.connect_timeout)
            .field("connected", &self.transport.is_connected())
            .finish()
    }
}
