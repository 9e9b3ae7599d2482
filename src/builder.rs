//! Builder for socket-backed [`SyslogClient`] instances.
//!
//! Collects transport selection, TLS options, syslog defaults and timeouts,
//! validates them, and produces either a [`SyslogOutputConfig`] or a ready
//! client. Connection is left to the caller so construction never blocks.

use std::{path::PathBuf, time::Duration};

use thiserror::Error;

use crate::{
    client::{SyslogClient, resolve_hostname},
    formatter::SyslogDefaults,
    rate_limited_warner::DEFAULT_WARN_INTERVAL,
    transport::{Endpoint, SocketTransport, TcpEndpoint, TlsOptions, UnixEndpoint},
};

/// Program name used when none is configured.
pub const DEFAULT_PROGRAM: &str = "shipper";
/// Facility used when none is configured (user-level messages).
pub const DEFAULT_PRIORITY: u64 = 1;
/// Severity used when none is configured (informational).
pub const DEFAULT_SEVERITY: u64 = 6;
pub use crate::client::DEFAULT_CONNECT_TIMEOUT;
/// Default write timeout applied to socket writes.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(1);

const MAX_FACILITY: u64 = 23;
const MAX_SEVERITY: u64 = 7;

/// Errors that may occur while building a client.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    /// Invalid user supplied configuration.
    #[error("invalid syslog output configuration: {0}")]
    InvalidConfig(String),
}

#[derive(Clone, Debug)]
enum TransportConfig {
    Tcp { host: String, port: u16 },
    Unix { path: PathBuf },
}

#[derive(Clone, Debug, Default)]
struct TlsConfig {
    domain: Option<String>,
    insecure: bool,
}

macro_rules! ensure_positive {
    ($value:expr, $field:expr) => {{
        if $value == 0 {
            Err(BuildError::InvalidConfig(format!(
                "{} must be greater than zero",
                $field
            )))
        } else {
            Ok($value)
        }
    }};
}

macro_rules! ensure_at_most {
    ($value:expr, $max:expr, $field:expr) => {{
        if $value > $max {
            Err(BuildError::InvalidConfig(format!(
                "{} must be at most {}, got {}",
                $field, $max, $value
            )))
        } else {
            Ok($value)
        }
    }};
}

macro_rules! option_setter {
    ($(#[$meta:meta])* $fn_name:ident, $field:ident, $ty:ty) => {
        $(#[$meta])*
        pub fn $fn_name(mut self, value: $ty) -> Self {
            self.$field = Some(value);
            self
        }
    };
}

/// Validated settings for a socket-backed syslog output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyslogOutputConfig {
    pub endpoint: Endpoint,
    pub program: String,
    pub priority: u64,
    pub severity: u64,
    /// Fixed hostname; resolved from the system when `None`.
    pub hostname: Option<String>,
    pub connect_timeout: Duration,
    pub write_timeout: Duration,
    pub warn_interval: Duration,
}

impl SyslogOutputConfig {
    /// Construct an unconnected client from the settings.
    pub fn into_client(self) -> SyslogClient<SocketTransport> {
        let transport = SocketTransport::new(self.endpoint, self.write_timeout);
        let defaults = SyslogDefaults {
            program: self.program,
            priority: self.priority,
            severity: self.severity,
            hostname: self.hostname.unwrap_or_else(resolve_hostname),
        };
        SyslogClient::with_defaults(transport, defaults)
            .with_connect_timeout(self.connect_timeout)
            .with_warn_interval(self.warn_interval)
    }
}

/// Builder for constructing [`SyslogClient`] instances over sockets.
#[derive(Clone, Debug, Default)]
pub struct SyslogClientBuilder {
    transport: Option<TransportConfig>,
    tls: Option<TlsConfig>,
    program: Option<String>,
    priority: Option<u64>,
    severity: Option<u64>,
    hostname: Option<String>,
    connect_timeout_ms: Option<u64>,
    write_timeout_ms: Option<u64>,
    warn_interval_ms: Option<u64>,
}

impl SyslogClientBuilder {
    /// Create a new builder with no transport configured.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the builder to use TCP.
    pub fn with_tcp(mut self, host: impl Into<String>, port: u16) -> Self {
        self.transport = Some(TransportConfig::Tcp {
            host: host.into(),
            port,
        });
        self
    }

    /// Configure the builder to use a Unix domain socket.
    pub fn with_unix_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.transport = Some(TransportConfig::Unix { path: path.into() });
        self
    }

    /// Configure TLS using the provided domain and validation policy.
    ///
    /// The TCP host is presented during the handshake when `domain` is
    /// `None` or blank.
    pub fn with_tls(mut self, domain: Option<String>, insecure: bool) -> Self {
        self.tls = Some(TlsConfig { domain, insecure });
        self
    }

    /// Set the default program name.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = Some(program.into());
        self
    }

    /// Use a fixed hostname instead of resolving it.
    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    option_setter!(
        #[doc = "Set the default syslog facility."]
        with_priority,
        priority,
        u64
    );
    option_setter!(
        #[doc = "Set the default syslog severity."]
        with_severity,
        severity,
        u64
    );
    option_setter!(with_connect_timeout_ms, connect_timeout_ms, u64);
    option_setter!(with_write_timeout_ms, write_timeout_ms, u64);
    option_setter!(with_warn_interval_ms, warn_interval_ms, u64);

    fn validate(&self) -> Result<(), BuildError> {
        self.validate_transport()?;
        self.validate_defaults()?;
        self.validate_timeouts()?;
        Ok(())
    }

    fn validate_transport(&self) -> Result<(), BuildError> {
        match &self.transport {
            None => Err(BuildError::InvalidConfig(
                "syslog output requires a transport".into(),
            )),
            Some(TransportConfig::Unix { .. }) if self.tls.is_some() => Err(
                BuildError::InvalidConfig("tls is only supported for tcp transports".into()),
            ),
            Some(TransportConfig::Tcp { host, .. }) if host.trim().is_empty() => Err(
                BuildError::InvalidConfig("tcp host must not be empty".into()),
            ),
            _ => Ok(()),
        }
    }

    fn validate_defaults(&self) -> Result<(), BuildError> {
        if let Some(program) = &self.program
            && program.trim().is_empty()
        {
            return Err(BuildError::InvalidConfig("program must not be empty".into()));
        }
        if let Some(hostname) = &self.hostname
            && hostname.trim().is_empty()
        {
            return Err(BuildError::InvalidConfig(
                "hostname must not be empty".into(),
            ));
        }
        if let Some(priority) = self.priority {
            ensure_at_most!(priority, MAX_FACILITY, "priority")?;
        }
        if let Some(severity) = self.severity {
            ensure_at_most!(severity, MAX_SEVERITY, "severity")?;
        }
        Ok(())
    }

    fn validate_timeouts(&self) -> Result<(), BuildError> {
        if let Some(timeout) = self.connect_timeout_ms {
            ensure_positive!(timeout, "connect_timeout_ms")?;
        }
        if let Some(timeout) = self.write_timeout_ms {
            ensure_positive!(timeout, "write_timeout_ms")?;
        }
        if let Some(interval) = self.warn_interval_ms {
            ensure_positive!(interval, "warn_interval_ms")?;
        }
        Ok(())
    }

    /// Validate the collected settings.
    pub fn build_config(&self) -> Result<SyslogOutputConfig, BuildError> {
        self.validate()?;
        let endpoint = self
            .transport
            .as_ref()
            .map(|transport| self.build_endpoint(transport))
            .ok_or_else(|| BuildError::InvalidConfig("syslog output requires a transport".into()))?;
        Ok(SyslogOutputConfig {
            endpoint,
            program: self
                .program
                .clone()
                .unwrap_or_else(|| DEFAULT_PROGRAM.to_owned()),
            priority: self.priority.unwrap_or(DEFAULT_PRIORITY),
            severity: self.severity.unwrap_or(DEFAULT_SEVERITY),
            hostname: self.hostname.clone(),
            connect_timeout: self
                .connect_timeout_ms
                .map_or(DEFAULT_CONNECT_TIMEOUT, Duration::from_millis),
            write_timeout: self
                .write_timeout_ms
                .map_or(DEFAULT_WRITE_TIMEOUT, Duration::from_millis),
            warn_interval: self
                .warn_interval_ms
                .map_or(DEFAULT_WARN_INTERVAL, Duration::from_millis),
        })
    }

    /// Validate the settings and construct an unconnected client.
    pub fn build(&self) -> Result<SyslogClient<SocketTransport>, BuildError> {
        Ok(self.build_config()?.into_client())
    }

    fn build_endpoint(&self, transport: &TransportConfig) -> Endpoint {
        match transport {
            TransportConfig::Tcp { host, port } => Endpoint::Tcp(TcpEndpoint {
                host: host.clone(),
                port: *port,
                tls: self.build_tls_options(host),
            }),
            TransportConfig::Unix { path } => Endpoint::Unix(UnixEndpoint { path: path.clone() }),
        }
    }

    fn build_tls_options(&self, host: &str) -> Option<TlsOptions> {
        self.tls.as_ref().map(|tls_cfg| {
            let domain = tls_cfg
                .domain
                .clone()
                .filter(|d| !d.trim().is_empty())
                .unwrap_or_else(|| host.to_owned());
            TlsOptions {
                domain,
                insecure_skip_verify: tls_cfg.insecure,
            }
        })
    }
}
