//! Syslog output stage for a log-shipping pipeline.
//!
//! Converts loosely typed [`Event`]s into framed syslog lines
//! (`<PRI>TIMESTAMP HOSTNAME PROGRAM: MESSAGE\n`) and writes them, one line
//! per event and in order, over a blocking [`Transport`]. Malformed events are
//! reported per event instead of being dropped silently, and a transport
//! failure halts the batch and hands back everything not yet written.

pub mod builder;
pub mod client;
pub mod event;
pub mod file_config;
pub mod formatter;
pub mod metrics;
pub mod rate_limited_warner;
pub mod transport;

#[cfg(any(test, feature = "test-util"))]
pub mod test_utils;

pub use builder::{BuildError, SyslogClientBuilder, SyslogOutputConfig};
pub use client::{
    BatchError, BatchReport, PublishError, RejectedEvent, SyslogClient, UNKNOWN_HOSTNAME,
    resolve_hostname,
};
pub use event::{Event, EventParseError, Overrides, Value};
pub use file_config::{ConfigError, load_ini_file, load_output_config, parse_ini_str};
pub use formatter::{
    EventFormatter, FormatError, SyslogDefaults, SyslogFormatter, format_line, pri_token,
};
pub use metrics::{
    GlobalShippedLines, SHIPPED_LINES_METRIC, ShippedLineCounter, ShippedLines, shipped_lines,
};
pub use transport::{
    ConnectionError, Endpoint, SocketTransport, TcpEndpoint, TlsOptions, Transport, UnixEndpoint,
};
