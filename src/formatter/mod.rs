//! Syslog line formatting.
//!
//! Provides the [`EventFormatter`] trait alongside [`SyslogFormatter`], which
//! renders an [`Event`] as a single newline-terminated line of the form
//! `<PRI>TIMESTAMP HOSTNAME PROGRAM: MESSAGE`. Formatting is pure: the same
//! event and defaults always yield the same bytes, and nothing outside the
//! call is read or written.

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};

use crate::event::Event;

mod error;
mod pri;

pub use error::FormatError;
pub use pri::pri_token;

/// Fallback values applied when an event carries no override.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyslogDefaults {
    /// Program name written after the hostname.
    pub program: String,
    /// Syslog facility.
    pub priority: u64,
    /// Syslog severity.
    pub severity: u64,
    /// Hostname written after the timestamp.
    pub hostname: String,
}

/// Trait for formatting events into wire lines.
///
/// Implementors must be thread-safe (`Send + Sync`) so a formatter can be
/// shared between output workers.
pub trait EventFormatter: Send + Sync {
    /// Format an event into a complete line, including the trailing newline.
    fn format(&self, event: &Event) -> Result<String, FormatError>;
}

/// Formatter bound to a client's defaults.
#[derive(Clone, Debug)]
pub struct SyslogFormatter {
    defaults: SyslogDefaults,
}

impl SyslogFormatter {
    pub fn new(defaults: SyslogDefaults) -> Self {
        Self { defaults }
    }

    pub fn defaults(&self) -> &SyslogDefaults {
        &self.defaults
    }
}

impl EventFormatter for SyslogFormatter {
    fn format(&self, event: &Event) -> Result<String, FormatError> {
        format_line(event, &self.defaults)
    }
}

impl<F: EventFormatter + ?Sized> EventFormatter for Arc<F> {
    fn format(&self, event: &Event) -> Result<String, FormatError> {
        (**self).format(event)
    }
}

impl<F: EventFormatter + ?Sized> EventFormatter for Box<F> {
    fn format(&self, event: &Event) -> Result<String, FormatError> {
        (**self).format(event)
    }
}

/// Render `event` as a syslog line using `defaults` where no override exists.
pub fn format_line(event: &Event, defaults: &SyslogDefaults) -> Result<String, FormatError> {
    let timestamp = event
        .timestamp()?
        .with_timezone(&Utc)
        .to_rfc3339_opts(SecondsFormat::Secs, true);

    let overrides = event.overrides()?;
    let program = overrides.program.unwrap_or(&defaults.program);
    let priority = overrides.priority.unwrap_or(defaults.priority);
    let severity = overrides.severity.unwrap_or(defaults.severity);
    let pri = pri_token(priority, severity)?;

    let message = event.message()?;

    let mut line = String::with_capacity(
        pri.len() + timestamp.len() + defaults.hostname.len() + program.len() + message.len() + 8,
    );
    line.push('<');
    line.push_str(&pri);
    line.push('>');
    line.push_str(&timestamp);
    line.push(' ');
    line.push_str(&defaults.hostname);
    line.push(' ');
    line.push_str(program);
    line.push_str(": ");
    line.push_str(message);
    line.push('\n');
    Ok(line)
}
