//! Publisher loop writing batches of events through the transport.

use log::{debug, warn};
use thiserror::Error;

use crate::{
    event::Event,
    formatter::{EventFormatter, FormatError},
    metrics::ShippedLines,
    transport::{ConnectionError, Transport},
};

use super::SyslogClient;

/// An event excluded from the output because it could not be formatted.
#[derive(Clone, Debug, PartialEq)]
pub struct RejectedEvent {
    /// Position of the event in the submitted batch.
    pub index: usize,
    pub event: Event,
    pub error: FormatError,
}

/// Outcome of a batch whose every formattable event was written.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchReport {
    /// Lines written to the transport.
    pub published: usize,
    /// Events skipped because formatting failed, in input order.
    pub rejected: Vec<RejectedEvent>,
}

impl BatchReport {
    /// True when every event in the batch was written.
    pub fn is_complete(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// A batch halted by a transport failure.
#[derive(Debug, Error)]
#[error(
    "transport write failed after {} lines; {} events unsent",
    .report.published,
    .unsent.len()
)]
pub struct BatchError {
    /// Progress made before the failure.
    pub report: BatchReport,
    /// The event whose write failed followed by every later event.
    pub unsent: Vec<Event>,
    #[source]
    pub source: ConnectionError,
}

/// Failure publishing a single event.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error(transparent)]
    Connection(#[from] ConnectionError),
}

fn write_line<T: Transport>(transport: &mut T, line: &[u8]) -> Result<(), ConnectionError> {
    let written = transport.write(line)?;
    if written != line.len() {
        return Err(ConnectionError::ShortWrite {
            written,
            expected: line.len(),
        });
    }
    Ok(())
}

impl<T: Transport> SyslogClient<T> {
    /// Publish `events` in order, one line per event.
    ///
    /// Events that fail to format are reported in [`BatchReport::rejected`]
    /// and skipped; the rest of the batch continues. The first transport
    /// failure stops the batch and returns the failing event and everything
    /// after it as [`BatchError::unsent`].
    pub fn publish_events(&mut self, events: Vec<Event>) -> Result<BatchReport, BatchError> {
        let mut report = BatchReport::default();
        let mut pending = events.into_iter().enumerate();

        while let Some((index, event)) = pending.next() {
            let line = match self.formatter.format(&event) {
                Ok(line) => line,
                Err(error) => {
                    debug!("syslog: rejecting event {index}: {error}");
                    self.warner.record_drop();
                    self.warner.warn_if_due(|count| {
                        warn!("syslog output rejected {count} malformed events; last error: {error}");
                    });
                    report.rejected.push(RejectedEvent {
                        index,
                        event,
                        error,
                    });
                    continue;
                }
            };

            if let Err(source) = write_line(&mut self.transport, line.as_bytes()) {
                let mut unsent = Vec::with_capacity(pending.len() + 1);
                unsent.push(event);
                unsent.extend(pending.map(|(_, event)| event));
                return Err(BatchError {
                    report,
                    unsent,
                    source,
                });
            }

            self.shipped.add(1);
            report.published += 1;
        }

        Ok(report)
    }

    /// Publish a single event.
    pub fn publish_event(&mut self, event: Event) -> Result<(), PublishError> {
        match self.publish_events(vec![event]) {
            Ok(mut report) => match report.rejected.pop() {
                Some(rejected) => Err(PublishError::Format(rejected.error)),
                None => Ok(()),
            },
            Err(err) => Err(PublishError::Connection(err.source)),
        }
    }
}
