//! Fixtures shared by the integration tests.
#![allow(dead_code)]

use std::{sync::Arc, time::Duration};

use chrono::{TimeZone, Utc};
use rstest::fixture;
use syslog_shipper::{
    Event, ShippedLineCounter, SyslogClient, SyslogDefaults, test_utils::MemoryTransport,
};

/// A connected client writing to memory, its transport handle and its
/// private shipped-line counter.
pub struct MemoryOutput {
    pub client: SyslogClient<MemoryTransport>,
    pub transport: MemoryTransport,
    pub counter: Arc<ShippedLineCounter>,
}

/// Client defaults used throughout the integration tests.
pub fn defaults() -> SyslogDefaults {
    SyslogDefaults {
        program: "app".into(),
        priority: 1,
        severity: 3,
        hostname: "host".into(),
    }
}

/// Build a connected [`MemoryOutput`] around `transport`.
pub fn memory_output_with(transport: MemoryTransport) -> MemoryOutput {
    let counter = Arc::new(ShippedLineCounter::new());
    let mut client = SyslogClient::with_defaults(transport.clone(), defaults())
        .with_shipped_lines(counter.clone());
    client
        .connect(Duration::from_secs(1))
        .expect("memory transport connects");
    MemoryOutput {
        client,
        transport,
        counter,
    }
}

#[fixture]
pub fn memory_output() -> MemoryOutput {
    memory_output_with(MemoryTransport::new())
}

/// An event stamped at the start of 2024.
pub fn event(message: &str) -> Event {
    Event::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(), message)
}
