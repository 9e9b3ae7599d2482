//! Benchmarks for syslog line formatting and batch publishing.

use std::time::Duration;

use chrono::{TimeZone, Utc};
use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use syslog_shipper::{
    Event, ShippedLineCounter, SyslogClient, SyslogDefaults, event::PRIORITY_FIELD,
    format_line, test_utils::MemoryTransport,
};

fn defaults() -> SyslogDefaults {
    SyslogDefaults {
        program: "bench".into(),
        priority: 1,
        severity: 6,
        hostname: "bench-host".into(),
    }
}

fn sample_event(i: usize) -> Event {
    let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    Event::new(ts, format!("GET /api/items/{i} 200 12ms"))
}

fn bench_format(c: &mut Criterion) {
    let defaults = defaults();
    let plain = sample_event(1);
    let overridden = sample_event(2).with_override(PRIORITY_FIELD, 0i64);

    c.bench_function("format_line/defaults", |b| {
        b.iter(|| format_line(black_box(&plain), black_box(&defaults)))
    });
    c.bench_function("format_line/overrides", |b| {
        b.iter(|| format_line(black_box(&overridden), black_box(&defaults)))
    });
}

fn bench_publish(c: &mut Criterion) {
    let counter = std::sync::Arc::new(ShippedLineCounter::new());
    c.bench_function("publish_events/100", |b| {
        b.iter_batched(
            || {
                let mut client = SyslogClient::with_defaults(MemoryTransport::new(), defaults())
                    .with_shipped_lines(counter.clone());
                client
                    .connect(Duration::from_secs(1))
                    .expect("memory transport connects");
                let events: Vec<_> = (0..100).map(sample_event).collect();
                (client, events)
            },
            |(mut client, events)| client.publish_events(events),
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_format, bench_publish);
criterion_main!(benches);
