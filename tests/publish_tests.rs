//! Publish contract of the syslog client over an in-memory transport.

use proptest::prelude::*;
use rstest::rstest;
use serial_test::serial;
use syslog_shipper::{
    ConnectionError, Event, FormatError, PublishError, SyslogClient, shipped_lines,
    event::MESSAGE_KEY, test_utils::MemoryTransport,
};

mod test_utils;
use test_utils::{MemoryOutput, defaults, event, memory_output, memory_output_with};

fn without_message(message: &str) -> Event {
    let mut event = event(message);
    event.remove(MESSAGE_KEY);
    event
}

#[rstest]
fn missing_message_does_not_stop_the_batch(mut memory_output: MemoryOutput) {
    let report = memory_output
        .client
        .publish_events(vec![
            event("first"),
            without_message("broken"),
            event("last"),
        ])
        .expect("format errors are reported, not raised");

    assert_eq!(report.published, 2);
    assert_eq!(report.rejected.len(), 1);
    assert_eq!(report.rejected[0].index, 1);
    assert!(matches!(
        report.rejected[0].error,
        FormatError::MissingField { ref field } if field == MESSAGE_KEY
    ));
    let lines = memory_output.transport.lines();
    assert!(lines[0].ends_with("app: first\n"));
    assert!(lines[1].ends_with("app: last\n"));
}

#[rstest]
fn transport_failure_returns_remaining_events() {
    let mut output = memory_output_with(MemoryTransport::new().fail_after(2));
    let events: Vec<_> = ["a", "b", "c", "d", "e"].into_iter().map(event).collect();

    let err = output
        .client
        .publish_events(events.clone())
        .expect_err("third write fails");

    assert_eq!(err.report.published, 2);
    assert_eq!(err.unsent, events[2..].to_vec());
    assert!(matches!(err.source, ConnectionError::Io(_)));
    assert_eq!(output.counter.get(), 2);
    assert!(err.to_string().contains("3 events unsent"));
}

#[rstest]
fn reconnect_after_failure_resumes_publishing() {
    let mut output = memory_output_with(MemoryTransport::new().fail_after(1));
    let err = output
        .client
        .publish_events(vec![event("a"), event("b")])
        .expect_err("second write fails");
    assert!(!output.client.is_connected());

    output
        .client
        .connect(std::time::Duration::from_millis(100))
        .expect("reconnect");
    assert_eq!(output.transport.connect_count(), 2);
    // The memory transport keeps failing past its limit, so the retry fails
    // again and hands the same event back.
    let retry = output
        .client
        .publish_events(err.unsent)
        .expect_err("still failing");
    assert_eq!(retry.unsent.len(), 1);
}

#[rstest]
fn publish_event_reports_each_failure_kind(mut memory_output: MemoryOutput) {
    memory_output
        .client
        .publish_event(event("ok"))
        .expect("publish");
    let err = memory_output
        .client
        .publish_event(without_message("bad"))
        .expect_err("format failure");
    assert!(matches!(err, PublishError::Format(_)));

    memory_output.client.close().expect("close");
    let err = memory_output
        .client
        .publish_event(event("late"))
        .expect_err("closed");
    assert!(matches!(
        err,
        PublishError::Connection(ConnectionError::NotConnected)
    ));
}

#[rstest]
#[serial]
fn default_sink_is_the_process_counter() {
    let transport = MemoryTransport::new();
    let mut client = SyslogClient::with_defaults(transport, defaults());
    client
        .connect(std::time::Duration::from_secs(1))
        .expect("connect");

    let before = shipped_lines().get();
    client
        .publish_events(vec![event("x"), event("y")])
        .expect("publish");
    assert!(shipped_lines().get() >= before + 2);
}

proptest! {
    #[test]
    fn healthy_transport_writes_every_event_in_order(
        messages in proptest::collection::vec("[a-z0-9 ]{0,12}", 0..20)
    ) {
        let mut output = memory_output_with(MemoryTransport::new());
        let events: Vec<_> = messages.iter().map(|m| event(m)).collect();

        let report = output.client.publish_events(events).unwrap();

        prop_assert_eq!(report.published, messages.len());
        prop_assert!(report.is_complete());
        prop_assert_eq!(output.counter.get(), messages.len() as u64);
        let written: Vec<String> = output
            .transport
            .lines()
            .into_iter()
            .map(|line| line.split_once(": ").unwrap().1.trim_end_matches('\n').to_owned())
            .collect();
        prop_assert_eq!(written, messages);
    }
}
