//! Line framing properties of the syslog formatter.

use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;
use rstest::rstest;
use syslog_shipper::{
    Event, EventFormatter, FormatError, SyslogDefaults, SyslogFormatter, format_line,
    event::{PRIORITY_FIELD, PROGRAM_FIELD, SEVERITY_FIELD},
};

mod test_utils;
use test_utils::{defaults, event};

#[rstest]
fn kernel_override_keeps_zero_marker() {
    let event = event("boot ok")
        .with_override(PROGRAM_FIELD, "kernel")
        .with_override(PRIORITY_FIELD, 0i64)
        .with_override(SEVERITY_FIELD, 6i64);
    let line = format_line(&event, &defaults()).expect("format");
    assert_eq!(line, "<06>2024-01-01T00:00:00Z host kernel: boot ok\n");
}

#[rstest]
fn client_defaults_without_overrides() {
    let line = format_line(&event("boot ok"), &defaults()).expect("format");
    assert_eq!(line, "<11>2024-01-01T00:00:00Z host app: boot ok\n");
}

#[rstest]
fn zero_priority_and_severity_render_bare_zero() {
    let event = event("panic")
        .with_override(PRIORITY_FIELD, 0u64)
        .with_override(SEVERITY_FIELD, 0u64);
    let line = format_line(&event, &defaults()).expect("format");
    assert!(line.starts_with("<0>"), "unexpected line {line:?}");
}

#[rstest]
fn json_events_format_like_constructed_ones() {
    let event = Event::from_json(
        r#"{"@timestamp":"2024-01-01T00:00:00.123Z","message":"boot ok","fields":{"program":"kernel","priority":0,"severity":6}}"#,
    )
    .expect("json event");
    let line = format_line(&event, &defaults()).expect("format");
    assert_eq!(line, "<06>2024-01-01T00:00:00Z host kernel: boot ok\n");
}

#[rstest]
fn unparsable_json_timestamp_is_a_format_error() {
    let event = Event::from_json(r#"{"@timestamp":"tomorrow","message":"m"}"#).expect("json");
    let err = format_line(&event, &defaults()).expect_err("bad timestamp");
    assert_eq!(err.field(), "@timestamp");
    assert!(matches!(err, FormatError::WrongType { .. }));
}

fn arb_timestamp() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..4_102_444_800).prop_map(|secs| Utc.timestamp_opt(secs, 0).unwrap())
}

proptest! {
    #[test]
    fn framing_recovers_pri_program_and_message(
        ts in arb_timestamp(),
        message in "[^\n]*",
        program in "[a-zA-Z][a-zA-Z0-9_-]{0,15}",
        priority in 0u64..24,
        severity in 0u64..8,
    ) {
        let formatter = SyslogFormatter::new(SyslogDefaults {
            program: program.clone(),
            priority,
            severity,
            hostname: "host".into(),
        });
        let line = formatter.format(&Event::new(ts, message.clone())).unwrap();

        prop_assert!(line.ends_with('\n'));
        prop_assert_eq!(line.matches('\n').count(), message.matches('\n').count() + 1);

        let body = line.strip_prefix('<').unwrap();
        let (pri, rest) = body.split_once('>').unwrap();
        let expected_pri = syslog_shipper::pri_token(priority, severity).unwrap();
        prop_assert_eq!(pri, expected_pri.as_str());

        let (header, tail) = rest.split_once(": ").unwrap();
        prop_assert_eq!(tail.strip_suffix('\n').unwrap(), message.as_str());
        let host_and_program = format!(" host {program}");
        prop_assert!(header.ends_with(&host_and_program));
    }

    #[test]
    fn overrides_take_precedence(
        priority in 1u64..24,
        severity in 0u64..8,
        program in "[a-z]{1,8}",
    ) {
        let event = event("m")
            .with_override(PROGRAM_FIELD, program.clone())
            .with_override(PRIORITY_FIELD, priority)
            .with_override(SEVERITY_FIELD, severity);
        let line = format_line(&event, &defaults()).unwrap();
        let expected = format!(
            "<{}>2024-01-01T00:00:00Z host {program}: m\n",
            priority * 8 + severity
        );
        prop_assert_eq!(line, expected);
    }

    #[test]
    fn formatting_is_deterministic(ts in arb_timestamp(), message in ".*") {
        let event = Event::new(ts, message);
        let first = format_line(&event, &defaults()).unwrap();
        let second = format_line(&event, &defaults()).unwrap();
        prop_assert_eq!(first, second);
    }
}
