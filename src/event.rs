//! Event representation consumed by the syslog output.
//!
//! Upstream pipeline stages hand the output a loosely typed mapping of field
//! names to values. This module defines that mapping together with typed
//! accessors which turn a missing or mistyped field into a [`FormatError`]
//! naming the field, rather than letting a malformed event take down the
//! publishing thread.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use thiserror::Error;

use crate::formatter::FormatError;

/// Key holding the event instant.
pub const TIMESTAMP_KEY: &str = "@timestamp";
/// Key holding the log line text.
pub const MESSAGE_KEY: &str = "message";
/// Key holding the nested override mapping.
pub const FIELDS_KEY: &str = "fields";
/// Override key replacing the program name.
pub const PROGRAM_FIELD: &str = "program";
/// Override key replacing the syslog facility.
pub const PRIORITY_FIELD: &str = "priority";
/// Override key replacing the syslog severity.
pub const SEVERITY_FIELD: &str = "severity";

/// Nested field mapping.
pub type Fields = BTreeMap<String, Value>;

/// A single loosely typed event value.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Unsigned(u64),
    Float(f64),
    Text(String),
    Timestamp(DateTime<FixedOffset>),
    List(Vec<Value>),
    Map(Fields),
}

impl Value {
    /// Human readable name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Integer(_) => "integer",
            Value::Unsigned(_) => "unsigned integer",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Timestamp(_) => "timestamp",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::Unsigned(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl<Tz: chrono::TimeZone> From<DateTime<Tz>> for Value {
    fn from(value: DateTime<Tz>) -> Self {
        Value::Timestamp(value.fixed_offset())
    }
}

impl From<Fields> for Value {
    fn from(value: Fields) -> Self {
        Value::Map(value)
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Integer(i)
                } else if let Some(u) = n.as_u64() {
                    Value::Unsigned(u)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

/// Per-event overrides of the client defaults.
///
/// Each field is `None` when the event does not carry the override.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Overrides<'a> {
    pub program: Option<&'a str>,
    pub priority: Option<u64>,
    pub severity: Option<u64>,
}

/// Errors raised while ingesting an event from JSON.
#[derive(Debug, Error)]
pub enum EventParseError {
    /// The input was not valid JSON.
    #[error("invalid event json: {0}")]
    Json(#[from] serde_json::Error),
    /// The input was valid JSON but not an object.
    #[error("event must be a json object, found {0}")]
    NotAnObject(&'static str),
}

/// Structured record supplied by the upstream pipeline.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Event {
    fields: Fields,
}

impl Event {
    /// Create an event carrying the two required keys.
    pub fn new<Tz: chrono::TimeZone>(timestamp: DateTime<Tz>, message: impl Into<String>) -> Self {
        let mut event = Self::default();
        event.insert(TIMESTAMP_KEY, Value::from(timestamp));
        event.insert(MESSAGE_KEY, Value::Text(message.into()));
        event
    }

    /// Parse a JSON object into an event.
    ///
    /// A top-level `@timestamp` string holding an RFC3339 instant is promoted
    /// to [`Value::Timestamp`]. Other strings stay text, so an unparsable
    /// timestamp is reported when the event is formatted.
    pub fn from_json(input: &str) -> Result<Self, EventParseError> {
        let parsed: serde_json::Value = serde_json::from_str(input)?;
        let map = match parsed {
            serde_json::Value::Object(map) => map,
            other => return Err(EventParseError::NotAnObject(json_kind(&other))),
        };
        let mut fields: Fields = map.into_iter().map(|(k, v)| (k, Value::from(v))).collect();
        let promoted = match fields.get(TIMESTAMP_KEY) {
            Some(Value::Text(raw)) => DateTime::parse_from_rfc3339(raw).ok(),
            _ => None,
        };
        if let Some(ts) = promoted {
            fields.insert(TIMESTAMP_KEY.to_owned(), Value::Timestamp(ts));
        }
        Ok(Self { fields })
    }

    /// Serialise the event back into a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Insert or replace a top-level field.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(key.into(), value.into())
    }

    /// Look up a top-level field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Remove a top-level field.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }

    /// Set an override inside the nested `fields` mapping, creating it when
    /// absent. A non-map `fields` value is replaced.
    pub fn with_override(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let entry = self
            .fields
            .entry(FIELDS_KEY.to_owned())
            .or_insert_with(|| Value::Map(Fields::new()));
        if !matches!(entry, Value::Map(_)) {
            *entry = Value::Map(Fields::new());
        }
        if let Value::Map(map) = entry {
            map.insert(key.into(), value.into());
        }
        self
    }

    /// Number of top-level fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the event holds no fields at all.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Required event instant.
    pub fn timestamp(&self) -> Result<DateTime<FixedOffset>, FormatError> {
        match self.fields.get(TIMESTAMP_KEY) {
            Some(Value::Timestamp(ts)) => Ok(*ts),
            Some(other) => Err(FormatError::wrong_type(TIMESTAMP_KEY, "timestamp", other)),
            None => Err(FormatError::missing(TIMESTAMP_KEY)),
        }
    }

    /// Required message text.
    pub fn message(&self) -> Result<&str, FormatError> {
        match self.fields.get(MESSAGE_KEY) {
            Some(Value::Text(text)) => Ok(text),
            Some(other) => Err(FormatError::wrong_type(MESSAGE_KEY, "text", other)),
            None => Err(FormatError::missing(MESSAGE_KEY)),
        }
    }

    /// Overrides carried in the optional `fields` mapping.
    pub fn overrides(&self) -> Result<Overrides<'_>, FormatError> {
        let map = match self.fields.get(FIELDS_KEY) {
            None => return Ok(Overrides::default()),
            Some(Value::Map(map)) => map,
            Some(other) => return Err(FormatError::wrong_type(FIELDS_KEY, "map", other)),
        };

        let program = match map.get(PROGRAM_FIELD) {
            None => None,
            Some(Value::Text(text)) => Some(text.as_str()),
            Some(other) => {
                return Err(FormatError::wrong_type(
                    override_path(PROGRAM_FIELD),
                    "text",
                    other,
                ));
            }
        };
        Ok(Overrides {
            program,
            priority: integer_override(map, PRIORITY_FIELD)?,
            severity: integer_override(map, SEVERITY_FIELD)?,
        })
    }
}

fn override_path(key: &str) -> String {
    format!("{FIELDS_KEY}.{key}")
}

fn integer_override(map: &Fields, key: &str) -> Result<Option<u64>, FormatError> {
    match map.get(key) {
        None => Ok(None),
        Some(Value::Unsigned(u)) => Ok(Some(*u)),
        Some(Value::Integer(i)) => u64::try_from(*i)
            .map(Some)
            .map_err(|_| FormatError::NegativeValue {
                field: override_path(key),
                value: *i,
            }),
        Some(other) => Err(FormatError::wrong_type(
            override_path(key),
            "integer",
            other,
        )),
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.message() {
            Ok(message) => write!(f, "Event({message:?})"),
            Err(_) => write!(f, "Event(<{} fields>)", self.fields.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Tests for typed event access.

    use super::*;
    use chrono::{TimeZone, Utc};
    use rstest::rstest;

    fn boot_event() -> Event {
        Event::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(), "boot ok")
    }

    #[rstest]
    fn accessors_return_required_fields() {
        let event = boot_event();
        assert_eq!(event.message().expect("message"), "boot ok");
        assert_eq!(
            event.timestamp().expect("timestamp").to_rfc3339(),
            "2024-01-01T00:00:00+00:00"
        );
        assert_eq!(event.overrides().expect("overrides"), Overrides::default());
    }

    #[rstest]
    fn missing_message_names_the_field() {
        let mut event = boot_event();
        event.remove(MESSAGE_KEY);
        let err = event.message().expect_err("message is absent");
        assert_eq!(err.field(), MESSAGE_KEY);
        assert!(matches!(err, FormatError::MissingField { .. }));
    }

    #[rstest]
    fn text_timestamp_is_a_type_error() {
        let mut event = boot_event();
        event.insert(TIMESTAMP_KEY, "yesterday");
        let err = event.timestamp().expect_err("text is not a timestamp");
        assert!(
            matches!(err, FormatError::WrongType { ref found, .. } if found == "text"),
            "unexpected error {err:?}"
        );
    }

    #[rstest]
    #[case(Value::Integer(3), Some(3))]
    #[case(Value::Unsigned(5), Some(5))]
    fn integer_overrides_accept_signed_and_unsigned(
        #[case] value: Value,
        #[case] expected: Option<u64>,
    ) {
        let event = boot_event().with_override(PRIORITY_FIELD, value);
        assert_eq!(event.overrides().expect("overrides").priority, expected);
    }

    #[rstest]
    fn negative_override_is_rejected() {
        let event = boot_event().with_override(SEVERITY_FIELD, -1i64);
        let err = event.overrides().expect_err("negative severity");
        assert_eq!(err.field(), "fields.severity");
    }

    #[rstest]
    fn program_override_must_be_text() {
        let event = boot_event().with_override(PROGRAM_FIELD, 7i64);
        let err = event.overrides().expect_err("numeric program");
        assert_eq!(err.field(), "fields.program");
    }

    #[rstest]
    fn non_map_fields_is_rejected() {
        let mut event = boot_event();
        event.insert(FIELDS_KEY, "program=kernel");
        let err = event.overrides().expect_err("fields must be a map");
        assert_eq!(err.field(), FIELDS_KEY);
    }

    #[rstest]
    fn from_json_promotes_timestamp() {
        let event = Event::from_json(
            r#"{"@timestamp":"2024-01-01T02:00:00+02:00","message":"hi","fields":{"priority":0}}"#,
        )
        .expect("valid event");
        let ts = event.timestamp().expect("timestamp");
        assert_eq!(ts.with_timezone(&Utc), Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(event.overrides().expect("overrides").priority, Some(0));
    }

    #[rstest]
    fn from_json_keeps_unparsable_timestamp_as_text() {
        let event = Event::from_json(r#"{"@timestamp":"soon","message":"hi"}"#).expect("json");
        assert_eq!(event.get(TIMESTAMP_KEY), Some(&Value::Text("soon".into())));
    }

    #[rstest]
    #[case("[1, 2]", "array")]
    #[case("\"text\"", "string")]
    fn from_json_requires_object(#[case] input: &str, #[case] kind: &str) {
        let err = Event::from_json(input).expect_err("not an object");
        assert!(matches!(err, EventParseError::NotAnObject(k) if k == kind));
    }

    #[rstest]
    fn to_json_renders_timestamp_as_rfc3339() {
        let json = boot_event().to_json().expect("serialise");
        let reparsed = Event::from_json(&json).expect("reparse");
        assert_eq!(reparsed, boot_event());
    }
}
