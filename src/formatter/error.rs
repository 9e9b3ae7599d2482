//! Errors raised while turning an event into a syslog line.

use thiserror::Error;

use crate::event::Value;

/// Reasons an event cannot be rendered as a syslog line.
///
/// Every variant names the offending field so callers can report which part
/// of the event was malformed.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    /// A required field is absent.
    #[error("event is missing required field `{field}`")]
    MissingField { field: String },
    /// A field is present but holds the wrong kind of value.
    #[error("event field `{field}` must be {expected}, found {found}")]
    WrongType {
        field: String,
        expected: &'static str,
        found: String,
    },
    /// An integer override is negative.
    #[error("event field `{field}` must not be negative, found {value}")]
    NegativeValue { field: String, value: i64 },
    /// `priority * 8 + severity` does not fit in 64 bits.
    #[error("pri value overflows for priority {priority} and severity {severity}")]
    PriorityOverflow { priority: u64, severity: u64 },
}

impl FormatError {
    pub(crate) fn missing(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    pub(crate) fn wrong_type(field: impl Into<String>, expected: &'static str, found: &Value) -> Self {
        Self::WrongType {
            field: field.into(),
            expected,
            found: found.kind().to_owned(),
        }
    }

    /// Path of the field that caused the failure.
    ///
    /// Overflow is attributed to the priority since it scales the sum.
    pub fn field(&self) -> &str {
        match self {
            Self::MissingField { field }
            | Self::WrongType { field, .. }
            | Self::NegativeValue { field, .. } => field,
            Self::PriorityOverflow { .. } => "priority",
        }
    }
}
