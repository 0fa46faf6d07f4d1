use crate::reading::Reading;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;
use thiserror::Error;

/// Display metadata for a numeric quantity. Never enforced on fetched values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldBounds {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl FieldBounds {
    const fn new(min: f64, max: f64, step: f64) -> Self {
        Self { min, max, step }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    Numeric(FieldBounds),
    Timestamp,
}

pub const READING_TIME_KEY: &str = "readingTime";

const ISO8601_WITH_OFFSET: &str = "%Y-%m-%dT%H:%M:%S%.f%z";
const ISO8601_NAIVE: &str = "%Y-%m-%dT%H:%M:%S%.f";

const FIELD_TABLE: &[(&str, FieldKind)] = &[
    ("ph", FieldKind::Numeric(FieldBounds::new(6.0, 8.4, 0.01))),
    ("chlorine", FieldKind::Numeric(FieldBounds::new(0.0, 12.0, 0.1))),
    ("alkalinity", FieldKind::Numeric(FieldBounds::new(0.0, 300.0, 0.1))),
    ("bromine", FieldKind::Numeric(FieldBounds::new(0.0, 20.0, 0.1))),
    (READING_TIME_KEY, FieldKind::Timestamp),
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue {
    Number(f64),
    Timestamp(DateTime<Utc>),
}

#[derive(Debug, Error, PartialEq)]
pub enum FieldError {
    #[error("field `{0}` is not present in the latest reading")]
    Missing(&'static str),

    #[error("field `{key}` is not a number: {value}")]
    NotNumeric { key: &'static str, value: String },

    #[error("field `{key}` is not a valid timestamp `{value}`: {reason}")]
    InvalidTimestamp {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Device the adapters hang off in the host's registry.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceInfo {
    pub identifier: String,
    pub name: &'static str,
    pub manufacturer: &'static str,
    pub model: &'static str,
}

impl DeviceInfo {
    pub fn for_entry(entry_id: &str) -> Self {
        Self {
            identifier: entry_id.to_string(),
            name: crate::gateway::INTEGRATION_NAME,
            manufacturer: "Sutro",
            model: "0001",
        }
    }
}

/// Exposes one field of the cached reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldAdapter {
    key: &'static str,
    kind: FieldKind,
}

impl FieldAdapter {
    /// Looks the key up in the field table.
    pub fn for_key(key: &str) -> Option<Self> {
        FIELD_TABLE
            .iter()
            .find(|(k, _)| *k == key)
            .map(|&(key, kind)| Self { key, kind })
    }

    /// One adapter per monitored quantity, in table order.
    pub fn all() -> Vec<Self> {
        FIELD_TABLE
            .iter()
            .map(|&(key, kind)| Self { key, kind })
            .collect()
    }

    pub fn key(&self) -> &'static str {
        self.key
    }

    pub fn bounds(&self) -> Option<FieldBounds> {
        match self.kind {
            FieldKind::Numeric(bounds) => Some(bounds),
            FieldKind::Timestamp => None,
        }
    }

    pub fn unique_id(&self, entry_id: &str) -> String {
        format!("{entry_id}_{}", self.key)
    }

    pub fn value(&self, reading: &Reading) -> Result<FieldValue, FieldError> {
        let raw = reading.get(self.key).ok_or(FieldError::Missing(self.key))?;

        match self.kind {
            FieldKind::Numeric(_) => raw
                .as_f64()
                .map(FieldValue::Number)
                .ok_or_else(|| FieldError::NotNumeric {
                    key: self.key,
                    value: raw.to_string(),
                }),
            FieldKind::Timestamp => parse_timestamp(self.key, raw).map(FieldValue::Timestamp),
        }
    }
}

fn parse_timestamp(key: &'static str, raw: &Value) -> Result<DateTime<Utc>, FieldError> {
    let text = raw.as_str().ok_or_else(|| FieldError::InvalidTimestamp {
        key,
        value: raw.to_string(),
        reason: "expected a string".to_string(),
    })?;

    let rfc3339_err = match DateTime::parse_from_rfc3339(text) {
        Ok(ts) => return Ok(ts.with_timezone(&Utc)),
        Err(e) => e,
    };

    // Other ISO-8601 forms: offset without colon, or no zone at all (UTC)
    if let Ok(ts) = DateTime::parse_from_str(text, ISO8601_WITH_OFFSET) {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, ISO8601_NAIVE) {
        return Ok(naive.and_utc());
    }

    Err(FieldError::InvalidTimestamp {
        key,
        value: text.to_string(),
        reason: rfc3339_err.to_string(),
    })
}
