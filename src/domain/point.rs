//! Time-series points and their InfluxDB line protocol encoding.

use influxdb_line_protocol::LineProtocolBuilder;
use serde::Deserialize;
use std::collections::BTreeMap;
use time::OffsetDateTime;

/// A measured value as it arrives from a device.
///
/// JSON numbers always become [`FieldValue::Number`], so a field keeps the
/// same series type no matter whether a device sends `1` or `1.0`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    String(String),
    Bool(bool),
    /// Anything else the payload contained (null, arrays, objects). Kept so
    /// point construction can reject it with the offending key.
    Unsupported(serde_json::Value),
}

impl FieldValue {
    fn kind(&self) -> &'static str {
        match self {
            FieldValue::Number(_) => "number",
            FieldValue::String(_) => "string",
            FieldValue::Bool(_) => "bool",
            FieldValue::Unsupported(serde_json::Value::Null) => "null",
            FieldValue::Unsupported(serde_json::Value::Array(_)) => "array",
            FieldValue::Unsupported(serde_json::Value::Object(_)) => "object",
            FieldValue::Unsupported(_) => "unknown",
        }
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        Self::String(v.into())
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum PointError {
    #[error("point without fields is unsupported")]
    NoFields,
    #[error("measurement name cannot be empty")]
    EmptyMeasurement,
    #[error("tag {0:?} has an empty value")]
    EmptyTagValue(String),
    #[error("field key cannot be empty")]
    EmptyFieldKey,
    #[error("field {key:?} has unsupported type {kind}")]
    UnsupportedFieldType { key: String, kind: &'static str },
    #[error("field {0:?} is not a finite number")]
    NonFiniteNumber(String),
    #[error("{0} contains a newline")]
    Newline(String),
    #[error("timestamp {0} is before the unix epoch")]
    TimestampBeforeEpoch(i64),
}

/// Line protocol timestamp precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    Seconds,
}

impl Precision {
    pub fn as_str(self) -> &'static str {
        match self {
            Precision::Seconds => "s",
        }
    }
}

/// A single validated point ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct DataPoint {
    measurement: String,
    // Sorted tags are cheaper for the server to index.
    tags: BTreeMap<String, String>,
    fields: BTreeMap<String, FieldValue>,
    timestamp: u64,
}

impl DataPoint {
    pub fn builder(measurement: impl Into<String>) -> DataPointBuilder {
        DataPointBuilder {
            measurement: measurement.into(),
            tags: BTreeMap::new(),
            fields: BTreeMap::new(),
            timestamp: None,
        }
    }

    pub fn measurement(&self) -> &str {
        &self.measurement
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    /// Seconds since the unix epoch.
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// Renders the point as one newline-terminated line protocol line with a
    /// timestamp in seconds.
    pub fn line_protocol(&self) -> Result<String, PointError> {
        let mut lp = LineProtocolBuilder::new().measurement(&self.measurement);
        for (k, v) in &self.tags {
            lp = lp.tag(k, v);
        }

        let mut fields = self.fields.iter();
        let (key, value) = fields.next().ok_or(PointError::NoFields)?;
        let mut lp = match value {
            FieldValue::Number(n) => lp.field(key, *n),
            FieldValue::String(s) => lp.field(key, s.as_str()),
            FieldValue::Bool(b) => lp.field(key, *b),
            FieldValue::Unsupported(_) => return Err(unsupported(key, value)),
        };
        for (key, value) in fields {
            lp = match value {
                FieldValue::Number(n) => lp.field(key, *n),
                FieldValue::String(s) => lp.field(key, s.as_str()),
                FieldValue::Bool(b) => lp.field(key, *b),
                FieldValue::Unsupported(_) => return Err(unsupported(key, value)),
            };
        }

        let ts = i64::try_from(self.timestamp).unwrap_or(i64::MAX);
        let bytes = lp.timestamp(ts).close_line().build();
        // every piece written above came from a &str
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

fn unsupported(key: &str, value: &FieldValue) -> PointError {
    PointError::UnsupportedFieldType {
        key: key.to_string(),
        kind: value.kind(),
    }
}

/// Incrementally constructs a [`DataPoint`]. Validation happens in `build`.
#[derive(Debug)]
pub struct DataPointBuilder {
    measurement: String,
    tags: BTreeMap<String, String>,
    fields: BTreeMap<String, FieldValue>,
    timestamp: Option<OffsetDateTime>,
}

impl DataPointBuilder {
    pub fn tag(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(name.into(), value.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn fields(mut self, fields: impl IntoIterator<Item = (String, FieldValue)>) -> Self {
        self.fields.extend(fields);
        self
    }

    pub fn timestamp(mut self, ts: OffsetDateTime) -> Self {
        self.timestamp = Some(ts);
        self
    }

    pub fn build(self) -> Result<DataPoint, PointError> {
        let Self {
            measurement,
            tags,
            fields,
            timestamp,
        } = self;

        if measurement.is_empty() {
            return Err(PointError::EmptyMeasurement);
        }
        reject_newline("measurement", &measurement)?;

        for (k, v) in &tags {
            reject_newline("tag key", k)?;
            reject_newline("tag value", v)?;
            if v.is_empty() {
                return Err(PointError::EmptyTagValue(k.clone()));
            }
        }

        if fields.is_empty() {
            return Err(PointError::NoFields);
        }
        for (k, v) in &fields {
            if k.is_empty() {
                return Err(PointError::EmptyFieldKey);
            }
            reject_newline("field key", k)?;
            match v {
                FieldValue::Number(n) if !n.is_finite() => {
                    return Err(PointError::NonFiniteNumber(k.clone()))
                }
                FieldValue::String(s) => reject_newline("field value", s)?,
                FieldValue::Unsupported(_) => return Err(unsupported(k, v)),
                _ => {}
            }
        }

        let ts = timestamp.unwrap_or_else(OffsetDateTime::now_utc).unix_timestamp();
        let timestamp = u64::try_from(ts).map_err(|_| PointError::TimestampBeforeEpoch(ts))?;

        Ok(DataPoint {
            measurement,
            tags,
            fields,
            timestamp,
        })
    }
}

fn reject_newline(what: &str, s: &str) -> Result<(), PointError> {
    if s.contains(['\n', '\r']) {
        return Err(PointError::Newline(what.to_string()));
    }
    Ok(())
}
