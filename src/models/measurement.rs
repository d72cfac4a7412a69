//! InfluxDB line-protocol rendering.
//!
//! A [`Measurement`] collects a name, tags, fields and an event time, and
//! renders them as a single line for ingestion by a metrics agent. Tags and
//! fields are kept sorted so output is deterministic across runs.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Timestamp precision for rendered lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Precision {
    #[serde(rename = "s")]
    Seconds,
    #[serde(rename = "ms")]
    Millis,
    #[serde(rename = "us")]
    Micros,
    #[default]
    #[serde(rename = "ns")]
    Nanos,
}

impl Precision {
    /// Convert an event time to an epoch integer at this precision.
    ///
    /// Nanosecond conversion can overflow `i64` for dates far outside the
    /// 1677–2262 range; that is reported as an encoding error.
    pub fn epoch(&self, time: &DateTime<Utc>) -> Result<i64> {
        match self {
            Precision::Seconds => Ok(time.timestamp()),
            Precision::Millis => Ok(time.timestamp_millis()),
            Precision::Micros => Ok(time.timestamp_micros()),
            Precision::Nanos => time.timestamp_nanos_opt().ok_or_else(|| {
                AppError::encoding(format!("timestamp {time} out of range for nanoseconds"))
            }),
        }
    }
}

/// A field value in a line-protocol field set.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Float(f64),
    Integer(i64),
    Unsigned(u64),
    Boolean(bool),
    Text(String),
}

impl FieldValue {
    /// Render the value with its line-protocol type marker.
    fn render(&self) -> Result<String> {
        match self {
            FieldValue::Float(v) if !v.is_finite() => Err(AppError::encoding(format!(
                "non-finite float field value: {v}"
            ))),
            FieldValue::Float(v) => Ok(format!("{v}")),
            FieldValue::Integer(v) => Ok(format!("{v}i")),
            FieldValue::Unsigned(v) => Ok(format!("{v}u")),
            FieldValue::Boolean(v) => Ok(format!("{v}")),
            FieldValue::Text(v) => Ok(quote_string(v)),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<f32> for FieldValue {
    fn from(v: f32) -> Self {
        FieldValue::Float(v as f64)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Integer(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        FieldValue::Integer(v as i64)
    }
}

impl From<u64> for FieldValue {
    fn from(v: u64) -> Self {
        FieldValue::Unsigned(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Boolean(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

/// A single line-protocol measurement.
#[derive(Debug, Clone, Default)]
pub struct Measurement {
    name: String,
    tags: BTreeMap<String, String>,
    fields: BTreeMap<String, FieldValue>,
    time: Option<DateTime<Utc>>,
}

impl Measurement {
    /// Create an empty measurement with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Measurement name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attach a tag. Re-adding a key replaces its value.
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Attach a field. Re-adding a key replaces its value.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Set the event time.
    pub fn at(mut self, time: DateTime<Utc>) -> Self {
        self.time = Some(time);
        self
    }

    /// Render as one line-protocol line (no trailing newline).
    ///
    /// A measurement without fields is invalid in line protocol and is
    /// rejected. Without an event time, the line is rendered timestampless
    /// and the receiving agent assigns its own ingestion time.
    pub fn to_line(&self, precision: Precision) -> Result<String> {
        if self.fields.is_empty() {
            return Err(AppError::encoding(format!(
                "measurement '{}' has no fields",
                self.name
            )));
        }

        let mut line = escape_name(&self.name);

        for (key, value) in &self.tags {
            line.push(',');
            line.push_str(&escape_element(key));
            line.push('=');
            line.push_str(&escape_element(value));
        }

        let mut sep = ' ';
        for (key, value) in &self.fields {
            line.push(sep);
            sep = ',';
            line.push_str(&escape_element(key));
            line.push('=');
            line.push_str(&value.render()?);
        }

        if let Some(time) = &self.time {
            line.push(' ');
            line.push_str(&precision.epoch(time)?.to_string());
        }

        Ok(line)
    }
}

/// Escape a measurement name: commas and spaces.
fn escape_name(name: &str) -> String {
    escape_chars(name, &[',', ' '])
}

/// Escape a tag key, tag value or field key: commas, equals signs and spaces.
fn escape_element(element: &str) -> String {
    escape_chars(element, &[',', '=', ' '])
}

/// Quote a string field value, escaping backslashes and double quotes.
fn quote_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        if c == '\\' || c == '"' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

fn escape_chars(value: &str, special: &[char]) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        // Newlines would break line framing regardless of escaping rules.
        match c {
            '\n' | '\r' => continue,
            c if special.contains(&c) => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, 0)
            .unwrap()
            .and_utc()
    }

    #[test]
    fn field_value_rendering() {
        assert_eq!(FieldValue::from(60.5).render().unwrap(), "60.5");
        assert_eq!(FieldValue::from(2.667).render().unwrap(), "2.667");
        assert_eq!(FieldValue::from(8i64).render().unwrap(), "8i");
        assert_eq!(FieldValue::from(8u64).render().unwrap(), "8u");
        assert_eq!(FieldValue::from(true).render().unwrap(), "true");
        assert_eq!(FieldValue::from("a\"b").render().unwrap(), r#""a\"b""#);
    }

    #[test]
    fn non_finite_float_is_rejected() {
        assert!(FieldValue::Float(f64::NAN).render().is_err());
        assert!(FieldValue::Float(f64::INFINITY).render().is_err());
    }

    #[test]
    fn escaping_of_names_and_tags() {
        let m = Measurement::new("cpu load")
            .with_tag("host name", "a=b,c")
            .with_field("value", 1.0);

        let line = m.to_line(Precision::Nanos).unwrap();
        assert_eq!(line, r"cpu\ load,host\ name=a\=b\,c value=1");
    }

    #[test]
    fn full_line_with_nanosecond_timestamp() {
        let m = Measurement::new("iono_activity")
            .with_tag("source", "gfz")
            .with_tag("status", "definitive")
            .with_field("kp", 2.0)
            .with_field("ap", 7i64)
            .at(ts(2022, 7, 31, 19, 30));

        let line = m.to_line(Precision::Nanos).unwrap();
        assert_eq!(
            line,
            "iono_activity,source=gfz,status=definitive ap=7i,kp=2 1659295800000000000"
        );
    }

    #[test]
    fn precision_variants() {
        let time = ts(2022, 7, 31, 19, 30);
        assert_eq!(Precision::Seconds.epoch(&time).unwrap(), 1_659_295_800);
        assert_eq!(Precision::Millis.epoch(&time).unwrap(), 1_659_295_800_000);
        assert_eq!(
            Precision::Micros.epoch(&time).unwrap(),
            1_659_295_800_000_000
        );
        assert_eq!(
            Precision::Nanos.epoch(&time).unwrap(),
            1_659_295_800_000_000_000
        );
    }

    #[test]
    fn line_without_timestamp() {
        let m = Measurement::new("m").with_field("v", 1i64);
        assert_eq!(m.to_line(Precision::Nanos).unwrap(), "m v=1i");
    }

    #[test]
    fn measurement_without_fields_is_rejected() {
        let m = Measurement::new("m").with_tag("t", "x");
        assert!(m.to_line(Precision::Nanos).is_err());
    }

    #[test]
    fn precision_deserializes_from_config_tokens() {
        assert_eq!(
            serde_json::from_str::<Precision>("\"ns\"").unwrap(),
            Precision::Nanos
        );
        assert_eq!(
            serde_json::from_str::<Precision>("\"s\"").unwrap(),
            Precision::Seconds
        );
    }
}
