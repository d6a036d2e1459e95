// SPDX-License-Identifier: MIT

//! FIT decoder adapter.
//!
//! Binary decoding is delegated to the `fitparser` crate; this module
//! only reads the first session-summary message. Record-level telemetry
//! is counted for diagnostics but never stored.

use chrono::{DateTime, Duration, Utc};
use fitparser::profile::MesgNum;
use fitparser::{FitDataRecord, Value};

use crate::models::{ParseSummary, ParsedActivity, Sport};
use crate::parsers::ParseError;

/// Parse a binary FIT upload into a canonical activity.
pub fn parse(bytes: &[u8]) -> Result<ParsedActivity, ParseError> {
    let records =
        fitparser::from_bytes(bytes).map_err(|e| ParseError::FitDecode(e.to_string()))?;

    let session = records
        .iter()
        .find(|r| r.kind() == MesgNum::Session)
        .ok_or(ParseError::MissingSession)?;

    let start_time_utc = field(session, "start_time")
        .and_then(as_utc_timestamp)
        .ok_or(ParseError::MissingStartTime)?;

    // Prefer elapsed time; fall back to timer time for devices that only
    // report the latter.
    let elapsed_sec = field(session, "total_elapsed_time")
        .and_then(as_f64)
        .or_else(|| field(session, "total_timer_time").and_then(as_f64))
        .unwrap_or(0.0);
    let duration_sec = elapsed_sec.max(0.0).round() as u32;

    let sport = field(session, "sport")
        .map(|v| Sport::normalize(&v.to_string()))
        .unwrap_or(Sport::Other);

    let distance_m = field(session, "total_distance")
        .and_then(as_f64)
        .unwrap_or(0.0)
        .max(0.0);

    let record_count = records.iter().filter(|r| r.kind() == MesgNum::Record).count();

    Ok(ParsedActivity {
        sport,
        start_time_utc,
        end_time_utc: start_time_utc + Duration::seconds(i64::from(duration_sec)),
        duration_sec,
        distance_m,
        avg_hr: positive_u16(field(session, "avg_heart_rate")),
        avg_power: positive_u16(field(session, "avg_power")),
        calories: field(session, "total_calories")
            .and_then(as_f64)
            .filter(|v| *v > 0.0)
            .map(|v| v.round() as u32),
        parse_summary: ParseSummary {
            record_count: Some(record_count),
            lap_count: None,
        },
    })
}

/// Look up a session field by its profile name.
fn field<'a>(record: &'a FitDataRecord, name: &str) -> Option<&'a Value> {
    record
        .fields()
        .iter()
        .find(|f| f.name() == name)
        .map(|f| f.value())
}

fn as_utc_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Timestamp(ts) => Some(ts.with_timezone(&Utc)),
        _ => None,
    }
}

/// Widen any numeric FIT value to f64. Non-numeric values yield `None`.
fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Byte(v) | Value::Enum(v) | Value::UInt8(v) | Value::UInt8z(v) => {
            Some(f64::from(*v))
        }
        Value::SInt8(v) => Some(f64::from(*v)),
        Value::SInt16(v) => Some(f64::from(*v)),
        Value::UInt16(v) | Value::UInt16z(v) => Some(f64::from(*v)),
        Value::SInt32(v) => Some(f64::from(*v)),
        Value::UInt32(v) | Value::UInt32z(v) => Some(f64::from(*v)),
        Value::SInt64(v) => Some(*v as f64),
        Value::UInt64(v) | Value::UInt64z(v) => Some(*v as f64),
        Value::Float32(v) => Some(f64::from(*v)),
        Value::Float64(v) => Some(*v),
        _ => None,
    }
}

fn positive_u16(value: Option<&Value>) -> Option<u16> {
    value
        .and_then(as_f64)
        .filter(|v| *v > 0.0)
        .map(|v| v.round() as u16)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_garbage_bytes_fail_decode() {
        let err = parse(b"definitely not a fit file").unwrap_err();
        assert!(matches!(err, ParseError::FitDecode(_)));
    }

    #[test]
    fn test_empty_input_fails_decode() {
        assert!(parse(&[]).is_err());
    }

    #[test]
    fn test_as_f64_covers_integer_widths() {
        assert_eq!(as_f64(&Value::UInt16(150)), Some(150.0));
        assert_eq!(as_f64(&Value::Float64(42.5)), Some(42.5));
        assert_eq!(as_f64(&Value::String("ride".to_string())), None);
    }
}
