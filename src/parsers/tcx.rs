// SPDX-License-Identifier: MIT

//! TCX (Training Center XML) decoder.
//!
//! Reads only `Activities/Activity/Lap` summary fields; everything else
//! in the document (tracks, trackpoints, creator blocks, extensions) is
//! ignored without error. Lap values are aggregated into one activity.

use chrono::Duration;
use serde::Deserialize;

use crate::models::{ParseSummary, ParsedActivity, Sport};
use crate::parsers::ParseError;
use crate::time_utils::parse_rfc3339_utc;

#[derive(Debug, Deserialize)]
struct TrainingCenterDatabase {
    #[serde(rename = "Activities")]
    activities: Option<ActivityList>,
}

#[derive(Debug, Deserialize)]
struct ActivityList {
    #[serde(rename = "Activity", default)]
    activities: Vec<TcxActivity>,
}

#[derive(Debug, Deserialize)]
struct TcxActivity {
    #[serde(rename = "@Sport")]
    sport: Option<String>,
    /// Activity start timestamp (ISO-8601), doubling as the activity ID
    #[serde(rename = "Id")]
    id: Option<String>,
    #[serde(rename = "Lap", default)]
    laps: Vec<TcxLap>,
}

#[derive(Debug, Deserialize)]
struct TcxLap {
    #[serde(rename = "TotalTimeSeconds")]
    total_time_seconds: Option<f64>,
    #[serde(rename = "DistanceMeters")]
    distance_meters: Option<f64>,
    #[serde(rename = "Calories")]
    calories: Option<f64>,
    #[serde(rename = "AverageHeartRateBpm")]
    average_heart_rate_bpm: Option<HeartRateBpm>,
}

#[derive(Debug, Deserialize)]
struct HeartRateBpm {
    #[serde(rename = "Value")]
    value: Option<f64>,
}

/// Parse a TCX upload into a canonical activity.
///
/// Takes the first `Activity`; its `Id` must be a valid ISO-8601
/// timestamp or the whole parse fails.
pub fn parse(bytes: &[u8]) -> Result<ParsedActivity, ParseError> {
    let xml = std::str::from_utf8(bytes).map_err(|_| ParseError::InvalidUtf8)?;
    let doc: TrainingCenterDatabase =
        quick_xml::de::from_str(xml).map_err(|e| ParseError::InvalidXml(e.to_string()))?;

    let activity = doc
        .activities
        .and_then(|list| list.activities.into_iter().next())
        .ok_or(ParseError::NoActivity)?;

    let start_time_utc = activity
        .id
        .as_deref()
        .and_then(parse_rfc3339_utc)
        .ok_or(ParseError::InvalidStartTime)?;

    let laps = &activity.laps;
    let total_seconds: f64 = laps
        .iter()
        .map(|lap| lap.total_time_seconds.unwrap_or(0.0))
        .sum();
    let duration_sec = total_seconds.max(0.0).round() as u32;

    let distance_m: f64 = laps
        .iter()
        .map(|lap| lap.distance_meters.unwrap_or(0.0))
        .sum::<f64>()
        .max(0.0);

    let calories: f64 = laps.iter().map(|lap| lap.calories.unwrap_or(0.0)).sum();

    // Mean of non-zero lap averages; laps without a strap report 0.
    let hr_samples: Vec<f64> = laps
        .iter()
        .filter_map(|lap| lap.average_heart_rate_bpm.as_ref())
        .filter_map(|hr| hr.value)
        .filter(|v| *v > 0.0)
        .collect();
    let avg_hr = if hr_samples.is_empty() {
        None
    } else {
        Some((hr_samples.iter().sum::<f64>() / hr_samples.len() as f64).round() as u16)
    };

    Ok(ParsedActivity {
        sport: Sport::normalize(activity.sport.as_deref().unwrap_or("")),
        start_time_utc,
        end_time_utc: start_time_utc + Duration::seconds(i64::from(duration_sec)),
        duration_sec,
        distance_m,
        avg_hr,
        // TCX has no power field
        avg_power: None,
        calories: Some(calories.max(0.0).round() as u32),
        parse_summary: ParseSummary {
            record_count: None,
            lap_count: Some(laps.len()),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tcx(body: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<TrainingCenterDatabase xmlns="http://www.garmin.com/xmlschemas/TrainingCenterDatabase/v2">
  <Activities>{}</Activities>
</TrainingCenterDatabase>"#,
            body
        )
    }

    #[test]
    fn test_two_laps_aggregate() {
        let xml = tcx(
            r#"<Activity Sport="Running">
  <Id>2024-03-01T06:30:00Z</Id>
  <Lap StartTime="2024-03-01T06:30:00Z">
    <TotalTimeSeconds>1800</TotalTimeSeconds>
    <DistanceMeters>5000</DistanceMeters>
    <Calories>210</Calories>
    <AverageHeartRateBpm><Value>150</Value></AverageHeartRateBpm>
  </Lap>
  <Lap StartTime="2024-03-01T07:00:00Z">
    <TotalTimeSeconds>1800</TotalTimeSeconds>
    <DistanceMeters>5000</DistanceMeters>
    <Calories>200</Calories>
    <AverageHeartRateBpm><Value>160</Value></AverageHeartRateBpm>
  </Lap>
</Activity>"#,
        );

        let parsed = parse(xml.as_bytes()).unwrap();
        assert_eq!(parsed.sport, Sport::Run);
        assert_eq!(parsed.duration_sec, 3600);
        assert_eq!(parsed.distance_m, 10_000.0);
        assert_eq!(parsed.calories, Some(410));
        assert_eq!(parsed.avg_hr, Some(155));
        assert_eq!(parsed.avg_power, None);
        assert_eq!(parsed.parse_summary.lap_count, Some(2));
        assert_eq!(
            parsed.end_time_utc - parsed.start_time_utc,
            Duration::seconds(3600)
        );
    }

    #[test]
    fn test_zero_hr_laps_yield_no_average() {
        let xml = tcx(
            r#"<Activity Sport="Biking">
  <Id>2024-03-01T06:30:00Z</Id>
  <Lap><TotalTimeSeconds>600</TotalTimeSeconds>
    <AverageHeartRateBpm><Value>0</Value></AverageHeartRateBpm></Lap>
</Activity>"#,
        );

        let parsed = parse(xml.as_bytes()).unwrap();
        assert_eq!(parsed.sport, Sport::Bike);
        assert_eq!(parsed.avg_hr, None);
        assert_eq!(parsed.distance_m, 0.0);
    }

    #[test]
    fn test_unknown_elements_are_ignored() {
        let xml = tcx(
            r#"<Activity Sport="Running">
  <Id>2024-03-01T06:30:00Z</Id>
  <Lap>
    <TotalTimeSeconds>60</TotalTimeSeconds>
    <Track><Trackpoint><Time>2024-03-01T06:30:01Z</Time></Trackpoint></Track>
    <Extensions><Anything>ignored</Anything></Extensions>
  </Lap>
  <Creator><Name>Some Watch</Name></Creator>
</Activity>"#,
        );

        let parsed = parse(xml.as_bytes()).unwrap();
        assert_eq!(parsed.duration_sec, 60);
    }

    #[test]
    fn test_invalid_id_fails() {
        let xml = tcx(
            r#"<Activity Sport="Running"><Id>not-a-date</Id>
  <Lap><TotalTimeSeconds>60</TotalTimeSeconds></Lap></Activity>"#,
        );
        let err = parse(xml.as_bytes()).unwrap_err();
        assert!(matches!(err, ParseError::InvalidStartTime));
    }

    #[test]
    fn test_no_activity_fails() {
        let xml = tcx("");
        let err = parse(xml.as_bytes()).unwrap_err();
        assert!(matches!(err, ParseError::NoActivity));
    }

    #[test]
    fn test_not_xml_fails() {
        let err = parse(b"just some text").unwrap_err();
        assert!(matches!(err, ParseError::InvalidXml(_)));
    }

    #[test]
    fn test_non_utf8_fails() {
        let err = parse(&[0xff, 0xfe, 0x00]).unwrap_err();
        assert!(matches!(err, ParseError::InvalidUtf8));
    }
}
