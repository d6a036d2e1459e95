// SPDX-License-Identifier: MIT

//! Completed activity model and sport normalization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::upload::UploadedFile;

/// Closed sport enum shared by parsers and the matching engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sport {
    Swim,
    Bike,
    Run,
    Strength,
    Other,
}

impl Sport {
    /// Map a free-text sport string to the closed enum.
    ///
    /// Rules are substring matches evaluated in a fixed order, so inputs
    /// matching more than one rule ("swimrun") normalize deterministically.
    pub fn normalize(raw: &str) -> Self {
        let sport = raw.to_lowercase();
        if sport.contains("run") {
            Self::Run
        } else if sport.contains("bike") || sport.contains("cycl") {
            Self::Bike
        } else if sport.contains("swim") {
            Self::Swim
        } else if sport.contains("strength") {
            Self::Strength
        } else {
            Self::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Swim => "swim",
            Self::Bike => "bike",
            Self::Run => "run",
            Self::Strength => "strength",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for Sport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Free-form diagnostics captured while parsing, kept for support triage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParseSummary {
    /// Number of record-level messages seen (FIT only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_count: Option<usize>,
    /// Number of laps aggregated (TCX only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lap_count: Option<usize>,
}

/// Canonical activity produced by either parser, before persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedActivity {
    pub sport: Sport,
    pub start_time_utc: DateTime<Utc>,
    /// Always `start + duration`
    pub end_time_utc: DateTime<Utc>,
    pub duration_sec: u32,
    pub distance_m: f64,
    pub avg_hr: Option<u16>,
    pub avg_power: Option<u16>,
    pub calories: Option<u32>,
    pub parse_summary: ParseSummary,
}

/// Persisted completed activity, 1:1 with its upload.
///
/// The document ID equals the upload's document ID; a failed parse never
/// creates one of these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletedActivity {
    /// Document ID (equals `upload_id`)
    pub id: String,
    pub upload_id: String,
    pub user_id: String,
    pub sport: Sport,
    pub start_time_utc: DateTime<Utc>,
    pub end_time_utc: DateTime<Utc>,
    pub duration_sec: u32,
    pub distance_m: f64,
    pub avg_hr: Option<u16>,
    pub avg_power: Option<u16>,
    pub calories: Option<u32>,
    pub parse_summary: ParseSummary,
    /// Ingestion source, currently always "upload"
    pub source: String,
    pub created_at: DateTime<Utc>,
}

impl CompletedActivity {
    /// Persistable record for a successfully parsed upload.
    pub fn from_parsed(upload: &UploadedFile, parsed: ParsedActivity) -> Self {
        Self {
            id: upload.id.clone(),
            upload_id: upload.id.clone(),
            user_id: upload.user_id.clone(),
            sport: parsed.sport,
            start_time_utc: parsed.start_time_utc,
            end_time_utc: parsed.end_time_utc,
            duration_sec: parsed.duration_sec,
            distance_m: parsed.distance_m,
            avg_hr: parsed.avg_hr,
            avg_power: parsed.avg_power,
            calories: parsed.calories,
            parse_summary: parsed.parse_summary,
            source: "upload".to_string(),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_known_sports() {
        assert_eq!(Sport::normalize("Running"), Sport::Run);
        assert_eq!(Sport::normalize("Cycling"), Sport::Bike);
        assert_eq!(Sport::normalize("MTB bike ride"), Sport::Bike);
        assert_eq!(Sport::normalize("Open Water Swimming"), Sport::Swim);
        assert_eq!(Sport::normalize("Strength Training"), Sport::Strength);
    }

    #[test]
    fn test_normalize_unknown_is_other() {
        assert_eq!(Sport::normalize("Kayaking"), Sport::Other);
        assert_eq!(Sport::normalize(""), Sport::Other);
    }

    #[test]
    fn test_normalize_rule_order_is_fixed() {
        // "run" is checked before "swim", so a combined label is a run.
        assert_eq!(Sport::normalize("swimrun"), Sport::Run);
    }
}
