// SPDX-License-Identifier: MIT

//! Activity-to-session link records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a link was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkType {
    Auto,
    Manual,
}

/// Per-candidate sub-scores, stored as the auto-match "reason" so a
/// decision can be audited later.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub time_score: f64,
    pub sport_score: f64,
    pub duration_score: f64,
    pub distance_score: f64,
    /// Absolute minutes between activity start and candidate start
    pub minutes_diff: f64,
}

/// Link from one completed activity to at most one planned session.
///
/// The document ID equals `completed_activity_id`, so writing a link
/// natively replaces any prior link for that activity ("last decision
/// wins", at most one active link at all times).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityLink {
    pub user_id: String,
    pub completed_activity_id: String,
    pub planned_session_id: String,
    pub link_type: LinkType,
    /// Confidence in [0, 1]; 1.0 for manual links
    pub confidence: f64,
    /// Present for auto links, absent for manual ones
    pub match_reason: Option<ScoreBreakdown>,
    pub created_at: DateTime<Utc>,
}

impl ActivityLink {
    /// Manual override link ("escape hatch"): full confidence, no breakdown.
    pub fn manual(user_id: &str, activity_id: &str, session_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            completed_activity_id: activity_id.to_string(),
            planned_session_id: session_id.to_string(),
            link_type: LinkType::Manual,
            confidence: 1.0,
            match_reason: None,
            created_at: Utc::now(),
        }
    }
}
