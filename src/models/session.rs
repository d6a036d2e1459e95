// SPDX-License-Identifier: MIT

//! Planned training session, owned by the plan/calendar subsystem.
//!
//! This service only reads these records; creating and editing sessions
//! happens elsewhere.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::Sport;

/// A planned session considered as a match candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedSession {
    pub id: String,
    pub user_id: String,
    /// Calendar date of the session (no time of day is planned)
    pub date: NaiveDate,
    pub sport: Sport,
    /// Target duration in minutes, if the plan specifies one
    pub duration_minutes: Option<u32>,
    /// Target distance in meters, if the plan specifies one
    pub distance_m: Option<f64>,
}
