// SPDX-License-Identifier: MIT

//! Matching/scoring engine.
//!
//! Pure functions only: candidate retrieval is I/O and lives in the
//! ingestion service, so everything here is deterministic and testable
//! in isolation. Given one completed activity and the candidate planned
//! sessions in a +/-6h window, each candidate gets a confidence in
//! [0, 1] and the decision policy accepts one candidate or defers to a
//! human.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::models::{CompletedActivity, PlannedSession, ScoreBreakdown, Sport};

/// Sub-score weights. They sum to 1.0 so confidence stays in [0, 1].
const TIME_WEIGHT: f64 = 0.4;
const SPORT_WEIGHT: f64 = 0.3;
const DURATION_WEIGHT: f64 = 0.2;
const DISTANCE_WEIGHT: f64 = 0.1;

/// Minimum confidence for an auto-match.
pub const ACCEPT_THRESHOLD: f64 = 0.85;
/// Minimum lead over the runner-up; closer than this is ambiguous and
/// deferred to manual attach.
pub const AMBIGUITY_MARGIN: f64 = 0.15;

/// Planned sessions carry a date but no time of day; candidates are
/// anchored at this hour UTC.
const CANDIDATE_START_HOUR: u32 = 6;

/// The activity-side fields the engine reads.
#[derive(Debug, Clone)]
pub struct MatchInput {
    pub sport: Sport,
    pub start_time_utc: DateTime<Utc>,
    pub duration_sec: u32,
    pub distance_m: f64,
}

impl From<&CompletedActivity> for MatchInput {
    fn from(activity: &CompletedActivity) -> Self {
        Self {
            sport: activity.sport,
            start_time_utc: activity.start_time_utc,
            duration_sec: activity.duration_sec,
            distance_m: activity.distance_m,
        }
    }
}

/// A planned session reduced to the four fields scoring needs.
#[derive(Debug, Clone)]
pub struct MatchCandidate {
    pub session_id: String,
    pub sport: Sport,
    pub start_time_utc: DateTime<Utc>,
    pub target_duration_sec: Option<u32>,
    pub target_distance_m: Option<f64>,
}

impl MatchCandidate {
    pub fn from_session(session: &PlannedSession) -> Self {
        Self {
            session_id: session.id.clone(),
            sport: session.sport,
            start_time_utc: candidate_start(session.date),
            target_duration_sec: session.duration_minutes.map(|m| m * 60),
            target_distance_m: session.distance_m,
        }
    }
}

/// Anchor a dated session at the candidate start hour.
fn candidate_start(date: NaiveDate) -> DateTime<Utc> {
    let time = NaiveTime::from_hms_opt(CANDIDATE_START_HOUR, 0, 0).unwrap_or(NaiveTime::MIN);
    Utc.from_utc_datetime(&date.and_time(time))
}

/// One candidate's score.
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub session_id: String,
    pub confidence: f64,
    pub breakdown: ScoreBreakdown,
}

/// Score one candidate against the activity.
///
/// Weighted sum of time proximity, sport match, duration similarity and
/// distance similarity; see the individual scoring functions below.
pub fn score_candidate(activity: &MatchInput, candidate: &MatchCandidate) -> ScoredCandidate {
    let minutes_diff = (activity.start_time_utc - candidate.start_time_utc)
        .num_seconds()
        .abs() as f64
        / 60.0;

    let time_score = time_proximity_score(minutes_diff);
    let sport_score = if activity.sport == candidate.sport { 1.0 } else { 0.0 };
    let duration_score = similarity_score(
        f64::from(activity.duration_sec),
        candidate.target_duration_sec.map(f64::from),
    );
    let distance_score = similarity_score(activity.distance_m, candidate.target_distance_m);

    let confidence = clamp01(
        time_score * TIME_WEIGHT
            + sport_score * SPORT_WEIGHT
            + duration_score * DURATION_WEIGHT
            + distance_score * DISTANCE_WEIGHT,
    );

    ScoredCandidate {
        session_id: candidate.session_id.clone(),
        confidence,
        breakdown: ScoreBreakdown {
            time_score,
            sport_score,
            duration_score,
            distance_score,
            minutes_diff,
        },
    }
}

/// Decision policy: accept the best candidate only when it clears the
/// confidence threshold AND leads the runner-up by a clear margin.
///
/// A bare threshold mis-links same-sport sessions planned close together
/// (a brick workout produces two plausible candidates); requiring a
/// margin defers those to a human instead of silently picking one.
pub fn pick_auto_match(scores: &[ScoredCandidate]) -> Option<&ScoredCandidate> {
    let mut ranked: Vec<&ScoredCandidate> = scores.iter().collect();
    ranked.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let best = *ranked.first()?;
    if best.confidence < ACCEPT_THRESHOLD {
        return None;
    }
    if let Some(second) = ranked.get(1) {
        if best.confidence - second.confidence < AMBIGUITY_MARGIN {
            return None;
        }
    }
    Some(best)
}

/// Step function over the start-time gap. Deliberately not a continuous
/// decay: the steps make any stored breakdown auditable at a glance.
fn time_proximity_score(minutes_diff: f64) -> f64 {
    if minutes_diff <= 30.0 {
        1.0
    } else if minutes_diff <= 90.0 {
        0.6
    } else if minutes_diff <= 360.0 {
        0.2
    } else {
        0.0
    }
}

/// `clamp(1 - |actual - target| / target)` when a positive target exists,
/// else neutral 0.5 so an unspecified target neither helps nor hurts.
fn similarity_score(actual: f64, target: Option<f64>) -> f64 {
    match target.filter(|t| *t > 0.0) {
        Some(target) => clamp01(1.0 - (actual - target).abs() / target),
        None => 0.5,
    }
}

fn clamp01(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}
