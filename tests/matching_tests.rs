// SPDX-License-Identifier: MIT

//! Matching engine decision-policy tests.
//!
//! The engine is pure, so these run without any database or HTTP layer.

use chrono::{DateTime, Utc};
use trainlink::models::{ScoreBreakdown, Sport};
use trainlink::services::matching::{
    pick_auto_match, score_candidate, MatchCandidate, MatchInput, ScoredCandidate,
};

fn ts(raw: &str) -> DateTime<Utc> {
    raw.parse().expect("valid RFC3339 timestamp")
}

/// Hand-built scored candidate for decision-policy tests.
fn scored(session_id: &str, confidence: f64) -> ScoredCandidate {
    ScoredCandidate {
        session_id: session_id.to_string(),
        confidence,
        breakdown: ScoreBreakdown {
            time_score: 0.0,
            sport_score: 0.0,
            duration_score: 0.0,
            distance_score: 0.0,
            minutes_diff: 0.0,
        },
    }
}

fn run_activity() -> MatchInput {
    MatchInput {
        sport: Sport::Run,
        start_time_utc: ts("2024-03-01T06:25:00Z"),
        duration_sec: 3600,
        distance_m: 10_000.0,
    }
}

fn run_candidate(session_id: &str) -> MatchCandidate {
    MatchCandidate {
        session_id: session_id.to_string(),
        sport: Sport::Run,
        start_time_utc: ts("2024-03-01T06:00:00Z"),
        target_duration_sec: Some(3600),
        target_distance_m: Some(10_000.0),
    }
}

#[test]
fn test_scoring_is_deterministic() {
    let activity = run_activity();
    let candidate = run_candidate("s-1");

    let first = score_candidate(&activity, &candidate);
    let second = score_candidate(&activity, &candidate);

    assert_eq!(first.confidence, second.confidence);
    assert_eq!(first.breakdown, second.breakdown);
}

#[test]
fn test_ambiguous_pair_is_deferred() {
    // 0.90 clears the threshold, but the 0.08 margin is below 0.15:
    // defer to a human rather than risk linking the wrong session.
    let scores = vec![scored("s-1", 0.90), scored("s-2", 0.82)];
    assert!(pick_auto_match(&scores).is_none());
}

#[test]
fn test_clear_winner_is_accepted() {
    let scores = vec![scored("s-1", 0.91), scored("s-2", 0.72)];
    let best = pick_auto_match(&scores).expect("should auto-match");
    assert_eq!(best.session_id, "s-1");
}

#[test]
fn test_lone_low_confidence_candidate_is_rejected() {
    let scores = vec![scored("s-1", 0.80)];
    assert!(pick_auto_match(&scores).is_none());
}

#[test]
fn test_lone_candidate_at_threshold_is_accepted() {
    let scores = vec![scored("s-1", 0.85)];
    assert!(pick_auto_match(&scores).is_some());
}

#[test]
fn test_no_candidates_no_match() {
    assert!(pick_auto_match(&[]).is_none());
}

#[test]
fn test_order_of_candidates_does_not_matter() {
    let forward = vec![scored("s-1", 0.91), scored("s-2", 0.72)];
    let reversed = vec![scored("s-2", 0.72), scored("s-1", 0.91)];

    assert_eq!(
        pick_auto_match(&forward).map(|b| b.session_id.clone()),
        pick_auto_match(&reversed).map(|b| b.session_id.clone()),
    );
}

#[test]
fn test_full_pipeline_close_run_matches() {
    // 25 minutes off the 06:00 anchor, same sport, on-target duration and
    // distance: 0.4 + 0.3 + 0.2 + 0.1 = 1.0.
    let scoredc = score_candidate(&run_activity(), &run_candidate("s-1"));
    assert_eq!(scoredc.confidence, 1.0);
    assert_eq!(scoredc.breakdown.time_score, 1.0);
    assert_eq!(scoredc.breakdown.minutes_diff, 25.0);

    let best = pick_auto_match(std::slice::from_ref(&scoredc)).expect("should match");
    assert_eq!(best.session_id, "s-1");
}

#[test]
fn test_brick_workout_same_sport_twice_is_deferred() {
    // Two same-sport sessions planned the same morning: both score high,
    // the margin is small, no silent guess.
    let activity = run_activity();
    let first = run_candidate("s-1");
    let mut second = run_candidate("s-2");
    second.target_duration_sec = Some(3900);

    let scores = vec![
        score_candidate(&activity, &first),
        score_candidate(&activity, &second),
    ];
    assert!(scores.iter().all(|s| s.confidence >= 0.85));
    assert!(pick_auto_match(&scores).is_none());
}

#[test]
fn test_missing_targets_score_neutral() {
    let activity = run_activity();
    let candidate = MatchCandidate {
        session_id: "s-1".to_string(),
        sport: Sport::Run,
        start_time_utc: ts("2024-03-01T06:00:00Z"),
        target_duration_sec: None,
        target_distance_m: None,
    };

    let result = score_candidate(&activity, &candidate);
    assert_eq!(result.breakdown.duration_score, 0.5);
    assert_eq!(result.breakdown.distance_score, 0.5);
    // 0.4*1.0 + 0.3*1.0 + 0.2*0.5 + 0.1*0.5 = 0.85
    assert!((result.confidence - 0.85).abs() < 1e-9);
}
