use chrono::{DateTime, Duration, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use trainlink::models::Sport;
use trainlink::services::matching::{pick_auto_match, score_candidate, MatchCandidate, MatchInput};

fn start() -> DateTime<Utc> {
    "2024-03-01T06:25:00Z".parse().unwrap()
}

/// A spread of candidates around the activity start, alternating sports
/// and target completeness, roughly what a week of candidate sessions
/// looks like for an active user.
fn candidates(n: usize) -> Vec<MatchCandidate> {
    (0..n)
        .map(|i| MatchCandidate {
            session_id: format!("session-{}", i),
            sport: if i % 3 == 0 { Sport::Run } else { Sport::Bike },
            start_time_utc: start() + Duration::minutes(i as i64 * 47 - 360),
            target_duration_sec: if i % 2 == 0 { Some(3600) } else { None },
            target_distance_m: if i % 4 == 0 { Some(10_000.0) } else { None },
        })
        .collect()
}

fn benchmark_matching(c: &mut Criterion) {
    let input = MatchInput {
        sport: Sport::Run,
        start_time_utc: start(),
        duration_sec: 3600,
        distance_m: 10_000.0,
    };
    let field = candidates(50);

    let mut group = c.benchmark_group("matching");

    group.bench_function("score_one_candidate", |b| {
        b.iter(|| score_candidate(black_box(&input), black_box(&field[0])))
    });

    group.bench_function("score_and_pick_50_candidates", |b| {
        b.iter(|| {
            let scored: Vec<_> = field
                .iter()
                .map(|candidate| score_candidate(black_box(&input), candidate))
                .collect();
            pick_auto_match(black_box(&scored))
        })
    });

    group.finish();
}

criterion_group!(benches, benchmark_matching);
criterion_main!(benches);
