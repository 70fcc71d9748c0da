use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

use quizline_core::leaderboard::Leaderboard;
use quizline_core::model::Attempt;
use quizline_core::statistics::compute_aggregate_stats;
use quizline_core::traits::{AttemptQuery, SortField};

fn make_attempts(n: u64) -> Vec<Attempt> {
    let base = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    (1..=n)
        .map(|id| {
            let at = base + Duration::minutes(id as i64);
            Attempt {
                id,
                participant_name: format!("player-{}", id % 50),
                character_label: ["🚀 Astronaut", "🧙 Wizard", "None"][(id % 3) as usize].into(),
                score: (id * 7 % 11) as u32,
                total_questions: 10,
                completed_at: at,
                last_modified: at,
            }
        })
        .collect()
}

fn bench_ranking(c: &mut Criterion) {
    let mut group = c.benchmark_group("leaderboard");

    for n in [100u64, 10_000] {
        let attempts = make_attempts(n);

        group.bench_function(format!("by_score/n={n}"), |b| {
            b.iter(|| Leaderboard::rank(black_box(attempts.clone()), &AttemptQuery::leaderboard()))
        });

        group.bench_function(format!("top_10/n={n}"), |b| {
            let query = AttemptQuery::leaderboard().with_limit(10);
            b.iter(|| Leaderboard::rank(black_box(attempts.clone()), &query))
        });

        group.bench_function(format!("by_date/n={n}"), |b| {
            let query = AttemptQuery::sorted_by(SortField::Date).descending();
            b.iter(|| Leaderboard::rank(black_box(attempts.clone()), &query))
        });
    }

    group.finish();
}

fn bench_stats(c: &mut Criterion) {
    let attempts = make_attempts(10_000);
    c.bench_function("aggregate_stats/n=10000", |b| {
        b.iter(|| compute_aggregate_stats(black_box(&attempts)))
    });
}

criterion_group!(benches, bench_ranking, bench_stats);
criterion_main!(benches);
