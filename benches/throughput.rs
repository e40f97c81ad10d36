use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use sudoku_cache::{
    persist::sqlite::SqliteStore,
    puzzle::{PuzzleKey, PuzzleRecord},
    runtime::{events::FeedEvent, listener::apply_feed_event},
    types::Difficulty,
};

fn catalog(n: usize) -> Vec<PuzzleRecord> {
    (0..n)
        .map(|i| {
            let cells: Vec<u8> = (0..81).map(|c| ((c + i) % 10) as u8).collect();
            PuzzleRecord::new(
                PuzzleKey::try_from(cells).expect("key"),
                Difficulty::ALL[i % Difficulty::ALL.len()],
            )
        })
        .collect()
}

fn bench_replace_all(c: &mut Criterion) {
    let mut group = c.benchmark_group("replace_all");
    let store = SqliteStore::open_in_memory().expect("open");
    for n in [50usize, 200usize, 1000usize] {
        let puzzles = catalog(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &puzzles, |b, puzzles| {
            b.iter(|| store.replace_all(puzzles).expect("replace"));
        });
    }
    group.finish();
}

fn bench_pick_random(c: &mut Criterion) {
    let store = SqliteStore::open_in_memory().expect("open");
    store.replace_all(&catalog(200)).expect("replace");
    c.bench_function("pick_random_200", |b| {
        b.iter(|| store.pick_random(Difficulty::Hard).expect("pick"));
    });
}

fn bench_feed_apply(c: &mut Criterion) {
    let store = SqliteStore::open_in_memory().expect("open");
    let event = FeedEvent::from_puzzles(&catalog(200));
    c.bench_function("feed_apply_200", |b| {
        b.iter(|| apply_feed_event(&store, &event).expect("apply"));
    });
}

criterion_group!(benches, bench_replace_all, bench_pick_random, bench_feed_apply);
criterion_main!(benches);
