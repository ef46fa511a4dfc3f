//! Benchmarks for the Arregmatica document store
//!
//! Run with: cargo bench

use arregmatica::store::{JournalSyncMode, StoreConfig, StoreEngine, TreePath};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use serde_json::json;
use tempfile::tempdir;

fn bench_path(c: &mut Criterion) {
    let mut group = c.benchmark_group("path");

    group.bench_function("parse_shallow", |b| {
        b.iter(|| TreePath::parse(black_box("accounts/user-42")).unwrap())
    });

    group.bench_function("parse_deep", |b| {
        b.iter(|| {
            TreePath::parse(black_box("accounts/user-42/posts/post-7/comments/c-123")).unwrap()
        })
    });

    group.finish();
}

fn bench_engine(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    let mut group = c.benchmark_group("engine");

    group.bench_function("set_single", |b| {
        b.iter_custom(|iters| {
            rt.block_on(async {
                let dir = tempdir().unwrap();
                let mut config = StoreConfig::new(dir.path());
                config.journal_sync = JournalSyncMode::None; // No fsync for raw performance
                let store = StoreEngine::open(config).await.unwrap();

                let start = std::time::Instant::now();

                for i in 0..iters {
                    store
                        .set(
                            &format!("accounts/u{}/posts/p{}", i % 100, i),
                            json!({"text": "benchmark post", "created_at": i}),
                        )
                        .await
                        .unwrap();
                }

                start.elapsed()
            })
        });
    });

    group.bench_function("get_hot", |b| {
        b.iter_custom(|iters| {
            rt.block_on(async {
                let dir = tempdir().unwrap();
                let mut config = StoreConfig::new(dir.path());
                config.journal_sync = JournalSyncMode::None;
                let store = StoreEngine::open(config).await.unwrap();

                store
                    .set("accounts/u1", json!({"username": "bench", "online": true}))
                    .await
                    .unwrap();

                let start = std::time::Instant::now();

                for _ in 0..iters {
                    let _ = store.get(black_box("accounts/u1/username")).await.unwrap();
                }

                start.elapsed()
            })
        });
    });

    group.bench_function("children_1000", |b| {
        b.iter_custom(|iters| {
            rt.block_on(async {
                let dir = tempdir().unwrap();
                let mut config = StoreConfig::new(dir.path());
                config.journal_sync = JournalSyncMode::None;
                let store = StoreEngine::open(config).await.unwrap();

                for i in 0..1000 {
                    store
                        .set(&format!("scores/u{}", i), json!({"total_score": i}))
                        .await
                        .unwrap();
                }

                let start = std::time::Instant::now();

                for _ in 0..iters {
                    let _ = store.children(black_box("scores")).await.unwrap();
                }

                start.elapsed()
            })
        });
    });

    group.finish();
}

fn bench_fanout(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    let mut group = c.benchmark_group("fanout");

    for subscribers in [1usize, 16, 64] {
        group.throughput(Throughput::Elements(subscribers as u64));

        group.bench_function(format!("set_with_{}_subscribers", subscribers), |b| {
            b.iter_custom(|iters| {
                rt.block_on(async {
                    let dir = tempdir().unwrap();
                    let mut config = StoreConfig::new(dir.path());
                    config.journal_sync = JournalSyncMode::None;
                    let store = StoreEngine::open(config).await.unwrap();

                    // Keep receivers alive so every write fans out
                    let receivers: Vec<_> = (0..subscribers).map(|_| store.subscribe()).collect();

                    let start = std::time::Instant::now();

                    for i in 0..iters {
                        store
                            .set(
                                &format!("groups/bench/messages/m{}", i),
                                json!({"text": "hello", "sent_at": i}),
                            )
                            .await
                            .unwrap();
                    }

                    let elapsed = start.elapsed();
                    drop(receivers);
                    elapsed
                })
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_path, bench_engine, bench_fanout);
criterion_main!(benches);
