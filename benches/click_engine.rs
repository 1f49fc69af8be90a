//! 点击引擎端到端基准测试（临时 SQLite + 内存缓存）

use criterion::{Criterion, criterion_group, criterion_main};
use clicker::cache::{CounterCache, MemoryCounterCache};
use clicker::clicks::{ClickEngine, RateLimiter};
use clicker::config::{ClicksConfig, DatabaseConfig, LeaderboardPolicy};
use clicker::storage::UserStore;
use clicker::storage::backend::SeaOrmStorage;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tempfile::TempDir;

fn bench_rate_limiter(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let cache: Arc<dyn CounterCache> = Arc::new(MemoryCounterCache::new(1_000_000));
    let limiter = RateLimiter::new(cache, Duration::from_secs(1), 25);
    let counter = AtomicU64::new(0);

    c.bench_function("rate_limiter/check_and_consume", |b| {
        b.to_async(&rt).iter(|| {
            let limiter = limiter.clone();
            let user = format!("u{}", counter.fetch_add(1, Ordering::Relaxed) % 1_000);
            async move { limiter.check_and_consume(&user).await }
        });
    });
}

fn bench_register_click(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let dir = TempDir::new().unwrap();
    let db_url = format!("sqlite://{}?mode=rwc", dir.path().join("bench.db").display());

    let engine = rt.block_on(async {
        let storage = Arc::new(
            SeaOrmStorage::new(&db_url, "sqlite", &DatabaseConfig::default())
                .await
                .unwrap(),
        );
        for i in 0..100 {
            storage
                .create_or_touch_user(&format!("u{}", i), None)
                .await
                .unwrap();
        }
        let config = ClicksConfig {
            max_actions: 1_000_000_000,
            ..ClicksConfig::default()
        };
        ClickEngine::new(
            storage,
            Arc::new(MemoryCounterCache::new(1_000_000)),
            &config,
            LeaderboardPolicy::RankedSet,
        )
    });
    let counter = AtomicU64::new(0);

    c.bench_function("click_engine/register_click", |b| {
        b.to_async(&rt).iter(|| {
            let engine = engine.clone();
            let user = format!("u{}", counter.fetch_add(1, Ordering::Relaxed) % 100);
            async move { engine.register_click(&user).await.unwrap() }
        });
    });
}

criterion_group!(benches, bench_rate_limiter, bench_register_click);
criterion_main!(benches);
