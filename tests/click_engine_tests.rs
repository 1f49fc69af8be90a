//! Click engine integration tests
//!
//! Runs the engine against a temporary SQLite database and the in-memory
//! counter cache, plus mock stores/caches for failure injection.

mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use clicker::cache::{CounterCache, MemoryCounterCache, keys};
use clicker::clicks::{ClickEngine, ClickWarning};
use clicker::config::{ClicksConfig, LeaderboardPolicy};
use clicker::errors::ClickerError;
use clicker::storage::UserStore;

use common::{DownCache, MockStore, relaxed_clicks, temp_storage};

fn memory_cache() -> Arc<MemoryCounterCache> {
    Arc::new(MemoryCounterCache::new(10_000))
}

// =============================================================================
// 持久层原子性
// =============================================================================

#[tokio::test]
async fn test_concurrent_clicks_are_all_counted() {
    let (storage, _dir) = temp_storage().await;
    storage.create_or_touch_user("u1", None).await.unwrap();
    storage.increment_user_total("u1", 7).await.unwrap();

    let engine = ClickEngine::new(
        storage.clone(),
        memory_cache(),
        &relaxed_clicks(),
        LeaderboardPolicy::Snapshot,
    );

    const N: usize = 32;
    let mut handles = Vec::with_capacity(N);
    for _ in 0..N {
        let engine = engine.clone();
        handles.push(tokio::spawn(
            async move { engine.register_click("u1").await },
        ));
    }

    let mut totals = Vec::with_capacity(N);
    for handle in handles {
        let receipt = handle.await.unwrap().unwrap();
        assert!(receipt.warnings.is_empty());
        totals.push(receipt.total_clicks);
    }

    // 每次自增都拿到各不相同的、连续的新值
    totals.sort_unstable();
    let expected: Vec<i64> = (8..8 + N as i64).collect();
    assert_eq!(totals, expected);

    let user = storage.find_user("u1").await.unwrap().unwrap();
    assert_eq!(user.total_clicks, 7 + N as i64);
    assert_eq!(storage.count_click_events("u1").await.unwrap(), N as u64);
}

#[tokio::test]
async fn test_three_clicks_then_leaderboard_of_one() {
    let (storage, _dir) = temp_storage().await;
    storage.create_or_touch_user("u1", Some("Ann")).await.unwrap();

    let cache = memory_cache();
    let engine = ClickEngine::new(
        storage.clone(),
        cache.clone(),
        &relaxed_clicks(),
        LeaderboardPolicy::Snapshot,
    );

    let mut shown = Vec::new();
    for _ in 0..3 {
        shown.push(engine.register_click("u1").await.unwrap().total_clicks.to_string());
    }
    assert_eq!(shown, ["1", "2", "3"]);

    let leaderboard = clicker::leaderboard::LeaderboardService::new(
        storage.clone(),
        cache,
        &common::leaderboard_config(),
    );
    let top = leaderboard.top_n(1).await.unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].rank, 1);
    assert_eq!(top[0].user_id, "u1");
    assert_eq!(top[0].total_clicks, 3);
    assert_eq!(top[0].username.as_deref(), Some("Ann"));
}

#[tokio::test]
async fn test_unknown_user_is_rejected_without_side_effects() {
    let (storage, _dir) = temp_storage().await;
    let engine = ClickEngine::new(
        storage.clone(),
        memory_cache(),
        &relaxed_clicks(),
        LeaderboardPolicy::Snapshot,
    );

    let err = engine.register_click("ghost").await.unwrap_err();
    assert_eq!(err, ClickerError::user_not_found("ghost"));
    assert!(storage.find_user("ghost").await.unwrap().is_none());
    assert_eq!(storage.count_click_events("ghost").await.unwrap(), 0);
    assert_eq!(storage.sum_totals().await.unwrap(), 0);
}

#[tokio::test]
async fn test_empty_user_id_is_a_validation_error() {
    let store = Arc::new(MockStore::new());
    let engine = ClickEngine::new(
        store.clone(),
        memory_cache(),
        &relaxed_clicks(),
        LeaderboardPolicy::Snapshot,
    );

    let err = engine.register_click("").await.unwrap_err();
    assert!(matches!(err, ClickerError::Validation(_)));
    assert_eq!(store.increment_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_user_id_is_trimmed_before_counting() {
    let store = Arc::new(MockStore::new().with_user("u1", 0));
    let cache = memory_cache();
    let engine = ClickEngine::new(
        store.clone(),
        cache.clone(),
        &relaxed_clicks(),
        LeaderboardPolicy::Snapshot,
    );

    let receipt = engine.register_click(" u1 ").await.unwrap();
    assert_eq!(receipt.total_clicks, 1);
    assert_eq!(store.total_of("u1"), Some(1));
    assert_eq!(
        cache.get(&keys::user_total("u1")).await.unwrap().as_deref(),
        Some("1")
    );

    let err = engine.register_click("   ").await.unwrap_err();
    assert!(matches!(err, ClickerError::Validation(_)));
    assert_eq!(store.increment_calls.load(Ordering::SeqCst), 1);
}

// =============================================================================
// 限流
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_rate_limit_rejects_exactly_one_over_budget() {
    let store = Arc::new(MockStore::new().with_user("u1", 0));
    let config = ClicksConfig {
        max_actions: 5,
        rate_limit_window_ms: 1000,
        ..ClicksConfig::default()
    };
    let engine = ClickEngine::new(
        store.clone(),
        memory_cache(),
        &config,
        LeaderboardPolicy::Snapshot,
    );

    let mut limited = 0;
    let mut retry_after = 0;
    for _ in 0..6 {
        match engine.register_click("u1").await {
            Ok(_) => {}
            Err(ClickerError::RateLimited { retry_after_ms }) => {
                limited += 1;
                retry_after = retry_after_ms;
            }
            Err(e) => panic!("unexpected error: {}", e),
        }
    }
    assert_eq!(limited, 1);
    assert!(retry_after > 0 && retry_after <= 1000);
    assert_eq!(store.total_of("u1"), Some(5));
    assert_eq!(store.event_count(), 5);

    tokio::time::advance(Duration::from_millis(1001)).await;

    let receipt = engine.register_click("u1").await.unwrap();
    assert_eq!(receipt.total_clicks, 6);
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_is_per_user() {
    let store = Arc::new(MockStore::new().with_user("a", 0).with_user("b", 0));
    let config = ClicksConfig {
        max_actions: 1,
        ..ClicksConfig::default()
    };
    let engine = ClickEngine::new(store, memory_cache(), &config, LeaderboardPolicy::Snapshot);

    engine.register_click("a").await.unwrap();
    assert!(matches!(
        engine.register_click("a").await,
        Err(ClickerError::RateLimited { .. })
    ));
    engine.register_click("b").await.unwrap();
}

// =============================================================================
// 故障注入
// =============================================================================

#[tokio::test]
async fn test_audit_failure_keeps_increment_and_warns() {
    let store = Arc::new(MockStore::new().with_user("u1", 10));
    store.fail_append.store(true, Ordering::SeqCst);
    let engine = ClickEngine::new(
        store.clone(),
        memory_cache(),
        &relaxed_clicks(),
        LeaderboardPolicy::Snapshot,
    );

    let receipt = engine.register_click("u1").await.unwrap();
    assert_eq!(receipt.total_clicks, 11);
    assert!(receipt.is_degraded());
    assert!(matches!(
        receipt.warnings.as_slice(),
        [ClickWarning::AuditLogFailed(_)]
    ));

    // 不重试：自增只发生一次，也没有审计记录
    assert_eq!(store.increment_calls.load(Ordering::SeqCst), 1);
    assert_eq!(store.total_of("u1"), Some(11));
    assert_eq!(store.event_count(), 0);
}

#[tokio::test]
async fn test_cache_outage_still_counts_durably() {
    let store = Arc::new(MockStore::new().with_user("u1", 0));
    let cache = Arc::new(DownCache::default());
    let config = ClicksConfig {
        max_actions: 1,
        ..ClicksConfig::default()
    };
    let engine = ClickEngine::new(store.clone(), cache.clone(), &config, LeaderboardPolicy::RankedSet);

    // 限流器不可用时放行，即使超过了配额
    for expected in 1..=3 {
        let receipt = engine.register_click("u1").await.unwrap();
        assert_eq!(receipt.total_clicks, expected);
        assert!(
            receipt
                .warnings
                .iter()
                .any(|w| matches!(w, ClickWarning::CacheDegraded(_)))
        );
        assert!(
            receipt
                .warnings
                .iter()
                .any(|w| matches!(w, ClickWarning::LeaderboardHintFailed(_)))
        );
    }
    assert_eq!(store.event_count(), 3);
    assert!(cache.calls.load(Ordering::SeqCst) > 0);
}

#[tokio::test]
async fn test_store_outage_surfaces_as_unavailable() {
    let store = Arc::new(MockStore::new().with_user("u1", 0));
    store.fail_all.store(true, Ordering::SeqCst);
    let engine = ClickEngine::new(
        store,
        memory_cache(),
        &relaxed_clicks(),
        LeaderboardPolicy::Snapshot,
    );

    let err = engine.register_click("u1").await.unwrap_err();
    assert!(matches!(err, ClickerError::StoreUnavailable(_)));
    assert!(err.is_transient());
}

#[tokio::test(start_paused = true)]
async fn test_fast_counter_drift_expires_after_store_outage() {
    let store = Arc::new(MockStore::new().with_user("u1", 0));
    store.fail_all.store(true, Ordering::SeqCst);
    let cache = memory_cache();
    let config = relaxed_clicks();
    let engine = ClickEngine::new(
        store.clone(),
        cache.clone(),
        &config,
        LeaderboardPolicy::Snapshot,
    );

    let err = engine.register_click("u1").await.unwrap_err();
    assert!(matches!(err, ClickerError::StoreUnavailable(_)));

    // 快速计数已经写入，持久层没有变化
    let user_key = keys::user_total("u1");
    assert_eq!(cache.get(&user_key).await.unwrap().as_deref(), Some("1"));
    assert_eq!(
        cache.get(keys::GLOBAL_CLICKS).await.unwrap().as_deref(),
        Some("1")
    );
    assert_eq!(store.total_of("u1"), Some(0));

    let ttl = Duration::from_millis(config.rate_limit_window_ms)
        * config.user_total_ttl_multiplier;
    tokio::time::advance(ttl - Duration::from_millis(1)).await;
    assert_eq!(cache.get(&user_key).await.unwrap().as_deref(), Some("1"));

    tokio::time::advance(Duration::from_millis(2)).await;
    assert_eq!(cache.get(&user_key).await.unwrap(), None);
    assert_eq!(store.total_of("u1"), Some(0));
}

// =============================================================================
// 快速路径计数与排名提示
// =============================================================================

#[tokio::test]
async fn test_fast_counters_and_rank_hint_are_updated() {
    let store = Arc::new(MockStore::new().with_user("u1", 0).with_user("u2", 0));
    let cache = memory_cache();
    let engine = ClickEngine::new(
        store,
        cache.clone(),
        &relaxed_clicks(),
        LeaderboardPolicy::RankedSet,
    );

    engine.register_click("u1").await.unwrap();
    engine.register_click("u1").await.unwrap();
    engine.register_click("u2").await.unwrap();

    assert_eq!(
        cache.get(&keys::user_total("u1")).await.unwrap().as_deref(),
        Some("2")
    );
    assert_eq!(
        cache.get(keys::GLOBAL_CLICKS).await.unwrap().as_deref(),
        Some("3")
    );
    assert_eq!(
        cache.ranked_rev_rank(keys::RANK_INDEX, "u1").await.unwrap(),
        Some(0)
    );
    assert_eq!(
        cache.ranked_rev_range(keys::RANK_INDEX, 0, 10).await.unwrap(),
        vec![("u1".to_string(), 2), ("u2".to_string(), 1)]
    );
}

#[tokio::test]
async fn test_snapshot_policy_does_not_touch_rank_index() {
    let store = Arc::new(MockStore::new().with_user("u1", 0));
    let cache = memory_cache();
    let engine = ClickEngine::new(
        store,
        cache.clone(),
        &relaxed_clicks(),
        LeaderboardPolicy::Snapshot,
    );

    engine.register_click("u1").await.unwrap();
    assert_eq!(cache.ranked_len(keys::RANK_INDEX).await.unwrap(), 0);
}
