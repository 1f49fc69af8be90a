use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::api::services::ApiServices;
use crate::cache::{self, CounterCache};
use crate::config::{LeaderboardPolicy, StaticConfig, get_config};
use crate::storage::{SeaOrmStorage, StorageFactory};

pub struct StartupContext {
    pub storage: Arc<SeaOrmStorage>,
    pub cache: Arc<dyn CounterCache>,
    pub services: ApiServices,
    /// 会话过期清理任务，关闭时中止
    pub cleanup_task: JoinHandle<()>,
}

/// 安装 rustls 默认加密实现，重复安装只记录日志
pub fn install_crypto_provider() {
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        debug!("rustls crypto provider already installed");
    }
}

/// 准备服务器启动的上下文
/// 包括存储、缓存、各业务服务以及后台任务
pub async fn prepare_server_startup() -> Result<StartupContext> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    install_crypto_provider();

    let config = get_config();

    let storage = StorageFactory::create(&config.database)
        .await
        .context("Failed to create storage backend")?;
    info!("Using storage backend: {}", storage.backend_name());

    let cache = cache::create_cache(&config.cache)
        .await
        .context("Failed to create cache")?;
    info!("Using cache backend: {}", cache.backend_name());

    let services = build_services(storage.clone(), cache.clone(), &config);

    if config.leaderboard.policy == LeaderboardPolicy::RankedSet {
        // 索引可以稍后在读路径上重建，这里失败不阻止启动
        match services.leaderboard.rebuild_rank_index().await {
            Ok(count) => debug!("Rank index primed with {} users", count),
            Err(e) => warn!("Failed to prime rank index: {}", e),
        }
    }

    let cleanup_task = services.sessions.start_cleanup_task();
    debug!(
        "Session cleanup scheduled every {}s",
        config.sessions.cleanup_interval_secs
    );

    info!(
        "Leaderboard policy: {}, rate limit: {} clicks per {} ms",
        config.leaderboard.policy, config.clicks.max_actions, config.clicks.rate_limit_window_ms
    );

    debug!(
        "Pre-startup processing completed in {} ms",
        start_time.elapsed().as_millis()
    );

    Ok(StartupContext {
        storage,
        cache,
        services,
        cleanup_task,
    })
}

/// 用同一个存储实例同时充当用户存储与会话存储
pub fn build_services(
    storage: Arc<SeaOrmStorage>,
    cache: Arc<dyn CounterCache>,
    config: &StaticConfig,
) -> ApiServices {
    ApiServices::new(storage.clone(), storage, cache, config)
}
