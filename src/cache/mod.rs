//! 快速计数缓存
//!
//! 限流计数、快速路径点击计数、排行榜快照和排名索引都放在这里。
//! 缓存不是权威数据源，全部内容都可以从持久层重建。

pub mod backends;
pub mod keys;
pub mod macros;
pub mod register;
pub mod traits;

use std::sync::{Arc, Once};

use tracing::info;

pub use backends::{MemoryCounterCache, RedisCounterCache};
pub use traits::{CounterCache, WindowCount};

use crate::config::CacheConfig;
use crate::errors::{ClickerError, Result};

static BUILTIN_PLUGINS: Once = Once::new();

/// 确保内置后端已注册（ctor 注册之外的兜底，链接器可能丢弃未引用的构造函数）
fn ensure_builtin_plugins() {
    BUILTIN_PLUGINS.call_once(|| {
        backends::memory::register_plugin();
        backends::redis::register_plugin();
    });
}

/// 根据 `cache.type` 创建计数缓存
pub async fn create_cache(config: &CacheConfig) -> Result<Arc<dyn CounterCache>> {
    ensure_builtin_plugins();
    register::debug_cache_registry();

    let constructor = register::get_counter_cache_plugin(&config.cache_type).ok_or_else(|| {
        ClickerError::cache_plugin_not_found(format!(
            "Unknown cache type '{}'. Available: {}",
            config.cache_type,
            register::registered_counter_cache_plugins().join(", ")
        ))
    })?;

    let cache = constructor(config.clone()).await?;
    info!("Counter cache initialized: {}", cache.backend_name());
    Ok(Arc::from(cache))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_memory_cache() {
        let config = CacheConfig::default();
        let cache = create_cache(&config).await.unwrap();
        assert_eq!(cache.backend_name(), "memory");
        cache.ping().await.unwrap();
    }

    #[tokio::test]
    async fn test_unknown_cache_type() {
        let config = CacheConfig {
            cache_type: "nope".to_string(),
            ..CacheConfig::default()
        };
        let err = match create_cache(&config).await {
            Ok(_) => panic!("unknown backend must fail"),
            Err(e) => e,
        };
        assert!(matches!(err, ClickerError::CachePluginNotFound(_)));
        assert!(err.message().contains("memory"));
    }
}
