use std::sync::{Arc, OnceLock};

use arc_swap::ArcSwap;

use super::StaticConfig;

/// 默认配置文件路径
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

static CONFIG: OnceLock<ArcSwap<StaticConfig>> = OnceLock::new();

/// Get the global configuration instance
///
/// Returns an Arc pointer to the configuration, which is cheap to clone
/// and doesn't hold any locks.
pub fn get_config() -> Arc<StaticConfig> {
    match CONFIG.get() {
        Some(config) => config.load_full(),
        None => Arc::new(StaticConfig::default()),
    }
}

/// Initialize the global configuration
///
/// Loads configuration from `path` (or "config.toml" when `None`).
/// If the file doesn't exist, uses in-memory defaults plus `CLICKER__*` overrides.
/// Subsequent calls are no-ops.
pub fn init_config(path: Option<&str>) {
    CONFIG.get_or_init(|| {
        ArcSwap::from_pointee(StaticConfig::load(path.unwrap_or(DEFAULT_CONFIG_PATH)))
    });
}

/// Replace the global configuration (used by tests and reload paths)
pub fn update_config(config: StaticConfig) {
    match CONFIG.get() {
        Some(current) => current.store(Arc::new(config)),
        None => {
            let _ = CONFIG.set(ArcSwap::from_pointee(config));
        }
    }
}
