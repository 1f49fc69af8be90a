use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumIter, EnumString};

/// 排行榜缓存策略
///
/// 一个部署只使用其中一种，不能混用：
/// - `Snapshot`：整体缓存 top-N 快照，TTL 到期后整体重算
/// - `RankedSet`：每次点击增量更新有序集合，定期从数据库整体校准
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Default,
    EnumIter,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LeaderboardPolicy {
    #[default]
    Snapshot,
    RankedSet,
}

impl std::fmt::Display for LeaderboardPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_ref())
    }
}

/// 静态配置（从 TOML 加载，启动时使用）
///
/// 优先级：ENV > config.toml > 默认值
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StaticConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub clicks: ClicksConfig,
    #[serde(default)]
    pub leaderboard: LeaderboardConfig,
    #[serde(default)]
    pub sessions: SessionsConfig,
}

impl StaticConfig {
    /// 从 TOML 文件和环境变量加载配置
    ///
    /// ENV 前缀：CLICKER，分隔符：__
    /// 示例：CLICKER__CLICKS__MAX_ACTIONS=10
    pub fn load(path: &str) -> Self {
        use config::{Config, Environment, File};

        let builder = Config::builder()
            // 1. 从 TOML 文件加载（可选）
            .add_source(File::with_name(path).required(false))
            // 2. 从环境变量覆盖，前缀 CLICKER，分隔符 __
            .add_source(
                Environment::with_prefix("CLICKER")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("server.cors_allowed_origins"),
            );

        match builder.build() {
            Ok(settings) => match settings.try_deserialize::<StaticConfig>() {
                Ok(config) => {
                    if std::path::Path::new(path).exists() {
                        eprintln!("[INFO] Configuration loaded from: {}", path);
                    }
                    config
                }
                Err(e) => {
                    eprintln!("[ERROR] Failed to deserialize config: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("[ERROR] Failed to build config: {}", e);
                Self::default()
            }
        }
    }

    /// 生成示例 TOML 配置文件
    pub fn generate_sample_config() -> String {
        let sample_config = Self::default();
        toml::to_string_pretty(&sample_config)
            .unwrap_or_else(|e| format!("Error generating sample config: {}", e))
    }

    /// 保存配置到 TOML 文件
    pub fn save_to_file<P: AsRef<std::path::Path>>(&self, path: P) -> crate::errors::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::errors::ClickerError::serialization(e.to_string()))?;

        if let Some(parent) = path.as_ref().parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    #[serde(default = "default_cpu_count")]
    pub cpu_count: usize,
    /// Mini App 前端所在的 origin，空表示只允许同源
    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,
}

/// 数据库连接配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_database_pool_size")]
    pub pool_size: u32,
    #[serde(default = "default_database_timeout")]
    pub timeout: u64,
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
}

/// 缓存系统配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(rename = "type")]
    #[serde(default = "default_cache_type")]
    pub cache_type: String,
    #[serde(default)]
    pub redis: RedisConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
}

/// Redis 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    #[serde(default = "default_redis_url")]
    pub url: String,
    #[serde(default = "default_redis_key_prefix")]
    pub key_prefix: String,
}

/// 内存缓存配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// 键数量上限，超过后先清理过期键，仍超限则拒绝新键
    #[serde(default = "default_memory_capacity")]
    pub max_capacity: u64,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default = "default_log_file")]
    pub file: Option<String>,
    #[serde(default = "default_max_backups")]
    pub max_backups: u32,
    #[serde(default = "default_enable_rotation")]
    pub enable_rotation: bool,
}

/// 点击计数与限流配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClicksConfig {
    /// 每次点击增加的数量
    #[serde(default = "default_click_increment")]
    pub increment: i64,
    /// 固定窗口长度（毫秒）
    #[serde(default = "default_rate_limit_window_ms")]
    pub rate_limit_window_ms: u64,
    /// 每个窗口允许的最大次数
    #[serde(default = "default_rate_limit_max_actions")]
    pub max_actions: u64,
    /// 用户快速计数键的 TTL = 窗口长度 × 该倍数
    #[serde(default = "default_user_total_ttl_multiplier")]
    pub user_total_ttl_multiplier: u32,
}

/// 排行榜配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardConfig {
    #[serde(default)]
    pub policy: LeaderboardPolicy,
    #[serde(default = "default_leaderboard_limit")]
    pub default_limit: usize,
    #[serde(default = "default_leaderboard_max_limit")]
    pub max_limit: usize,
    #[serde(default = "default_snapshot_ttl_secs")]
    pub snapshot_ttl_secs: u64,
    #[serde(default = "default_global_total_ttl_secs")]
    pub global_total_ttl_secs: u64,
    #[serde(default = "default_rank_resync_secs")]
    pub rank_resync_secs: u64,
}

/// 会话配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionsConfig {
    /// 超过该分钟数没有心跳的 ACTIVE 会话会被标记为 INACTIVE
    #[serde(default = "default_session_timeout_minutes")]
    pub timeout_minutes: u64,
    #[serde(default = "default_session_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,
}

// ============================================================
// Default value functions for static config
// ============================================================

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    3000
}

fn default_cpu_count() -> usize {
    num_cpus::get()
}

fn default_database_url() -> String {
    "clicker.db".to_string()
}

fn default_database_pool_size() -> u32 {
    10
}

fn default_database_timeout() -> u64 {
    30
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    100
}

fn default_retry_max_delay_ms() -> u64 {
    2000
}

fn default_cache_type() -> String {
    "memory".to_string()
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379/".to_string()
}

fn default_redis_key_prefix() -> String {
    "clicker:".to_string()
}

fn default_memory_capacity() -> u64 {
    100_000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_log_file() -> Option<String> {
    None
}

fn default_max_backups() -> u32 {
    5
}

fn default_enable_rotation() -> bool {
    true
}

fn default_click_increment() -> i64 {
    1
}

fn default_rate_limit_window_ms() -> u64 {
    1000
}

fn default_rate_limit_max_actions() -> u64 {
    25
}

fn default_user_total_ttl_multiplier() -> u32 {
    10
}

fn default_leaderboard_limit() -> usize {
    20
}

fn default_leaderboard_max_limit() -> usize {
    100
}

fn default_snapshot_ttl_secs() -> u64 {
    5
}

fn default_global_total_ttl_secs() -> u64 {
    5
}

fn default_rank_resync_secs() -> u64 {
    60
}

fn default_session_timeout_minutes() -> u64 {
    5
}

fn default_session_cleanup_interval_secs() -> u64 {
    60
}

// ============================================================
// Default implementations
// ============================================================

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            cpu_count: default_cpu_count(),
            cors_allowed_origins: Vec::new(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            pool_size: default_database_pool_size(),
            timeout: default_database_timeout(),
            retry_count: default_retry_count(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_type: default_cache_type(),
            redis: RedisConfig::default(),
            memory: MemoryConfig::default(),
        }
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            key_prefix: default_redis_key_prefix(),
        }
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_capacity: default_memory_capacity(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: default_log_file(),
            max_backups: default_max_backups(),
            enable_rotation: default_enable_rotation(),
        }
    }
}

impl Default for ClicksConfig {
    fn default() -> Self {
        Self {
            increment: default_click_increment(),
            rate_limit_window_ms: default_rate_limit_window_ms(),
            max_actions: default_rate_limit_max_actions(),
            user_total_ttl_multiplier: default_user_total_ttl_multiplier(),
        }
    }
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            policy: LeaderboardPolicy::default(),
            default_limit: default_leaderboard_limit(),
            max_limit: default_leaderboard_max_limit(),
            snapshot_ttl_secs: default_snapshot_ttl_secs(),
            global_total_ttl_secs: default_global_total_ttl_secs(),
            rank_resync_secs: default_rank_resync_secs(),
        }
    }
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            timeout_minutes: default_session_timeout_minutes(),
            cleanup_interval_secs: default_session_cleanup_interval_secs(),
        }
    }
}
