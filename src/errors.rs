use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickerError {
    CacheConnection(String),
    CacheUnavailable(String),
    CachePluginNotFound(String),
    DatabaseConfig(String),
    DatabaseConnection(String),
    StoreUnavailable(String),
    FileOperation(String),
    Validation(String),
    UserNotFound(String),
    RateLimited { retry_after_ms: u64 },
    Serialization(String),
}

impl ClickerError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            ClickerError::CacheConnection(_) => "E001",
            ClickerError::CacheUnavailable(_) => "E002",
            ClickerError::CachePluginNotFound(_) => "E003",
            ClickerError::DatabaseConfig(_) => "E004",
            ClickerError::DatabaseConnection(_) => "E005",
            ClickerError::StoreUnavailable(_) => "E006",
            ClickerError::FileOperation(_) => "E007",
            ClickerError::Validation(_) => "E008",
            ClickerError::UserNotFound(_) => "E009",
            ClickerError::RateLimited { .. } => "E010",
            ClickerError::Serialization(_) => "E011",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            ClickerError::CacheConnection(_) => "Cache Connection Error",
            ClickerError::CacheUnavailable(_) => "Cache Unavailable",
            ClickerError::CachePluginNotFound(_) => "Cache Plugin Not Found",
            ClickerError::DatabaseConfig(_) => "Database Configuration Error",
            ClickerError::DatabaseConnection(_) => "Database Connection Error",
            ClickerError::StoreUnavailable(_) => "Store Unavailable",
            ClickerError::FileOperation(_) => "File Operation Error",
            ClickerError::Validation(_) => "Validation Error",
            ClickerError::UserNotFound(_) => "User Not Found",
            ClickerError::RateLimited { .. } => "Rate Limited",
            ClickerError::Serialization(_) => "Serialization Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> String {
        match self {
            ClickerError::CacheConnection(msg)
            | ClickerError::CacheUnavailable(msg)
            | ClickerError::CachePluginNotFound(msg)
            | ClickerError::DatabaseConfig(msg)
            | ClickerError::DatabaseConnection(msg)
            | ClickerError::StoreUnavailable(msg)
            | ClickerError::FileOperation(msg)
            | ClickerError::Validation(msg)
            | ClickerError::Serialization(msg) => msg.clone(),
            ClickerError::UserNotFound(user_id) => format!("user '{}' does not exist", user_id),
            ClickerError::RateLimited { retry_after_ms } => {
                format!("rate limit exceeded, retry after {} ms", retry_after_ms)
            }
        }
    }

    /// 调用方可以按退避策略重试的错误
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ClickerError::RateLimited { .. }
                | ClickerError::StoreUnavailable(_)
                | ClickerError::CacheUnavailable(_)
        )
    }

    /// 格式化为彩色输出（用于 Server 模式）
    #[cfg(feature = "server")]
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出（用于 CLI 模式）
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for ClickerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for ClickerError {}

// 便捷的构造函数
impl ClickerError {
    pub fn cache_connection<T: Into<String>>(msg: T) -> Self {
        ClickerError::CacheConnection(msg.into())
    }

    pub fn cache_unavailable<T: Into<String>>(msg: T) -> Self {
        ClickerError::CacheUnavailable(msg.into())
    }

    pub fn cache_plugin_not_found<T: Into<String>>(msg: T) -> Self {
        ClickerError::CachePluginNotFound(msg.into())
    }

    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        ClickerError::DatabaseConfig(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        ClickerError::DatabaseConnection(msg.into())
    }

    pub fn store_unavailable<T: Into<String>>(msg: T) -> Self {
        ClickerError::StoreUnavailable(msg.into())
    }

    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        ClickerError::FileOperation(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        ClickerError::Validation(msg.into())
    }

    pub fn user_not_found<T: Into<String>>(user_id: T) -> Self {
        ClickerError::UserNotFound(user_id.into())
    }

    pub fn rate_limited(retry_after_ms: u64) -> Self {
        ClickerError::RateLimited { retry_after_ms }
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        ClickerError::Serialization(msg.into())
    }
}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for ClickerError {
    fn from(err: sea_orm::DbErr) -> Self {
        ClickerError::StoreUnavailable(err.to_string())
    }
}

impl From<redis::RedisError> for ClickerError {
    fn from(err: redis::RedisError) -> Self {
        ClickerError::CacheUnavailable(err.to_string())
    }
}

impl From<std::io::Error> for ClickerError {
    fn from(err: std::io::Error) -> Self {
        ClickerError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for ClickerError {
    fn from(err: serde_json::Error) -> Self {
        ClickerError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ClickerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_unique() {
        let errors = [
            ClickerError::cache_connection("x"),
            ClickerError::cache_unavailable("x"),
            ClickerError::cache_plugin_not_found("x"),
            ClickerError::database_config("x"),
            ClickerError::database_connection("x"),
            ClickerError::store_unavailable("x"),
            ClickerError::file_operation("x"),
            ClickerError::validation("x"),
            ClickerError::user_not_found("x"),
            ClickerError::rate_limited(10),
            ClickerError::serialization("x"),
        ];
        let mut codes: Vec<&str> = errors.iter().map(|e| e.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_rate_limited_message_carries_delay() {
        let err = ClickerError::rate_limited(750);
        assert_eq!(err.error_type(), "Rate Limited");
        assert!(err.message().contains("750"));
        assert!(err.is_transient());
    }

    #[test]
    fn test_user_not_found_is_not_transient() {
        let err = ClickerError::user_not_found("u1");
        assert_eq!(err.format_simple(), "User Not Found: user 'u1' does not exist");
        assert!(!err.is_transient());
    }
}
