//! 统一 API 错误码定义

use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::errors::ClickerError;

/// API 错误码枚举
///
/// 使用 serde_repr 序列化为数字。按千位分域：
/// - 0: 成功
/// - 1000-1099: 通用错误
/// - 2000-2099: 点击与限流
/// - 3000-3099: 用户与用户名
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(i32)]
pub enum ErrorCode {
    // 成功
    Success = 0,

    // 通用错误 1000-1099
    BadRequest = 1000,
    NotFound = 1004,
    InternalServerError = 1005,
    ServiceUnavailable = 1030,

    // 点击与限流 2000-2099
    RateLimitExceeded = 2004,

    // 用户 3000-3099
    UserNotFound = 3000,
    UsernameRejected = 3001,
}

impl From<&ClickerError> for ErrorCode {
    fn from(err: &ClickerError) -> Self {
        match err {
            ClickerError::RateLimited { .. } => ErrorCode::RateLimitExceeded,
            ClickerError::UserNotFound(_) => ErrorCode::UserNotFound,
            ClickerError::Validation(_) => ErrorCode::BadRequest,
            ClickerError::StoreUnavailable(_)
            | ClickerError::CacheUnavailable(_)
            | ClickerError::CacheConnection(_)
            | ClickerError::DatabaseConnection(_) => ErrorCode::ServiceUnavailable,
            ClickerError::CachePluginNotFound(_)
            | ClickerError::DatabaseConfig(_)
            | ClickerError::FileOperation(_)
            | ClickerError::Serialization(_) => ErrorCode::InternalServerError,
        }
    }
}
