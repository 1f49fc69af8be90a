//! API 帮助函数

use actix_web::http::StatusCode;
use actix_web::http::header::RETRY_AFTER;
use actix_web::{HttpResponse, error::InternalError, web};
use serde::Serialize;
use tracing::{error, warn};

use crate::errors::ClickerError;

use super::error_code::ErrorCode;
use super::types::ApiError;

/// 请求体上限，点击类接口的载荷都很小
const JSON_PAYLOAD_LIMIT: usize = 16 * 1024;

/// ClickerError → HTTP 状态码
pub fn http_status(err: &ClickerError) -> StatusCode {
    match err {
        ClickerError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        ClickerError::UserNotFound(_) => StatusCode::NOT_FOUND,
        ClickerError::Validation(_) => StatusCode::BAD_REQUEST,
        ClickerError::StoreUnavailable(_)
        | ClickerError::CacheUnavailable(_)
        | ClickerError::CacheConnection(_)
        | ClickerError::DatabaseConnection(_) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// 构建 JSON 响应
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> HttpResponse {
    HttpResponse::build(status)
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(body)
}

/// 构建成功响应
pub fn success_response<T: Serialize>(data: T) -> HttpResponse {
    json_response(StatusCode::OK, &data)
}

/// 构建错误响应
pub fn error_response(status: StatusCode, code: ErrorCode, message: &str) -> HttpResponse {
    json_response(
        status,
        &ApiError {
            code,
            error: message.to_string(),
            retry_after_ms: None,
        },
    )
}

/// 从 ClickerError 构建错误响应（自动映射 HTTP 状态码和 ErrorCode）
///
/// 限流时附带 `retryAfterMs` 和以秒为单位向上取整的 `Retry-After` 头。
pub fn error_from_clicker(err: &ClickerError) -> HttpResponse {
    let status = http_status(err);
    let body = ApiError {
        code: ErrorCode::from(err),
        error: err.message(),
        retry_after_ms: match err {
            ClickerError::RateLimited { retry_after_ms } => Some(*retry_after_ms),
            _ => None,
        },
    };

    if status.is_server_error() {
        error!("API request failed: {}", err);
    } else if !matches!(err, ClickerError::RateLimited { .. }) {
        warn!("API request rejected: {}", err);
    }

    let mut builder = HttpResponse::build(status);
    if let Some(ms) = body.retry_after_ms {
        builder.insert_header((RETRY_AFTER, ms.div_ceil(1000).max(1).to_string()));
    }
    builder
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(body)
}

/// 统一 Result → HttpResponse 转换
pub fn api_result<T, E>(result: Result<T, E>) -> HttpResponse
where
    T: Serialize,
    E: Into<ClickerError>,
{
    match result {
        Ok(data) => success_response(data),
        Err(e) => error_from_clicker(&e.into()),
    }
}

/// 载荷解析失败统一返回 400
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_PAYLOAD_LIMIT)
        .error_handler(|err, _req| {
            let message = format!("Invalid payload: {}", err);
            let resp = error_response(StatusCode::BAD_REQUEST, ErrorCode::BadRequest, &message);
            InternalError::from_response(err, resp).into()
        })
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        let message = format!("Invalid query: {}", err);
        let resp = error_response(StatusCode::BAD_REQUEST, ErrorCode::BadRequest, &message);
        InternalError::from_response(err, resp).into()
    })
}
