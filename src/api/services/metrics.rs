//! 指标接口 `/metrics`

use std::sync::Arc;

use actix_web::{HttpResponse, web};
use tracing::warn;

use crate::cache::{CounterCache, keys};

use super::helpers::success_response;
use super::types::RateLimitUsageResponse;

/// GET /api/metrics/rate-limit
///
/// 最近一次限流检查发布的窗口内计数；没有数据或缓存不可用时为 0。
pub async fn rate_limit_usage(cache: web::Data<Arc<dyn CounterCache>>) -> HttpResponse {
    let usage = match cache.get(keys::RATE_LIMIT_USAGE).await {
        Ok(Some(raw)) => raw.parse::<i64>().unwrap_or(0),
        Ok(None) => 0,
        Err(e) => {
            warn!("Rate limit usage read failed: {}", e);
            0
        }
    };
    success_response(RateLimitUsageResponse { usage })
}

pub fn metrics_routes() -> actix_web::Scope {
    web::scope("/metrics").route("/rate-limit", web::get().to(rate_limit_usage))
}
