//! 排行榜接口 `/leaderboard`

use actix_web::{HttpResponse, web};

use crate::leaderboard::LeaderboardService;

use super::helpers::api_result;
use super::types::{GlobalTotalResponse, LeaderboardQuery, LeaderboardResponse};

/// GET /api/leaderboard?limit=&userId=
///
/// limit 超出范围时收敛到 `1..=max_limit`，不报错。
pub async fn get_leaderboard(
    query: web::Query<LeaderboardQuery>,
    leaderboard: web::Data<LeaderboardService>,
) -> HttpResponse {
    let LeaderboardQuery { limit, user_id } = query.into_inner();
    let limit = limit.unwrap_or_else(|| leaderboard.default_limit());
    let viewer = user_id.as_deref().filter(|id| !id.is_empty());

    api_result(
        leaderboard
            .leaderboard(limit, viewer)
            .await
            .map(LeaderboardResponse::from),
    )
}

/// GET /api/leaderboard/global
pub async fn get_global_total(leaderboard: web::Data<LeaderboardService>) -> HttpResponse {
    api_result(
        leaderboard
            .global_total()
            .await
            .map(|total| GlobalTotalResponse {
                total_clicks: total.to_string(),
            }),
    )
}

pub fn leaderboard_routes() -> actix_web::Scope {
    web::scope("/leaderboard")
        .route("", web::get().to(get_leaderboard))
        .route("/global", web::get().to(get_global_total))
}
