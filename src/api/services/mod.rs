//! HTTP API
//!
//! 所有路由挂在 `/api` 下。各 handler 通过 `web::Data` 取得自己需要的服务，
//! 服务在启动时统一由 [`ApiServices`] 注册。

pub mod clicks;
pub mod error_code;
pub mod helpers;
pub mod leaderboard;
pub mod metrics;
pub mod sessions;
pub mod types;
pub mod username;
pub mod users;

use std::sync::Arc;

use actix_web::web;

use crate::cache::CounterCache;
use crate::clicks::ClickEngine;
use crate::config::StaticConfig;
use crate::leaderboard::LeaderboardService;
use crate::services::{SessionService, UserService, UsernameService};
use crate::storage::{SessionStore, UserStore};

pub use clicks::clicks_routes;
pub use error_code::ErrorCode;
pub use leaderboard::leaderboard_routes;
pub use metrics::metrics_routes;
pub use sessions::sessions_routes;
pub use username::username_routes;
pub use users::users_routes;

/// 一次启动中 API 依赖的全部服务
#[derive(Clone)]
pub struct ApiServices {
    pub engine: ClickEngine,
    pub leaderboard: LeaderboardService,
    pub users: UserService,
    pub usernames: UsernameService,
    pub sessions: SessionService,
    pub cache: Arc<dyn CounterCache>,
}

impl ApiServices {
    pub fn new(
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionStore>,
        cache: Arc<dyn CounterCache>,
        config: &StaticConfig,
    ) -> Self {
        let policy = config.leaderboard.policy;
        Self {
            engine: ClickEngine::new(users.clone(), cache.clone(), &config.clicks, policy),
            leaderboard: LeaderboardService::new(users.clone(), cache.clone(), &config.leaderboard),
            users: UserService::new(users.clone(), sessions.clone()),
            usernames: UsernameService::new(users),
            sessions: SessionService::new(sessions, &config.sessions),
            cache,
        }
    }

    /// 注册 app_data 并挂载 `/api` 路由，供 `App::configure` 使用
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(web::Data::new(self.engine.clone()))
            .app_data(web::Data::new(self.leaderboard.clone()))
            .app_data(web::Data::new(self.users.clone()))
            .app_data(web::Data::new(self.usernames.clone()))
            .app_data(web::Data::new(self.sessions.clone()))
            .app_data(web::Data::new(self.cache.clone()))
            .app_data(helpers::json_config())
            .app_data(helpers::query_config())
            .service(api_routes());
    }
}

/// `/api` 路由
pub fn api_routes() -> actix_web::Scope {
    web::scope("/api")
        .service(clicks_routes())
        .service(leaderboard_routes())
        .service(users_routes())
        .service(username_routes())
        .service(sessions_routes())
        .service(metrics_routes())
}
