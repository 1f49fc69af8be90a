//! 会话接口 `/sessions`

use actix_web::{HttpResponse, web};
use tracing::debug;

use crate::services::SessionService;

use super::helpers::{api_result, error_from_clicker, success_response};
use super::types::{HeartbeatRequest, SessionCountsResponse, StatusResponse, TerminateRequest};

/// GET /api/sessions
pub async fn get_session_counts(sessions: web::Data<SessionService>) -> HttpResponse {
    api_result(sessions.counts().await.map(SessionCountsResponse::from))
}

/// POST /api/sessions/heartbeats
pub async fn heartbeat(
    body: web::Json<HeartbeatRequest>,
    sessions: web::Data<SessionService>,
) -> HttpResponse {
    match sessions
        .heartbeat(&body.user_id, body.chat_id.as_deref())
        .await
    {
        Ok(touched) => {
            debug!("Heartbeat for {} touched {} sessions", body.user_id, touched);
            success_response(StatusResponse { status: "ok" })
        }
        Err(e) => error_from_clicker(&e),
    }
}

/// POST /api/sessions/terminate
pub async fn terminate(
    body: web::Json<TerminateRequest>,
    sessions: web::Data<SessionService>,
) -> HttpResponse {
    match sessions.terminate(&body.user_id).await {
        Ok(_) => success_response(StatusResponse {
            status: "terminated",
        }),
        Err(e) => error_from_clicker(&e),
    }
}

pub fn sessions_routes() -> actix_web::Scope {
    web::scope("/sessions")
        .route("", web::get().to(get_session_counts))
        .route("/heartbeats", web::post().to(heartbeat))
        .route("/terminate", web::post().to(terminate))
}
