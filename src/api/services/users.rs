//! 用户接口 `/users`

use actix_web::{HttpResponse, web};
use tracing::info;

use crate::services::UserService;

use super::helpers::api_result;
use super::types::{CreateUserRequest, UserResponse};

/// POST /api/users
///
/// 首次接触时建档，之后的调用只刷新活跃时间（以及给出的显示名）。
pub async fn register_user(
    body: web::Json<CreateUserRequest>,
    users: web::Data<UserService>,
) -> HttpResponse {
    let body = body.into_inner();
    let result = users
        .register_contact(&body.id, body.display_name.as_deref(), body.chat_id.as_deref())
        .await;
    if let Ok(user) = &result {
        info!("User {} registered or touched", user.id);
    }
    api_result(result.map(UserResponse::from))
}

/// GET /api/users/{id}
pub async fn get_user(path: web::Path<String>, users: web::Data<UserService>) -> HttpResponse {
    let user_id = path.into_inner();
    api_result(users.user_stats(&user_id).await.map(UserResponse::from))
}

pub fn users_routes() -> actix_web::Scope {
    web::scope("/users")
        .route("", web::post().to(register_user))
        .route("/{id}", web::get().to(get_user))
}
