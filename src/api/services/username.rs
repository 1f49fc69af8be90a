//! 用户名接口 `/username`

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, web};

use crate::services::UsernameService;

use super::helpers::{error_from_clicker, json_response, success_response};
use super::types::{
    SetUsernameRequest, SetUsernameResponse, ValidateUsernameRequest, ValidateUsernameResponse,
};

/// POST /api/username/validate
pub async fn validate_username(
    body: web::Json<ValidateUsernameRequest>,
    usernames: web::Data<UsernameService>,
) -> HttpResponse {
    match usernames.validate(&body.username).await {
        Ok(check) => success_response(ValidateUsernameResponse::from(check)),
        Err(e) => error_from_clicker(&e),
    }
}

/// POST /api/username/set
///
/// 校验不通过或被占用时返回 400，消息放在 `message` 里。
pub async fn set_username(
    body: web::Json<SetUsernameRequest>,
    usernames: web::Data<UsernameService>,
) -> HttpResponse {
    match usernames.set_username(&body.user_id, &body.username).await {
        Ok(check) if check.valid => success_response(SetUsernameResponse::from(check)),
        Ok(check) => json_response(StatusCode::BAD_REQUEST, &SetUsernameResponse::from(check)),
        Err(e) => error_from_clicker(&e),
    }
}

pub fn username_routes() -> actix_web::Scope {
    web::scope("/username")
        .route("/validate", web::post().to(validate_username))
        .route("/set", web::post().to(set_username))
}
