//! 点击接口 `/clicks`

use actix_web::{HttpResponse, web};
use tracing::trace;

use crate::clicks::ClickEngine;

use super::helpers::{error_from_clicker, success_response};
use super::types::{ClickRequest, ClickResponse};

/// POST /api/clicks
pub async fn register_click(
    body: web::Json<ClickRequest>,
    engine: web::Data<ClickEngine>,
) -> HttpResponse {
    trace!("Click request for user {}", body.user_id);
    match engine.register_click(&body.user_id).await {
        Ok(receipt) => success_response(ClickResponse::from(receipt)),
        Err(e) => error_from_clicker(&e),
    }
}

pub fn clicks_routes() -> actix_web::Scope {
    web::scope("/clicks").route("", web::post().to(register_click))
}
