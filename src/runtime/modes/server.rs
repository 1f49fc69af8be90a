//! Server mode
//!
//! 准备存储、缓存与服务，启动 HTTP 服务器并等待关闭信号。

use actix_cors::Cors;
use actix_web::{
    App, HttpServer,
    middleware::{Compress, DefaultHeaders},
};
use anyhow::{Context, Result};
use tracing::warn;

use crate::api::middleware::RequestIdMiddleware;
use crate::config::get_config;
use crate::runtime::lifetime;

/// 根据允许的来源列表构建 CORS 中间件
///
/// 空列表等同于只允许同源；包含 `*` 时允许任意来源，但不携带凭证。
pub fn build_cors_middleware(allowed_origins: &[String]) -> Cors {
    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "OPTIONS"])
        .allowed_header("Content-Type")
        .allowed_header("X-Request-ID")
        .expose_headers(vec!["Retry-After", "X-Request-ID"])
        .max_age(3600);

    if allowed_origins.iter().any(|o| o == "*") {
        cors = cors.allow_any_origin();
    } else {
        for origin in allowed_origins {
            cors = cors.allowed_origin(origin);
        }
    }
    cors
}

/// Run the HTTP server
///
/// **Note**: Logging system must be initialized before calling this function
pub async fn run_server() -> Result<()> {
    let startup = lifetime::startup::prepare_server_startup()
        .await
        .inspect_err(|e| tracing::error!("Server startup failed: {:#}", e))?;

    let config = get_config();
    let cpu_count = config.server.cpu_count.clamp(1, 32);
    warn!("Using {} CPU cores for the server", cpu_count);

    let allowed_origins = config.server.cors_allowed_origins.clone();
    if allowed_origins.is_empty() {
        warn!("CORS allowed origins is empty, only same-origin requests will be accepted");
    }

    let services = startup.services.clone();
    let bind_address = format!("{}:{}", config.server.host, config.server.port);

    let server = HttpServer::new(move || {
        let services = services.clone();
        App::new()
            .wrap(RequestIdMiddleware)
            .wrap(build_cors_middleware(&allowed_origins))
            .wrap(Compress::default())
            .wrap(
                DefaultHeaders::new()
                    .add(("Cache-Control", "no-cache, no-store, must-revalidate")),
            )
            .configure(|cfg| services.configure(cfg))
    })
    .keep_alive(std::time::Duration::from_secs(30))
    .client_request_timeout(std::time::Duration::from_millis(5000))
    .workers(cpu_count)
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {}", bind_address))?;

    warn!("Starting server at http://{}", bind_address);
    let server = server.run();

    tokio::select! {
        res = server => {
            res?;
        }
        _ = lifetime::shutdown::listen_for_shutdown(startup.storage.clone(), startup.cleanup_task) => {
            warn!("Graceful shutdown: all tasks completed");
        }
    }

    Ok(())
}
