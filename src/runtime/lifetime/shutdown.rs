use std::sync::Arc;
use std::time::Duration;

use tokio::signal;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::storage::SeaOrmStorage;

/// 关闭超时时间（秒）
const SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// 等待 Ctrl+C 信号
pub async fn wait_for_signal() {
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received, closing resources...");
        }
        Err(e) => {
            warn!(
                "Failed to listen for Ctrl+C: {}. Proceeding with shutdown anyway.",
                e
            );
        }
    }
}

pub async fn listen_for_shutdown(storage: Arc<SeaOrmStorage>, cleanup_task: JoinHandle<()>) {
    wait_for_signal().await;

    let shutdown_result = timeout(
        Duration::from_secs(SHUTDOWN_TIMEOUT_SECS),
        perform_shutdown_tasks(storage, cleanup_task),
    )
    .await;

    match shutdown_result {
        Ok(()) => {
            info!("All shutdown tasks completed successfully");
        }
        Err(_) => {
            error!(
                "Shutdown tasks timed out after {} seconds! Forcing exit.",
                SHUTDOWN_TIMEOUT_SECS
            );
            std::process::exit(1);
        }
    }
}

/// 执行所有关闭任务（在超时内调用）
async fn perform_shutdown_tasks(storage: Arc<SeaOrmStorage>, cleanup_task: JoinHandle<()>) {
    cleanup_task.abort();

    // SeaOrmStorage 共享同一个连接池，关闭任意一个副本即可
    let storage = storage.as_ref().clone();
    match storage.close().await {
        Ok(()) => info!("Database connections closed"),
        Err(e) => error!("Failed to close database: {}", e),
    }
}
