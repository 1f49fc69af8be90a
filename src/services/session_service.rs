//! 会话在线状态与过期清理

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, info, warn};

use crate::config::SessionsConfig;
use crate::errors::{ClickerError, Result};
use crate::storage::{SessionStatus, SessionStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionCounts {
    pub active: u64,
    pub inactive: u64,
}

#[derive(Clone)]
pub struct SessionService {
    sessions: Arc<dyn SessionStore>,
    timeout: Duration,
    cleanup_interval: Duration,
}

impl SessionService {
    pub fn new(sessions: Arc<dyn SessionStore>, config: &SessionsConfig) -> Self {
        Self {
            sessions,
            timeout: Duration::from_secs(config.timeout_minutes.saturating_mul(60)),
            cleanup_interval: Duration::from_secs(config.cleanup_interval_secs.max(1)),
        }
    }

    pub async fn heartbeat(&self, user_id: &str, chat_id: Option<&str>) -> Result<u64> {
        if user_id.is_empty() {
            return Err(ClickerError::validation("userId must not be empty"));
        }
        self.sessions.heartbeat(user_id, chat_id).await
    }

    pub async fn terminate(&self, user_id: &str) -> Result<u64> {
        if user_id.is_empty() {
            return Err(ClickerError::validation("userId must not be empty"));
        }
        self.sessions.terminate_sessions(user_id).await
    }

    pub async fn counts(&self) -> Result<SessionCounts> {
        let (active, inactive) = tokio::try_join!(
            self.sessions.count_sessions(SessionStatus::Active),
            self.sessions.count_sessions(SessionStatus::Inactive),
        )?;
        Ok(SessionCounts { active, inactive })
    }

    /// 把超过超时时间没有心跳的活跃会话标记为 INACTIVE
    pub async fn cleanup_stale(&self) -> Result<u64> {
        let timeout = chrono::Duration::from_std(self.timeout)
            .map_err(|e| ClickerError::validation(format!("invalid session timeout: {}", e)))?;
        let cutoff = Utc::now() - timeout;
        let marked = self.sessions.mark_stale_inactive(cutoff).await?;
        if marked > 0 {
            info!("Marked {} stale sessions inactive", marked);
        } else {
            debug!("No stale sessions");
        }
        Ok(marked)
    }

    /// 启动周期清理任务，失败只记日志
    pub fn start_cleanup_task(&self) -> JoinHandle<()> {
        let service = self.clone();
        tokio::spawn(async move {
            let mut ticker = interval(service.cleanup_interval);
            loop {
                ticker.tick().await;
                if let Err(e) = service.cleanup_stale().await {
                    warn!("Session cleanup failed: {}", e);
                }
            }
        })
    }
}
