//! 用户名校验与设置

use std::sync::Arc;

use tracing::info;

use crate::errors::{ClickerError, Result};
use crate::storage::{UserStore, UsernameUpdate};

pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 20;

const MSG_LENGTH: &str = "Username must be 3-20 characters long";
const MSG_CHARSET: &str = "Username can only contain letters, numbers, dashes, and underscores";
const MSG_TAKEN: &str = "This username is already taken";

/// 校验结果，`message` 是给用户看的原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsernameCheck {
    pub valid: bool,
    pub message: Option<String>,
}

impl UsernameCheck {
    fn ok() -> Self {
        Self {
            valid: true,
            message: None,
        }
    }

    fn rejected(message: &str) -> Self {
        Self {
            valid: false,
            message: Some(message.to_string()),
        }
    }
}

/// 只检查格式：3-20 个字符，仅限 `[A-Za-z0-9_-]`
pub fn check_username_format(username: &str) -> UsernameCheck {
    let len = username.chars().count();
    if !(USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&len) {
        return UsernameCheck::rejected(MSG_LENGTH);
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return UsernameCheck::rejected(MSG_CHARSET);
    }
    UsernameCheck::ok()
}

#[derive(Clone)]
pub struct UsernameService {
    users: Arc<dyn UserStore>,
}

impl UsernameService {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    /// 格式与唯一性
    pub async fn validate(&self, username: &str) -> Result<UsernameCheck> {
        let check = check_username_format(username);
        if !check.valid {
            return Ok(check);
        }
        if self.users.username_taken(username).await? {
            return Ok(UsernameCheck::rejected(MSG_TAKEN));
        }
        Ok(UsernameCheck::ok())
    }

    pub async fn set_username(&self, user_id: &str, username: &str) -> Result<UsernameCheck> {
        let check = self.validate(username).await?;
        if !check.valid {
            return Ok(check);
        }
        match self.users.set_username(user_id, username).await? {
            UsernameUpdate::Updated => {
                info!("User {} chose username {}", user_id, username);
                Ok(UsernameCheck::ok())
            }
            UsernameUpdate::Taken => Ok(UsernameCheck::rejected(MSG_TAKEN)),
            UsernameUpdate::UserNotFound => Err(ClickerError::user_not_found(user_id)),
        }
    }
}
