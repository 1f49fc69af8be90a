//! 点击计数与限流
//!
//! - `rate_limiter`: 基于缓存的固定窗口限流
//! - `engine`: 单次点击的完整处理流程

pub mod engine;
pub mod rate_limiter;

pub use engine::{ClickEngine, ClickReceipt, ClickWarning};
pub use rate_limiter::{RateDecision, RateLimiter};
