use sqlx::SqlitePool;
use std::sync::Arc;

use crate::config::Config;
use crate::middleware::RateLimiter;

pub mod expense;
pub mod household;
pub mod split;
pub mod user;

pub use expense::*;
pub use household::*;
pub use split::*;
pub use user::*;

/// Application state shared across all handlers
pub struct AppState {
    pub db: SqlitePool,
    pub config: Config,
    pub login_rate_limiter: Arc<RateLimiter>,
}
