use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::totp::Authenticator;
use crate::config::Config;
use crate::crypto::SecretBox;
use crate::rate_limit::AttemptLimiter;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub authenticator: Authenticator,
    pub secrets: SecretBox,
    pub login_limiter: AttemptLimiter,
    pub totp_limiter: AttemptLimiter,
}
