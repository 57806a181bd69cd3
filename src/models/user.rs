use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_WORKER: &str = "worker";
pub const ROLES: [&str; 2] = [ROLE_ADMIN, ROLE_WORKER];

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: String,
    pub role: String,
    pub active: bool,
    #[serde(skip)]
    pub totp_secret_enc: Option<Vec<u8>>,
    pub two_factor_enabled: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Login must stop at the second factor.
    pub fn requires_second_factor(&self) -> bool {
        self.two_factor_enabled && self.totp_secret_enc.is_some()
    }
}
