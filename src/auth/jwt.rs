use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a token is good for. Only `Full` tokens open the API; an
/// `MfaChallenge` token can only be exchanged for a `Full` one at the
/// second-factor login step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    Full,
    MfaChallenge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifetime {
    /// Regular login session.
    Standard,
    /// "Remember me" session.
    Extended,
    /// Window to complete the second factor after the password step.
    Challenge,
}

impl Lifetime {
    pub fn duration(self) -> Duration {
        match self {
            Lifetime::Standard => Duration::hours(24),
            Lifetime::Extended => Duration::days(7),
            Lifetime::Challenge => Duration::minutes(5),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub role: String,
    pub kind: SessionKind,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(user_id: Uuid, email: &str, role: &str, kind: SessionKind, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            email: email.to_string(),
            role: role.to_string(),
            kind,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        }
    }

    pub fn session(user_id: Uuid, email: &str, role: &str, lifetime: Lifetime) -> Self {
        Self::new(user_id, email, role, SessionKind::Full, lifetime.duration())
    }

    pub fn challenge(user_id: Uuid, email: &str, role: &str) -> Self {
        Self::new(
            user_id,
            email,
            role,
            SessionKind::MfaChallenge,
            Lifetime::Challenge.duration(),
        )
    }
}

pub fn encode_token(claims: &Claims, secret: &str) -> Result<String, String> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| format!("JWT encode failed: {e}"))
}

pub fn decode_token(token: &str, secret: &str) -> Result<Claims, String> {
    // Tokens stop verifying at `exp`, with no clock tolerance.
    let mut validation = Validation::default();
    validation.leeway = 0;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| format!("JWT decode failed: {e}"))
}
