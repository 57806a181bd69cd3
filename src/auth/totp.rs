//! TOTP second factor: secret generation, provisioning (otpauth URI + QR)
//! and code verification.
//!
//! Codes are RFC 6238 SHA-1, 6 digits, 30 second steps. Verification
//! accepts the current step and two steps either side.

use chrono::Utc;
use data_encoding::BASE32;
use serde::Serialize;
use totp_rs::{Algorithm, Secret, TOTP};

pub const DIGITS: usize = 6;
pub const STEP_SECS: u64 = 30;
pub const SKEW_STEPS: u8 = 2;
const SECRET_BYTES: usize = 20;

/// What an authenticator app needs to enroll.
#[derive(Debug, Serialize)]
pub struct Provisioning {
    pub secret: String,
    pub otpauth_url: String,
    /// PNG data URL.
    pub qr_code: String,
}

#[derive(Debug, Clone)]
pub struct Authenticator {
    issuer: String,
}

impl Authenticator {
    pub fn new(issuer: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
        }
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Fresh 160-bit secret, base32 encoded.
    pub fn generate_secret(&self) -> String {
        let bytes: [u8; SECRET_BYTES] = rand::random();
        BASE32.encode(&bytes)
    }

    pub fn provision(&self, secret: &str, account: &str) -> Result<Provisioning, String> {
        let totp = self.build(secret, account)?;
        let qr = totp
            .get_qr_base64()
            .map_err(|e| format!("QR generation failed: {e}"))?;

        Ok(Provisioning {
            secret: totp.get_secret_base32(),
            otpauth_url: totp.get_url(),
            qr_code: format!("data:image/png;base64,{qr}"),
        })
    }

    pub fn verify(&self, secret: &str, code: &str) -> Result<bool, String> {
        let now = u64::try_from(Utc::now().timestamp())
            .map_err(|_| "System clock is before the Unix epoch".to_string())?;
        self.verify_at(secret, code, now)
    }

    /// Check `code` against the steps around `unix_time`.
    pub fn verify_at(&self, secret: &str, code: &str, unix_time: u64) -> Result<bool, String> {
        let Some(code) = normalize_code(code) else {
            return Ok(false);
        };
        // The label plays no part in the code itself.
        let totp = self.build(secret, "verify")?;
        Ok(totp.check(&code, unix_time))
    }

    fn build(&self, secret: &str, account: &str) -> Result<TOTP, String> {
        let bytes = Secret::Encoded(secret.to_string())
            .to_bytes()
            .map_err(|e| format!("Invalid TOTP secret: {e}"))?;

        TOTP::new(
            Algorithm::SHA1,
            DIGITS,
            SKEW_STEPS,
            STEP_SECS,
            bytes,
            Some(self.issuer.clone()),
            account.to_string(),
        )
        .map_err(|e| format!("TOTP init failed: {e}"))
    }
}

/// Strip the spaces authenticator apps like to show; anything but 6 digits is no code at all.
fn normalize_code(code: &str) -> Option<String> {
    let code: String = code.chars().filter(|c| !c.is_whitespace()).collect();
    (code.len() == DIGITS && code.bytes().all(|b| b.is_ascii_digit())).then_some(code)
}
