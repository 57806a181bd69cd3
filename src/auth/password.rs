use std::sync::LazyLock;

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

pub const MIN_LENGTH: usize = 8;
const MAX_LENGTH: usize = 256;

/// Hash burned on logins for unknown accounts so they cost the same as real ones.
static DECOY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash("decoy-password-never-matches").ok());

fn hasher() -> Result<Argon2<'static>, String> {
    // Argon2id, 19 MiB, 2 passes, 1 lane
    let params = Params::new(19 * 1024, 2, 1, None).map_err(|e| format!("Invalid params: {e}"))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

pub fn check_policy(password: &str) -> Result<(), String> {
    if password.len() < MIN_LENGTH {
        return Err(format!("Password must be at least {MIN_LENGTH} characters"));
    }
    if password.len() > MAX_LENGTH {
        return Err(format!("Password must be at most {MAX_LENGTH} characters"));
    }
    Ok(())
}

pub fn hash(password: &str) -> Result<String, String> {
    let salt = SaltString::generate(&mut OsRng);
    hasher()?
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| format!("Hashing failed: {e}"))
}

/// Verify against a stored PHC string; the cost parameters are read from the hash.
pub fn verify(password: &str, stored: &str) -> Result<bool, String> {
    let parsed = PasswordHash::new(stored).map_err(|e| format!("Invalid hash: {e}"))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Spend one verification on the decoy hash. Always false.
pub fn verify_decoy(password: &str) -> bool {
    if let Some(decoy) = DECOY_HASH.as_deref() {
        let _ = verify(password, decoy);
    }
    false
}
