use std::sync::LazyLock;

use regex::Regex;

use crate::auth::password;
use crate::error::AppError;
use crate::models::user::ROLES;

// ':' is excluded because the address doubles as the otpauth account label.
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s:]+@[^@\s:]+\.[^@\s:]+$").expect("email regex is valid")
});

pub fn email(value: &str) -> Result<(), AppError> {
    if value.len() > 254 || !EMAIL_RE.is_match(value) {
        return Err(AppError::BadRequest("Invalid email address".to_string()));
    }
    Ok(())
}

pub fn password(value: &str) -> Result<(), AppError> {
    password::check_policy(value).map_err(AppError::BadRequest)
}

pub fn role(value: &str) -> Result<(), AppError> {
    if ROLES.contains(&value) {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!(
            "Invalid role '{value}' (expected one of: {})",
            ROLES.join(", ")
        )))
    }
}

pub fn required<'a>(field: &str, value: &'a str) -> Result<&'a str, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }
    Ok(trimmed)
}

/// Trim optional text; blank becomes `None`.
pub fn optional(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
