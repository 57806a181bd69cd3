use std::net::IpAddr;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub encryption_key: String,
    pub host: IpAddr,
    pub port: u16,
    pub registration: RegistrationMode,
    pub max_upload_size: usize,
    pub totp_issuer: String,
    pub log_level: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RegistrationMode {
    Open,
    Closed,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env_required("DATABASE_URL")?;
        let jwt_secret = env_required("JWT_SECRET")?;
        let encryption_key = env_required("QCONTROL_ENCRYPTION_KEY")?;

        let host: IpAddr = env_or("QCONTROL_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid QCONTROL_HOST: {e}"))?;

        let port: u16 = env_or("QCONTROL_PORT", "3000")
            .parse()
            .map_err(|e| format!("Invalid QCONTROL_PORT: {e}"))?;

        let registration = match env_or("QCONTROL_REGISTRATION", "closed").as_str() {
            "open" => RegistrationMode::Open,
            _ => RegistrationMode::Closed,
        };

        let max_upload_size: usize = env_or("QCONTROL_MAX_UPLOAD_SIZE", "5242880")
            .parse()
            .map_err(|e| format!("Invalid QCONTROL_MAX_UPLOAD_SIZE: {e}"))?;

        // otpauth labels use ':' as the issuer/account separator
        let totp_issuer = env_or("QCONTROL_TOTP_ISSUER", "Quality Control");
        if totp_issuer.contains(':') {
            return Err("Invalid QCONTROL_TOTP_ISSUER: must not contain ':'".to_string());
        }

        let log_level = env_or("QCONTROL_LOG_LEVEL", "info");

        Ok(Config {
            database_url,
            jwt_secret,
            encryption_key,
            host,
            port,
            registration,
            max_upload_size,
            totp_issuer,
            log_level,
        })
    }
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
