use std::{env, net::SocketAddr, str::FromStr, time::Duration};

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub listen_addr: SocketAddr,
    pub cookie_secret: String,
    pub session_ttl: Duration,
    pub store_timeout: Duration,
    pub request_timeout: Duration,
    pub default_page_size: u32,
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://rides.db".to_string());
        let listen_addr: SocketAddr = parse_var("APP_LISTEN_ADDR", "127.0.0.1:3000")?;

        let cookie_secret = env::var("COOKIE_SECRET")
            .unwrap_or_else(|_| "change-me-rides-admin-cookie-secret".to_string());

        let session_ttl_hours: u64 = parse_var("SESSION_TTL_HOURS", "12")?;
        let store_timeout_ms: u64 = parse_var("STORE_TIMEOUT_MS", "5000")?;
        let request_timeout_secs: u64 = parse_var("REQUEST_TIMEOUT_SECS", "15")?;
        let default_page_size: u32 = parse_var("DEFAULT_PAGE_SIZE", "10")?;
        if default_page_size == 0 {
            return Err(AppError::Config(
                "DEFAULT_PAGE_SIZE must be positive".to_string(),
            ));
        }

        Ok(Self {
            database_url,
            listen_addr,
            cookie_secret,
            session_ttl: Duration::from_secs(session_ttl_hours * 3600),
            store_timeout: Duration::from_millis(store_timeout_ms),
            request_timeout: Duration::from_secs(request_timeout_secs),
            default_page_size,
            admin_username: non_empty_var("ADMIN_USERNAME"),
            admin_password: non_empty_var("ADMIN_PASSWORD"),
        })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://rides.db".to_string(),
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            cookie_secret: "change-me-rides-admin-cookie-secret".to_string(),
            session_ttl: Duration::from_secs(12 * 3600),
            store_timeout: Duration::from_millis(5000),
            request_timeout: Duration::from_secs(15),
            default_page_size: 10,
            admin_username: None,
            admin_password: None,
        }
    }
}

fn parse_var<T>(key: &str, default: &str) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    raw.trim()
        .parse()
        .map_err(|err| AppError::Config(format!("invalid {key}: {err}")))
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
