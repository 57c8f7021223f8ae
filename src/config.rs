use std::path::PathBuf;

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_hours: i64,
}

/// Outbound mail relay. With no `api_url` messages are only logged.
#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    pub api_url: Option<String>,
    pub api_token: Option<String>,
    pub from: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AvatarConfig {
    pub tmp_dir: PathBuf,
    pub public_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub host: String,
    pub port: u16,
    /// Public origin used to build links in outgoing mail.
    pub base_url: String,
    pub jwt: JwtConfig,
    pub mail: MailConfig,
    pub avatars: AvatarConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let db_max_connections = parse_or("DB_MAX_CONNECTIONS", 10);
        let host = std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port = parse_or("APP_PORT", 8080);
        let base_url = std::env::var("APP_BASE_URL")
            .unwrap_or_else(|_| format!("http://localhost:{}", port));

        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET is not set")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "contactbook".into()),
            audience: std::env::var("JWT_AUDIENCE")
                .unwrap_or_else(|_| "contactbook-users".into()),
            ttl_hours: parse_or("JWT_TTL_HOURS", 23),
        };

        let mail = MailConfig {
            api_url: std::env::var("MAIL_API_URL").ok().filter(|v| !v.is_empty()),
            api_token: std::env::var("MAIL_API_TOKEN").ok().filter(|v| !v.is_empty()),
            from: std::env::var("MAIL_FROM").unwrap_or_else(|_| "no-reply@contactbook.local".into()),
        };

        let avatars = AvatarConfig {
            tmp_dir: std::env::var("UPLOAD_TMP_DIR")
                .unwrap_or_else(|_| "tmp".into())
                .into(),
            public_dir: std::env::var("AVATAR_DIR")
                .unwrap_or_else(|_| "public/avatars".into())
                .into(),
        };

        Ok(Self {
            database_url,
            db_max_connections,
            host,
            port,
            base_url: base_url.trim_end_matches('/').to_string(),
            jwt,
            mail,
            avatars,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Link embedded in verification mail.
    pub fn verification_link(&self, token: &str) -> String {
        format!("{}/api/users/verify/{}", self.base_url, token)
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
