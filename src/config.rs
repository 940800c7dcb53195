use anyhow::Context;
use serde::Deserialize;

const DEFAULT_JWT_SECRET: &str = "change-me-in-production";
const DEFAULT_TTL_MINUTES: i64 = 30;
const MAX_TTL_MINUTES: i64 = 525_600; // one year
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000,http://127.0.0.1:3000";

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL is not set")?;

        let secret = match lookup("JWT_SECRET_KEY") {
            Some(s) if !s.is_empty() => s,
            _ => {
                tracing::warn!("JWT_SECRET_KEY not set; using the built-in development secret");
                DEFAULT_JWT_SECRET.to_string()
            }
        };

        let ttl_minutes = match lookup("ACCESS_TOKEN_EXPIRE_MINUTES") {
            Some(raw) => {
                let ttl = raw
                    .trim()
                    .parse::<i64>()
                    .with_context(|| format!("ACCESS_TOKEN_EXPIRE_MINUTES is not a number: {raw}"))?;
                anyhow::ensure!(ttl > 0, "ACCESS_TOKEN_EXPIRE_MINUTES must be positive, got {ttl}");
                anyhow::ensure!(
                    ttl <= MAX_TTL_MINUTES,
                    "ACCESS_TOKEN_EXPIRE_MINUTES must be at most {MAX_TTL_MINUTES}, got {ttl}"
                );
                ttl
            }
            None => DEFAULT_TTL_MINUTES,
        };

        let port = match lookup("APP_PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .with_context(|| format!("APP_PORT is not a valid port: {raw}"))?,
            None => 8000,
        };

        let cors_origins = lookup("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|| DEFAULT_CORS_ORIGINS.into())
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(String::from)
            .collect();

        Ok(Self {
            database_url,
            jwt: JwtConfig {
                secret,
                ttl_minutes,
            },
            host: lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            cors_origins,
        })
    }
}
