use std::path::PathBuf;

use anyhow::{Context, Result, bail};

/// Accepted range for `PLAZA_TOKEN_TTL_DAYS`.
const TOKEN_TTL_DAYS: std::ops::RangeInclusive<i64> = 1..=365;

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

pub struct Config {
    pub jwt_secret: String,
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub token_ttl_days: i64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let jwt_secret = get("PLAZA_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("PLAZA_JWT_SECRET is unset or still a placeholder");
        }

        let port = get("PLAZA_PORT")
            .unwrap_or_else(|| "3000".into())
            .parse()
            .context("PLAZA_PORT must be a port number")?;
        let token_ttl_days: i64 = get("PLAZA_TOKEN_TTL_DAYS")
            .unwrap_or_else(|| "30".into())
            .parse()
            .context("PLAZA_TOKEN_TTL_DAYS must be an integer")?;
        if !TOKEN_TTL_DAYS.contains(&token_ttl_days) {
            bail!(
                "PLAZA_TOKEN_TTL_DAYS must be between {} and {}, got {}",
                TOKEN_TTL_DAYS.start(),
                TOKEN_TTL_DAYS.end(),
                token_ttl_days
            );
        }

        Ok(Self {
            jwt_secret,
            db_path: get("PLAZA_DB_PATH").unwrap_or_else(|| "plaza.db".into()).into(),
            host: get("PLAZA_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            token_ttl_days,
        })
    }
}
