//! Process configuration read from environment variables.

use std::str::FromStr;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://mantenimiento.db?mode=rwc";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_JWT_EXPIRES_IN_SECS: u64 = 86_400;
pub const DEFAULT_REFRESH_EXPIRES_IN_SECS: u64 = 604_800;
const MIN_SECRET_LEN: usize = 16;
/// Ten years; keeps expiry arithmetic far from overflow.
const MAX_TTL_SECS: u64 = 315_360_000;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Initial administrator created on startup when absent.
#[derive(Debug)]
pub struct AdminSeed {
    pub email: String,
    pub password: SecretString,
}

#[derive(Debug)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: SecretString,
    pub jwt_expires_in_secs: u64,
    pub refresh_expires_in_secs: u64,
    pub cors_origin: Option<String>,
    pub admin_seed: Option<AdminSeed>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let jwt_secret = get("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;
        if jwt_secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::Invalid {
                name: "JWT_SECRET",
                reason: format!("must be at least {MIN_SECRET_LEN} characters"),
            });
        }

        let admin_seed = match (get("ADMIN_EMAIL"), get("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(AdminSeed {
                email,
                password: SecretString::from(password),
            }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing("ADMIN_PASSWORD")),
            (None, Some(_)) => return Err(ConfigError::Missing("ADMIN_EMAIL")),
        };

        Ok(Self {
            database_url: get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            host: get("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse_or("PORT", get("PORT"), DEFAULT_PORT)?,
            jwt_secret: SecretString::from(jwt_secret),
            jwt_expires_in_secs: positive_or(
                "JWT_EXPIRES_IN_SECS",
                get("JWT_EXPIRES_IN_SECS"),
                DEFAULT_JWT_EXPIRES_IN_SECS,
            )?,
            refresh_expires_in_secs: positive_or(
                "REFRESH_EXPIRES_IN_SECS",
                get("REFRESH_EXPIRES_IN_SECS"),
                DEFAULT_REFRESH_EXPIRES_IN_SECS,
            )?,
            cors_origin: get("CORS_ORIGIN"),
            admin_seed,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn access_ttl_secs(&self) -> i64 {
        self.jwt_expires_in_secs as i64
    }

    pub fn refresh_ttl_secs(&self) -> i64 {
        self.refresh_expires_in_secs as i64
    }

    pub fn jwt_secret_bytes(&self) -> &[u8] {
        self.jwt_secret.expose_secret().as_bytes()
    }
}

fn parse_or<T>(name: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: format!("{raw:?}: {e}"),
        }),
    }
}

fn positive_or(name: &'static str, raw: Option<String>, default: u64) -> Result<u64, ConfigError> {
    let value = parse_or(name, raw, default)?;
    if value == 0 || value > MAX_TTL_SECS {
        return Err(ConfigError::Invalid {
            name,
            reason: format!("must be between 1 and {MAX_TTL_SECS}"),
        });
    }
    Ok(value)
}
