use std::{env, fmt::Display, str::FromStr};

use tracing::{info, warn};

use crate::utils::error::{AppError, AppResult};

/// Which poll store backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Mongo,
    Memory,
}

impl FromStr for StoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mongodb" | "mongo" => Ok(StoreKind::Mongo),
            "memory" => Ok(StoreKind::Memory),
            other => Err(format!("unknown poll store '{other}', expected 'mongodb' or 'memory'")),
        }
    }
}

impl Display for StoreKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreKind::Mongo => write!(f, "mongodb"),
            StoreKind::Memory => write!(f, "memory"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub mongodb_uri: String,
    pub db_name: Option<String>,
    pub cors_origin: Option<String>,
    pub store: StoreKind,
}

impl Config {
    pub fn load() -> AppResult<Self> {
        Ok(Self {
            port: try_load("PORT", "3001")?,
            mongodb_uri: try_load("MONGODB_URI", "mongodb://localhost:27017/polls")?,
            db_name: optional("DB_NAME"),
            cors_origin: optional("CORS_ORIGIN"),
            store: try_load("POLL_STORE", "mongodb")?,
        })
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn try_load<T: FromStr>(key: &str, default: &str) -> AppResult<T>
where
    T::Err: Display,
{
    optional(key)
        .unwrap_or_else(|| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
            AppError::InternalError(format!("{key} is misconfigured: {e}"))
        })
}
