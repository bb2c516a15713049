use chrono::NaiveDate;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::dates::parse_key;
use crate::error::{AppError, AppResult};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DB_PATH: &str = "data/completions.sqlite3";
const DEFAULT_END_DATE: &str = "2026-02-01";

/// Startup settings, read once from the environment
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub db_path: PathBuf,
    /// End of the range until the user picks another one
    pub default_end: NaiveDate,
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|_| AppError::Config(format!("PORT '{}' is not a port number", raw)))?,
            None => DEFAULT_PORT,
        };

        let db_path = lookup("CLASS_COUNTDOWN_DB")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH));

        let end_raw = lookup("CLASS_COUNTDOWN_END").unwrap_or_else(|| DEFAULT_END_DATE.to_string());
        let default_end = parse_key(&end_raw)
            .map_err(|_| AppError::Config(format!("CLASS_COUNTDOWN_END '{}' is not a YYYY-MM-DD date", end_raw)))?;

        Ok(Self { port, db_path, default_end })
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], self.port))
    }
}
