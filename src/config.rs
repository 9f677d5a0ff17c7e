//! Service configuration
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `STORE_BACKEND` | `postgres` | `postgres` or `memory` |
//! | `DATABASE_URL` | - | required for the Postgres store |
//! | `DB_MAX_CONNECTIONS` | `10` | pool size |
//! | `PORT` | `8083` | HTTP port |
//! | `PAYMENT_KEY_SECRET` | empty | gateway HMAC secret; empty disables paid checkout |
//! | `NATS_URL` | unset | event bus; unset means log-only events |
//! | `SEED_DEMO_DATA` | `true` for `memory`, else `false` | seed demo users and products at startup and enable `POST /api/seed-data` |

use std::env;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "pg" => Ok(Self::Postgres),
            "memory" | "mem" => Ok(Self::Memory),
            other => Err(ConfigError::Invalid("STORE_BACKEND", other.to_string())),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("{0} has an invalid value: {1}")]
    Invalid(&'static str, String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub store_backend: StoreBackend,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub port: u16,
    pub payment_key_secret: Option<String>,
    pub nats_url: Option<String>,
    pub seed_demo_data: bool,
}

fn var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parsed<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match var(name) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(name, raw)),
        None => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let store_backend = match var("STORE_BACKEND") {
            Some(raw) => raw.parse()?,
            None => StoreBackend::Postgres,
        };
        let database_url = var("DATABASE_URL");
        if store_backend == StoreBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }
        Ok(Self {
            store_backend,
            database_url,
            db_max_connections: parsed("DB_MAX_CONNECTIONS", 10)?,
            port: parsed("PORT", 8083)?,
            payment_key_secret: var("PAYMENT_KEY_SECRET"),
            nats_url: var("NATS_URL"),
            seed_demo_data: parsed("SEED_DEMO_DATA", store_backend == StoreBackend::Memory)?,
        })
    }
}
