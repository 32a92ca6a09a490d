//! Server configuration parsed from environment variables.

use std::net::IpAddr;
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_OWNER_ID: i64 = 1;
pub const DEFAULT_WS_CLIENT_BUFFER: usize = 256;
pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bind_addr: IpAddr,
    pub port: u16,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    /// Owner assigned to boards created without one, and whose boards
    /// `GET /api/boards` lists. There is no authentication.
    pub default_owner_id: i64,
    /// Outbound queue depth per websocket connection.
    pub ws_client_buffer: usize,
    pub max_body_bytes: usize,
    pub static_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: IpAddr::from([0, 0, 0, 0]),
            port: DEFAULT_PORT,
            database_url: None,
            db_max_connections: DEFAULT_DB_MAX_CONNECTIONS,
            default_owner_id: DEFAULT_OWNER_ID,
            ws_client_buffer: DEFAULT_WS_CLIENT_BUFFER,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            static_dir: None,
        }
    }
}

impl Config {
    /// Build typed config from process environment variables.
    ///
    /// Optional:
    /// - `BIND_ADDR`: default `0.0.0.0`
    /// - `PORT`: default 3000
    /// - `DATABASE_URL`: Postgres; in-memory store when absent
    /// - `DB_MAX_CONNECTIONS`: default 5
    /// - `DEFAULT_OWNER_ID`: default 1
    /// - `WS_CLIENT_BUFFER`: default 256
    /// - `MAX_BODY_BYTES`: default 10 MiB
    /// - `STATIC_DIR`: serve a built client from this directory
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` when a set variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup. Empty values count as unset.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` when a set variable does not parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Ok(Self {
            bind_addr: parse_or(get("BIND_ADDR"), "BIND_ADDR", defaults.bind_addr)?,
            port: parse_or(get("PORT"), "PORT", defaults.port)?,
            database_url: get("DATABASE_URL"),
            db_max_connections: parse_positive(get("DB_MAX_CONNECTIONS"), "DB_MAX_CONNECTIONS", defaults.db_max_connections)?,
            default_owner_id: parse_or(get("DEFAULT_OWNER_ID"), "DEFAULT_OWNER_ID", defaults.default_owner_id)?,
            ws_client_buffer: parse_positive(get("WS_CLIENT_BUFFER"), "WS_CLIENT_BUFFER", defaults.ws_client_buffer)?,
            max_body_bytes: parse_positive(get("MAX_BODY_BYTES"), "MAX_BODY_BYTES", defaults.max_body_bytes)?,
            static_dir: get("STATIC_DIR").map(PathBuf::from),
        })
    }
}

fn parse_or<T: std::str::FromStr>(raw: Option<String>, key: &'static str, default: T) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid { key, value }),
    }
}

fn parse_positive<T>(raw: Option<String>, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr + Default + PartialEq,
{
    let value = raw.clone();
    let parsed = parse_or(raw, key, default)?;
    if parsed == T::default() {
        return Err(ConfigError::Invalid { key, value: value.unwrap_or_default() });
    }
    Ok(parsed)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
