//! Runtime configuration.
//!
//! Database credentials come from the environment (a `.env` file is loaded
//! first if present). Everything else is a fixed location that only the CLI
//! may override.

use serde::Deserialize;
use sqlx::postgres::PgConnectOptions;
use thiserror::Error;

/// Warehouse schema holding the four training tables
pub const WAREHOUSE_SCHEMA: &str = "dw_alv";

/// Local CSV mirror of the warehouse tables
pub const CSV_MIRROR_DIR: &str = "data/CSVs";

/// External catalog snapshot
pub const CATALOG_PATH: &str = "aws/imdb_movies.parquet";

/// Destination of the ranked predictions
pub const OUTPUT_SCHEMA: &str = "imdb_alv";
pub const OUTPUT_TABLE: &str = "model_infer";

/// Columnar mirror of the output table
pub const SNAPSHOT_PATH: &str = "aws/imdb_model_infer.parquet";

const DEFAULT_DATABASE: &str = "postgres";
const DEFAULT_USER: &str = "postgres";
const DEFAULT_PORT: u16 = 5432;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Both IP and PASSWORD environment variables must be set ({0} is missing)")]
    Missing(&'static str),

    #[error("Invalid environment: {0}")]
    Env(#[from] envy::Error),
}

/// Only the two required variables are read from the environment; database
/// and user are fixed.
#[derive(Debug, Deserialize)]
struct DatabaseEnv {
    ip: Option<String>,
    password: Option<String>,
}

/// Connection parameters for the Postgres warehouse
#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// Host, optionally with `:port`
    pub ip: String,
    pub password: String,
    pub database: String,
    pub user: String,
}

impl DatabaseConfig {
    /// Load from the process environment (after `.env`)
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_parsed(envy::from_env::<DatabaseEnv>()?)
    }

    /// Load from explicit key/value pairs
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Self::from_parsed(envy::from_iter::<_, DatabaseEnv>(vars)?)
    }

    fn from_parsed(env: DatabaseEnv) -> Result<Self, ConfigError> {
        let required = |value: Option<String>, name| {
            value
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(name))
        };
        Ok(Self {
            ip: required(env.ip, "IP")?,
            password: required(env.password, "PASSWORD")?,
            database: DEFAULT_DATABASE.to_string(),
            user: DEFAULT_USER.to_string(),
        })
    }

    /// Host and port, splitting an explicit `host:port`
    pub fn host_and_port(&self) -> (&str, u16) {
        match self.ip.rsplit_once(':') {
            Some((host, port)) => match port.parse() {
                Ok(port) => (host, port),
                Err(_) => (self.ip.as_str(), DEFAULT_PORT),
            },
            None => (self.ip.as_str(), DEFAULT_PORT),
        }
    }

    pub fn connect_options(&self) -> PgConnectOptions {
        let (host, port) = self.host_and_port();
        PgConnectOptions::new()
            .host(host)
            .port(port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.database)
    }
}

// Keeps the password out of logs.
impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("ip", &self.ip)
            .field("database", &self.database)
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}
