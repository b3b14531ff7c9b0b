use std::env;
use std::fmt;

use thiserror::Error;

pub const DB_NAME: &str = "DB_NAME";
pub const DB_USER: &str = "DB_USER";
pub const DB_PASSWORD: &str = "DB_PASSWORD";
pub const DB_HOST: &str = "DB_HOST";
pub const DB_PORT: &str = "DB_PORT";

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("missing configuration value {0}")]
    Missing(&'static str),
    #[error("DB_PORT is not a valid port number: '{0}'")]
    InvalidPort(String),
}

/// Connection settings for the destination database.
#[derive(Clone, PartialEq)]
pub struct DbConfig {
    pub name: String,
    pub user: String,
    pub password: String,
    pub host: String,
    pub port: u16,
}

impl DbConfig {
    /// Read the five connection values from the process environment.  Load
    /// the `.env` file first if you want it taken into account.
    pub fn from_env() -> Result<DbConfig, ConfigError> {
        DbConfig::from_lookup(|key| env::var(key).ok())
    }

    /// All values are required.  A blank value counts as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<DbConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| -> Result<String, ConfigError> {
            match lookup(key) {
                Some(value) if !value.trim().is_empty() => Ok(value),
                _ => Err(ConfigError::Missing(key)),
            }
        };

        let name = required(DB_NAME)?;
        let user = required(DB_USER)?;
        let password = required(DB_PASSWORD)?;
        let host = required(DB_HOST)?;
        let port = required(DB_PORT)?;
        let port = port
            .trim()
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort(port))?;

        Ok(DbConfig {
            name,
            user,
            password,
            host,
            port,
        })
    }
}

impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("name", &self.name)
            .field("user", &self.user)
            .field("password", &"***")
            .field("host", &self.host)
            .field("port", &self.port)
            .finish()
    }
}

impl fmt::Display for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}/{}", self.user, self.host, self.port, self.name)
    }
}
