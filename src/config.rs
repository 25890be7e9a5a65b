use std::env;
use std::fmt;
use std::str::FromStr;

use crate::access::AccessPolicy;
use crate::error::AppError;

const MIN_SECRET_LEN: usize = 32;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    pub ip: String,
    pub port: u16,
    pub secret_key: String,
    pub task_access: AccessPolicy,
}

impl Config {
    /// Reads the process environment. Call `dotenv::dotenv()` first to pick up a `.env` file.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret_key = lookup("SECRET_KEY")
            .ok_or_else(|| AppError::Config("SECRET_KEY must be set".to_string()))?;
        if secret_key.len() < MIN_SECRET_LEN {
            return Err(AppError::Config(format!(
                "SECRET_KEY must be at least {} bytes long",
                MIN_SECRET_LEN
            )));
        }

        Ok(Config {
            database_url: lookup("DATABASE_URL").unwrap_or_else(|| "sqlite:tasks.db".to_string()),
            max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 5)?,
            ip: lookup("IP").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse_or(&lookup, "PORT", 8080)?,
            secret_key,
            task_access: parse_or(&lookup, "TASK_ACCESS", AccessPolicy::Open)?,
        })
    }
}

// Debug output ends up in logs, so the signing secret is left out.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &self.database_url)
            .field("max_connections", &self.max_connections)
            .field("ip", &self.ip)
            .field("port", &self.port)
            .field("secret_key", &"<redacted>")
            .field("task_access", &self.task_access)
            .finish()
    }
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> Result<T, AppError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("invalid value for {}: {:?}", name, raw))),
        None => Ok(default),
    }
}
