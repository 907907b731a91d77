// src/config.rs
use std::{
    env,
    fmt::Display,
    net::{IpAddr, SocketAddr},
    str::FromStr,
};

use http::HeaderValue;
use thiserror::Error;
use tracing::debug;

use crate::slug::DEFAULT_SLUG_LENGTH;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid {key} value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Unset means polls live in process memory only.
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub slug_length: usize,
    pub bcrypt_cost: u32,
    /// Unset allows any origin.
    pub cors_allow_origin: Option<HeaderValue>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            database_url: None,
            max_connections: 5,
            slug_length: DEFAULT_SLUG_LENGTH,
            bcrypt_cost: 10,
            cors_allow_origin: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let config = Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_or(&lookup, "PORT", defaults.port)?,
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", defaults.max_connections)?,
            slug_length: parse_or(&lookup, "SLUG_LENGTH", defaults.slug_length)?,
            bcrypt_cost: parse_or(&lookup, "BCRYPT_COST", defaults.bcrypt_cost)?,
            cors_allow_origin: match lookup("CORS_ALLOW_ORIGIN") {
                Some(origin) => Some(HeaderValue::from_str(&origin).map_err(|e| {
                    ConfigError::Invalid {
                        key: "CORS_ALLOW_ORIGIN",
                        value: origin.clone(),
                        reason: e.to_string(),
                    }
                })?),
                None => None,
            },
        };

        check_range("SLUG_LENGTH", config.slug_length, 8, 32)?;
        check_range("BCRYPT_COST", config.bcrypt_cost, 4, 31)?;
        check_range("DATABASE_MAX_CONNECTIONS", config.max_connections, 1, 1000)?;

        Ok(config)
    }

    pub fn bind_address(&self) -> Result<SocketAddr, ConfigError> {
        let ip = self.host.parse::<IpAddr>().map_err(|e| ConfigError::Invalid {
            key: "HOST",
            value: self.host.clone(),
            reason: e.to_string(),
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
            value,
        }),
        None => {
            debug!("{key} not set, using default");
            Ok(default)
        }
    }
}

fn check_range<T>(key: &'static str, value: T, min: T, max: T) -> Result<(), ConfigError>
where
    T: PartialOrd + Display,
{
    if value < min || value > max {
        return Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
            reason: format!("must be between {min} and {max}"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.slug_length, DEFAULT_SLUG_LENGTH);
        assert!(config.database_url.is_none());
        assert_eq!(config.bind_address().unwrap().to_string(), "0.0.0.0:3000");
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("PORT", "8080"),
            ("DATABASE_URL", "postgres://localhost/polls"),
            ("SLUG_LENGTH", "12"),
            ("CORS_ALLOW_ORIGIN", "http://localhost:5173"),
        ]))
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/polls"));
        assert_eq!(config.slug_length, 12);
        assert_eq!(
            config.cors_allow_origin,
            Some(HeaderValue::from_static("http://localhost:5173"))
        );
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(Config::from_lookup(lookup(&[("PORT", "eighty")])).is_err());
        assert!(Config::from_lookup(lookup(&[("SLUG_LENGTH", "4")])).is_err());
        assert!(Config::from_lookup(lookup(&[("BCRYPT_COST", "2")])).is_err());
    }

    #[test]
    fn test_blank_database_url_means_memory() {
        let config = Config::from_lookup(lookup(&[("DATABASE_URL", "  ")])).unwrap();
        assert!(config.database_url.is_none());
    }
}
