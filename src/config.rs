//! Configuration de l'application, lue depuis l'environnement
//! (après chargement éventuel d'un fichier `.env`).

use std::net::{IpAddr, SocketAddr};

use chrono::Duration;
use log::warn;
use thiserror::Error;

use crate::consts;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
    #[error("Missing required variable {0}")]
    Missing(&'static str),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub app_name: String,
    pub database_url: String,
    pub secret_key: String,
    pub access_token_ttl: Duration,
    pub http_host: IpAddr,
    pub http_port: u16,
    pub cors_origins: Vec<String>,
    pub casbin_model: String,
    pub casbin_policy: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_owned());

        let secret_key = match lookup("SECRET_KEY") {
            Some(key) if !key.is_empty() => key,
            _ if cfg!(debug_assertions) => {
                warn!("SECRET_KEY not set, using the debug signing key");
                consts::DEBUG_SECRET_KEY.to_owned()
            }
            _ => return Err(ConfigError::Missing("SECRET_KEY")),
        };

        let minutes: i64 = parse(
            "ACCESS_TOKEN_EXPIRE_MINUTES",
            lookup("ACCESS_TOKEN_EXPIRE_MINUTES"),
            consts::ACCESS_TOKEN_EXPIRE_MINUTES,
        )?;
        if minutes <= 0 {
            return Err(ConfigError::Invalid {
                key: "ACCESS_TOKEN_EXPIRE_MINUTES",
                value: minutes.to_string(),
            });
        }

        let http_host = parse(
            "HTTP_HOST",
            lookup("HTTP_HOST"),
            consts::HTTP_HOST
                .parse()
                .map_err(|_| ConfigError::Invalid {
                    key: "HTTP_HOST",
                    value: consts::HTTP_HOST.to_owned(),
                })?,
        )?;
        let http_port = parse("HTTP_PORT", lookup("HTTP_PORT"), consts::HTTP_PORT)?;

        let cors_origins = get("CORS_ORIGINS", consts::CORS_ORIGINS)
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_owned)
            .collect();

        Ok(Self {
            app_name: get("APP_NAME", consts::APP_NAME),
            database_url: get("DATABASE_URL", consts::DATABASE_URL),
            secret_key,
            access_token_ttl: Duration::minutes(minutes),
            http_host,
            http_port,
            cors_origins,
            casbin_model: get("CASBIN_MODEL", consts::CASBIN_MODEL),
            casbin_policy: get("CASBIN_POLICY", consts::CASBIN_POLICY),
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.http_host, self.http_port)
    }
}

fn parse<T: std::str::FromStr>(
    key: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}
