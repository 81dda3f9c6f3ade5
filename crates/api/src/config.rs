//! Runtime configuration, read once from the environment at startup.

use std::net::SocketAddr;
use std::path::PathBuf;

use chrono::Duration;
use thiserror::Error;

use clinic_auth::HydrationPolicy;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    /// Where unauthenticated requests are redirected.
    pub login_path: String,
    /// Body of every 403 response.
    pub access_denied_message: String,
    pub hydration: HydrationPolicy,
    /// Optional JSON file with dev fixtures for the in-memory clinic records.
    pub seed_file: Option<PathBuf>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            login_path: "/login".to_string(),
            access_denied_message: "Access denied".to_string(),
            hydration: HydrationPolicy::default(),
            seed_file: None,
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the environment in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(addr) = lookup("CLINIC_BIND_ADDR") {
            config.bind_addr = addr.parse().map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                key: "CLINIC_BIND_ADDR",
                value: addr.clone(),
                reason: e.to_string(),
            })?;
        }

        if let Some(path) = lookup("CLINIC_LOGIN_PATH") {
            if !path.starts_with('/') {
                return Err(ConfigError::Invalid {
                    key: "CLINIC_LOGIN_PATH",
                    value: path,
                    reason: "must be an absolute path".to_string(),
                });
            }
            config.login_path = path;
        }

        if let Some(message) = lookup("CLINIC_ACCESS_DENIED_MESSAGE") {
            config.access_denied_message = message;
        }

        if let Some(ttl) = lookup("CLINIC_ROLE_TTL_SECS") {
            let secs: i64 = ttl.trim().parse().map_err(|e: std::num::ParseIntError| ConfigError::Invalid {
                key: "CLINIC_ROLE_TTL_SECS",
                value: ttl.clone(),
                reason: e.to_string(),
            })?;
            config.hydration = match secs {
                0 => HydrationPolicy::never_expire(),
                s if s > 0 => match Duration::try_seconds(s) {
                    Some(duration) => HydrationPolicy::expire_after(duration),
                    None => {
                        return Err(ConfigError::Invalid {
                            key: "CLINIC_ROLE_TTL_SECS",
                            value: ttl,
                            reason: "out of range".to_string(),
                        });
                    }
                },
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "CLINIC_ROLE_TTL_SECS",
                        value: ttl,
                        reason: "must not be negative".to_string(),
                    });
                }
            };
        }

        config.seed_file = lookup("CLINIC_SEED_FILE").map(PathBuf::from);

        Ok(config)
    }
}
