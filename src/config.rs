// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Development builds fall back to local defaults for the signing key and
//! store. Production refuses to start without them.

use std::env;

/// Default token validity: 7 days.
const DEFAULT_TOKEN_TTL_SECS: i64 = 7 * 24 * 60 * 60;
/// Longest accepted token validity: 1 year.
pub const MAX_TOKEN_TTL_SECS: i64 = 365 * 24 * 60 * 60;
const DEFAULT_TOKEN_LEEWAY_SECS: u64 = 30;
/// Upper bound on accepted clock skew when verifying tokens.
pub const MAX_TOKEN_LEEWAY_SECS: u64 = 60;
const MIN_SIGNING_KEY_LEN: usize = 32;

/// Argon2id defaults (OWASP minimum recommendation).
const DEFAULT_HASH_COST: u32 = 3;
const DEFAULT_HASH_MEMORY_KIB: u32 = 19 * 1024;

const DEV_SIGNING_KEY: &str = "dev_only_jwt_signing_key_do_not_deploy";
const DEV_STORE_URL: &str = "memory://";

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn parse(raw: &str) -> Result<Self, ConfigError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" | "local" | "test" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            _ => Err(ConfigError::Invalid("APP_ENV", raw.to_string())),
        }
    }
}

/// Where users and profiles are persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreUrl {
    /// Process-local maps; contents are lost on restart.
    Memory,
    /// Google Firestore in the given GCP project.
    Firestore { project_id: String },
}

impl StoreUrl {
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let raw = raw.trim();
        if raw == "memory://" || raw == "memory" {
            return Ok(Self::Memory);
        }
        match raw.strip_prefix("firestore://") {
            Some(project) if !project.is_empty() && !project.contains('/') => {
                Ok(Self::Firestore {
                    project_id: project.to_string(),
                })
            }
            _ => Err(ConfigError::Invalid("STORE_URL", raw.to_string())),
        }
    }
}

/// Argon2 work factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashCost {
    /// Iteration count (t_cost)
    pub iterations: u32,
    /// Memory size in KiB (m_cost)
    pub memory_kib: u32,
}

impl Default for HashCost {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_HASH_COST,
            memory_kib: DEFAULT_HASH_MEMORY_KIB,
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    /// Backing store location
    pub store_url: StoreUrl,

    /// JWT signing key (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// How long an issued token stays valid
    pub token_ttl_secs: i64,
    /// Accepted clock skew when checking `exp`, at most `MAX_TOKEN_LEEWAY_SECS`
    pub token_leeway_secs: u64,
    pub hash_cost: HashCost,
}

impl Config {
    /// Default config for testing only.
    ///
    /// Uses the cheapest argon2 parameters so tests stay fast.
    pub fn test_default() -> Self {
        Self {
            environment: Environment::Development,
            frontend_url: "http://localhost:5173".to_string(),
            port: 8080,
            store_url: StoreUrl::Memory,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!!".to_vec(),
            token_ttl_secs: 3600,
            token_leeway_secs: 0,
            hash_cost: HashCost {
                iterations: 1,
                memory_kib: 64,
            },
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let environment = match env::var("APP_ENV") {
            Ok(raw) => Environment::parse(&raw)?,
            Err(_) => Environment::Development,
        };
        let production = environment == Environment::Production;

        let jwt_signing_key = match env::var("JWT_SIGNING_KEY") {
            Ok(key) => key.trim().as_bytes().to_vec(),
            Err(_) if production => return Err(ConfigError::Missing("JWT_SIGNING_KEY")),
            Err(_) => {
                tracing::warn!("JWT_SIGNING_KEY not set, using development key");
                DEV_SIGNING_KEY.as_bytes().to_vec()
            }
        };
        if production && jwt_signing_key.len() < MIN_SIGNING_KEY_LEN {
            return Err(ConfigError::Invalid(
                "JWT_SIGNING_KEY",
                format!("must be at least {} bytes", MIN_SIGNING_KEY_LEN),
            ));
        }

        let store_url = match env::var("STORE_URL") {
            Ok(raw) => StoreUrl::parse(&raw)?,
            Err(_) if production => return Err(ConfigError::Missing("STORE_URL")),
            Err(_) => StoreUrl::parse(DEV_STORE_URL)?,
        };

        let token_ttl_secs: i64 = parse_var("TOKEN_TTL_SECS", DEFAULT_TOKEN_TTL_SECS)?;
        if !(1..=MAX_TOKEN_TTL_SECS).contains(&token_ttl_secs) {
            return Err(ConfigError::Invalid(
                "TOKEN_TTL_SECS",
                format!("must be between 1 and {}", MAX_TOKEN_TTL_SECS),
            ));
        }
        let token_leeway_secs: u64 = parse_var("TOKEN_LEEWAY_SECS", DEFAULT_TOKEN_LEEWAY_SECS)?;

        Ok(Self {
            environment,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            port: parse_var("PORT", 8080)?,
            store_url,
            jwt_signing_key,
            token_ttl_secs,
            token_leeway_secs: token_leeway_secs.min(MAX_TOKEN_LEEWAY_SECS),
            hash_cost: HashCost {
                iterations: parse_var("PASSWORD_HASH_COST", DEFAULT_HASH_COST)?,
                memory_kib: parse_var("PASSWORD_HASH_MEMORY_KIB", DEFAULT_HASH_MEMORY_KIB)?,
            },
        })
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(name, raw)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
