//! Server configuration loaded from the environment

use anyhow::{bail, Context};
use auth_domain::hashing_service::DEFAULT_ITERATIONS;
use auth_domain::token_service::TokenConfig;
use jsonwebtoken::Algorithm;
use std::env;
use std::fmt;
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::str::FromStr;
use std::time::Duration;

/// Shortest accepted HMAC signing secret, in bytes
const MIN_SECRET_LEN: usize = 32;

/// Longest accepted session lifetime (30 days)
const MAX_TOKEN_TTL_SECS: u64 = 30 * 24 * 60 * 60;

#[derive(Clone)]
pub struct Config {
    /// gRPC listen address
    pub grpc_addr: SocketAddr,

    pub mongo_uri: String,
    pub db_name: String,
    pub credentials_collection: String,
    pub tokens_collection: String,

    /// HMAC secret used to sign session tokens
    pub token_secret: String,
    pub token_issuer: String,
    pub token_audience: Vec<String>,
    pub token_ttl: Duration,

    /// Upper bound for a single store call
    pub store_timeout: Duration,
    pub hash_iterations: NonZeroU32,
    /// How often expired tokens are purged
    pub purge_interval: Duration,
}

impl Config {
    /// Load settings from process environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load settings through `lookup`, which returns the raw value of a variable
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let token_secret = lookup("AUTH_TOKEN_SECRET").context("AUTH_TOKEN_SECRET must be set")?;
        if token_secret.len() < MIN_SECRET_LEN {
            bail!("AUTH_TOKEN_SECRET must be at least {} bytes", MIN_SECRET_LEN);
        }

        let token_ttl_secs: u64 = parse_var("AUTH_TOKEN_TTL_SECS", &get_or("AUTH_TOKEN_TTL_SECS", "3600"))?;
        if token_ttl_secs == 0 || token_ttl_secs > MAX_TOKEN_TTL_SECS {
            bail!(
                "AUTH_TOKEN_TTL_SECS must be between 1 and {}",
                MAX_TOKEN_TTL_SECS
            );
        }

        let store_timeout_ms: u64 = parse_var(
            "AUTH_STORE_TIMEOUT_MS",
            &get_or("AUTH_STORE_TIMEOUT_MS", "5000"),
        )?;
        if store_timeout_ms == 0 {
            bail!("AUTH_STORE_TIMEOUT_MS must be positive");
        }

        let hash_iterations: u32 = parse_var(
            "AUTH_HASH_ITERATIONS",
            &get_or("AUTH_HASH_ITERATIONS", &DEFAULT_ITERATIONS.to_string()),
        )?;
        let hash_iterations =
            NonZeroU32::new(hash_iterations).context("AUTH_HASH_ITERATIONS must be positive")?;

        let purge_interval_secs: u64 = parse_var(
            "AUTH_PURGE_INTERVAL_SECS",
            &get_or("AUTH_PURGE_INTERVAL_SECS", "300"),
        )?;
        if purge_interval_secs == 0 {
            bail!("AUTH_PURGE_INTERVAL_SECS must be positive");
        }

        let token_audience: Vec<String> = get_or("AUTH_TOKEN_AUDIENCE", "auth_clients")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if token_audience.is_empty() {
            bail!("AUTH_TOKEN_AUDIENCE must name at least one audience");
        }

        Ok(Self {
            grpc_addr: parse_var("AUTH_GRPC_ADDR", &get_or("AUTH_GRPC_ADDR", "0.0.0.0:50051"))?,
            mongo_uri: lookup("MONGO_DB_URI").context("MONGO_DB_URI must be set")?,
            db_name: get_or("AUTH_DB_NAME", "auth_db"),
            credentials_collection: get_or("AUTH_CREDENTIALS_COLLECTION", "credentials"),
            tokens_collection: get_or("AUTH_TOKENS_COLLECTION", "tokens"),
            token_secret,
            token_issuer: get_or("AUTH_TOKEN_ISSUER", "auth_server"),
            token_audience,
            token_ttl: Duration::from_secs(token_ttl_secs),
            store_timeout: Duration::from_millis(store_timeout_ms),
            hash_iterations,
            purge_interval: Duration::from_secs(purge_interval_secs),
        })
    }

    pub fn token_config(&self) -> anyhow::Result<TokenConfig> {
        let ttl = chrono::Duration::from_std(self.token_ttl).context("token TTL out of range")?;
        Ok(TokenConfig::new(
            self.token_secret.clone(),
            self.token_audience.clone(),
            self.token_issuer.clone(),
            Algorithm::HS256,
            ttl,
        ))
    }
}

fn parse_var<T>(key: &str, raw: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse()
        .with_context(|| format!("{} has an invalid value: {:?}", key, raw))
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("grpc_addr", &self.grpc_addr)
            .field("mongo_uri", &"<redacted>")
            .field("db_name", &self.db_name)
            .field("credentials_collection", &self.credentials_collection)
            .field("tokens_collection", &self.tokens_collection)
            .field("token_secret", &"<redacted>")
            .field("token_issuer", &self.token_issuer)
            .field("token_audience", &self.token_audience)
            .field("token_ttl", &self.token_ttl)
            .field("store_timeout", &self.store_timeout)
            .field("hash_iterations", &self.hash_iterations)
            .field("purge_interval", &self.purge_interval)
            .finish()
    }
}
