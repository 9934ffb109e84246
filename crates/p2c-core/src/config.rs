//! Gateway configuration.
//!
//! All settings come from environment variables and are read exactly once,
//! at startup. The resulting [`GatewayConfig`] is immutable and handed to the
//! process bridge and the HTTP server explicitly.

use std::str::FromStr;
use std::time::Duration;

use crate::error::{Error, Result};

/// Executable name used when `BINARY_NAME` is unset.
pub const DEFAULT_COMPILER: &str = "COMPILER";
/// Origin allowed by CORS when `ALLOWED_ORIGIN` is unset.
pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:3000";

/// Immutable gateway configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Name or path of the external compiler executable.
    pub compiler: String,
    /// Host address the HTTP listener binds to.
    pub host: String,
    /// Port the HTTP listener binds to.
    pub port: u16,
    /// The single origin allowed to call the HTTP API from a browser.
    pub allowed_origin: String,
    /// Upper bound on draining in-flight requests at shutdown.
    pub shutdown_timeout: Duration,
    /// Upper bound on one compiler run. `None` waits forever.
    pub compile_timeout: Option<Duration>,
    /// Maximum number of compiler children alive at once.
    pub max_concurrent_compiles: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            compiler: DEFAULT_COMPILER.to_string(),
            host: "0.0.0.0".to_string(),
            port: 8080,
            allowed_origin: DEFAULT_ALLOWED_ORIGIN.to_string(),
            shutdown_timeout: Duration::from_secs(5),
            compile_timeout: Some(Duration::from_secs(30)),
            max_concurrent_compiles: 8,
        }
    }
}

impl GatewayConfig {
    /// Build the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();

        if let Some(compiler) = get("BINARY_NAME") {
            config.compiler = compiler;
        }
        if let Some(host) = get("HOST") {
            config.host = host;
        }
        if let Some(origin) = get("ALLOWED_ORIGIN") {
            config.allowed_origin = origin;
        }
        if let Some(port) = get("PORT") {
            config.port = parse("PORT", &port)?;
        }
        if let Some(secs) = get("SHUTDOWN_TIMEOUT_SECS") {
            config.shutdown_timeout = Duration::from_secs(parse("SHUTDOWN_TIMEOUT_SECS", &secs)?);
        }
        if let Some(secs) = get("COMPILE_TIMEOUT_SECS") {
            let secs: u64 = parse("COMPILE_TIMEOUT_SECS", &secs)?;
            config.compile_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        if let Some(max) = get("MAX_CONCURRENT_COMPILES") {
            let max: usize = parse("MAX_CONCURRENT_COMPILES", &max)?;
            if max == 0 {
                return Err(Error::Config {
                    key: "MAX_CONCURRENT_COMPILES",
                    message: "must be at least 1".to_string(),
                });
            }
            config.max_concurrent_compiles = max;
        }

        Ok(config)
    }

    /// Address string suitable for binding a listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse<T>(key: &'static str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| Error::Config {
        key,
        message: format!("{:?}: {}", value, e),
    })
}
