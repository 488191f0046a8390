//! Configuration for relaykit
//!
//! Centralized configuration with the relay module's factory defaults.
//! Values are passed explicitly into a session; nothing here is global.

use std::str::FromStr;
use std::time::Duration;

use crate::error::{RelayError, Result};

/// Widest relay bank the 32-bit data field can describe
pub const MAX_RELAYS: usize = 32;

/// Connection and addressing settings for one relay module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// Module host name or IP address
    pub host: String,

    /// Module TCP port
    pub port: u16,

    /// Connect/read/write timeout per attempt (milliseconds)
    pub timeout_ms: u64,

    /// Total attempts per exchange (first try included)
    pub retry_budget: u32,

    // -------------------------------------------------------------------------
    // Module Configuration
    // -------------------------------------------------------------------------
    /// Module address placed in every request frame
    pub module_number: u8,

    /// Number of relays on the board
    pub number_of_relays: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "192.168.1.240".to_string(),
            port: 8080,
            timeout_ms: 1000,
            retry_budget: 2,
            module_number: 1,
            number_of_relays: 16,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Load overrides from `RELAY_*` environment variables on top of the defaults
    ///
    /// Recognized: `RELAY_HOST`, `RELAY_PORT`, `RELAY_TIMEOUT_MS`,
    /// `RELAY_RETRIES`, `RELAY_MODULE`, `RELAY_COUNT`.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::from_env`] but reading from an arbitrary lookup
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(host) = lookup("RELAY_HOST") {
            config.host = host;
        }
        if let Some(port) = parse_var(&lookup, "RELAY_PORT")? {
            config.port = port;
        }
        if let Some(timeout_ms) = parse_var(&lookup, "RELAY_TIMEOUT_MS")? {
            config.timeout_ms = timeout_ms;
        }
        if let Some(retries) = parse_var(&lookup, "RELAY_RETRIES")? {
            config.retry_budget = retries;
        }
        if let Some(module) = parse_var(&lookup, "RELAY_MODULE")? {
            config.module_number = module;
        }
        if let Some(count) = parse_var(&lookup, "RELAY_COUNT")? {
            config.number_of_relays = count;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check that the settings describe a usable session
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(RelayError::Config("host must not be empty".to_string()));
        }
        if self.timeout_ms == 0 {
            return Err(RelayError::Config("timeout_ms must be positive".to_string()));
        }
        if self.retry_budget == 0 {
            return Err(RelayError::Config(
                "retry_budget must allow at least one attempt".to_string(),
            ));
        }
        if self.module_number == 0 {
            return Err(RelayError::Config(
                "module_number must be in 1..=255".to_string(),
            ));
        }
        if self.number_of_relays == 0 || self.number_of_relays > MAX_RELAYS {
            return Err(RelayError::Config(format!(
                "number_of_relays must be in 1..={}, got {}",
                MAX_RELAYS, self.number_of_relays
            )));
        }
        Ok(())
    }

    /// Per-attempt timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// `host:port` string for logging
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| RelayError::Config(format!("{}={:?}: {}", key, raw, e))),
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the module host
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Set the module port
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the per-attempt timeout (in milliseconds)
    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.config.timeout_ms = ms;
        self
    }

    /// Set the total number of attempts per exchange
    pub fn retry_budget(mut self, attempts: u32) -> Self {
        self.config.retry_budget = attempts;
        self
    }

    /// Set the module address
    pub fn module_number(mut self, module: u8) -> Self {
        self.config.module_number = module;
        self
    }

    /// Set the number of relays on the board
    pub fn number_of_relays(mut self, count: usize) -> Self {
        self.config.number_of_relays = count;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
