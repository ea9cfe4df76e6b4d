//! Transport and dispatcher configuration.
//!
//! `TransportConfig` only describes how an owned transport should be built.
//! A transport passed in through `FuelConfig::preconfigured` is used as is;
//! the config is never applied to it.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::error::FuelError;

/// Settings used when the dispatcher builds its own transport.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub timeout_ms: Option<u64>,
    pub connect_timeout_ms: Option<u64>,
    pub max_redirects: u32,
    pub max_idle_connections: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout_ms: None,
            connect_timeout_ms: None,
            max_redirects: 10,
            max_idle_connections: 10,
        }
    }
}

impl TransportConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_ms.map(Duration::from_millis)
    }

    /// Parse a JSON document. Missing fields keep their defaults.
    pub fn from_json(raw: &str) -> Result<Self, FuelError> {
        serde_json::from_str(raw)
            .map_err(|e| FuelError::InvalidArgument(format!("invalid transport config: {e}")))
    }

    /// Read `FUEL_TIMEOUT_MS`, `FUEL_CONNECT_TIMEOUT_MS`, `FUEL_MAX_REDIRECTS`
    /// and `FUEL_MAX_IDLE_CONNECTIONS`. Unset variables keep their defaults.
    pub fn from_env() -> Result<Self, FuelError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, FuelError> {
        let mut config = Self::default();
        if let Some(v) = parse_var(&lookup, "FUEL_TIMEOUT_MS")? {
            config.timeout_ms = Some(v);
        }
        if let Some(v) = parse_var(&lookup, "FUEL_CONNECT_TIMEOUT_MS")? {
            config.connect_timeout_ms = Some(v);
        }
        if let Some(v) = parse_var(&lookup, "FUEL_MAX_REDIRECTS")? {
            config.max_redirects = v;
        }
        if let Some(v) = parse_var(&lookup, "FUEL_MAX_IDLE_CONNECTIONS")? {
            config.max_idle_connections = v;
        }
        Ok(config)
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, FuelError>
where
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| FuelError::InvalidArgument(format!("{key}={raw:?}: {e}"))),
    }
}

/// Configuration for a `Fuel` dispatcher.
///
/// With `preconfigured` set, that transport is shared with the caller and
/// survives `Fuel::close`. Otherwise the dispatcher builds and owns one from
/// `transport`.
#[derive(Debug)]
pub struct FuelConfig<T> {
    pub preconfigured: Option<Arc<T>>,
    pub transport: TransportConfig,
}

impl<T> FuelConfig<T> {
    pub fn new() -> Self {
        Self {
            preconfigured: None,
            transport: TransportConfig::default(),
        }
    }

    pub fn preconfigured(mut self, transport: Arc<T>) -> Self {
        self.preconfigured = Some(transport);
        self
    }

    pub fn transport(mut self, transport: TransportConfig) -> Self {
        self.transport = transport;
        self
    }
}

impl<T> Default for FuelConfig<T> {
    fn default() -> Self {
        Self::new()
    }
}
