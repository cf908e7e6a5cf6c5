use std::time::Duration;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

use crate::error::GazeDashError;

/// Base URL used when neither the config file nor the environment sets one.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

/// Default timeline bin width in seconds.
pub const DEFAULT_BIN_SECONDS: u32 = 5;

#[derive(Debug, Deserialize, Clone)]
pub struct GazeDashConfig {
    pub service: ServiceConfig,
    pub api: ApiConfig,
    pub timeline: TimelineConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    /// Per-request timeout. Unset means a hung request stays pending until cancelled.
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

impl ApiConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(Duration::from_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct TimelineConfig {
    pub bin_seconds: u32,
}

impl GazeDashConfig {
    /// Load config from an optional TOML file, overlaid with `GAZEDASH__*` env vars.
    ///
    /// A missing file is not an error; the built-in defaults apply.
    pub fn load(path: &str) -> Result<Self, GazeDashError> {
        let s = defaults()?
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("GAZEDASH")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;
        Ok(s.try_deserialize()?)
    }

    /// Parse config from an in-memory TOML document on top of the defaults.
    pub fn from_toml_str(toml: &str) -> Result<Self, GazeDashError> {
        let s = defaults()?
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?;
        Ok(s.try_deserialize()?)
    }
}

fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("service.log_level", "info")?
        .set_default("api.base_url", DEFAULT_API_URL)?
        .set_default("timeline.bin_seconds", i64::from(DEFAULT_BIN_SECONDS))
}
