pub mod config;
pub mod poll;
pub mod serve;
pub mod submit;

use anyhow::Context;
use oc2_core::config::RelayConfig;
use std::path::Path;

pub const DEFAULT_SERVER: &str = "http://localhost:1512/oc2";

/// Load the config file when one was given, defaults otherwise.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<RelayConfig> {
    match path {
        Some(p) => RelayConfig::load(p)
            .with_context(|| format!("failed to load config from {}", p.display())),
        None => Ok(RelayConfig::default()),
    }
}
