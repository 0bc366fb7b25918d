// src/config/mod.rs
//! Configuration system for symmetric-vault
//!
//! TOML, one table per environment, `${VAR}` placeholders expanded from the
//! process environment before parsing.

pub use app::{key_file_pair, CipherSlot, Config, EnvironmentConfig, SlotSource};
pub use defaults::{default_config_path, default_environment};

mod app;
mod defaults;
mod env;

use std::path::Path;
use std::str::FromStr;

use crate::error::{CoreError, Result};

/// Parse config text after placeholder expansion
pub fn parse(text: &str) -> Result<Config> {
    let expanded = env::expand(text)?;
    toml::from_str(&expanded).map_err(|e| CoreError::Config(format!("invalid config: {e}")))
}

/// Read and parse a config file; relative key paths resolve against its directory
pub fn load_path(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .map_err(|e| CoreError::Config(format!("cannot read {}: {e}", path.display())))?;
    let mut config = parse(&text)?;
    config.base_dir = path.parent().map(Path::to_path_buf);
    Ok(config)
}

impl FromStr for Config {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        parse(s)
    }
}
