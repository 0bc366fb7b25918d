// src/config/defaults.rs
use std::env;
use std::path::PathBuf;

use crate::consts::{CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH, DEFAULT_ENVIRONMENT, ENVIRONMENT_ENV};

pub fn default_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

pub fn default_environment() -> String {
    env::var(ENVIRONMENT_ENV).unwrap_or_else(|_| DEFAULT_ENVIRONMENT.to_owned())
}
