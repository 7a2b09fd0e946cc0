//! Server logging setup.
//!
//! Thin wrapper around [`core::initialize_logger`] that resolves the level
//! and optional log-file path from [`crate::config::Config`].

use crate::config::Config;
use log::LevelFilter;
use std::str::FromStr;

pub fn init_from_config(cfg: &Config) -> anyhow::Result<()> {
    let level = LevelFilter::from_str(&cfg.logging.level).unwrap_or(LevelFilter::Info);
    let file_path = if cfg.logging.file.is_empty() {
        None
    } else {
        Some(cfg.logging.file.as_str())
    };

    core::initialize_logger(level, file_path)
        .map_err(|e| anyhow::anyhow!("failed to initialize logger: {e}"))?;
    Ok(())
}
