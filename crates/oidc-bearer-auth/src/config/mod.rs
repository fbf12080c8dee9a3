//! Configuration management
//!
//! Supports configuration loading with precedence: env > file > CLI > defaults

mod builder;
mod env;
mod file;

pub use builder::{Config, ConfigBuilder, TelemetryConfig, TransportConfig};

use crate::Result;

/// Load configuration on top of `builder` with precedence: env > file > `builder`
pub fn load_config(mut builder: ConfigBuilder) -> Result<ConfigBuilder> {
    // Load from config file if exists
    if let Some(path) = file::find_config_file() {
        tracing::info!("Loading configuration from {}", path.display());
        builder = file::load_from_file(&path, builder)?;
    }

    // Override with environment variables
    builder = env::load_from_env(builder)?;

    Ok(builder)
}

/// Load configuration from a specific file path
pub fn load_config_from_path(
    path: &std::path::Path,
    builder: ConfigBuilder,
) -> Result<ConfigBuilder> {
    // Load from specified file
    let builder = file::load_from_file(path, builder)?;

    // Override with environment variables
    env::load_from_env(builder)
}
