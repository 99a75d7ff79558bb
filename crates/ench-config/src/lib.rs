//! Configuration for EnCh
//!
//! The configuration is a YAML file (default `ench.yaml`) supporting a few
//! custom tags:
//!
//! - `!include path` - Include another YAML file
//! - `!secret key` - Substitute from secrets.yaml
//! - `!env_var VAR` - Environment variable substitution
//!
//! # Example
//!
//! ```ignore
//! use ench_config::load_config;
//!
//! let config = load_config("/config", "ench.yaml")?;
//! if let Some(battery) = &config.battery {
//!     println!("battery check every {:?}", battery.interval);
//! }
//! ```

mod error;
mod loader;
mod secrets;
mod settings;

pub use error::{ConfigError, ConfigResult};
pub use loader::{load_yaml, YamlLoader};
pub use secrets::Secrets;
pub use settings::*;

use std::path::{Path, PathBuf};

/// Load, tag-process and resolve an EnCh configuration file
pub fn load_config(
    config_dir: impl Into<PathBuf>,
    file: impl AsRef<Path>,
) -> ConfigResult<EnchConfig> {
    let value = load_yaml(config_dir, file)?;
    EnchConfig::from_value(value)
}
