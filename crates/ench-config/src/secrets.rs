//! Secrets store backing the `!secret` tag
//!
//! Secrets live in `secrets.yaml` next to the configuration file so the hub
//! access token never has to be written into `ench.yaml` itself.

use crate::error::{ConfigError, ConfigResult};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name looked up in the configuration directory
pub const SECRETS_FILE: &str = "secrets.yaml";

/// Secrets loaded from secrets.yaml
#[derive(Debug, Clone)]
pub struct Secrets {
    secrets: HashMap<String, String>,
    path: PathBuf,
}

impl Secrets {
    /// Load secrets from `<config_dir>/secrets.yaml`
    ///
    /// A missing file is not an error; it yields an empty store.
    pub fn load(config_dir: &Path) -> ConfigResult<Self> {
        let path = config_dir.join(SECRETS_FILE);

        if !path.exists() {
            debug!(path = %path.display(), "No secrets file, using empty secrets");
            return Ok(Self {
                secrets: HashMap::new(),
                path,
            });
        }

        let content = fs::read_to_string(&path).map_err(|e| ConfigError::ReadFile {
            path: path.clone(),
            source: e,
        })?;

        Self::parse(&content, path)
    }

    fn parse(content: &str, path: PathBuf) -> ConfigResult<Self> {
        let raw: HashMap<String, serde_yaml::Value> =
            serde_yaml::from_str(content).map_err(|e| ConfigError::ParseYaml {
                path: path.clone(),
                source: e,
            })?;

        // Scalars become strings; anything else is re-serialized
        let secrets: HashMap<String, String> = raw
            .into_iter()
            .map(|(k, v)| {
                let str_value = match v {
                    serde_yaml::Value::String(s) => s,
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    serde_yaml::Value::Null => String::new(),
                    other => serde_yaml::to_string(&other)
                        .unwrap_or_default()
                        .trim()
                        .to_string(),
                };
                (k, str_value)
            })
            .collect();

        debug!(count = secrets.len(), path = %path.display(), "Loaded secrets");

        Ok(Self { secrets, path })
    }

    /// Get a secret by key
    pub fn get(&self, key: &str) -> ConfigResult<&str> {
        self.secrets
            .get(key)
            .map(|s| s.as_str())
            .ok_or_else(|| ConfigError::SecretNotFound {
                key: key.to_string(),
            })
    }

    /// Path the secrets were (or would have been) read from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of secrets loaded
    pub fn len(&self) -> usize {
        self.secrets.len()
    }

    /// Whether no secrets are loaded
    pub fn is_empty(&self) -> bool {
        self.secrets.is_empty()
    }
}

impl Default for Secrets {
    fn default() -> Self {
        Self {
            secrets: HashMap::new(),
            path: PathBuf::from(SECRETS_FILE),
        }
    }
}
