//! Store configuration and the driver factory
//!
//! The store format is selected at startup by configuration, never probed
//! from content. A [`StoreConfig`] names one of the three formats plus the
//! location details that format needs; [`open_backend`] turns it into the
//! configured driver. Configuration lives in a TOML file under the
//! platform config directory.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::backend::{
    Backend, LinkedBackend, NestedBackend, RemoteBackend, RemoteClient, StoreVersion,
};

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("config serialization failed: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid configuration: {message}")]
    Invalid { message: String },
}

/// Connection details for a remote vault service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemoteConfig {
    /// Service endpoint URL
    pub endpoint: String,
    /// Bearer token for the service
    pub token: String,
}

/// Declarative description of one store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreConfig {
    /// Which of the three store formats to open
    pub format: StoreVersion,

    /// Container path for the local formats
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Connection details for the remote format
    #[serde(default)]
    pub remote: Option<RemoteConfig>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            format: StoreVersion::V2,
            path: Some(default_store_path()),
            remote: None,
        }
    }
}

impl StoreConfig {
    /// Load a config from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path.as_ref())?;
        let config: StoreConfig = toml::from_str(&raw)?;
        debug!(config = %path.as_ref().display(), "loaded store config");
        Ok(config)
    }

    /// Write the config back out as TOML
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        let raw = toml::to_string_pretty(self)?;
        fs::write(path, raw)?;
        Ok(())
    }
}

/// Default location of the config file under the platform config directory
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("keytree")
        .join("config.toml")
}

/// Default location of a local store container under the platform data
/// directory
pub fn default_store_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("keytree")
        .join("store.ktree")
}

/// Build the driver a config describes.
///
/// `key` unlocks the local container formats. The remote format takes its
/// transport through `remote_client`; the endpoint and token in the config
/// belong to whoever constructs that client.
pub fn open_backend(
    config: &StoreConfig,
    key: &str,
    remote_client: Option<Box<dyn RemoteClient>>,
) -> Result<Box<dyn Backend>, ConfigError> {
    match config.format {
        StoreVersion::V1 => {
            let path = local_path(config)?;
            Ok(Box::new(LinkedBackend::new(path, key)))
        }
        StoreVersion::V2 => {
            let path = local_path(config)?;
            Ok(Box::new(NestedBackend::new(path, key)))
        }
        StoreVersion::Remote => {
            let client = remote_client.ok_or_else(|| ConfigError::Invalid {
                message: "remote store configured but no remote client supplied".to_string(),
            })?;
            Ok(Box::new(RemoteBackend::new(client)))
        }
    }
}

fn local_path(config: &StoreConfig) -> Result<&Path, ConfigError> {
    config
        .path
        .as_deref()
        .ok_or_else(|| ConfigError::Invalid {
            message: "local store configured without a container path".to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryRemoteClient;
    use tempfile::TempDir;

    #[test]
    fn test_config_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("keytree").join("config.toml");

        let config = StoreConfig {
            format: StoreVersion::V1,
            path: Some(PathBuf::from("/var/lib/keytree/store.ktree")),
            remote: None,
        };
        config.save(&path).unwrap();

        let loaded = StoreConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_invalid_toml_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "format = [not toml").unwrap();

        let err = StoreConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_factory_selects_format() {
        let dir = TempDir::new().unwrap();
        let config = StoreConfig {
            format: StoreVersion::V1,
            path: Some(dir.path().join("store.ktree")),
            remote: None,
        };
        let backend = open_backend(&config, "master", None).unwrap();
        assert_eq!(backend.version(), StoreVersion::V1);

        let config = StoreConfig {
            format: StoreVersion::V2,
            ..config
        };
        let backend = open_backend(&config, "master", None).unwrap();
        assert_eq!(backend.version(), StoreVersion::V2);
    }

    #[test]
    fn test_factory_remote_requires_client() {
        let config = StoreConfig {
            format: StoreVersion::Remote,
            path: None,
            remote: Some(RemoteConfig {
                endpoint: "https://vault.example".to_string(),
                token: "t".to_string(),
            }),
        };
        assert!(matches!(
            open_backend(&config, "", None),
            Err(ConfigError::Invalid { .. })
        ));

        let backend =
            open_backend(&config, "", Some(Box::new(MemoryRemoteClient::new()))).unwrap();
        assert_eq!(backend.version(), StoreVersion::Remote);
    }

    #[test]
    fn test_local_format_requires_path() {
        let config = StoreConfig {
            format: StoreVersion::V2,
            path: None,
            remote: None,
        };
        assert!(matches!(
            open_backend(&config, "master", None),
            Err(ConfigError::Invalid { .. })
        ));
    }
}
