//! TOML configuration.
//!
//! ```toml
//! [registry]
//! folder_path = ".shellhub/registry"
//!
//! [router]
//! default_route = "/MultiIndex"
//!
//! [logging]
//! level = "info"
//! ```
//!
//! Every section is optional.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_FOLDER_PATH: &str = ".shellhub/registry";
pub const DEFAULT_ROUTE: &str = "/MultiIndex";
pub const DEFAULT_LOG_LEVEL: &str = "warn";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read settings {path}: {message}")]
    Read { path: String, message: String },

    #[error("failed to parse settings {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid settings: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrySettings {
    pub folder_path: PathBuf,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            folder_path: PathBuf::from(DEFAULT_FOLDER_PATH),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterSettings {
    pub default_route: String,
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            default_route: DEFAULT_ROUTE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub registry: RegistrySettings,
    pub router: RouterSettings,
    pub logging: LoggingSettings,
}

impl Settings {
    pub fn from_toml_str(text: &str, origin: &str) -> Result<Self, SettingsError> {
        let settings: Self = toml::from_str(text).map_err(|source| SettingsError::Parse {
            path: origin.to_string(),
            source,
        })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| SettingsError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&text, &path.display().to_string())
    }

    pub fn load_or_default(path: Option<&Path>) -> Result<Self, SettingsError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.registry.folder_path.as_os_str().is_empty() {
            return Err(SettingsError::Invalid(
                "registry.folder_path must not be empty".to_string(),
            ));
        }
        if !self.router.default_route.starts_with('/') {
            return Err(SettingsError::Invalid(format!(
                "router.default_route must start with `/`, got `{}`",
                self.router.default_route
            )));
        }
        Ok(())
    }
}
