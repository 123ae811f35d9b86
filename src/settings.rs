//! Layered configuration for the story screen.
//!
//! Values come from built-in defaults, then an optional TOML file, then
//! `STORYREEL__SECTION__KEY` environment variables, e.g.
//! `STORYREEL__TRANSITION__PRESENT_DURATION_MS=500`.

use std::path::Path;

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::scheduler::SchedulerConfig;
use crate::story::StripAppearance;
use crate::transition::{BackdropConfig, TransitionConfig};

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "STORYREEL";

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The configuration file was not found.
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    /// The path is not valid UTF-8.
    #[error("Invalid configuration path: {0}")]
    InvalidPath(String),

    /// Failed to read or parse the configuration.
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] ConfigError),

    /// A value parsed but is out of range.
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// Failed to render the configuration back to TOML.
    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Complete configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ReelConfig {
    pub transition: TransitionConfig,
    pub backdrop: BackdropConfig,
    pub strip: StripAppearance,
    pub scheduler: SchedulerConfig,
}

impl ReelConfig {
    /// Load configuration from an optional file plus environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or unparsable, or if any value
    /// fails validation.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use storyreel::settings::ReelConfig;
    ///
    /// let config = ReelConfig::load(Some("storyreel.toml"))?;
    /// # Ok::<(), storyreel::settings::SettingsError>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: Option<P>) -> Result<Self, SettingsError> {
        Self::load_with_prefix(path, ENV_PREFIX)
    }

    /// Same as [`load`](Self::load) with a custom environment prefix.
    pub fn load_with_prefix<P: AsRef<Path>>(
        path: Option<P>,
        env_prefix: &str,
    ) -> Result<Self, SettingsError> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            let path = path.as_ref();
            let path_str = path
                .to_str()
                .ok_or_else(|| SettingsError::InvalidPath(format!("{:?}", path)))?;
            if !path.exists() {
                return Err(SettingsError::FileNotFound(path_str.to_string()));
            }
            builder = builder.add_source(File::with_name(path_str));
        }

        let config = builder
            .add_source(
                Environment::with_prefix(env_prefix)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: ReelConfig = config.try_deserialize()?;
        settings.validate()?;
        debug!(?settings, "configuration loaded");
        Ok(settings)
    }

    /// Check every section.
    pub fn validate(&self) -> Result<(), SettingsError> {
        self.transition
            .validate()
            .and_then(|_| self.backdrop.validate())
            .and_then(|_| self.strip.validate())
            .and_then(|_| self.scheduler.validate())
            .map_err(SettingsError::Invalid)
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, SettingsError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
