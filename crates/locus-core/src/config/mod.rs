//! Configuration management for Locus.
//!
//! Configuration is loaded from the platform config directory with sensible
//! defaults. All config structs implement `Default`, so a partial file only
//! needs the keys it changes.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure for Locus.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Stage selections and artifact persistence
    pub pipeline: PipelineConfig,

    /// Input and artifact directories
    pub paths: PathsConfig,

    /// Resource limits
    pub limits: LimitsConfig,

    /// RAM++ tagging service
    pub ram_plus: RamPlusConfig,

    /// LLaVA description model
    pub llava: LlavaConfig,

    /// DeepSeek keyword extraction model
    pub deepseek: DeepseekConfig,

    /// Grounding DINO detection service
    pub grounding_dino: GroundingDinoConfig,

    /// SAM2 segmentation service
    pub sam2: Sam2Config,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// - macOS: ~/Library/Application Support/com.locus.locus/config.toml
    /// - Linux: ~/.config/locus/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\locus\config\config.toml
    ///
    /// Falls back to ~/.locus/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "locus", "locus")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".locus").join("config.toml")
            })
    }

    /// Directory bare image names are resolved against (with ~ expansion).
    pub fn input_image_dir(&self) -> PathBuf {
        expand(&self.paths.input_images)
    }

    /// Directory holding tag-set JSON files (with ~ expansion).
    pub fn tag_dir(&self) -> PathBuf {
        expand(&self.paths.output_tags)
    }

    /// Directory for description text files (with ~ expansion).
    pub fn description_dir(&self) -> PathBuf {
        expand(&self.paths.output_descriptions)
    }

    /// Directory for detection JSON and annotated images (with ~ expansion).
    pub fn location_dir(&self) -> PathBuf {
        expand(&self.paths.output_location)
    }

    /// Caption font for annotated images (with ~ expansion).
    pub fn font_path(&self) -> PathBuf {
        expand(&self.grounding_dino.font_path)
    }

    /// Per-request timeout for model services.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.limits.request_timeout_ms)
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

fn expand(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();
    let expanded = shellexpand::tilde(&path_str);
    PathBuf::from(expanded.into_owned())
}
