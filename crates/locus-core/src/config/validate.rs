//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.limits.max_image_dimension == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_image_dimension must be > 0".into(),
            ));
        }
        if self.limits.decode_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.decode_timeout_ms must be > 0".into(),
            ));
        }
        if self.limits.request_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.request_timeout_ms must be > 0".into(),
            ));
        }
        if self.llava.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "llava.timeout_secs must be > 0".into(),
            ));
        }
        if self.llava.prompt.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "llava.prompt must not be empty".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.grounding_dino.score_threshold) {
            return Err(ConfigError::ValidationError(
                "grounding_dino.score_threshold must be between 0.0 and 1.0".into(),
            ));
        }
        if self.grounding_dino.font_size <= 0.0 {
            return Err(ConfigError::ValidationError(
                "grounding_dino.font_size must be > 0".into(),
            ));
        }
        Ok(())
    }
}
