//! Error types for the Locus pipeline.
//!
//! Errors are organized by stage to provide clear, actionable error messages
//! that include relevant context (file paths, stage names, service names).

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for Locus operations.
#[derive(Error, Debug)]
pub enum LocusError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Errors raised outside of a specific stage (image loading, tag resolution)
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// A stage failed while processing an image; the run was aborted.
    #[error("{stage} stage failed for {image}: {source}")]
    Stage {
        stage: Stage,
        image: PathBuf,
        #[source]
        source: PipelineError,
    },
}

impl LocusError {
    /// The stage that failed, if the error came from one.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            LocusError::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

/// The three pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Tagging,
    Location,
    Segmentation,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Tagging => write!(f, "tagging"),
            Stage::Location => write!(f, "location"),
            Stage::Segmentation => write!(f, "segmentation"),
        }
    }
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Pipeline processing errors.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Source image or tag file does not exist
    #[error("Input not found: {0}")]
    MissingInput(PathBuf),

    /// No `.json` tag file in the scanned directory
    #[error("No .json tag files found in {dir}")]
    MissingTagSource { dir: PathBuf },

    /// A tag file exists but could not be parsed
    #[error("Invalid tag file {path}: {message}")]
    InvalidTagFile { path: PathBuf, message: String },

    /// Image decoding failed
    #[error("Decode error for {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// Image dimensions exceed limit
    #[error("Image too large: {path} ({width}x{height} > {max_dim})")]
    ImageTooLarge {
        path: PathBuf,
        width: u32,
        height: u32,
        max_dim: u32,
    },

    /// Operation timed out
    #[error("Timeout in {stage} stage for {path} after {timeout_ms}ms")]
    Timeout {
        path: PathBuf,
        stage: String,
        timeout_ms: u64,
    },

    /// Text generation never produced a non-empty result before the deadline
    #[error("{service} produced no text within {timeout_ms}ms ({attempts} attempts)")]
    GenerationTimeout {
        service: String,
        timeout_ms: u64,
        attempts: u32,
    },

    /// Tag generation failed
    #[error("Tagging failed for {path}: {message}")]
    Tagging { path: PathBuf, message: String },

    /// The keyword model answered with something that holds no tag list
    #[error("Could not parse keywords from model output: {0}")]
    KeywordParse(String),

    /// LLM call failed (Ollama transport, HTTP status, or response parsing)
    #[error("LLM error: {message}")]
    Llm {
        message: String,
        status_code: Option<u16>,
    },

    /// A model service call failed
    #[error("{service} service error: {message}")]
    Service {
        service: String,
        message: String,
        status_code: Option<u16>,
    },

    /// The detector returned output that cannot be normalized
    #[error("Malformed detector output: {0}")]
    DetectorOutput(String),

    /// Writing an artifact (JSON, text, image) failed
    #[error("Failed to write artifact {path}: {message}")]
    Artifact { path: PathBuf, message: String },
}

/// Convenience type alias for Locus results.
pub type Result<T> = std::result::Result<T, LocusError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_error_names_stage_and_image() {
        let err = LocusError::Stage {
            stage: Stage::Location,
            image: PathBuf::from("desk.jpg"),
            source: PipelineError::DetectorOutput("box with 3 coordinates".into()),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("location stage failed for desk.jpg"));
        assert!(msg.contains("box with 3 coordinates"));
        assert_eq!(err.stage(), Some(Stage::Location));
    }

    #[test]
    fn test_pipeline_error_has_no_stage() {
        let err = LocusError::from(PipelineError::MissingInput(PathBuf::from("a.jpg")));
        assert_eq!(err.stage(), None);
    }
}
