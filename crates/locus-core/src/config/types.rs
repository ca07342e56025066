//! Sub-configuration structs and stage method selections.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Which strategy produces the tag set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaggingMethod {
    /// RAM++ maps the image to tags in a single call
    RamPlus,
    /// A vision LLM describes the image, a text LLM extracts keywords
    DescribeExtract,
}

/// Captioning model for the describe-then-extract strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DescriptionMethod {
    Llava,
}

/// Keyword-extraction model for the describe-then-extract strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    Deepseek,
}

/// Open-vocabulary detector used by the location stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationMethod {
    GroundingDino,
}

/// Segmentation model fed with the located boxes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentationMethod {
    Sam2,
}

impl fmt::Display for TaggingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaggingMethod::RamPlus => write!(f, "RAM++"),
            TaggingMethod::DescribeExtract => write!(f, "DESCRIPTION & KEYWORD EXTRACTION"),
        }
    }
}

impl fmt::Display for DescriptionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DescriptionMethod::Llava => write!(f, "LLAVA"),
        }
    }
}

impl fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionMethod::Deepseek => write!(f, "DEEPSEEK"),
        }
    }
}

impl fmt::Display for LocationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationMethod::GroundingDino => write!(f, "GDINO"),
        }
    }
}

impl fmt::Display for SegmentationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SegmentationMethod::Sam2 => write!(f, "SAM2"),
        }
    }
}

/// Stage selections for one pipeline run.
///
/// `description` and `extraction` are only consulted when `tagging` is
/// [`TaggingMethod::DescribeExtract`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub tagging: TaggingMethod,
    pub description: DescriptionMethod,
    pub extraction: ExtractionMethod,
    pub location: LocationMethod,
    pub segmentation: SegmentationMethod,

    /// Write tag, description, detection and annotated-image artifacts
    pub save_artifacts: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            tagging: TaggingMethod::DescribeExtract,
            description: DescriptionMethod::Llava,
            extraction: ExtractionMethod::Deepseek,
            location: LocationMethod::GroundingDino,
            segmentation: SegmentationMethod::Sam2,
            save_artifacts: false,
        }
    }
}

/// Input and artifact directories.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory bare image names are resolved against
    pub input_images: PathBuf,

    /// Tag-set JSON files (written by tagging, read by standalone location)
    pub output_tags: PathBuf,

    /// Description text files
    pub output_descriptions: PathBuf,

    /// Detection JSON and annotated images
    pub output_location: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            input_images: PathBuf::from("~/.locus/input_images"),
            output_tags: PathBuf::from("~/.locus/output_tags"),
            output_descriptions: PathBuf::from("~/.locus/output_descriptions"),
            output_location: PathBuf::from("~/.locus/output_location"),
        }
    }
}

/// Resource limits to protect against problematic inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum image dimension (width or height)
    pub max_image_dimension: u32,

    /// Decode timeout in milliseconds
    pub decode_timeout_ms: u64,

    /// Per-request timeout for model services in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_image_dimension: 10000,
            decode_timeout_ms: 5000,
            request_timeout_ms: 120_000,
        }
    }
}

/// RAM++ tagging service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RamPlusConfig {
    pub endpoint: String,
}

impl Default for RamPlusConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8001".to_string(),
        }
    }
}

/// LLaVA description via Ollama.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlavaConfig {
    /// Ollama API endpoint
    pub endpoint: String,

    /// Model name
    pub model: String,

    /// Prompt sent with the image
    pub prompt: String,

    /// Seconds to keep asking for a non-empty description
    pub timeout_secs: u64,
}

impl Default for LlavaConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434".to_string(),
            model: "llava:34b".to_string(),
            prompt: "Describe the image.".to_string(),
            timeout_secs: 1200,
        }
    }
}

/// DeepSeek keyword extraction via Ollama.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeepseekConfig {
    /// Ollama API endpoint
    pub endpoint: String,

    /// Model name
    pub model: String,

    /// Instruction placed before the description
    pub instruction: String,
}

impl Default for DeepseekConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434".to_string(),
            model: "deepseek-r1:14b".to_string(),
            instruction: "Extract the physical objects mentioned in the following image \
                          description. Answer only with a JSON object mapping consecutive \
                          integer keys (as strings) to short singular object names, \
                          for example {\"0\": \"cup\", \"1\": \"table\"}."
                .to_string(),
        }
    }
}

/// Grounding DINO detection service and location-stage policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundingDinoConfig {
    pub endpoint: String,

    /// Candidates must score strictly above this to survive filtering
    pub score_threshold: f64,

    /// TrueType font for box labels on annotated images
    pub font_path: PathBuf,

    /// Label font size in pixels
    pub font_size: f32,
}

impl Default for GroundingDinoConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8002".to_string(),
            score_threshold: 0.3,
            font_path: PathBuf::from("/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf"),
            font_size: 20.0,
        }
    }
}

/// SAM2 segmentation service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Sam2Config {
    pub endpoint: String,
}

impl Default for Sam2Config {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8003".to_string(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
