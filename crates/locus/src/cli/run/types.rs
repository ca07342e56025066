//! Value enums for `locus run` flags, mapped onto the core method selections.

use clap::ValueEnum;
use locus_core::config::{
    DescriptionMethod, ExtractionMethod, LocationMethod, SegmentationMethod, TaggingMethod,
};

/// Output format for reports.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    /// Single JSON document
    Json,
    /// One JSON report per line
    Jsonl,
}

impl From<OutputFormat> for locus_core::OutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Json => locus_core::OutputFormat::Json,
            OutputFormat::Jsonl => locus_core::OutputFormat::JsonLines,
        }
    }
}

/// Tagging strategy.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum Tagging {
    /// RAM++ tags the image directly
    #[value(name = "ram_plus")]
    RamPlus,
    /// Describe with a vision LLM, then extract keywords
    #[value(name = "describe_extract")]
    DescribeExtract,
}

impl From<Tagging> for TaggingMethod {
    fn from(value: Tagging) -> Self {
        match value {
            Tagging::RamPlus => TaggingMethod::RamPlus,
            Tagging::DescribeExtract => TaggingMethod::DescribeExtract,
        }
    }
}

/// Captioning model.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum Description {
    Llava,
}

impl From<Description> for DescriptionMethod {
    fn from(value: Description) -> Self {
        match value {
            Description::Llava => DescriptionMethod::Llava,
        }
    }
}

/// Keyword-extraction model.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum Extraction {
    Deepseek,
}

impl From<Extraction> for ExtractionMethod {
    fn from(value: Extraction) -> Self {
        match value {
            Extraction::Deepseek => ExtractionMethod::Deepseek,
        }
    }
}

/// Open-vocabulary detector.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum Location {
    #[value(name = "grounding_dino")]
    GroundingDino,
}

impl From<Location> for LocationMethod {
    fn from(value: Location) -> Self {
        match value {
            Location::GroundingDino => LocationMethod::GroundingDino,
        }
    }
}

/// Segmentation model.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum Segmentation {
    Sam2,
}

impl From<Segmentation> for SegmentationMethod {
    fn from(value: Segmentation) -> Self {
        match value {
            Segmentation::Sam2 => SegmentationMethod::Sam2,
        }
    }
}
