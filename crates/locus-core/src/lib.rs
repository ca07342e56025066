//! Locus Core - tagging, grounding and segmentation pipeline.
//!
//! Locus takes an image, produces candidate object tags, grounds those tags
//! into scored bounding boxes with an open-vocabulary detector, and hands the
//! boxes to a segmentation model. The models themselves are external: Ollama
//! serves the language models, small HTTP services serve the vision models.
//!
//! # Architecture
//!
//! ```text
//! Image → Tagging (RAM++ | LLaVA → DeepSeek) → Location (Grounding DINO) → Segmentation (SAM2)
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use locus_core::{Config, ModelFactory, Pipeline};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> locus_core::Result<()> {
//!     let config = Config::load()?;
//!     let pipeline = Pipeline::new(&config, &ModelFactory::new(&config)).await?;
//!
//!     let report = pipeline.run(Path::new("desk.jpg")).await?;
//!     println!("{} detections in {:?}", report.detections.len(), report.elapsed);
//!
//!     pipeline.shutdown().await
//! }
//! ```

// Module declarations
pub mod artifact;
pub mod config;
pub mod error;
pub mod llm;
pub mod location;
pub mod output;
pub mod pipeline;
pub mod segmentation;
pub mod service;
pub mod tagging;
pub mod types;

// Re-exports for convenient access
pub use config::Config;
pub use error::{ConfigError, LocusError, PipelineError, PipelineResult, Result, Stage};
pub use location::{
    build_prompt, filter_confidence, locate_from_latest, normalize, LocationStrategy,
};
pub use output::{OutputFormat, OutputWriter};
pub use pipeline::{ImageDecoder, ModelFactory, Pipeline, SourceImage, StageFactory, TagSource};
pub use segmentation::SegmentationStrategy;
pub use tagging::TaggingStrategy;
pub use types::{
    BatchReport, BoundingBox, DetectionCandidate, DetectionResult, RunReport, SegmentationOutput,
    TagSet,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
