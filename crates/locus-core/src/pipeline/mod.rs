//! Pipeline components.
//!
//! - **decode**: Load and decode the source image
//! - **discovery**: Resolve image references and find the latest tag file
//! - **factory**: Build stage collaborators from configuration
//! - **orchestrator**: Sequence tagging, location and segmentation

pub mod decode;
pub mod discovery;
pub mod factory;
pub mod orchestrator;

pub use decode::{ImageDecoder, SourceImage};
pub use discovery::{latest_json, resolve_image, TagSource};
pub use factory::{ModelFactory, StageFactory};
pub use orchestrator::Pipeline;
