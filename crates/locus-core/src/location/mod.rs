//! Location stage: ground a [`TagSet`] into scored bounding boxes.
//!
//! For each image the stage builds a prompt from the tags, calls the
//! detector once, normalizes and filters its output, and (when saving is on)
//! writes `location_gdino_<ts>.json` plus an annotated `location_gdino_<ts>.jpg`.
//! Location artifacts use the bare timestamp, so two runs in the same second
//! overwrite each other.

mod annotate;
mod detector;
mod normalize;
mod prompt;

pub use annotate::Annotator;
pub use detector::{GroundingDinoService, ZeroShotDetector};
pub use normalize::{filter_confidence, normalize, RawDetections};
pub use prompt::build_prompt;

use async_trait::async_trait;
use image::ImageFormat;
use std::path::{Path, PathBuf};

use crate::artifact::{self, artifact_error};
use crate::error::PipelineResult;
use crate::pipeline::{SourceImage, TagSource};
use crate::types::{DetectionResult, TagSet};

/// Capability shared by every location strategy.
#[async_trait]
pub trait LocationStrategy: Send + Sync {
    /// Name used in log banners.
    fn name(&self) -> &str;

    async fn produce_detections(
        &self,
        image: &SourceImage,
        tags: &TagSet,
    ) -> PipelineResult<DetectionResult>;

    /// Release the models this strategy owns.
    async fn release(&self) -> PipelineResult<()> {
        Ok(())
    }
}

/// Grounding DINO location with confidence filtering and optional artifacts.
pub struct GroundingDinoLocator {
    detector: Box<dyn ZeroShotDetector>,
    threshold: f64,
    annotator: Annotator,
    /// Where JSON and annotated images go; `None` disables saving
    output_dir: Option<PathBuf>,
}

impl GroundingDinoLocator {
    pub fn new(
        detector: Box<dyn ZeroShotDetector>,
        threshold: f64,
        annotator: Annotator,
        output_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            detector,
            threshold,
            annotator,
            output_dir,
        }
    }

    async fn save(
        &self,
        dir: &Path,
        image: &SourceImage,
        detections: &DetectionResult,
    ) -> PipelineResult<()> {
        let ts = artifact::timestamp();

        let json_path = artifact::timestamped_path(dir, "location_gdino", &ts, "json");
        artifact::overwrite_json(&json_path, detections)?;
        tracing::info!("Detections saved to: {:?}", json_path);

        let jpg_path = artifact::timestamped_path(dir, "location_gdino", &ts, "jpg");
        let annotator = self.annotator.clone();
        let source = image.image.clone();
        let boxes = detections.clone();
        let target = jpg_path.clone();
        tokio::task::spawn_blocking(move || {
            annotator
                .render(&source, &boxes)
                .save_with_format(&target, ImageFormat::Jpeg)
        })
        .await
        .map_err(|e| artifact_error(&jpg_path, format!("render task panicked: {e}")))?
        .map_err(|e| artifact_error(&jpg_path, e))?;
        tracing::info!("Annotated image saved to: {:?}", jpg_path);

        Ok(())
    }
}

#[async_trait]
impl LocationStrategy for GroundingDinoLocator {
    fn name(&self) -> &str {
        "GDINO"
    }

    async fn produce_detections(
        &self,
        image: &SourceImage,
        tags: &TagSet,
    ) -> PipelineResult<DetectionResult> {
        let prompt = build_prompt(tags);
        tracing::info!("Detection prompt: {prompt}");

        let raw = self
            .detector
            .detect(image, &prompt, image.target_size())
            .await?;
        let all = normalize(raw)?;
        let total = all.len();
        let detections = filter_confidence(all, self.threshold);

        tracing::info!(
            "Kept {}/{} detections above {:.2}",
            detections.len(),
            total,
            self.threshold
        );
        for d in &detections {
            tracing::debug!(
                "  {} {:.3} [{:.1}, {:.1}, {:.1}, {:.1}]",
                d.label,
                d.score,
                d.bbox.x_min,
                d.bbox.y_min,
                d.bbox.x_max,
                d.bbox.y_max
            );
        }

        if let Some(dir) = &self.output_dir {
            self.save(dir, image, &detections).await?;
        }

        Ok(detections)
    }
}

/// Run a location strategy on tags read from the newest `.json` in `tag_dir`.
///
/// Used when no tagging stage runs first. Returns the tag source alongside
/// the detections.
pub async fn locate_from_latest(
    locator: &dyn LocationStrategy,
    image: &SourceImage,
    tag_dir: &Path,
) -> PipelineResult<(TagSource, DetectionResult)> {
    let source = TagSource::latest(tag_dir)?;
    tracing::info!("Using tags from {}", source.file_name());
    let detections = locator.produce_detections(image, &source.tags).await?;
    Ok((source, detections))
}
