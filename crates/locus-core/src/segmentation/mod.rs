//! Segmentation stage: turn grounded boxes into masks.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::PipelineResult;
use crate::llm::provider::ImageInput;
use crate::pipeline::SourceImage;
use crate::service::ModelService;
use crate::types::{DetectionCandidate, SegmentationOutput};

/// Capability shared by every segmentation strategy.
#[async_trait]
pub trait SegmentationStrategy: Send + Sync {
    /// Name used in log banners.
    fn name(&self) -> &str;

    async fn produce_masks(
        &self,
        image: &SourceImage,
        detections: &[DetectionCandidate],
    ) -> PipelineResult<SegmentationOutput>;

    async fn release(&self) -> PipelineResult<()> {
        Ok(())
    }
}

#[derive(Serialize)]
struct SegmentRequest<'a> {
    image: &'a str,
    media_type: &'a str,
    boxes: Vec<[f64; 4]>,
    labels: Vec<&'a str>,
}

impl<'a> SegmentRequest<'a> {
    fn new(input: &'a ImageInput, detections: &'a [DetectionCandidate]) -> Self {
        Self {
            image: &input.data,
            media_type: &input.media_type,
            boxes: detections.iter().map(|d| d.bbox.to_xyxy()).collect(),
            labels: detections.iter().map(|d| d.label.as_str()).collect(),
        }
    }
}

/// SAM2 behind a model service (`POST /segment`), prompted with boxes.
pub struct Sam2Segmenter {
    service: ModelService,
}

impl Sam2Segmenter {
    pub fn new(service: ModelService) -> Self {
        Self { service }
    }
}

#[async_trait]
impl SegmentationStrategy for Sam2Segmenter {
    fn name(&self) -> &str {
        "SAM2"
    }

    async fn produce_masks(
        &self,
        image: &SourceImage,
        detections: &[DetectionCandidate],
    ) -> PipelineResult<SegmentationOutput> {
        if detections.is_empty() {
            tracing::info!("No detections to segment");
            return Ok(SegmentationOutput::default());
        }

        let input = ImageInput::from_source(image);
        let output: SegmentationOutput = self
            .service
            .post_json("segment", &SegmentRequest::new(&input, detections))
            .await?;

        tracing::info!("SAM2 produced {} masks", output.masks.len());
        Ok(output)
    }
}
