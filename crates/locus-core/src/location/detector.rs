//! Open-vocabulary detector collaborators.

use async_trait::async_trait;
use serde::Serialize;

use super::normalize::RawDetections;
use crate::error::PipelineResult;
use crate::llm::provider::ImageInput;
use crate::pipeline::SourceImage;
use crate::service::ModelService;

/// Grounds a text prompt into raw boxes on an image.
#[async_trait]
pub trait ZeroShotDetector: Send + Sync {
    /// One detector call. `target_size` is `(height, width)`.
    async fn detect(
        &self,
        image: &SourceImage,
        prompt: &str,
        target_size: (u32, u32),
    ) -> PipelineResult<RawDetections>;
}

#[derive(Serialize)]
struct DetectRequest<'a> {
    image: &'a str,
    media_type: &'a str,
    prompt: &'a str,
    target_size: [u32; 2],
}

/// Grounding DINO behind a model service (`POST /detect`).
pub struct GroundingDinoService {
    service: ModelService,
}

impl GroundingDinoService {
    pub fn new(service: ModelService) -> Self {
        Self { service }
    }

    pub async fn health(&self) -> PipelineResult<()> {
        self.service.health().await
    }
}

#[async_trait]
impl ZeroShotDetector for GroundingDinoService {
    async fn detect(
        &self,
        image: &SourceImage,
        prompt: &str,
        target_size: (u32, u32),
    ) -> PipelineResult<RawDetections> {
        let input = ImageInput::from_source(image);
        let body = DetectRequest {
            image: &input.data,
            media_type: &input.media_type,
            prompt,
            target_size: [target_size.0, target_size.1],
        };
        self.service.post_json("detect", &body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_target_size_is_height_width() {
        let body = DetectRequest {
            image: "",
            media_type: "image/png",
            prompt: "cup. table.",
            target_size: [480, 640],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["target_size"], serde_json::json!([480, 640]));
        assert_eq!(json["prompt"], "cup. table.");
    }
}
