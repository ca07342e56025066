//! RAM++ image tagging through its model service.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::TaggingStrategy;
use crate::artifact;
use crate::error::{PipelineError, PipelineResult};
use crate::llm::provider::ImageInput;
use crate::pipeline::SourceImage;
use crate::service::ModelService;
use crate::types::TagSet;

#[derive(Serialize)]
struct TagRequest<'a> {
    image: &'a str,
    media_type: &'a str,
}

#[derive(Deserialize)]
struct TagResponse {
    tags: Vec<String>,
}

/// Tags an image in one call to a RAM++ service (`POST /tag`).
pub struct RamPlusTagger {
    service: ModelService,
    /// Where tag files go; `None` disables saving
    output_dir: Option<PathBuf>,
}

impl RamPlusTagger {
    pub fn new(service: ModelService, output_dir: Option<PathBuf>) -> Self {
        Self {
            service,
            output_dir,
        }
    }
}

#[async_trait]
impl TaggingStrategy for RamPlusTagger {
    fn name(&self) -> &str {
        "RAM++"
    }

    async fn produce_tags(&self, image: &SourceImage) -> PipelineResult<TagSet> {
        let input = ImageInput::from_source(image);
        let body = TagRequest {
            image: &input.data,
            media_type: &input.media_type,
        };
        let response: TagResponse = self.service.post_json("tag", &body).await?;
        let tags = tags_from_response(response);

        if tags.is_empty() {
            return Err(PipelineError::Tagging {
                path: image.path.clone(),
                message: "RAM++ returned no tags".to_string(),
            });
        }

        tracing::info!(
            "RAM++ tags: {}",
            tags.labels().collect::<Vec<_>>().join(" | ")
        );

        if let Some(dir) = &self.output_dir {
            let path = artifact::write_unique_json(dir, "tags_ram_plus", &tags)?;
            tracing::info!("Tags saved to: {:?}", path);
        }

        Ok(tags)
    }
}

/// RAM++ answers with a flat label list; blank labels are dropped.
fn tags_from_response(response: TagResponse) -> TagSet {
    TagSet::from_labels(
        response
            .tags
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let body = TagRequest {
            image: "aGVsbG8=",
            media_type: "image/png",
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["image"], "aGVsbG8=");
        assert_eq!(json["media_type"], "image/png");
    }

    #[test]
    fn test_response_becomes_numbered_tags() {
        let response: TagResponse =
            serde_json::from_str(r#"{"tags": ["cup", " ", "table "]}"#).unwrap();
        let tags = tags_from_response(response);
        assert_eq!(tags.len(), 2);
        assert_eq!(tags.get("0"), Some("cup"));
        assert_eq!(tags.get("1"), Some("table"));
    }

    #[tokio::test]
    async fn test_unreachable_service_fails() {
        let service = ModelService::new(
            "ram_plus",
            "http://127.0.0.1:9",
            std::time::Duration::from_millis(500),
        );
        let tagger = RamPlusTagger::new(service, None);
        let source =
            SourceImage::from_image("desk.png", image::DynamicImage::new_rgb8(4, 4)).unwrap();
        let err = tagger.produce_tags(&source).await.unwrap_err();
        assert!(matches!(err, PipelineError::Service { .. }));
    }
}
