//! Tagging strategies: turn an image into a [`TagSet`].
//!
//! Two interchangeable strategies implement [`TaggingStrategy`]:
//! - [`RamPlusTagger`]: a single RAM++ call.
//! - [`DescribeExtractTagger`]: a [`Describer`] writes free text, then a
//!   [`KeywordExtractor`] pulls the tags out of it.

mod deepseek;
mod llava;
mod ram_plus;

pub use deepseek::{parse_keywords, DeepseekExtractor};
pub use llava::LlavaDescriber;
pub use ram_plus::RamPlusTagger;

use async_trait::async_trait;

use crate::error::{PipelineError, PipelineResult};
use crate::pipeline::SourceImage;
use crate::types::TagSet;

/// Capability shared by every tagging strategy.
#[async_trait]
pub trait TaggingStrategy: Send + Sync {
    /// Name used in log banners.
    fn name(&self) -> &str;

    async fn produce_tags(&self, image: &SourceImage) -> PipelineResult<TagSet>;

    /// Release the models this strategy owns.
    async fn release(&self) -> PipelineResult<()> {
        Ok(())
    }
}

/// Produces a free-text description of an image.
#[async_trait]
pub trait Describer: Send + Sync {
    fn name(&self) -> &str;

    async fn describe(&self, image: &SourceImage) -> PipelineResult<String>;

    async fn release(&self) -> PipelineResult<()> {
        Ok(())
    }
}

/// Extracts object tags from a description.
#[async_trait]
pub trait KeywordExtractor: Send + Sync {
    fn name(&self) -> &str;

    async fn extract(&self, description: &str) -> PipelineResult<TagSet>;

    async fn release(&self) -> PipelineResult<()> {
        Ok(())
    }
}

/// Two-step strategy: describe the image, then extract tags from the text.
pub struct DescribeExtractTagger {
    describer: Box<dyn Describer>,
    extractor: Box<dyn KeywordExtractor>,
}

impl DescribeExtractTagger {
    pub fn new(describer: Box<dyn Describer>, extractor: Box<dyn KeywordExtractor>) -> Self {
        Self {
            describer,
            extractor,
        }
    }
}

#[async_trait]
impl TaggingStrategy for DescribeExtractTagger {
    fn name(&self) -> &str {
        "DESCRIPTION & KEYWORD EXTRACTION"
    }

    async fn produce_tags(&self, image: &SourceImage) -> PipelineResult<TagSet> {
        tracing::info!("[PIPELINE | TAGGING | DESCRIPTION | {}]", self.describer.name());
        let description = self.describer.describe(image).await?;
        if description.trim().is_empty() {
            return Err(PipelineError::Tagging {
                path: image.path.clone(),
                message: format!("{} returned an empty description", self.describer.name()),
            });
        }

        tracing::info!(
            "[PIPELINE | TAGGING | KEYWORD EXTRACTION | {}]",
            self.extractor.name()
        );
        self.extractor.extract(&description).await
    }

    async fn release(&self) -> PipelineResult<()> {
        self.describer.release().await?;
        self.extractor.release().await
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    pub(crate) struct FixedDescriber {
        pub text: String,
        pub calls: Arc<AtomicU32>,
    }

    #[async_trait]
    impl Describer for FixedDescriber {
        fn name(&self) -> &str {
            "FIXED"
        }

        async fn describe(&self, _image: &SourceImage) -> PipelineResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.text.clone())
        }
    }

    pub(crate) struct RecordingExtractor {
        pub tags: TagSet,
        pub seen: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl KeywordExtractor for RecordingExtractor {
        fn name(&self) -> &str {
            "RECORDING"
        }

        async fn extract(&self, description: &str) -> PipelineResult<TagSet> {
            self.seen.lock().unwrap().push(description.to_string());
            Ok(self.tags.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::{FixedDescriber, RecordingExtractor};
    use super::*;
    use image::DynamicImage;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    fn source() -> SourceImage {
        SourceImage::from_image("desk.jpg", DynamicImage::new_rgb8(4, 4)).unwrap()
    }

    #[tokio::test]
    async fn test_description_flows_into_extractor() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let tagger = DescribeExtractTagger::new(
            Box::new(FixedDescriber {
                text: "A cup on a table.".into(),
                calls: Arc::new(AtomicU32::new(0)),
            }),
            Box::new(RecordingExtractor {
                tags: TagSet::from_labels(["cup", "table"]),
                seen: seen.clone(),
            }),
        );

        let tags = tagger.produce_tags(&source()).await.unwrap();
        assert_eq!(tags, TagSet::from_labels(["cup", "table"]));
        assert_eq!(*seen.lock().unwrap(), vec!["A cup on a table.".to_string()]);
    }

    #[tokio::test]
    async fn test_empty_description_skips_extraction() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let calls = Arc::new(AtomicU32::new(0));
        let tagger = DescribeExtractTagger::new(
            Box::new(FixedDescriber {
                text: "   ".into(),
                calls: calls.clone(),
            }),
            Box::new(RecordingExtractor {
                tags: TagSet::from_labels(["cup"]),
                seen: seen.clone(),
            }),
        );

        let err = tagger.produce_tags(&source()).await.unwrap_err();
        assert!(matches!(err, PipelineError::Tagging { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(seen.lock().unwrap().is_empty());
    }
}
