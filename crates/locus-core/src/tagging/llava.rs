//! LLaVA image description through Ollama.

use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;

use super::Describer;
use crate::artifact;
use crate::error::PipelineResult;
use crate::llm::provider::{ImageInput, LlmProvider, LlmRequest};
use crate::llm::retry;
use crate::pipeline::SourceImage;

/// Describes images with a vision model, retrying until the text is non-empty.
pub struct LlavaDescriber {
    provider: Box<dyn LlmProvider>,
    prompt: String,
    timeout: Duration,
    /// Where description files go; `None` disables saving
    output_dir: Option<PathBuf>,
}

impl LlavaDescriber {
    pub fn new(
        provider: Box<dyn LlmProvider>,
        prompt: &str,
        timeout: Duration,
        output_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            provider,
            prompt: prompt.to_string(),
            timeout,
            output_dir,
        }
    }
}

#[async_trait]
impl Describer for LlavaDescriber {
    fn name(&self) -> &str {
        "LLAVA"
    }

    async fn describe(&self, image: &SourceImage) -> PipelineResult<String> {
        let request = LlmRequest::describe_image(ImageInput::from_source(image), &self.prompt);

        let description = retry::until_non_empty("llava", self.timeout, |attempt| {
            let request = &request;
            async move {
                tracing::debug!("LLaVA attempt {attempt} for {:?}", image.path);
                Ok(self.provider.generate(request).await?.text)
            }
        })
        .await?;

        tracing::info!("Image description:\n\n{description}\n");

        if let Some(dir) = &self.output_dir {
            let path = artifact::write_unique_text(dir, "description_llava", &description)?;
            tracing::info!("Description saved to: {:?}", path);
        }

        Ok(description)
    }

    async fn release(&self) -> PipelineResult<()> {
        self.provider.unload().await
    }
}
