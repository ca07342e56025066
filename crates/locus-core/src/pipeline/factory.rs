//! Construction of stage collaborators from configuration.
//!
//! The orchestrator asks a [`StageFactory`] only for what the active
//! configuration selects. [`ModelFactory`] acquires real model handles:
//! Ollama models are preloaded and model services are health-checked, so a
//! missing model fails at construction rather than on the first image.

use async_trait::async_trait;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::config::{
    Config, DescriptionMethod, ExtractionMethod, LocationMethod, SegmentationMethod,
};
use crate::error::PipelineResult;
use crate::llm::{LlmProvider, OllamaProvider};
use crate::location::{Annotator, GroundingDinoLocator, GroundingDinoService, LocationStrategy};
use crate::segmentation::{Sam2Segmenter, SegmentationStrategy};
use crate::service::ModelService;
use crate::tagging::{
    DeepseekExtractor, Describer, KeywordExtractor, LlavaDescriber, RamPlusTagger,
    TaggingStrategy,
};

/// Builds stage collaborators on demand.
#[async_trait]
pub trait StageFactory: Send + Sync {
    /// The direct (single-call) tagger.
    async fn ram_plus(&self) -> PipelineResult<Box<dyn TaggingStrategy>>;

    async fn describer(&self, method: DescriptionMethod) -> PipelineResult<Box<dyn Describer>>;

    async fn extractor(&self, method: ExtractionMethod)
        -> PipelineResult<Box<dyn KeywordExtractor>>;

    async fn locator(&self, method: LocationMethod) -> PipelineResult<Box<dyn LocationStrategy>>;

    async fn segmenter(
        &self,
        method: SegmentationMethod,
    ) -> PipelineResult<Box<dyn SegmentationStrategy>>;
}

/// Factory backed by Ollama and the HTTP model services.
pub struct ModelFactory {
    config: Config,
}

impl ModelFactory {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// `dir` when artifact saving is on.
    fn artifact_dir(&self, dir: PathBuf) -> Option<PathBuf> {
        self.config.pipeline.save_artifacts.then_some(dir)
    }

    fn service(&self, name: &str, endpoint: &str) -> ModelService {
        ModelService::new(name, endpoint, self.config.request_timeout())
    }

    async fn preload(&self, provider: &OllamaProvider) -> PipelineResult<()> {
        let start = Instant::now();
        tracing::info!("Loading {} into Ollama...", provider.model());
        provider.load().await?;
        tracing::info!(
            "{} ready ({:.1}s)",
            provider.model(),
            start.elapsed().as_secs_f64()
        );
        Ok(())
    }
}

#[async_trait]
impl StageFactory for ModelFactory {
    async fn ram_plus(&self) -> PipelineResult<Box<dyn TaggingStrategy>> {
        let service = self.service("ram_plus", &self.config.ram_plus.endpoint);
        service.health().await?;
        tracing::info!("RAM++ service ready at {}", service.endpoint());
        Ok(Box::new(RamPlusTagger::new(
            service,
            self.artifact_dir(self.config.tag_dir()),
        )))
    }

    async fn describer(&self, method: DescriptionMethod) -> PipelineResult<Box<dyn Describer>> {
        match method {
            DescriptionMethod::Llava => {
                let cfg = &self.config.llava;
                let timeout = Duration::from_secs(cfg.timeout_secs);
                let provider = OllamaProvider::new(&cfg.endpoint, &cfg.model, timeout);
                self.preload(&provider).await?;
                Ok(Box::new(LlavaDescriber::new(
                    Box::new(provider),
                    &cfg.prompt,
                    timeout,
                    self.artifact_dir(self.config.description_dir()),
                )))
            }
        }
    }

    async fn extractor(
        &self,
        method: ExtractionMethod,
    ) -> PipelineResult<Box<dyn KeywordExtractor>> {
        match method {
            ExtractionMethod::Deepseek => {
                let cfg = &self.config.deepseek;
                let provider =
                    OllamaProvider::new(&cfg.endpoint, &cfg.model, self.config.request_timeout());
                self.preload(&provider).await?;
                Ok(Box::new(DeepseekExtractor::new(
                    Box::new(provider),
                    &cfg.instruction,
                    self.artifact_dir(self.config.tag_dir()),
                )))
            }
        }
    }

    async fn locator(&self, method: LocationMethod) -> PipelineResult<Box<dyn LocationStrategy>> {
        match method {
            LocationMethod::GroundingDino => {
                let cfg = &self.config.grounding_dino;
                let detector =
                    GroundingDinoService::new(self.service("grounding_dino", &cfg.endpoint));
                detector.health().await?;
                tracing::info!("Grounding DINO service ready at {}", cfg.endpoint);

                let output_dir = self.artifact_dir(self.config.location_dir());
                let annotator = if output_dir.is_some() {
                    Annotator::load(&self.config.font_path(), cfg.font_size)
                } else {
                    Annotator::boxes_only()
                };

                Ok(Box::new(GroundingDinoLocator::new(
                    Box::new(detector),
                    cfg.score_threshold,
                    annotator,
                    output_dir,
                )))
            }
        }
    }

    async fn segmenter(
        &self,
        method: SegmentationMethod,
    ) -> PipelineResult<Box<dyn SegmentationStrategy>> {
        match method {
            SegmentationMethod::Sam2 => {
                let service = self.service("sam2", &self.config.sam2.endpoint);
                service.health().await?;
                tracing::info!("SAM2 service ready at {}", service.endpoint());
                Ok(Box::new(Sam2Segmenter::new(service)))
            }
        }
    }
}
