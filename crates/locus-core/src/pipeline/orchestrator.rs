//! Pipeline orchestration: tagging → location → segmentation.

use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::{Config, TaggingMethod};
use crate::error::{LocusError, PipelineError, PipelineResult, Result, Stage};
use crate::location::LocationStrategy;
use crate::segmentation::SegmentationStrategy;
use crate::tagging::{DescribeExtractTagger, TaggingStrategy};
use crate::types::{BatchReport, RunReport};

use super::decode::ImageDecoder;
use super::discovery::resolve_image;
use super::factory::StageFactory;

/// Runs the three stages for one image at a time.
///
/// Only the strategies selected by the configuration are constructed; each
/// is built once and reused for every image until [`Pipeline::shutdown`].
pub struct Pipeline {
    decoder: ImageDecoder,
    input_dir: PathBuf,
    tagger: Box<dyn TaggingStrategy>,
    locator: Box<dyn LocationStrategy>,
    segmenter: Box<dyn SegmentationStrategy>,
}

impl Pipeline {
    /// Construct the selected strategies through `factory`.
    pub async fn new(config: &Config, factory: &dyn StageFactory) -> Result<Self> {
        let selection = config.pipeline;
        tracing::info!(
            "Pipeline: tagging={}, location={}, segmentation={}",
            selection.tagging,
            selection.location,
            selection.segmentation
        );

        // A construction failure releases whatever was already built.
        let tagger: Box<dyn TaggingStrategy> = match selection.tagging {
            TaggingMethod::RamPlus => factory.ram_plus().await?,
            TaggingMethod::DescribeExtract => {
                let describer = factory.describer(selection.description).await?;
                let extractor = match factory.extractor(selection.extraction).await {
                    Ok(extractor) => extractor,
                    Err(e) => {
                        log_release("description", describer.release().await);
                        return Err(e.into());
                    }
                };
                Box::new(DescribeExtractTagger::new(describer, extractor))
            }
        };
        let locator = match factory.locator(selection.location).await {
            Ok(locator) => locator,
            Err(e) => {
                log_release("tagging", tagger.release().await);
                return Err(e.into());
            }
        };
        let segmenter = match factory.segmenter(selection.segmentation).await {
            Ok(segmenter) => segmenter,
            Err(e) => {
                log_release("tagging", tagger.release().await);
                log_release("location", locator.release().await);
                return Err(e.into());
            }
        };

        Ok(Self {
            decoder: ImageDecoder::new(config.limits.clone()),
            input_dir: config.input_image_dir(),
            tagger,
            locator,
            segmenter,
        })
    }

    /// Run all stages on one image.
    ///
    /// A bare file name is resolved against the configured input directory.
    /// The first failing stage aborts the run.
    pub async fn run(&self, reference: &Path) -> Result<RunReport> {
        let start = Instant::now();
        let path = resolve_image(reference, &self.input_dir)?;
        tracing::info!("[PIPELINE] {:?}", path);

        let image = self.decoder.load(&path).await?;
        tracing::debug!(
            "Loaded {}x{} {}",
            image.width,
            image.height,
            image.format_name()
        );

        tracing::info!("[PIPELINE | TAGGING | {}]", self.tagger.name());
        let tags = self
            .tagger
            .produce_tags(&image)
            .await
            .map_err(|e| stage_error(Stage::Tagging, &path, e))?;

        tracing::info!("[PIPELINE | LOCATION | {}]", self.locator.name());
        let detections = self
            .locator
            .produce_detections(&image, &tags)
            .await
            .map_err(|e| stage_error(Stage::Location, &path, e))?;

        tracing::info!("[PIPELINE | SEGMENTATION | {}]", self.segmenter.name());
        let segmentation = self
            .segmenter
            .produce_masks(&image, &detections)
            .await
            .map_err(|e| stage_error(Stage::Segmentation, &path, e))?;

        let elapsed = start.elapsed();
        tracing::info!("[PIPELINE] Finished in {:.2}s", elapsed.as_secs_f64());

        Ok(RunReport {
            image: path,
            tags,
            detections,
            segmentation,
            elapsed,
        })
    }

    /// Run every image in order, calling `on_run` after each success.
    ///
    /// The first failure aborts the batch.
    pub async fn run_batch_with<F>(&self, images: &[PathBuf], mut on_run: F) -> Result<BatchReport>
    where
        F: FnMut(&RunReport),
    {
        let mut runs = Vec::with_capacity(images.len());
        for image in images {
            let report = self.run(image).await?;
            on_run(&report);
            runs.push(report);
        }

        let batch = BatchReport::from_runs(runs);
        tracing::info!(
            "Average time over {} runs: {:.2}s",
            batch.runs.len(),
            batch.average.as_secs_f64()
        );
        Ok(batch)
    }

    pub async fn run_batch(&self, images: &[PathBuf]) -> Result<BatchReport> {
        self.run_batch_with(images, |_| {}).await
    }

    /// Release every model handle. All strategies are released even if one
    /// fails; the first error is returned.
    pub async fn shutdown(self) -> Result<()> {
        let results = [
            (Stage::Tagging, self.tagger.release().await),
            (Stage::Location, self.locator.release().await),
            (Stage::Segmentation, self.segmenter.release().await),
        ];

        let mut first = None;
        for (stage, result) in results {
            if let Err(e) = result {
                tracing::warn!("Failed to release {stage} models: {e}");
                first.get_or_insert(LocusError::Pipeline(e));
            }
        }
        first.map_or(Ok(()), Err)
    }
}

fn log_release(what: &str, result: PipelineResult<()>) {
    if let Err(e) = result {
        tracing::warn!("Failed to release {what} models: {e}");
    }
}

fn stage_error(stage: Stage, image: &Path, source: PipelineError) -> LocusError {
    tracing::error!("{stage} stage failed for {:?}: {source}", image);
    LocusError::Stage {
        stage,
        image: image.to_path_buf(),
        source,
    }
}
