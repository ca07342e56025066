//! The `locus locate` command: the location stage alone, fed by the newest tag file.

use clap::Args;
use locus_core::pipeline::resolve_image;
use locus_core::{
    locate_from_latest, Config, ImageDecoder, LocationStrategy, ModelFactory, StageFactory,
};
use serde::Serialize;
use std::path::{Path, PathBuf};

use super::run::{Location, OutputFormat};

/// Arguments for the `locate` command.
#[derive(Args, Debug)]
pub struct LocateArgs {
    /// Image file or name inside the configured input directory
    #[arg(required = true)]
    pub image: PathBuf,

    /// Detector (overrides config)
    #[arg(long, value_enum)]
    pub location: Option<Location>,

    /// Save the detection JSON and the annotated image
    #[arg(long, overrides_with = "no_save")]
    pub save: bool,

    /// Do not save artifacts
    #[arg(long, overrides_with = "save")]
    pub no_save: bool,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    pub format: OutputFormat,
}

#[derive(Serialize)]
struct LocateReport<'a> {
    image: &'a Path,
    tag_file: &'a Path,
    tags: &'a locus_core::TagSet,
    detections: &'a locus_core::DetectionResult,
}

/// Execute the locate command.
pub async fn execute(args: LocateArgs, mut config: Config) -> anyhow::Result<()> {
    if let Some(location) = args.location {
        config.pipeline.location = location.into();
    }
    if args.save {
        config.pipeline.save_artifacts = true;
    } else if args.no_save {
        config.pipeline.save_artifacts = false;
    }

    let path = resolve_image(&args.image, &config.input_image_dir())?;
    let image = ImageDecoder::new(config.limits.clone()).load(&path).await?;

    let tag_dir = config.tag_dir();
    tracing::info!("[LOCATION | {}] tags from {:?}", config.pipeline.location, tag_dir);

    let locator = ModelFactory::new(&config)
        .locator(config.pipeline.location)
        .await?;
    let outcome = locate_from_latest(locator.as_ref(), &image, &tag_dir).await;
    let released = locator.release().await;
    let (source, detections) = outcome?;
    released?;

    let report = LocateReport {
        image: &path,
        tag_file: &source.path,
        tags: &source.tags,
        detections: &detections,
    };
    super::write_report(args.output.as_deref(), args.format.into(), &report)
}
