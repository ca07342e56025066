//! The `locus run` command: the full pipeline over one or more images.

mod batch;
pub mod types;

pub use types::{Description, Extraction, Location, OutputFormat, Segmentation, Tagging};

use clap::Args;
use locus_core::config::PipelineConfig;
use locus_core::{Config, ModelFactory, Pipeline};
use std::path::PathBuf;

/// Arguments for the `run` command.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Image files or names inside the configured input directory
    #[arg(required = true)]
    pub images: Vec<PathBuf>,

    /// Tagging strategy (overrides config)
    #[arg(long, value_enum)]
    pub tagging: Option<Tagging>,

    /// Captioning model for describe_extract (overrides config)
    #[arg(long, value_enum)]
    pub description: Option<Description>,

    /// Keyword extraction model for describe_extract (overrides config)
    #[arg(long, value_enum)]
    pub extraction: Option<Extraction>,

    /// Detector for the location stage (overrides config)
    #[arg(long, value_enum)]
    pub location: Option<Location>,

    /// Segmentation model (overrides config)
    #[arg(long, value_enum)]
    pub segmentation: Option<Segmentation>,

    /// Save tag, description and location artifacts
    #[arg(long, overrides_with = "no_save")]
    pub save: bool,

    /// Do not save artifacts
    #[arg(long, overrides_with = "save")]
    pub no_save: bool,

    /// Output file for the run report (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    pub format: OutputFormat,
}

/// Manual Default impl for constructing RunArgs outside of clap.
///
/// Values match the clap `#[arg(default_value = ...)]` annotations above.
impl Default for RunArgs {
    fn default() -> Self {
        Self {
            images: Vec::new(),
            tagging: None,
            description: None,
            extraction: None,
            location: None,
            segmentation: None,
            save: false,
            no_save: false,
            output: None,
            format: OutputFormat::Json,
        }
    }
}

impl RunArgs {
    /// `Some` when `--save` or `--no-save` was given.
    pub fn save_override(&self) -> Option<bool> {
        match (self.save, self.no_save) {
            (true, _) => Some(true),
            (false, true) => Some(false),
            (false, false) => None,
        }
    }

    /// Apply command-line overrides on top of the configured selections.
    pub fn apply(&self, pipeline: &mut PipelineConfig) {
        if let Some(tagging) = self.tagging {
            pipeline.tagging = tagging.into();
        }
        if let Some(description) = self.description {
            pipeline.description = description.into();
        }
        if let Some(extraction) = self.extraction {
            pipeline.extraction = extraction.into();
        }
        if let Some(location) = self.location {
            pipeline.location = location.into();
        }
        if let Some(segmentation) = self.segmentation {
            pipeline.segmentation = segmentation.into();
        }
        if let Some(save) = self.save_override() {
            pipeline.save_artifacts = save;
        }
    }
}

/// Execute the run command.
pub async fn execute(args: RunArgs, mut config: Config) -> anyhow::Result<()> {
    args.apply(&mut config.pipeline);

    let factory = ModelFactory::new(&config);
    let pipeline = Pipeline::new(&config, &factory).await?;

    let outcome = if args.images.len() == 1 {
        run_single(&pipeline, &args).await
    } else {
        batch::run_batch(&pipeline, &args).await
    };

    // Models are released whether or not the run succeeded.
    let released = pipeline.shutdown().await;
    outcome?;
    released?;
    Ok(())
}

async fn run_single(pipeline: &Pipeline, args: &RunArgs) -> anyhow::Result<()> {
    let report = pipeline.run(&args.images[0]).await?;
    eprintln!("Elapsed: {:.2}s", report.elapsed.as_secs_f64());
    super::write_report(args.output.as_deref(), args.format.into(), &report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use locus_core::config::{SegmentationMethod, TaggingMethod};

    #[test]
    fn run_args_default_format_is_json() {
        let args = RunArgs::default();
        assert!(matches!(args.format, OutputFormat::Json));
    }

    #[test]
    fn run_args_default_has_no_overrides() {
        let args = RunArgs::default();
        let mut pipeline = PipelineConfig::default();
        args.apply(&mut pipeline);
        assert_eq!(pipeline, PipelineConfig::default());
        assert_eq!(args.save_override(), None);
    }

    #[test]
    fn run_args_overrides_apply() {
        let args = RunArgs {
            tagging: Some(Tagging::RamPlus),
            segmentation: Some(Segmentation::Sam2),
            save: true,
            ..Default::default()
        };
        let mut pipeline = PipelineConfig::default();
        args.apply(&mut pipeline);
        assert_eq!(pipeline.tagging, TaggingMethod::RamPlus);
        assert_eq!(pipeline.segmentation, SegmentationMethod::Sam2);
        assert!(pipeline.save_artifacts);
    }

    #[test]
    fn run_args_no_save_disables_artifacts() {
        let args = RunArgs {
            no_save: true,
            ..Default::default()
        };
        let mut pipeline = PipelineConfig {
            save_artifacts: true,
            ..Default::default()
        };
        args.apply(&mut pipeline);
        assert!(!pipeline.save_artifacts);
    }

    #[test]
    fn run_args_parse_snake_case_methods() {
        use clap::Parser;

        #[derive(Parser)]
        struct Wrapper {
            #[command(flatten)]
            run: RunArgs,
        }

        let parsed = Wrapper::try_parse_from([
            "locus",
            "a.jpg",
            "b.jpg",
            "--tagging",
            "ram_plus",
            "--location",
            "grounding_dino",
            "--no-save",
        ])
        .unwrap();
        assert_eq!(parsed.run.images.len(), 2);
        assert!(matches!(parsed.run.tagging, Some(Tagging::RamPlus)));
        assert!(matches!(parsed.run.location, Some(Location::GroundingDino)));
        assert_eq!(parsed.run.save_override(), Some(false));
    }
}
