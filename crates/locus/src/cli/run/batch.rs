//! Batch runs: one pipeline run per image, in order, with progress and a summary.

use locus_core::{BatchReport, OutputFormat as CoreOutputFormat, OutputWriter, Pipeline};

use super::RunArgs;

/// Run every image through the pipeline. The first failure aborts the batch.
pub async fn run_batch(pipeline: &Pipeline, args: &RunArgs) -> anyhow::Result<()> {
    let progress = create_progress_bar(args.images.len() as u64);

    let result = pipeline
        .run_batch_with(&args.images, |report| {
            progress.inc(1);
            progress.set_message(format!("last {:.1}s", report.elapsed.as_secs_f64()));
        })
        .await;

    let batch = match result {
        Ok(batch) => batch,
        Err(e) => {
            progress.abandon_with_message("aborted");
            return Err(e.into());
        }
    };
    progress.finish_and_clear();

    write_batch(args, &batch)?;
    print_summary(&batch);
    Ok(())
}

/// JSON writes the whole batch (runs and average); JSONL writes one run per line.
fn write_batch(args: &RunArgs, batch: &BatchReport) -> anyhow::Result<()> {
    let format: CoreOutputFormat = args.format.into();
    match format {
        CoreOutputFormat::Json => crate::cli::write_report(args.output.as_deref(), format, batch),
        CoreOutputFormat::JsonLines => {
            let destination = crate::cli::open_output(args.output.as_deref())?;
            let mut writer = OutputWriter::new(destination, format);
            writer.write_each(&batch.runs)?;
            writer.flush()?;
            if let Some(path) = &args.output {
                tracing::info!("Output written to {:?}", path);
            }
            Ok(())
        }
    }
}

fn create_progress_bar(total: u64) -> indicatif::ProgressBar {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-"),
    );
    pb.set_message("starting...");
    pb
}

/// Print a formatted summary table after the batch.
fn print_summary(batch: &BatchReport) {
    let total: f64 = batch.runs.iter().map(|r| r.elapsed.as_secs_f64()).sum();
    let detections: usize = batch.runs.iter().map(|r| r.detections.len()).sum();

    eprintln!();
    eprintln!("  ====================================");
    eprintln!("               Summary");
    eprintln!("  ====================================");
    eprintln!("    Images:       {:>8}", batch.runs.len());
    eprintln!("    Detections:   {:>8}", detections);
    eprintln!("  ------------------------------------");
    eprintln!("    Total:        {:>7.2}s", total);
    eprintln!("    Average:      {:>7.2}s", batch.average.as_secs_f64());
    eprintln!("  ====================================");
}
