//! Command implementations for the `locus` binary.

pub mod config;
pub mod locate;
pub mod run;

use locus_core::OutputFormat as CoreOutputFormat;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Open the output destination: a file when given, stdout otherwise.
pub fn open_output(path: Option<&Path>) -> anyhow::Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(io::stdout().lock()),
    })
}

/// Write one report value to the output destination.
pub fn write_report<T: serde::Serialize>(
    path: Option<&Path>,
    format: CoreOutputFormat,
    value: &T,
) -> anyhow::Result<()> {
    let mut writer = locus_core::OutputWriter::new(open_output(path)?, format);
    writer.write(value)?;
    writer.flush()?;
    if let Some(path) = path {
        tracing::info!("Output written to {:?}", path);
    }
    Ok(())
}
