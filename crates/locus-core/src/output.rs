//! Report and artifact serialization.
//!
//! JSON output is one pretty-printed document; JSON Lines puts each value on
//! its own compact line.

use serde::Serialize;
use std::io::{self, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    JsonLines,
}

/// Serializes values to a destination in one [`OutputFormat`].
pub struct OutputWriter<W: Write> {
    writer: W,
    format: OutputFormat,
}

impl<W: Write> OutputWriter<W> {
    pub fn new(writer: W, format: OutputFormat) -> Self {
        Self { writer, format }
    }

    /// Serialize one value, newline-terminated.
    pub fn write<T: Serialize + ?Sized>(&mut self, value: &T) -> io::Result<()> {
        let serialized = match self.format {
            OutputFormat::Json => serde_json::to_writer_pretty(&mut self.writer, value),
            OutputFormat::JsonLines => serde_json::to_writer(&mut self.writer, value),
        };
        serialized.map_err(io::Error::other)?;
        writeln!(self.writer)
    }

    /// Serialize each value in turn. In JSON Lines this is one line per value.
    pub fn write_each<T: Serialize>(&mut self, values: &[T]) -> io::Result<()> {
        values.iter().try_for_each(|value| self.write(value))
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BoundingBox, DetectionCandidate};

    fn detections() -> Vec<DetectionCandidate> {
        vec![
            DetectionCandidate {
                label: "cup".to_string(),
                score: 0.8,
                bbox: BoundingBox::new(1.0, 2.0, 3.0, 4.0),
            },
            DetectionCandidate {
                label: "table".to_string(),
                score: 0.5,
                bbox: BoundingBox::new(0.0, 0.0, 50.0, 40.0),
            },
        ]
    }

    #[test]
    fn test_json_document_is_pretty() {
        let mut buffer = Vec::new();
        let mut writer = OutputWriter::new(&mut buffer, OutputFormat::Json);
        writer.write(&detections()).unwrap();

        let output = String::from_utf8(buffer).unwrap();
        assert!(output.starts_with("[\n"));
        let parsed: Vec<DetectionCandidate> = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed, detections());
    }

    #[test]
    fn test_json_lines_one_compact_value_per_line() {
        let mut buffer = Vec::new();
        let mut writer = OutputWriter::new(&mut buffer, OutputFormat::JsonLines);
        writer.write_each(&detections()).unwrap();

        let output = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("\"label\":\"cup\""));
        let second: DetectionCandidate = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second.label, "table");
    }

    #[test]
    fn test_write_each_empty_writes_nothing() {
        let mut buffer = Vec::new();
        let mut writer = OutputWriter::new(&mut buffer, OutputFormat::JsonLines);
        writer.write_each::<DetectionCandidate>(&[]).unwrap();
        assert!(buffer.is_empty());
    }
}
