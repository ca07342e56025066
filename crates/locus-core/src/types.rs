//! Core data types passed between pipeline stages.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Candidate object labels produced by the tagging stage.
///
/// Keys are opaque. Insertion order is kept and determines the word order of
/// the detector prompt, so the set serializes as a JSON object in that order
/// and deserializes in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet {
    entries: Vec<(String, String)>,
}

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tag set keyed `"0"`, `"1"`, … in iteration order.
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        labels
            .into_iter()
            .enumerate()
            .map(|(i, label)| (i.to_string(), label.into()))
            .collect()
    }

    /// Insert a label. Re-inserting an existing key replaces its label in place.
    pub fn insert(&mut self, key: impl Into<String>, label: impl Into<String>) {
        let key = key.into();
        let label = label.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = label,
            None => self.entries.push((key, label)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Labels in insertion order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(_, v)| v.as_str())
    }

    /// `(key, label)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TagSet {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut tags = TagSet::new();
        for (k, v) in iter {
            tags.insert(k, v);
        }
        tags
    }
}

impl Serialize for TagSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for TagSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TagSetVisitor;

        impl<'de> Visitor<'de> for TagSetVisitor {
            type Value = TagSet;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object mapping keys to label strings")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<TagSet, A::Error> {
                let mut tags = TagSet::new();
                while let Some((key, label)) = access.next_entry::<String, String>()? {
                    tags.insert(key, label);
                }
                Ok(tags)
            }
        }

        deserializer.deserialize_map(TagSetVisitor)
    }
}

/// Axis-aligned box in source-image pixel coordinates.
///
/// Coordinates are neither clamped to the image nor required to be ordered.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

impl BoundingBox {
    pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    /// `[x_min, y_min, x_max, y_max]`, the order model services expect.
    pub fn to_xyxy(&self) -> [f64; 4] {
        [self.x_min, self.y_min, self.x_max, self.y_max]
    }
}

/// One grounded label with its detector confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionCandidate {
    pub label: String,

    /// Detector confidence from 0.0 to 1.0
    pub score: f64,

    pub bbox: BoundingBox,
}

/// Detections in detector emission order (not sorted by score).
pub type DetectionResult = Vec<DetectionCandidate>;

/// A mask reported by the segmentation service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mask {
    pub label: String,
    pub score: f64,

    /// Mask area in pixels
    pub area: u64,
}

/// Output of the segmentation stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SegmentationOutput {
    pub masks: Vec<Mask>,
}

/// Everything one pipeline run produced for an image.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Resolved path of the source image
    pub image: PathBuf,

    pub tags: TagSet,

    /// Filtered detections, exactly as handed to segmentation
    pub detections: DetectionResult,

    pub segmentation: SegmentationOutput,

    /// Wall-clock duration of the whole run
    #[serde(rename = "elapsed_seconds", serialize_with = "serialize_secs")]
    pub elapsed: Duration,
}

/// Reports for a batch of images processed one after another.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub runs: Vec<RunReport>,

    /// Arithmetic mean of the per-run elapsed times
    #[serde(rename = "average_seconds", serialize_with = "serialize_secs")]
    pub average: Duration,
}

impl BatchReport {
    /// Build a report once all runs have completed.
    pub fn from_runs(runs: Vec<RunReport>) -> Self {
        let average = mean_elapsed(runs.iter().map(|r| r.elapsed));
        Self { runs, average }
    }
}

/// Arithmetic mean of durations; zero for an empty input.
pub fn mean_elapsed(durations: impl IntoIterator<Item = Duration>) -> Duration {
    let (total, count) = durations
        .into_iter()
        .fold((0.0f64, 0u32), |(sum, n), d| (sum + d.as_secs_f64(), n + 1));
    if count == 0 {
        Duration::ZERO
    } else {
        Duration::from_secs_f64(total / count as f64)
    }
}

fn serialize_secs<S: Serializer>(d: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(d.as_secs_f64())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(label: &str, score: f64) -> DetectionCandidate {
        DetectionCandidate {
            label: label.to_string(),
            score,
            bbox: BoundingBox::new(10.5, 20.0, 110.25, 220.0),
        }
    }

    #[test]
    fn test_tag_set_keeps_document_order() {
        let tags: TagSet = serde_json::from_str(r#"{"7":"lamp","2":"cup","10":"table"}"#).unwrap();
        let labels: Vec<&str> = tags.labels().collect();
        assert_eq!(labels, vec!["lamp", "cup", "table"]);
        assert_eq!(
            serde_json::to_string(&tags).unwrap(),
            r#"{"7":"lamp","2":"cup","10":"table"}"#
        );
    }

    #[test]
    fn test_tag_set_reinsert_replaces_in_place() {
        let mut tags = TagSet::new();
        tags.insert("a", "cup");
        tags.insert("b", "table");
        tags.insert("a", "mug");
        assert_eq!(tags.len(), 2);
        assert_eq!(tags.labels().collect::<Vec<_>>(), vec!["mug", "table"]);
        assert_eq!(tags.get("a"), Some("mug"));
    }

    #[test]
    fn test_tag_set_from_labels_numbers_keys() {
        let tags = TagSet::from_labels(["cup", "table"]);
        assert_eq!(tags.get("0"), Some("cup"));
        assert_eq!(tags.get("1"), Some("table"));
    }

    #[test]
    fn test_tag_set_rejects_non_string_labels() {
        assert!(serde_json::from_str::<TagSet>(r#"{"0": 3}"#).is_err());
        assert!(serde_json::from_str::<TagSet>(r#"["cup"]"#).is_err());
    }

    #[test]
    fn test_detection_result_roundtrip() {
        let result: DetectionResult = vec![candidate("cup", 0.91), candidate("table", 0.42)];
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"label\":\"cup\""));
        assert!(json.contains(
            "\"bbox\":{\"x_min\":10.5,\"y_min\":20.0,\"x_max\":110.25,\"y_max\":220.0}"
        ));

        let parsed: DetectionResult = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, result);
    }

    #[test]
    fn test_mean_elapsed() {
        let runs = [
            Duration::from_millis(1000),
            Duration::from_millis(2000),
            Duration::from_millis(4500),
        ];
        assert_eq!(mean_elapsed(runs), Duration::from_millis(2500));
        assert_eq!(mean_elapsed(std::iter::empty()), Duration::ZERO);
    }

    #[test]
    fn test_run_report_serializes_seconds() {
        let report = RunReport {
            image: PathBuf::from("desk.jpg"),
            tags: TagSet::from_labels(["cup"]),
            detections: vec![candidate("cup", 0.9)],
            segmentation: SegmentationOutput::default(),
            elapsed: Duration::from_millis(1500),
        };
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["elapsed_seconds"], 1.5);
        assert_eq!(value["tags"]["0"], "cup");
    }
}
