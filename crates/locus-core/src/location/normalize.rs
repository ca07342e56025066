//! Detector output normalization and confidence filtering.

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};
use crate::types::{BoundingBox, DetectionCandidate, DetectionResult};

/// Detector output as parallel arrays, before normalization.
///
/// Any array may be missing; a missing array counts as empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawDetections {
    #[serde(default)]
    pub labels: Vec<String>,

    /// Boxes as `[x_min, y_min, x_max, y_max, ...]`
    #[serde(default)]
    pub boxes: Vec<Vec<f64>>,

    #[serde(default)]
    pub scores: Vec<f64>,
}

/// Zip labels, boxes and scores into candidates.
///
/// The result is as long as the shortest array. A box with fewer than four
/// coordinates is an error; coordinates past the fourth are ignored.
pub fn normalize(raw: RawDetections) -> PipelineResult<DetectionResult> {
    raw.labels
        .into_iter()
        .zip(raw.boxes)
        .zip(raw.scores)
        .enumerate()
        .map(|(i, ((label, coords), score))| {
            let bbox = match coords.as_slice() {
                [x_min, y_min, x_max, y_max, ..] => {
                    BoundingBox::new(*x_min, *y_min, *x_max, *y_max)
                }
                short => {
                    return Err(PipelineError::DetectorOutput(format!(
                        "box {i} ({label}) has {} coordinates, expected 4",
                        short.len()
                    )))
                }
            };
            Ok(DetectionCandidate { label, score, bbox })
        })
        .collect()
}

/// Keep candidates scoring strictly above `threshold`, in order.
pub fn filter_confidence(result: DetectionResult, threshold: f64) -> DetectionResult {
    result
        .into_iter()
        .filter(|c| c.score > threshold)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(label: &str, score: f64) -> DetectionCandidate {
        DetectionCandidate {
            label: label.into(),
            score,
            bbox: BoundingBox::new(0.0, 0.0, 1.0, 1.0),
        }
    }

    #[test]
    fn test_threshold_is_strict() {
        let result = vec![candidate("a", 0.29), candidate("b", 0.30), candidate("c", 0.31)];
        let kept = filter_confidence(result, 0.30);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].label, "c");
    }

    #[test]
    fn test_filter_keeps_emission_order() {
        let result = vec![candidate("x", 0.5), candidate("y", 0.9), candidate("z", 0.7)];
        let labels: Vec<_> = filter_confidence(result, 0.3)
            .into_iter()
            .map(|c| c.label)
            .collect();
        assert_eq!(labels, vec!["x", "y", "z"]);
    }

    #[test]
    fn test_normalize_truncates_to_shortest() {
        let raw = RawDetections {
            labels: vec!["cup".into(), "table".into(), "lamp".into()],
            boxes: vec![vec![1.0, 2.0, 3.0, 4.0], vec![5.0, 6.0, 7.0, 8.0]],
            scores: vec![0.9, 0.8, 0.7],
        };
        let result = normalize(raw).unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result[1].label, "table");
        assert_eq!(result[1].bbox, BoundingBox::new(5.0, 6.0, 7.0, 8.0));
        assert_eq!(result[1].score, 0.8);
    }

    #[test]
    fn test_missing_array_yields_empty_result() {
        let raw: RawDetections =
            serde_json::from_str(r#"{"labels": ["cup"], "boxes": [[1, 2, 3, 4]]}"#).unwrap();
        assert!(normalize(raw).unwrap().is_empty());
    }

    #[test]
    fn test_integer_coordinates_and_scores_coerced() {
        let raw: RawDetections = serde_json::from_str(
            r#"{"labels": ["cup"], "boxes": [[10, 20, 30, 40, 99]], "scores": [1]}"#,
        )
        .unwrap();
        let result = normalize(raw).unwrap();
        assert_eq!(result[0].bbox, BoundingBox::new(10.0, 20.0, 30.0, 40.0));
        assert_eq!(result[0].score, 1.0);
    }

    #[test]
    fn test_short_box_is_error() {
        let raw = RawDetections {
            labels: vec!["cup".into()],
            boxes: vec![vec![1.0, 2.0, 3.0]],
            scores: vec![0.9],
        };
        let err = normalize(raw).unwrap_err();
        assert!(matches!(err, PipelineError::DetectorOutput(_)));
    }

    #[test]
    fn test_detection_json_round_trip() {
        let result = vec![DetectionCandidate {
            label: "cup".into(),
            score: 0.8125,
            bbox: BoundingBox::new(-3.5, 10.0, 120.25, 4.0),
        }];
        let json = serde_json::to_string_pretty(&result).unwrap();
        let back: DetectionResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["bbox"]["x_min"], -3.5);
        assert_eq!(value[0]["label"], "cup");
    }
}
