//! Detection overlay rendering.

use ab_glyph::{FontArc, PxScale};
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use std::path::Path;

use crate::types::DetectionCandidate;

const RED: Rgb<u8> = Rgb([255, 0, 0]);

/// Outline stroke in pixels, drawn inward from the box edge
const STROKE: i32 = 3;

/// Label baseline offset above the box top edge
const LABEL_OFFSET: f64 = 20.0;

const CAPTION_LIMIT: i32 = 1 << 30;

/// Draws boxes and `label: score` captions onto a copy of the source image.
#[derive(Clone)]
pub struct Annotator {
    font: Option<FontArc>,
    scale: PxScale,
}

impl Annotator {
    /// Load the caption font. A missing or unreadable font is logged and
    /// captions are skipped; boxes are still drawn.
    pub fn load(font_path: &Path, font_size: f32) -> Self {
        let font = match std::fs::read(font_path) {
            Ok(bytes) => match FontArc::try_from_vec(bytes) {
                Ok(font) => Some(font),
                Err(e) => {
                    tracing::warn!("Invalid font {:?}: {e}; drawing boxes only", font_path);
                    None
                }
            },
            Err(e) => {
                tracing::warn!("Cannot read font {:?}: {e}; drawing boxes only", font_path);
                None
            }
        };
        Self {
            font,
            scale: PxScale::from(font_size),
        }
    }

    /// An annotator that draws boxes only.
    pub fn boxes_only() -> Self {
        Self {
            font: None,
            scale: PxScale::from(20.0),
        }
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Render every candidate onto an RGB copy of `image`.
    pub fn render(&self, image: &DynamicImage, detections: &[DetectionCandidate]) -> RgbImage {
        let mut canvas = image.to_rgb8();
        let (w, h) = canvas.dimensions();
        let x_pixel = |v: f64| to_pixel(v, w);
        let y_pixel = |v: f64| to_pixel(v, h);

        for candidate in detections {
            let b = &candidate.bbox;
            let left = x_pixel(b.x_min.min(b.x_max));
            let top = y_pixel(b.y_min.min(b.y_max));
            let right = x_pixel(b.x_min.max(b.x_max));
            let bottom = y_pixel(b.y_min.max(b.y_max));

            for inset in 0..i64::from(STROKE) {
                let width = right - left + 1 - 2 * inset;
                let height = bottom - top + 1 - 2 * inset;
                if width <= 0 || height <= 0 {
                    break;
                }
                // Clamped coordinates fit in i32 and the sizes in u32.
                let rect = Rect::at((left + inset) as i32, (top + inset) as i32)
                    .of_size(width as u32, height as u32);
                draw_hollow_rect_mut(&mut canvas, rect, RED);
            }

            if let Some(font) = &self.font {
                let caption = format!("{}: {:.2}", candidate.label, candidate.score);
                let x = caption_pixel(b.x_min);
                let y = caption_pixel(b.y_min - LABEL_OFFSET);
                draw_text_mut(&mut canvas, RED, x, y, self.scale, font, &caption);
            }
        }

        canvas
    }
}

/// Truncate a box coordinate to a pixel, clamped to the canvas extent
/// widened by the stroke on both sides.
fn to_pixel(value: f64, extent: u32) -> i64 {
    let limit = f64::from(extent) + f64::from(STROKE);
    let clamped = if value.is_nan() {
        0.0
    } else {
        value.clamp(-f64::from(STROKE), limit)
    };
    clamped.trunc() as i64
}

/// Captions are not clamped to the canvas, only kept clear of i32 overflow
/// once glyph offsets are added.
fn caption_pixel(value: f64) -> i32 {
    (value.trunc() as i32).clamp(-CAPTION_LIMIT, CAPTION_LIMIT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BoundingBox;

    fn detection(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> DetectionCandidate {
        DetectionCandidate {
            label: "cup".into(),
            score: 0.87,
            bbox: BoundingBox::new(x_min, y_min, x_max, y_max),
        }
    }

    #[test]
    fn test_missing_font_falls_back_to_boxes() {
        let annotator = Annotator::load(Path::new("/nonexistent/font.ttf"), 20.0);
        assert!(!annotator.has_font());
    }

    #[test]
    fn test_box_outline_is_three_pixels_red() {
        let image = DynamicImage::new_rgb8(64, 64);
        let out = Annotator::boxes_only().render(&image, &[detection(10.0, 10.0, 40.0, 40.0)]);

        assert_eq!(out.dimensions(), (64, 64));
        for x in 10..13 {
            assert_eq!(*out.get_pixel(x, 25), RED, "stroke column {x}");
        }
        assert_eq!(*out.get_pixel(13, 25), Rgb([0, 0, 0]));
        assert_eq!(*out.get_pixel(25, 25), Rgb([0, 0, 0]));
        assert_eq!(*out.get_pixel(40, 40), RED);
    }

    #[test]
    fn test_reversed_and_out_of_bounds_boxes_do_not_panic() {
        let image = DynamicImage::new_rgb8(32, 32);
        let annotator = Annotator::boxes_only();
        let out = annotator.render(
            &image,
            &[detection(30.0, 30.0, 5.0, 5.0), detection(-10.0, -10.0, 100.0, 100.0)],
        );
        assert_eq!(*out.get_pixel(5, 5), RED);
    }

    #[test]
    fn test_coordinates_truncate_toward_zero() {
        let image = DynamicImage::new_rgb8(32, 32);
        let out = Annotator::boxes_only().render(&image, &[detection(4.9, 4.9, 20.9, 20.9)]);
        assert_eq!(*out.get_pixel(4, 10), RED);
        assert_eq!(*out.get_pixel(20, 10), RED);
        assert_eq!(*out.get_pixel(21, 10), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_extreme_box_is_clamped_to_canvas() {
        let image = DynamicImage::new_rgb8(32, 32);
        let annotator = Annotator::boxes_only();
        let out = annotator.render(
            &image,
            &[
                detection(-3e9, -3e9, 3e9, 3e9),
                detection(f64::MIN, 0.0, f64::MAX, 10.0),
                detection(f64::NAN, 2.0, 8.0, 8.0),
            ],
        );
        assert_eq!(out.dimensions(), (32, 32));
        assert_eq!(*out.get_pixel(5, 0), RED);
        assert_eq!(*out.get_pixel(5, 10), RED);
        assert_eq!(*out.get_pixel(8, 5), RED);
        assert_eq!(*out.get_pixel(16, 16), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_to_pixel_clamps_and_truncates() {
        assert_eq!(to_pixel(12.7, 32), 12);
        assert_eq!(to_pixel(-0.5, 32), 0);
        assert_eq!(to_pixel(-3e9, 32), -3);
        assert_eq!(to_pixel(3e9, 32), 35);
        assert_eq!(caption_pixel(-10.9), -10);
        assert_eq!(caption_pixel(f64::MAX), CAPTION_LIMIT);
    }

    #[test]
    fn test_source_image_is_untouched() {
        let image = DynamicImage::new_rgb8(16, 16);
        Annotator::boxes_only().render(&image, &[detection(2.0, 2.0, 10.0, 10.0)]);
        assert_eq!(image.to_rgb8().get_pixel(2, 2), &Rgb([0, 0, 0]));
    }
}
