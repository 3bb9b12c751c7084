//! Color Heuristic Fallback
//!
//! Rule-based skin/nail assessment over per-pixel color statistics, used
//! whenever centroid classification is unavailable. Each pixel's saturation
//! and value are computed on a 0-255 scale and averaged across the image:
//! dull, dark images read as unhealthy; vivid, bright images as healthy.

use image::RgbImage;

use super::{BodyPart, HealthLabel, ImageClassification};

const SAT_LOW: f64 = 60.0;
const VAL_LOW: f64 = 110.0;
const SAT_MARKED: f64 = 45.0;
const VAL_MARKED: f64 = 90.0;
const SAT_HIGH: f64 = 120.0;
const VAL_HIGH: f64 = 160.0;

/// Classify an image by its mean per-pixel saturation and value.
///
/// Saturation and value are taken per pixel and then averaged; averaging the
/// RGB channels first would cancel opposing hues and misread saturated
/// multi-hue images as grey.
pub fn classify(image: &RgbImage, part: BodyPart) -> ImageClassification {
    let pixel_count = (image.width() as u64) * (image.height() as u64);
    if pixel_count == 0 {
        return ImageClassification {
            label: HealthLabel::healthy(part),
            confidence: 0.5,
        };
    }

    let mut saturation_sum = 0.0f64;
    let mut value_sum = 0.0f64;
    for pixel in image.pixels() {
        let r = pixel.0[0] as f64;
        let g = pixel.0[1] as f64;
        let b = pixel.0[2] as f64;
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        value_sum += max;
        if max > 0.0 {
            saturation_sum += (max - min) / max * 255.0;
        }
    }
    let saturation = saturation_sum / pixel_count as f64;
    let value = value_sum / pixel_count as f64;

    if saturation < SAT_LOW && value < VAL_LOW {
        // Dull and dark; markedly so when either channel drops further.
        let confidence = if saturation < SAT_MARKED || value < VAL_MARKED {
            0.8
        } else {
            0.7
        };
        ImageClassification {
            label: HealthLabel::unhealthy(part),
            confidence,
        }
    } else if saturation > SAT_HIGH && value > VAL_HIGH {
        ImageClassification {
            label: HealthLabel::healthy(part),
            confidence: 0.75,
        }
    } else {
        ImageClassification {
            label: HealthLabel::healthy(part),
            confidence: 0.6,
        }
    }
}
