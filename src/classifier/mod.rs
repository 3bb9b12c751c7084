//! Skin & Nail Image Classifier
//!
//! Nearest-centroid classification over injected feature vectors, with a
//! color heuristic as the permanent fallback. Each body part (skin, nails)
//! is an independent domain with its own lazily-initialized state:
//!
//! - Initialization runs exactly once per domain, on first classification.
//! - If the feature extractor or reference collection is absent, or every
//!   reference class is empty, the domain falls back to the heuristic and
//!   never retries centroid initialization.
//! - Classification itself never fails: undecodable input yields a neutral
//!   healthy verdict at confidence 0.5.

pub mod extractor;
pub mod heuristic;

use std::sync::{Arc, OnceLock};

use image::RgbImage;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub use extractor::{FeatureExtractor, ImageDirectory, InMemoryCollection, ReferenceCollection};

/// Distance-to-confidence temperature. Larger values flatten the mapping.
const CONFIDENCE_TEMPERATURE: f64 = 100.0;

/// Body region a classification request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyPart {
    Skin,
    Nail,
}

impl BodyPart {
    /// Reference class labels for this domain, healthy first.
    pub fn class_labels(&self) -> [&'static str; 2] {
        match self {
            BodyPart::Skin => ["healthy_skin", "unhealthy_skin"],
            BodyPart::Nail => ["healthy_nails", "unhealthy_nails"],
        }
    }
}

/// Classification verdict label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthLabel {
    HealthySkin,
    UnhealthySkin,
    HealthyNails,
    UnhealthyNails,
}

impl HealthLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthLabel::HealthySkin => "healthy_skin",
            HealthLabel::UnhealthySkin => "unhealthy_skin",
            HealthLabel::HealthyNails => "healthy_nails",
            HealthLabel::UnhealthyNails => "unhealthy_nails",
        }
    }

    pub fn is_unhealthy(&self) -> bool {
        matches!(self, HealthLabel::UnhealthySkin | HealthLabel::UnhealthyNails)
    }

    pub fn healthy(part: BodyPart) -> Self {
        match part {
            BodyPart::Skin => HealthLabel::HealthySkin,
            BodyPart::Nail => HealthLabel::HealthyNails,
        }
    }

    pub fn unhealthy(part: BodyPart) -> Self {
        match part {
            BodyPart::Skin => HealthLabel::UnhealthySkin,
            BodyPart::Nail => HealthLabel::UnhealthyNails,
        }
    }

    fn from_class_label(label: &str) -> Option<Self> {
        match label {
            "healthy_skin" => Some(HealthLabel::HealthySkin),
            "unhealthy_skin" => Some(HealthLabel::UnhealthySkin),
            "healthy_nails" => Some(HealthLabel::HealthyNails),
            "unhealthy_nails" => Some(HealthLabel::UnhealthyNails),
            _ => None,
        }
    }
}

/// One classification verdict: a label plus confidence in [0.05, 0.99]
/// (0.5 for neutral verdicts on undecodable or unscorable input).
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ImageClassification {
    pub label: HealthLabel,
    pub confidence: f64,
}

/// Mean feature vector for one reference class.
#[derive(Debug, Clone)]
struct Centroid {
    label: HealthLabel,
    vector: Vec<f64>,
}

/// Resolved per-domain classification strategy.
#[derive(Debug)]
enum DomainState {
    CentroidBased(Vec<Centroid>),
    HeuristicFallback,
}

/// Skin/nail health classifier with lazily-built per-domain state.
pub struct HealthClassifier {
    extractor: Option<Arc<dyn FeatureExtractor>>,
    references: Option<Arc<dyn ReferenceCollection>>,
    skin_state: OnceLock<DomainState>,
    nail_state: OnceLock<DomainState>,
}

impl HealthClassifier {
    /// Classifier backed by an injected extractor and reference collection.
    pub fn new(
        extractor: Arc<dyn FeatureExtractor>,
        references: Arc<dyn ReferenceCollection>,
    ) -> Self {
        Self {
            extractor: Some(extractor),
            references: Some(references),
            skin_state: OnceLock::new(),
            nail_state: OnceLock::new(),
        }
    }

    /// Classifier with no extraction backend; every call uses the heuristic.
    pub fn heuristic_only() -> Self {
        Self {
            extractor: None,
            references: None,
            skin_state: OnceLock::new(),
            nail_state: OnceLock::new(),
        }
    }

    /// Classify an encoded image (jpg/png bytes) for one body part.
    ///
    /// Never fails: undecodable bytes yield a neutral healthy verdict, and
    /// per-call extraction failures drop to the heuristic for that call only.
    pub fn classify(&self, image_bytes: &[u8], part: BodyPart) -> ImageClassification {
        let image = match image::load_from_memory(image_bytes) {
            Ok(decoded) => decoded.to_rgb8(),
            Err(err) => {
                warn!(part = ?part, error = %err, "undecodable image, returning neutral verdict");
                return ImageClassification {
                    label: HealthLabel::healthy(part),
                    confidence: 0.5,
                };
            }
        };

        match self.domain_state(part) {
            DomainState::HeuristicFallback => heuristic::classify(&image, part),
            DomainState::CentroidBased(centroids) => {
                self.classify_by_centroids(&image, part, centroids)
            }
        }
    }

    fn classify_by_centroids(
        &self,
        image: &RgbImage,
        part: BodyPart,
        centroids: &[Centroid],
    ) -> ImageClassification {
        // CentroidBased state only exists when an extractor was injected.
        let extractor = match &self.extractor {
            Some(extractor) => extractor,
            None => return heuristic::classify(image, part),
        };

        let features = match extractor.extract(image, part) {
            Ok(features) => features,
            Err(err) => {
                warn!(part = ?part, error = %err, "feature extraction failed, using heuristic");
                return heuristic::classify(image, part);
            }
        };

        let mut best: Option<(&Centroid, f64)> = None;
        let mut tied = false;
        for centroid in centroids {
            let distance = euclidean_distance(&features, &centroid.vector);
            match best {
                Some((best_centroid, best_distance)) => {
                    if distance < best_distance {
                        best = Some((centroid, distance));
                        tied = false;
                    } else if distance == best_distance && centroid.label != best_centroid.label {
                        tied = true;
                    }
                }
                None => best = Some((centroid, distance)),
            }
        }

        match best {
            Some((centroid, distance)) => {
                // An exact cross-class tie is ambiguous; report it neutrally.
                let confidence = if tied {
                    0.5
                } else {
                    confidence_from_distance(distance)
                };
                ImageClassification {
                    label: centroid.label,
                    confidence,
                }
            }
            None => heuristic::classify(image, part),
        }
    }

    fn domain_state(&self, part: BodyPart) -> &DomainState {
        let cell = match part {
            BodyPart::Skin => &self.skin_state,
            BodyPart::Nail => &self.nail_state,
        };
        cell.get_or_init(|| self.build_domain_state(part))
    }

    /// Build centroids for one domain from the reference collection.
    /// Any outcome other than at least one usable centroid is a permanent
    /// fall back to the heuristic; initialization is never retried.
    fn build_domain_state(&self, part: BodyPart) -> DomainState {
        let (extractor, references) = match (&self.extractor, &self.references) {
            (Some(extractor), Some(references)) => (extractor, references),
            _ => {
                debug!(part = ?part, "no extraction backend, heuristic fallback");
                return DomainState::HeuristicFallback;
            }
        };

        let mut centroids = Vec::new();
        for class_label in part.class_labels() {
            let label = match HealthLabel::from_class_label(class_label) {
                Some(label) => label,
                None => continue,
            };
            let images = references.class_images(class_label);
            if images.is_empty() {
                debug!(class = class_label, "no reference images for class");
                continue;
            }

            let vectors: Vec<Vec<f64>> = images
                .par_iter()
                .filter_map(|bytes| {
                    let image = image::load_from_memory(bytes).ok()?.to_rgb8();
                    extractor.extract(&image, part).ok()
                })
                .collect();

            match mean_vector(&vectors) {
                Some(vector) => centroids.push(Centroid { label, vector }),
                None => {
                    warn!(class = class_label, "no usable reference features for class");
                }
            }
        }

        if centroids.is_empty() {
            warn!(part = ?part, "centroid initialization produced nothing, heuristic fallback");
            DomainState::HeuristicFallback
        } else {
            debug!(part = ?part, classes = centroids.len(), "centroid classifier initialized");
            DomainState::CentroidBased(centroids)
        }
    }
}

/// Element-wise mean of equal-length vectors. Vectors whose length differs
/// from the first are skipped; returns None when nothing usable remains.
fn mean_vector(vectors: &[Vec<f64>]) -> Option<Vec<f64>> {
    let first = vectors.first()?;
    let dim = first.len();
    if dim == 0 {
        return None;
    }

    let mut sum = vec![0.0f64; dim];
    let mut count = 0usize;
    for vector in vectors {
        if vector.len() != dim {
            continue;
        }
        for (acc, v) in sum.iter_mut().zip(vector) {
            *acc += v;
        }
        count += 1;
    }
    if count == 0 {
        return None;
    }
    for acc in &mut sum {
        *acc /= count as f64;
    }
    Some(sum)
}

/// Euclidean distance; length mismatch yields infinity so the verdict
/// degrades to a neutral confidence instead of comparing garbage.
fn euclidean_distance(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() {
        return f64::INFINITY;
    }
    let sum_sq: f64 = a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum();
    libm::sqrt(sum_sq)
}

/// Map a centroid distance to a confidence: exp(-d / temperature), clamped
/// to [0.05, 0.99]. Non-finite distances map to the neutral 0.5.
fn confidence_from_distance(distance: f64) -> f64 {
    if !distance.is_finite() {
        return 0.5;
    }
    libm::exp(-distance / CONFIDENCE_TEMPERATURE).clamp(0.05, 0.99)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use approx::assert_relative_eq;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn png_bytes(rgb: [u8; 3]) -> Vec<u8> {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb(rgb)));
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    /// Extractor that reduces an image to its mean channel intensities.
    struct MeanColorExtractor;

    impl FeatureExtractor for MeanColorExtractor {
        fn extract(&self, image: &RgbImage, _part: BodyPart) -> Result<Vec<f64>> {
            let n = (image.width() * image.height()) as f64;
            let mut sum = [0.0f64; 3];
            for pixel in image.pixels() {
                sum[0] += pixel.0[0] as f64;
                sum[1] += pixel.0[1] as f64;
                sum[2] += pixel.0[2] as f64;
            }
            Ok(vec![sum[0] / n, sum[1] / n, sum[2] / n])
        }
    }

    struct FailingExtractor;

    impl FeatureExtractor for FailingExtractor {
        fn extract(&self, _image: &RgbImage, _part: BodyPart) -> Result<Vec<f64>> {
            anyhow::bail!("backend unavailable")
        }
    }

    fn trained_classifier() -> HealthClassifier {
        let mut collection = InMemoryCollection::new();
        collection.insert("healthy_skin", png_bytes([200, 150, 140]));
        collection.insert("unhealthy_skin", png_bytes([60, 50, 45]));
        HealthClassifier::new(Arc::new(MeanColorExtractor), Arc::new(collection))
    }

    #[test]
    fn test_confidence_from_distance() {
        assert_relative_eq!(confidence_from_distance(0.0), 0.99);
        assert_relative_eq!(confidence_from_distance(100.0), (-1.0f64).exp(), epsilon = 1e-12);
        assert_relative_eq!(confidence_from_distance(1000.0), 0.05);
        assert_relative_eq!(confidence_from_distance(f64::INFINITY), 0.5);
        assert_relative_eq!(confidence_from_distance(f64::NAN), 0.5);
    }

    #[test]
    fn test_euclidean_distance_length_mismatch_is_infinite() {
        assert!(euclidean_distance(&[1.0, 2.0], &[1.0]).is_infinite());
        assert_relative_eq!(euclidean_distance(&[3.0, 0.0], &[0.0, 4.0]), 5.0);
    }

    #[test]
    fn test_nearest_centroid_classification() {
        let classifier = trained_classifier();

        let bright = classifier.classify(&png_bytes([195, 145, 138]), BodyPart::Skin);
        assert_eq!(bright.label, HealthLabel::HealthySkin);
        assert!(bright.confidence > 0.9);

        let dark = classifier.classify(&png_bytes([55, 48, 40]), BodyPart::Skin);
        assert_eq!(dark.label, HealthLabel::UnhealthySkin);
        assert!(dark.confidence > 0.9);
    }

    #[test]
    fn test_cross_class_tie_is_neutral_confidence() {
        let mut collection = InMemoryCollection::new();
        collection.insert("healthy_skin", png_bytes([100, 100, 100]));
        collection.insert("unhealthy_skin", png_bytes([200, 200, 200]));
        let classifier = HealthClassifier::new(Arc::new(MeanColorExtractor), Arc::new(collection));

        // Exactly equidistant from both centroids
        let result = classifier.classify(&png_bytes([150, 150, 150]), BodyPart::Skin);
        assert_relative_eq!(result.confidence, 0.5);
    }

    #[test]
    fn test_undecodable_image_is_neutral() {
        let classifier = trained_classifier();
        let result = classifier.classify(b"not an image", BodyPart::Skin);
        assert_eq!(result.label, HealthLabel::HealthySkin);
        assert_relative_eq!(result.confidence, 0.5);

        let result = classifier.classify(b"", BodyPart::Nail);
        assert_eq!(result.label, HealthLabel::HealthyNails);
        assert_relative_eq!(result.confidence, 0.5);
    }

    #[test]
    fn test_empty_collection_falls_back_to_heuristic() {
        let classifier = HealthClassifier::new(
            Arc::new(MeanColorExtractor),
            Arc::new(InMemoryCollection::new()),
        );
        // Heuristic verdicts carry the heuristic's fixed confidence levels
        let result = classifier.classify(&png_bytes([200, 80, 90]), BodyPart::Skin);
        assert_eq!(result.label, HealthLabel::HealthySkin);
        assert_relative_eq!(result.confidence, 0.75);
    }

    #[test]
    fn test_extraction_failure_falls_back_per_call() {
        let mut collection = InMemoryCollection::new();
        collection.insert("healthy_nails", png_bytes([200, 150, 140]));
        // Centroid init itself fails per-image, leaving the class empty
        let classifier = HealthClassifier::new(Arc::new(FailingExtractor), Arc::new(collection));
        let result = classifier.classify(&png_bytes([30, 30, 30]), BodyPart::Nail);
        assert_eq!(result.label, HealthLabel::UnhealthyNails);
        assert_relative_eq!(result.confidence, 0.8);
    }

    #[test]
    fn test_heuristic_only_constructor() {
        let classifier = HealthClassifier::heuristic_only();
        let result = classifier.classify(&png_bytes([100, 90, 80]), BodyPart::Nail);
        assert_eq!(result.label, HealthLabel::UnhealthyNails);
        assert_relative_eq!(result.confidence, 0.7);
    }

    #[test]
    fn test_domains_are_independent() {
        let mut collection = InMemoryCollection::new();
        collection.insert("healthy_skin", png_bytes([200, 150, 140]));
        collection.insert("unhealthy_skin", png_bytes([60, 50, 45]));
        // Nail classes left empty: skin gets centroids, nails fall back
        let classifier =
            HealthClassifier::new(Arc::new(MeanColorExtractor), Arc::new(collection));

        let skin = classifier.classify(&png_bytes([195, 145, 138]), BodyPart::Skin);
        assert_eq!(skin.label, HealthLabel::HealthySkin);
        assert!(skin.confidence > 0.9);

        let nails = classifier.classify(&png_bytes([180, 180, 180]), BodyPart::Nail);
        assert_eq!(nails.label, HealthLabel::HealthyNails);
        assert_relative_eq!(nails.confidence, 0.6);
    }
}
