//! Feature Extraction Boundary
//!
//! The classifier is agnostic to how image features are produced; it only
//! requires deterministic fixed-length vectors comparable by Euclidean
//! distance, one extractor domain per body part. Reference images for
//! centroid initialization come through a second seam so tests and callers
//! can supply in-memory collections instead of a dataset directory.

use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use image::RgbImage;
use rustc_hash::FxHashMap;
use tracing::debug;

use super::BodyPart;

/// External feature-extraction capability, dependency-injected.
///
/// Implementations must be deterministic per (image, body part): the same
/// input always yields the same vector. Vector length must be constant
/// within one body-part domain.
pub trait FeatureExtractor: Send + Sync {
    fn extract(&self, image: &RgbImage, part: BodyPart) -> Result<Vec<f64>>;
}

/// Source of labeled reference images for centroid initialization.
///
/// Yields raw encoded image bytes per class label. An empty result for every
/// class of a body part means that part has no trained centroids and the
/// classifier falls back to the color heuristic permanently.
pub trait ReferenceCollection: Send + Sync {
    fn class_images(&self, class_label: &str) -> Vec<Vec<u8>>;
}

/// Filesystem-backed reference collection: one subdirectory per class label
/// containing jpg/jpeg/png samples. Missing directories yield no images.
#[derive(Debug, Clone)]
pub struct ImageDirectory {
    root: PathBuf,
}

impl ImageDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn is_supported(name: &str) -> bool {
        let lower = name.to_ascii_lowercase();
        lower.ends_with(".jpg") || lower.ends_with(".jpeg") || lower.ends_with(".png")
    }
}

impl ReferenceCollection for ImageDirectory {
    fn class_images(&self, class_label: &str) -> Vec<Vec<u8>> {
        let class_dir = self.root.join(class_label);
        let entries = match fs::read_dir(&class_dir) {
            Ok(entries) => entries,
            Err(_) => {
                debug!(class = class_label, dir = %class_dir.display(), "reference class directory missing");
                return Vec::new();
            }
        };

        let mut images = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            let name = match path.file_name().and_then(|n| n.to_str()) {
                Some(name) => name,
                None => continue,
            };
            if !Self::is_supported(name) {
                continue;
            }
            match fs::read(&path) {
                Ok(bytes) => images.push(bytes),
                Err(err) => {
                    debug!(file = %path.display(), error = %err, "skipping unreadable reference image");
                }
            }
        }
        images
    }
}

/// In-memory reference collection, keyed by class label. Intended for tests
/// and for callers that manage reference data themselves.
#[derive(Debug, Default, Clone)]
pub struct InMemoryCollection {
    classes: FxHashMap<String, Vec<Vec<u8>>>,
}

impl InMemoryCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, class_label: impl Into<String>, image_bytes: Vec<u8>) {
        self.classes
            .entry(class_label.into())
            .or_default()
            .push(image_bytes);
    }
}

impl ReferenceCollection for InMemoryCollection {
    fn class_images(&self, class_label: &str) -> Vec<Vec<u8>> {
        self.classes.get(class_label).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_extensions() {
        assert!(ImageDirectory::is_supported("sample.jpg"));
        assert!(ImageDirectory::is_supported("SAMPLE.JPEG"));
        assert!(ImageDirectory::is_supported("scan.png"));
        assert!(!ImageDirectory::is_supported("notes.txt"));
        assert!(!ImageDirectory::is_supported("archive.gif"));
    }

    #[test]
    fn test_missing_class_dir_yields_no_images() {
        let dir = ImageDirectory::new("/nonexistent/training_set");
        assert!(dir.class_images("healthy_skin").is_empty());
    }

    #[test]
    fn test_in_memory_collection() {
        let mut collection = InMemoryCollection::new();
        collection.insert("healthy_skin", vec![1, 2, 3]);
        collection.insert("healthy_skin", vec![4, 5]);
        assert_eq!(collection.class_images("healthy_skin").len(), 2);
        assert!(collection.class_images("unhealthy_skin").is_empty());
    }
}
