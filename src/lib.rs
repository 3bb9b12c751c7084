//! Pediatric Malnutrition Screening Engine
//!
//! Rule-based nutrition risk assessment for children and adolescents
//! (2-19 years) from anthropometric measurements and skin/nail photos:
//!
//! - `reference`: bundled BMI-for-age growth reference curves
//! - `stats`: closed-form standard-normal quantile for z-scores
//! - `percentile`: BMI-for-age percentile and z-score estimation
//! - `category`: coarse BMI categorization with adult-threshold fallback
//! - `classifier`: nearest-centroid skin/nail classification with a color
//!   heuristic fallback
//! - `risk`: additive 0-100 risk scoring and tiering
//! - `recommend`: deterministic guidance text selection
//! - `engine`: the end-to-end assessment pipeline
//! - `explain`: rule-based conversational report explanation
//!
//! Assessment never fails: degraded inputs (bad gender, out-of-range age,
//! undecodable images) produce a degraded but complete assessment.

pub mod category;
pub mod classifier;
pub mod engine;
pub mod explain;
pub mod percentile;
pub mod recommend;
pub mod reference;
pub mod risk;
pub mod stats;

// Re-export commonly used types
pub use category::{categorize_bmi, BmiCategory};
pub use classifier::{
    BodyPart, FeatureExtractor, HealthClassifier, HealthLabel, ImageClassification,
    ImageDirectory, InMemoryCollection, ReferenceCollection,
};
pub use engine::{AnthropometricInput, Assessment, AssessmentEngine, NutritionStatus};
pub use explain::{detect_intent, Explainer, Intent, ReportContext, TextGenerator};
pub use percentile::{estimate_bmi_percentile, EstimateError, PercentileResult};
pub use recommend::{generate_recommendations, RecommendationSet};
pub use reference::{Gender, GrowthReference};
pub use risk::{calculate_risk_score, determine_severity, RiskAssessment, RiskLevel, Severity};
