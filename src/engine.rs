//! Assessment Engine
//!
//! Composes the estimator, categorizer, classifier, scorer, and
//! recommendation engine into a single entry point. Assessment is total:
//! estimator rejections degrade to neutral growth figures (median
//! percentile, zero z-score) instead of failing, and image problems are
//! absorbed by the classifier's own fallbacks.

use serde::Serialize;
use tracing::{info, warn};

use crate::category::{categorize_bmi, BmiCategory};
use crate::classifier::{BodyPart, HealthClassifier, ImageClassification};
use crate::percentile::estimate_bmi_percentile;
use crate::recommend::{generate_recommendations, RecommendationSet};
use crate::reference::GrowthReference;
use crate::risk::{calculate_risk_score, determine_severity, RiskAssessment, Severity};

/// Measurements for one child at assessment time.
#[derive(Debug, Clone, Serialize)]
pub struct AnthropometricInput {
    pub age_months: f64,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub gender: String,
    /// Body mass index in kg/m², derived from height and weight.
    pub bmi: f64,
}

impl AnthropometricInput {
    /// Build an input from raw measurements, deriving BMI.
    /// Non-positive height yields a zero BMI, which downstream estimation
    /// treats as degraded input rather than an error.
    pub fn from_measurements(
        age_months: f64,
        height_cm: f64,
        weight_kg: f64,
        gender: impl Into<String>,
    ) -> Self {
        let bmi = if height_cm > 0.0 {
            let height_m = height_cm / 100.0;
            weight_kg / (height_m * height_m)
        } else {
            0.0
        };
        Self {
            age_months,
            height_cm,
            weight_kg,
            gender: gender.into(),
            bmi,
        }
    }

    pub fn age_years(&self) -> f64 {
        self.age_months / 12.0
    }
}

/// Headline status shown alongside the numeric score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NutritionStatus {
    Normal,
    AtRisk,
    Moderate,
    Severe,
}

impl NutritionStatus {
    pub fn display_text(&self) -> &'static str {
        match self {
            NutritionStatus::Normal => "Normal",
            NutritionStatus::AtRisk => "At Risk",
            NutritionStatus::Moderate => "Moderate",
            NutritionStatus::Severe => "Severe",
        }
    }
}

/// Complete assessment output for one child.
#[derive(Debug, Clone, Serialize)]
pub struct Assessment {
    pub input: AnthropometricInput,
    pub bmi_percentile: f64,
    pub bmi_z_score: f64,
    pub bmi_category: BmiCategory,
    pub skin: ImageClassification,
    pub nails: ImageClassification,
    pub skin_severity: Severity,
    pub nail_severity: Severity,
    pub risk: RiskAssessment,
    pub recommendations: RecommendationSet,
    pub nutrition_status: NutritionStatus,
}

/// End-to-end assessment pipeline.
pub struct AssessmentEngine {
    reference: GrowthReference,
    classifier: HealthClassifier,
}

impl AssessmentEngine {
    /// Engine over the bundled growth reference.
    pub fn new(classifier: HealthClassifier) -> anyhow::Result<Self> {
        Ok(Self {
            reference: GrowthReference::bundled()?,
            classifier,
        })
    }

    /// Engine over a caller-supplied reference table.
    pub fn with_reference(reference: GrowthReference, classifier: HealthClassifier) -> Self {
        Self {
            reference,
            classifier,
        }
    }

    pub fn reference(&self) -> &GrowthReference {
        &self.reference
    }

    /// Run a full assessment. Never fails: degraded inputs produce a
    /// degraded but complete assessment.
    pub fn assess(
        &self,
        input: &AnthropometricInput,
        skin_image: &[u8],
        nail_image: &[u8],
    ) -> Assessment {
        let age_years = input.age_years();

        let skin = self.classifier.classify(skin_image, BodyPart::Skin);
        let nails = self.classifier.classify(nail_image, BodyPart::Nail);

        let (bmi_percentile, bmi_z_score) =
            match estimate_bmi_percentile(&self.reference, age_years, input.bmi, &input.gender) {
                Ok(result) => (result.percentile, result.z_score),
                Err(err) => {
                    // Neutral growth figures; the categorizer applies its
                    // own adult-threshold fallback independently.
                    warn!(error = %err, "percentile estimation degraded to neutral figures");
                    (50.0, 0.0)
                }
            };

        let bmi_category = categorize_bmi(&self.reference, input.bmi, age_years, &input.gender);
        let risk = calculate_risk_score(bmi_percentile, bmi_z_score, &skin, &nails, age_years);
        let recommendations = generate_recommendations(&risk, bmi_category);
        let nutrition_status = nutrition_status(&risk, &skin, &nails);

        info!(
            score = risk.score,
            level = risk.level.display_text(),
            status = nutrition_status.display_text(),
            "assessment complete"
        );

        Assessment {
            input: input.clone(),
            bmi_percentile,
            bmi_z_score,
            bmi_category,
            skin_severity: determine_severity(&skin),
            nail_severity: determine_severity(&nails),
            skin,
            nails,
            risk,
            recommendations,
            nutrition_status,
        }
    }
}

/// Headline status from the risk tier, with unhealthy image verdicts
/// promoting an otherwise-low tier to At Risk.
fn nutrition_status(
    risk: &RiskAssessment,
    skin: &ImageClassification,
    nails: &ImageClassification,
) -> NutritionStatus {
    use crate::risk::RiskLevel;
    match risk.level {
        RiskLevel::Critical => NutritionStatus::Severe,
        RiskLevel::High => NutritionStatus::Moderate,
        RiskLevel::Medium => NutritionStatus::AtRisk,
        RiskLevel::Low => {
            if skin.label.is_unhealthy() || nails.label.is_unhealthy() {
                NutritionStatus::AtRisk
            } else {
                NutritionStatus::Normal
            }
        }
    }
}
