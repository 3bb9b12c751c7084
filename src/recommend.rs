//! Recommendation Engine
//!
//! Deterministic guidance text selected from the risk score and BMI
//! category. Thresholds are intentionally coarse: dietary advice follows the
//! category, lifestyle and hydration advice follow the score, and the
//! consultation flag trips on high scores or extreme categories.

use serde::Serialize;

use crate::category::BmiCategory;
use crate::risk::RiskAssessment;

/// Guidance bundle attached to every assessment.
#[derive(Debug, Clone, Serialize)]
pub struct RecommendationSet {
    pub dietary_recommendations: &'static str,
    pub lifestyle_recommendations: &'static str,
    pub hydration_tips: &'static str,
    /// True when a professional evaluation should be sought.
    pub professional_consultation: bool,
}

/// Select recommendations for a scored assessment.
pub fn generate_recommendations(
    risk: &RiskAssessment,
    bmi_category: BmiCategory,
) -> RecommendationSet {
    let dietary_recommendations = match bmi_category {
        BmiCategory::Underweight => {
            "Increase caloric intake with nutrient-dense foods. \
             Focus on protein-rich foods, healthy fats, and complex carbohydrates. \
             Consider 5-6 small meals per day. Include dairy, eggs, lean meats, \
             nuts, and whole grains."
        }
        BmiCategory::Overweight | BmiCategory::Obese => {
            "Focus on portion control and balanced nutrition. \
             Increase vegetables, fruits, and lean proteins. \
             Reduce processed foods, sugary drinks, and excessive fats. \
             Aim for regular meal timing and avoid skipping meals."
        }
        BmiCategory::Normal => {
            "Maintain balanced nutrition with variety. \
             Include all food groups: proteins, carbohydrates, healthy fats, \
             vitamins, and minerals. Focus on whole foods over processed options."
        }
    };

    let lifestyle_recommendations = if risk.score > 60 {
        "Immediate attention required. Establish regular sleep patterns, \
         reduce screen time, and increase physical activity. \
         Consider stress management techniques and family counseling."
    } else if risk.score > 40 {
        "Moderate lifestyle changes needed. Increase physical activity to \
         60 minutes daily, improve sleep hygiene, and reduce sedentary behavior. \
         Establish regular routines."
    } else {
        "Maintain healthy habits. Continue regular physical activity, \
         adequate sleep (8-10 hours), and balanced daily routines. \
         Monitor growth patterns regularly."
    };

    let hydration_tips = if risk.score > 50 {
        "Ensure adequate hydration: 6-8 glasses of water daily. \
         Monitor urine color (should be light yellow). \
         Increase fluids during physical activity and hot weather."
    } else {
        "Maintain good hydration habits: 6-8 glasses of water daily. \
         Include water-rich foods like fruits and vegetables."
    };

    let professional_consultation = risk.score > 40
        || matches!(bmi_category, BmiCategory::Underweight | BmiCategory::Obese);

    RecommendationSet {
        dietary_recommendations,
        lifestyle_recommendations,
        hydration_tips,
        professional_consultation,
    }
}
