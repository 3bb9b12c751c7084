//! Report Explainer
//!
//! Conversational explanation of an assessment. Intent detection is an
//! ordered keyword table checked top to bottom, first match wins; every
//! rule-based response is deterministic. An optional text generator can be
//! injected for free-form answers, and any generator failure drops silently
//! back to the rule-based path.

use std::fmt::Write as _;

use anyhow::Result;
use tracing::debug;

use crate::category::BmiCategory;
use crate::engine::Assessment;
use crate::risk::RiskLevel;

/// External free-form text generation capability.
pub trait TextGenerator: Send + Sync {
    fn generate(&self, prompt: &str) -> Result<String>;
}

/// Recognized question intents, in match priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Greeting,
    Report,
    Bmi,
    Risk,
    Recommendations,
    Consultation,
    Nutrition,
    Default,
}

/// Keyword table driving intent detection. Order is the dispatch order:
/// earlier rows shadow later ones when a message matches several.
const INTENT_KEYWORDS: &[(Intent, &[&str])] = &[
    (Intent::Greeting, &["hello", "hi", "hey", "start"]),
    (
        Intent::Report,
        &["explain", "what does", "mean", "understand", "report"],
    ),
    (
        Intent::Bmi,
        &["bmi", "weight", "height", "percentile", "z-score"],
    ),
    (
        Intent::Risk,
        &["risk", "dangerous", "serious", "critical", "level"],
    ),
    (
        Intent::Recommendations,
        &["recommend", "advice", "what should", "help", "improve"],
    ),
    (
        Intent::Consultation,
        &["doctor", "hospital", "professional", "consult", "medical"],
    ),
    (
        Intent::Nutrition,
        &["nutrition", "food", "diet", "healthy", "eating"],
    ),
];

/// Detect the intent of a user message by substring match on the lowercased
/// text. Unmatched messages get the default intent.
pub fn detect_intent(message: &str) -> Intent {
    let message = message.to_lowercase();
    for (intent, keywords) in INTENT_KEYWORDS {
        if keywords.iter().any(|keyword| message.contains(keyword)) {
            return *intent;
        }
    }
    Intent::Default
}

/// Assessment snapshot the explainer answers questions against.
#[derive(Debug, Clone)]
pub struct ReportContext {
    pub child_name: String,
    pub age_years: f64,
    pub bmi: f64,
    pub bmi_category: BmiCategory,
    pub bmi_percentile: f64,
    pub bmi_z_score: f64,
    pub skin_label: String,
    pub nail_label: String,
    pub risk_score: u32,
    pub risk_level: RiskLevel,
    pub dietary_recommendations: String,
    pub lifestyle_recommendations: String,
    pub hydration_tips: String,
    pub professional_consultation: bool,
}

impl ReportContext {
    pub fn from_assessment(assessment: &Assessment, child_name: impl Into<String>) -> Self {
        Self {
            child_name: child_name.into(),
            age_years: assessment.input.age_years(),
            bmi: assessment.input.bmi,
            bmi_category: assessment.bmi_category,
            bmi_percentile: assessment.bmi_percentile,
            bmi_z_score: assessment.bmi_z_score,
            skin_label: assessment.skin.label.as_str().to_string(),
            nail_label: assessment.nails.label.as_str().to_string(),
            risk_score: assessment.risk.score,
            risk_level: assessment.risk.level,
            dietary_recommendations: assessment.recommendations.dietary_recommendations.to_string(),
            lifestyle_recommendations: assessment
                .recommendations
                .lifestyle_recommendations
                .to_string(),
            hydration_tips: assessment.recommendations.hydration_tips.to_string(),
            professional_consultation: assessment.recommendations.professional_consultation,
        }
    }

    /// One-line-per-field context block, used as generator grounding and in
    /// report summaries.
    pub fn summary(&self) -> String {
        format!(
            "Child: {}\n\
             Age (years): {:.1}\n\
             BMI: {:.1} ({})\n\
             WHO Percentile: {:.1}%\n\
             Z-Score: {:.2}\n\
             Skin: {}\n\
             Nails: {}\n\
             Risk Level: {}",
            self.child_name,
            self.age_years,
            self.bmi,
            self.bmi_category.display_text(),
            self.bmi_percentile,
            self.bmi_z_score,
            self.skin_label,
            self.nail_label,
            self.risk_level.display_text(),
        )
    }
}

/// Rule-based explainer with an optional generator for free-form answers.
pub struct Explainer {
    context: Option<ReportContext>,
    generator: Option<Box<dyn TextGenerator>>,
}

impl Default for Explainer {
    fn default() -> Self {
        Self::new()
    }
}

impl Explainer {
    pub fn new() -> Self {
        Self {
            context: None,
            generator: None,
        }
    }

    pub fn with_generator(generator: Box<dyn TextGenerator>) -> Self {
        Self {
            context: None,
            generator: Some(generator),
        }
    }

    /// Attach the report the explainer answers against.
    pub fn set_context(&mut self, context: ReportContext) {
        self.context = Some(context);
    }

    /// Answer a user message.
    ///
    /// Tries the injected generator first when one is present; any generator
    /// failure falls back to the deterministic rule-based answer.
    pub fn respond(&self, message: &str) -> String {
        if let Some(generator) = &self.generator {
            let context_block = self
                .context
                .as_ref()
                .map(|c| c.summary())
                .unwrap_or_else(|| "None".to_string());
            let prompt = format!(
                "Context (if present):\n{}\n\nUser question: {}\n\n\
                 Answer with: (1) an explanation in simple language, (2) a brief takeaway, \
                 (3) 2-4 actionable, safe, non-diagnostic tips.",
                context_block, message
            );
            match generator.generate(&prompt) {
                Ok(text) if !text.trim().is_empty() => return text,
                Ok(_) => debug!("generator returned empty text, using rule-based answer"),
                Err(err) => debug!(error = %err, "generator failed, using rule-based answer"),
            }
        }
        self.rule_based_response(message)
    }

    fn rule_based_response(&self, message: &str) -> String {
        match detect_intent(message) {
            Intent::Greeting => self.greeting_response(),
            Intent::Report => self.report_response(),
            Intent::Bmi => self.bmi_response(),
            Intent::Risk => self.risk_response(),
            Intent::Recommendations => self.recommendations_response(),
            Intent::Consultation => consultation_response(),
            Intent::Nutrition => nutrition_response(),
            Intent::Default => default_response(),
        }
    }

    fn greeting_response(&self) -> String {
        "Great to see you! I'm here to help you understand your child's nutrition report. \
         I can explain:\n\
         - What the results mean\n\
         - BMI and growth patterns\n\
         - Risk levels and what they indicate\n\
         - Personalized recommendations\n\
         - When to consult professionals\n\n\
         What would you like me to explain first?"
            .to_string()
    }

    fn report_response(&self) -> String {
        let context = match &self.context {
            Some(context) => context,
            None => {
                return "I don't have access to a specific report yet. Please run an \
                        assessment first, then I can explain it to you."
                    .to_string()
            }
        };

        let mut response = format!(
            "Let me explain {}'s nutrition report:\n\n",
            context.child_name
        );

        if context.risk_level == RiskLevel::Low {
            response.push_str("Overall Status: Your child appears to have normal nutrition status.\n");
        } else {
            let _ = writeln!(
                response,
                "Overall Status: {} risk - This indicates some concerns that need attention.",
                context.risk_level.display_text()
            );
        }

        let _ = writeln!(
            response,
            "BMI: {:.1} - This places {} in the '{}' category.",
            context.bmi,
            context.child_name,
            context.bmi_category.display_text()
        );

        if context.age_years < 5.0 {
            let _ = writeln!(
                response,
                "At {:.1} years old, this is a critical growth period. Proper nutrition is \
                 essential for development.",
                context.age_years
            );
        } else if context.age_years < 12.0 {
            let _ = writeln!(
                response,
                "At {:.1} years old, {} is in the school-age growth phase.",
                context.age_years, context.child_name
            );
        } else {
            let _ = writeln!(
                response,
                "At {:.1} years old, {} is in adolescence with increased nutritional needs.",
                context.age_years, context.child_name
            );
        }

        response.push_str("\nWould you like me to explain any specific part in more detail?");
        response
    }

    fn bmi_response(&self) -> String {
        let context = match &self.context {
            Some(context) => context,
            None => {
                return "I need to see a report to explain BMI details. Please run an \
                        assessment first."
                    .to_string()
            }
        };

        let mut response = String::from("Let me explain the BMI measurements:\n\n");

        let _ = writeln!(
            response,
            "BMI Value: {:.1}\nThis is {}'s Body Mass Index, calculated from height and weight.\n",
            context.bmi, context.child_name
        );

        let _ = writeln!(response, "Percentile: {:.1}", context.bmi_percentile);
        let percentile_note = if context.bmi_percentile < 5.0 {
            "This is below the 5th percentile, indicating significant underweight."
        } else if context.bmi_percentile < 25.0 {
            "This is below the 25th percentile, indicating mild underweight."
        } else if context.bmi_percentile < 75.0 {
            "This is in the normal range (25th-75th percentile)."
        } else if context.bmi_percentile < 95.0 {
            "This is above the 75th percentile, indicating overweight."
        } else {
            "This is above the 95th percentile, indicating obesity."
        };
        response.push_str(percentile_note);
        response.push('\n');

        let _ = writeln!(response, "\nZ-Score: {:.2}", context.bmi_z_score);
        let z_note = if context.bmi_z_score.abs() < 1.0 {
            "This is within normal range (within 1 standard deviation)."
        } else if context.bmi_z_score.abs() < 2.0 {
            "This is moderately outside normal range (1-2 standard deviations)."
        } else {
            "This is significantly outside normal range (2+ standard deviations)."
        };
        response.push_str(z_note);
        response.push('\n');

        let _ = write!(
            response,
            "\nCategory: {}\nThis is the classification based on age and gender growth standards.",
            context.bmi_category.display_text()
        );
        response
    }

    fn risk_response(&self) -> String {
        let context = match &self.context {
            Some(context) => context,
            None => {
                return "I need to see a report to explain risk levels. Please run an \
                        assessment first."
                    .to_string()
            }
        };

        let mut response = String::from("Let me explain the risk assessment:\n\n");
        let _ = writeln!(response, "Risk Score: {}/100", context.risk_score);
        let _ = writeln!(response, "Risk Level: {}\n", context.risk_level.display_text());

        response.push_str(match context.risk_level {
            RiskLevel::Low => {
                "Low Risk: Your child's nutrition status appears healthy. Continue current \
                 habits and monitor growth.\n"
            }
            RiskLevel::Medium => {
                "Medium Risk: Some concerns detected. Consider minor adjustments to diet \
                 and lifestyle.\n"
            }
            RiskLevel::High => {
                "High Risk: Significant concerns detected. Immediate attention and changes \
                 recommended.\n"
            }
            RiskLevel::Critical => {
                "Critical Risk: Serious concerns detected. Professional medical consultation \
                 strongly recommended.\n"
            }
        });

        response.push_str("\nWhat contributes to this risk:\n");
        if context.skin_label.contains("unhealthy") {
            response.push_str("- Skin condition indicates potential nutritional deficiencies\n");
        }
        if context.nail_label.contains("unhealthy") {
            response.push_str("- Nail condition suggests possible iron or protein issues\n");
        }
        if context.bmi_percentile < 10.0 || context.bmi_percentile > 90.0 {
            response.push_str("- BMI is outside healthy range for age\n");
        }
        response
    }

    fn recommendations_response(&self) -> String {
        let context = match &self.context {
            Some(context) => context,
            None => {
                return "I need to see a report to provide personalized recommendations. \
                        Please run an assessment first."
                    .to_string()
            }
        };

        let mut response =
            String::from("Here are personalized recommendations based on the analysis:\n\n");
        let _ = writeln!(
            response,
            "Dietary Recommendations:\n{}\n",
            context.dietary_recommendations
        );
        let _ = writeln!(
            response,
            "Lifestyle Recommendations:\n{}\n",
            context.lifestyle_recommendations
        );
        let _ = writeln!(response, "Hydration Tips:\n{}\n", context.hydration_tips);
        if context.professional_consultation {
            response.push_str(
                "Professional Consultation:\nBased on the assessment, consulting a healthcare \
                 professional is recommended.\n",
            );
        }
        response.push_str("\nWould you like me to explain any of these recommendations in more detail?");
        response
    }
}

fn consultation_response() -> String {
    "When to Consult Healthcare Professionals:\n\n\
     Immediate Consultation (Within 1-2 weeks):\n\
     - BMI below 5th or above 95th percentile\n\
     - Rapid weight loss or gain\n\
     - Persistent fatigue or weakness\n\
     - Severe skin or nail problems\n\n\
     Regular Monitoring (Every 3-6 months):\n\
     - BMI between 5th-10th or 90th-95th percentile\n\
     - Mild nutritional concerns\n\
     - Family history of nutrition issues\n\n\
     What to Bring:\n\
     - Growth charts and measurements\n\
     - Photos of skin/nail conditions\n\
     - Food diary (if available)\n\
     - Family medical history\n\n\
     Remember: Early intervention is key to preventing long-term health issues!"
        .to_string()
}

fn nutrition_response() -> String {
    "General Nutrition Guidelines for Children:\n\n\
     Essential Nutrients:\n\
     - Protein: Building blocks for growth (meat, fish, eggs, legumes)\n\
     - Carbohydrates: Energy source (whole grains, fruits, vegetables)\n\
     - Healthy Fats: Brain development (nuts, avocados, olive oil)\n\
     - Vitamins & Minerals: Overall health (colorful fruits and vegetables)\n\n\
     Daily Recommendations:\n\
     - 5+ servings of fruits and vegetables\n\
     - 3 servings of protein-rich foods\n\
     - 6-8 glasses of water\n\
     - Limit processed foods and sugary drinks\n\n\
     Growth Monitoring:\n\
     - Regular height and weight measurements\n\
     - Track growth patterns over time\n\
     - Consult growth charts for age and gender"
        .to_string()
}

/// Fixed fallback for unrecognized messages.
fn default_response() -> String {
    "I can help explain the report, BMI measurements, risk levels, or provide \
     recommendations. What would you like to know?"
        .to_string()
}
