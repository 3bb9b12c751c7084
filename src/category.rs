//! BMI Categorizer
//!
//! Coarse BMI classification from growth percentiles, with adult BMI
//! thresholds as the terminal safety net when the percentile estimator
//! rejects its input. Never fails.

use serde::{Deserialize, Serialize};

use crate::percentile::estimate_bmi_percentile;
use crate::reference::GrowthReference;

/// Coarse BMI classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

impl BmiCategory {
    pub fn display_text(&self) -> &'static str {
        match self {
            BmiCategory::Underweight => "Underweight",
            BmiCategory::Normal => "Normal",
            BmiCategory::Overweight => "Overweight",
            BmiCategory::Obese => "Obese",
        }
    }
}

/// Categorize BMI against child/adolescent percentile thresholds:
/// <5th Underweight, 5th-<85th Normal, 85th-<97th Overweight, else Obese.
///
/// If the estimator rejects the input (bad gender, age outside the table),
/// falls back to adult thresholds instead of propagating the error.
pub fn categorize_bmi(
    reference: &GrowthReference,
    bmi: f64,
    age_years: f64,
    gender: &str,
) -> BmiCategory {
    match estimate_bmi_percentile(reference, age_years, bmi, gender) {
        Ok(result) => {
            if result.percentile < 5.0 {
                BmiCategory::Underweight
            } else if result.percentile < 85.0 {
                BmiCategory::Normal
            } else if result.percentile < 97.0 {
                BmiCategory::Overweight
            } else {
                BmiCategory::Obese
            }
        }
        Err(_) => adult_category(bmi),
    }
}

/// Adult BMI thresholds: <18.5 / <25 / <30.
fn adult_category(bmi: f64) -> BmiCategory {
    if bmi < 18.5 {
        BmiCategory::Underweight
    } else if bmi < 25.0 {
        BmiCategory::Normal
    } else if bmi < 30.0 {
        BmiCategory::Overweight
    } else {
        BmiCategory::Obese
    }
}
