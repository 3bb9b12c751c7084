//! BMI-for-Age Percentile / Z-Score Estimator
//!
//! Maps (age, BMI, gender) to a continuous percentile against the growth
//! reference curves, plus a z-score derived through the standard-normal
//! quantile. Percentile transformation mirrors the reference table's band
//! structure:
//!
//! 1. Locate the age knot nearest the child's age (no cross-age interpolation)
//! 2. Below the 3rd band: linear scaling down toward zero
//! 3. Above the 97th band: unbounded linear extrapolation (may exceed 100)
//! 4. Otherwise: linear interpolation between the bracketing bands

use serde::Serialize;
use thiserror::Error;

use crate::reference::{Gender, GrowthReference, MAX_AGE_YEARS, MIN_AGE_YEARS, PERCENTILE_BANDS};
use crate::stats::z_score_from_percentile;

/// Input contract violation for the estimator.
///
/// Callers that must never fail (the categorizer, the engine) catch this and
/// fall back to adult BMI thresholds.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EstimateError {
    #[error("gender must be 'male' or 'female', got '{0}'")]
    InvalidGender(String),
    #[error("age must be between {MIN_AGE_YEARS} and {MAX_AGE_YEARS} years, got {0}")]
    AgeOutOfRange(f64),
    #[error("bmi must be positive, got {0}")]
    NonPositiveBmi(f64),
}

/// Continuous percentile and derived z-score for one measurement.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PercentileResult {
    /// Growth percentile. Practically 0-100, but the extrapolation rule above
    /// the 97th band is unbounded and can exceed 100 for extreme inputs.
    pub percentile: f64,
    /// Signed standard deviations from the reference median.
    pub z_score: f64,
}

/// Estimate BMI-for-age percentile and z-score.
pub fn estimate_bmi_percentile(
    reference: &GrowthReference,
    age_years: f64,
    bmi: f64,
    gender: &str,
) -> Result<PercentileResult, EstimateError> {
    let gender =
        Gender::parse(gender).ok_or_else(|| EstimateError::InvalidGender(gender.to_string()))?;
    if !(MIN_AGE_YEARS..=MAX_AGE_YEARS).contains(&age_years) {
        return Err(EstimateError::AgeOutOfRange(age_years));
    }
    if !(bmi > 0.0) {
        return Err(EstimateError::NonPositiveBmi(bmi));
    }

    let curve = reference.curve(gender);
    let knot = curve.nearest_knot(age_years);
    let thresholds = curve.band_thresholds(knot);

    let percentile = interpolate_percentile(bmi, &thresholds);
    let z_score = z_score_from_percentile(percentile);

    Ok(PercentileResult {
        percentile,
        z_score,
    })
}

/// Band interpolation over one age knot's thresholds.
fn interpolate_percentile(bmi: f64, thresholds: &[f64; 9]) -> f64 {
    let lowest = thresholds[0];
    let highest = thresholds[8];

    if bmi <= lowest {
        // Scales linearly down from the lowest band: 3 at the band edge,
        // approaching 0 as bmi approaches 0.
        return PERCENTILE_BANDS[0] * (bmi / lowest);
    }
    if bmi >= highest {
        // Unbounded extrapolation above the top band; not clamped.
        return PERCENTILE_BANDS[8] + 3.0 * (bmi - highest) / highest;
    }

    for i in 0..thresholds.len() - 1 {
        if thresholds[i] <= bmi && bmi <= thresholds[i + 1] {
            let width = thresholds[i + 1] - thresholds[i];
            let fraction = if width > 0.0 {
                (bmi - thresholds[i]) / width
            } else {
                0.0
            };
            return PERCENTILE_BANDS[i] + fraction * (PERCENTILE_BANDS[i + 1] - PERCENTILE_BANDS[i]);
        }
    }

    // Unreachable given the edge checks above; default to the median.
    50.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::GrowthReference;
    use approx::assert_relative_eq;

    fn reference() -> GrowthReference {
        GrowthReference::bundled().unwrap()
    }

    #[test]
    fn test_rejects_bad_gender() {
        let err = estimate_bmi_percentile(&reference(), 8.0, 16.0, "unknown").unwrap_err();
        assert!(matches!(err, EstimateError::InvalidGender(_)));
    }

    #[test]
    fn test_rejects_age_out_of_range() {
        let reference = reference();
        assert!(matches!(
            estimate_bmi_percentile(&reference, 1.5, 16.0, "male"),
            Err(EstimateError::AgeOutOfRange(_))
        ));
        assert!(matches!(
            estimate_bmi_percentile(&reference, 19.5, 16.0, "female"),
            Err(EstimateError::AgeOutOfRange(_))
        ));
        // Boundary ages are valid
        assert!(estimate_bmi_percentile(&reference, 2.0, 16.0, "male").is_ok());
        assert!(estimate_bmi_percentile(&reference, 19.0, 16.0, "male").is_ok());
    }

    #[test]
    fn test_below_lowest_band_scales_to_zero() {
        let reference = reference();
        // Male, age 8: p3 threshold is 13.4
        let result = estimate_bmi_percentile(&reference, 8.0, 13.4, "male").unwrap();
        assert_relative_eq!(result.percentile, 3.0, epsilon = 1e-9);

        let result = estimate_bmi_percentile(&reference, 8.0, 6.7, "male").unwrap();
        assert_relative_eq!(result.percentile, 1.5, epsilon = 1e-9);
        assert!(result.z_score < -2.0);
    }

    #[test]
    fn test_above_top_band_extrapolates_unbounded() {
        let reference = reference();
        // Male, age 8: p97 threshold is 19.1
        let result = estimate_bmi_percentile(&reference, 8.0, 19.1, "male").unwrap();
        assert_relative_eq!(result.percentile, 97.0, epsilon = 1e-9);

        // Extreme BMI pushes the percentile past 100 (documented behavior)
        let result = estimate_bmi_percentile(&reference, 8.0, 45.0, "male").unwrap();
        assert!(result.percentile > 100.0);
        assert!(result.z_score.is_finite());
    }

    #[test]
    fn test_midband_interpolation() {
        let reference = reference();
        // Male, age 8: p50 = 15.8, p75 = 16.6; 16.5 lands at 50 + 25 * (0.7/0.8)
        let result = estimate_bmi_percentile(&reference, 8.0, 16.5, "male").unwrap();
        assert_relative_eq!(result.percentile, 71.875, epsilon = 1e-9);
        assert!(result.z_score > 0.0);

        // Exactly at the median band
        let result = estimate_bmi_percentile(&reference, 8.0, 15.8, "male").unwrap();
        assert_relative_eq!(result.percentile, 50.0, epsilon = 1e-9);
        assert!(result.z_score.abs() < 1e-9);
    }

    #[test]
    fn test_percentile_monotonic_in_bmi() {
        let reference = reference();
        let ages = [2.0, 4.7, 8.0, 11.3, 15.0, 19.0];
        for gender in ["male", "female"] {
            for &age in &ages {
                let mut previous = f64::NEG_INFINITY;
                let mut bmi = 5.0;
                while bmi < 40.0 {
                    let result = estimate_bmi_percentile(&reference, age, bmi, gender).unwrap();
                    assert!(
                        result.percentile >= previous,
                        "percentile decreased at age={} gender={} bmi={}",
                        age,
                        gender,
                        bmi
                    );
                    previous = result.percentile;
                    bmi += 0.05;
                }
            }
        }
    }
}
