//! Growth Reference Data
//!
//! BMI-for-age reference curves for children and adolescents (2-19 years),
//! per gender, at nine standard percentile bands. The table is bundled with
//! the crate as JSON and loaded once; it is immutable after validation.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// The nine percentile bands the reference table is sampled at.
pub const PERCENTILE_BANDS: [f64; 9] = [3.0, 5.0, 10.0, 25.0, 50.0, 75.0, 90.0, 95.0, 97.0];

/// Age range covered by the reference table, in years.
pub const MIN_AGE_YEARS: f64 = 2.0;
pub const MAX_AGE_YEARS: f64 = 19.0;

/// Patient gender. Reference curves are gender-stratified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// Parse from user-facing text, case-insensitively.
    /// Anything other than "male"/"female" is a contract violation.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" => Some(Gender::Male),
            "female" => Some(Gender::Female),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

/// One gender's reference curve: age knots plus nine parallel threshold rows.
#[derive(Debug, Clone, Deserialize)]
pub struct GrowthCurve {
    /// Age knots in years, ascending.
    pub ages: Vec<f64>,
    p3: Vec<f64>,
    p5: Vec<f64>,
    p10: Vec<f64>,
    p25: Vec<f64>,
    p50: Vec<f64>,
    p75: Vec<f64>,
    p90: Vec<f64>,
    p95: Vec<f64>,
    p97: Vec<f64>,
}

impl GrowthCurve {
    /// Index of the age knot nearest to `age_years`.
    ///
    /// Nearest-neighbor on age, not interpolated across knots: the table's
    /// one-year resolution is treated as the resolution of the estimate.
    pub fn nearest_knot(&self, age_years: f64) -> usize {
        let mut best = 0;
        let mut best_dist = f64::INFINITY;
        for (idx, knot) in self.ages.iter().enumerate() {
            let dist = (knot - age_years).abs();
            if dist < best_dist {
                best_dist = dist;
                best = idx;
            }
        }
        best
    }

    /// The nine band thresholds at one age knot, ascending by band.
    pub fn band_thresholds(&self, knot: usize) -> [f64; 9] {
        [
            self.p3[knot],
            self.p5[knot],
            self.p10[knot],
            self.p25[knot],
            self.p50[knot],
            self.p75[knot],
            self.p90[knot],
            self.p95[knot],
            self.p97[knot],
        ]
    }

    fn validate(&self, label: &str) -> Result<()> {
        if self.ages.is_empty() {
            bail!("{} curve has no age knots", label);
        }
        let n = self.ages.len();
        for (name, row) in [
            ("p3", &self.p3),
            ("p5", &self.p5),
            ("p10", &self.p10),
            ("p25", &self.p25),
            ("p50", &self.p50),
            ("p75", &self.p75),
            ("p90", &self.p90),
            ("p95", &self.p95),
            ("p97", &self.p97),
        ] {
            if row.len() != n {
                bail!(
                    "{} curve: band {} has {} values for {} age knots",
                    label,
                    name,
                    row.len(),
                    n
                );
            }
        }
        // Thresholds must ascend across bands at every knot.
        for knot in 0..n {
            let thresholds = self.band_thresholds(knot);
            for pair in thresholds.windows(2) {
                if pair[0] > pair[1] {
                    bail!(
                        "{} curve: bands not monotonic at age {} ({} > {})",
                        label,
                        self.ages[knot],
                        pair[0],
                        pair[1]
                    );
                }
            }
        }
        Ok(())
    }
}

/// Full reference table: one curve per gender.
#[derive(Debug, Clone, Deserialize)]
pub struct GrowthReference {
    male: GrowthCurve,
    female: GrowthCurve,
}

/// BMI-for-age reference table bundled with the crate (simplified WHO data;
/// swap in the complete WHO growth reference for production use).
const BUNDLED_REFERENCE: &str = include_str!("../data/growth_reference.json");

impl GrowthReference {
    /// Load the bundled reference table.
    pub fn bundled() -> Result<Self> {
        Self::from_json(BUNDLED_REFERENCE).context("Failed to load bundled growth reference")
    }

    /// Parse and validate a reference table from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let reference: GrowthReference =
            serde_json::from_str(json).context("Failed to parse growth reference JSON")?;
        reference.male.validate("male")?;
        reference.female.validate("female")?;
        Ok(reference)
    }

    pub fn curve(&self, gender: Gender) -> &GrowthCurve {
        match gender {
            Gender::Male => &self.male,
            Gender::Female => &self.female,
        }
    }
}
