//! Statistics Helpers
//!
//! Closed-form standard-normal quantile used to derive z-scores from
//! percentiles. Deterministic by construction; no sampling.

/// Quantile arguments are clamped away from 0 and 1 so degenerate
/// percentiles map to a large but finite z-score (|z| ~ 4.75).
const QUANTILE_EPSILON: f64 = 1e-6;

/// Standard-normal inverse CDF via Acklam's rational approximation.
///
/// Relative error below 1.15e-9 over the full open interval. Input outside
/// (0, 1) is clamped to the working interval rather than returned as ±inf.
pub fn inverse_normal_cdf(p: f64) -> f64 {
    const A: [f64; 6] = [
        -3.969683028665376e+01,
        2.209460984245205e+02,
        -2.759285104469687e+02,
        1.383577518672690e+02,
        -3.066479806614716e+01,
        2.506628277459239e+00,
    ];
    const B: [f64; 5] = [
        -5.447609879822406e+01,
        1.615858368580409e+02,
        -1.556989798598866e+02,
        6.680131188771972e+01,
        -1.328068155288572e+01,
    ];
    const C: [f64; 6] = [
        -7.784894002430293e-03,
        -3.223964580411365e-01,
        -2.400758277161838e+00,
        -2.549732539343734e+00,
        4.374664141464968e+00,
        2.938163982698783e+00,
    ];
    const D: [f64; 4] = [
        7.784695709041462e-03,
        3.224671290700398e-01,
        2.445134137142996e+00,
        3.754408661907416e+00,
    ];
    const P_LOW: f64 = 0.02425;
    const P_HIGH: f64 = 1.0 - P_LOW;

    let p = p.clamp(QUANTILE_EPSILON, 1.0 - QUANTILE_EPSILON);

    if p < P_LOW {
        // Lower tail
        let q = libm::sqrt(-2.0 * libm::log(p));
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    } else if p <= P_HIGH {
        // Central region
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        // Upper tail (by symmetry)
        let q = libm::sqrt(-2.0 * libm::log(1.0 - p));
        -(((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    }
}

/// Derive a z-score from a growth percentile (0-100 scale).
///
/// Percentiles at or below the median map to a negative z of magnitude
/// |inverse_cdf(p/100)|; above the median, positive of magnitude
/// |inverse_cdf(1 - p/100)|.
pub fn z_score_from_percentile(percentile: f64) -> f64 {
    if percentile <= 50.0 {
        -inverse_normal_cdf(percentile / 100.0).abs()
    } else {
        inverse_normal_cdf(1.0 - percentile / 100.0).abs()
    }
}
