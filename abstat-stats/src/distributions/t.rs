//! Student's t distribution functions
//!
//! Degrees of freedom may be fractional; Welch–Satterthwaite produces them.

use super::special::regularized_incomplete_beta;
use crate::helpers::{number_arg, require_finite};
use abstat_core::InputError;
use abstat_plugin::prelude::*;

// ============ T CDF ============

pub struct TCdf;

static T_CDF_ARGS: [ArgMeta; 2] = [
    ArgMeta::required("t", "Number", "Value"),
    ArgMeta::required("df", "Number", "Degrees of freedom (must be > 0, may be fractional)"),
];

static T_CDF_EXAMPLES: [&str; 2] = ["t_cdf(t: 0, df: 10) → 0.5", "t_cdf(t: 2.228, df: 10) → 0.975..."];

static T_CDF_RELATED: [&str; 2] = ["t_inv", "snorm_cdf"];

impl CalculatorPlugin for TCdf {
    fn meta(&self) -> FunctionMeta {
        FunctionMeta {
            name: "t_cdf",
            description: "Student's t distribution CDF",
            usage: "t_cdf(t, df)",
            args: &T_CDF_ARGS,
            returns: "Number",
            examples: &T_CDF_EXAMPLES,
            category: "stats/distribution",
            related: &T_CDF_RELATED,
        }
    }

    fn call(&self, args: &JsonValue, _ctx: &CalcContext) -> Result<JsonValue, AbError> {
        let t = require_finite(number_arg(args, "t", "t_cdf")?, "t")?;
        let df = number_arg(args, "df", "t_cdf")?;
        Ok(json!(student_t_cdf(t, df)?))
    }
}

fn require_df(df: f64) -> Result<f64, InputError> {
    if df > 0.0 && !df.is_nan() {
        Ok(df)
    } else {
        Err(InputError::NonPositiveDegreesOfFreedom { field: "df", value: df })
    }
}

/// P(T ≤ t) for T ~ t(df)
pub fn student_t_cdf(t: f64, df: f64) -> Result<f64, InputError> {
    let df = require_df(df)?;
    if t.is_nan() {
        return Ok(f64::NAN);
    }
    let tail = 0.5 * two_tailed(t, df);
    Ok(if t >= 0.0 { 1.0 - tail } else { tail })
}

/// Two-tailed tail probability P(|T| ≥ |t|)
pub fn student_t_two_tailed(t: f64, df: f64) -> Result<f64, InputError> {
    let df = require_df(df)?;
    Ok(two_tailed(t, df))
}

/// I_{df/(df+t²)}(df/2, 1/2); small for large |t| without cancellation
fn two_tailed(t: f64, df: f64) -> f64 {
    if t.is_infinite() {
        return 0.0;
    }
    let x = df / (df + t * t);
    regularized_incomplete_beta(df / 2.0, 0.5, x).clamp(0.0, 1.0)
}

// ============ T Inverse ============

pub struct TInv;

static T_INV_ARGS: [ArgMeta; 2] = [
    ArgMeta::required("p", "Number", "Probability (0 < p < 1)"),
    ArgMeta::required("df", "Number", "Degrees of freedom (must be > 0, may be fractional)"),
];

static T_INV_EXAMPLES: [&str; 1] = ["t_inv(p: 0.975, df: 10) → 2.228..."];

static T_INV_RELATED: [&str; 2] = ["t_cdf", "snorm_inv"];

impl CalculatorPlugin for TInv {
    fn meta(&self) -> FunctionMeta {
        FunctionMeta {
            name: "t_inv",
            description: "Student's t distribution inverse (quantile)",
            usage: "t_inv(p, df)",
            args: &T_INV_ARGS,
            returns: "Number",
            examples: &T_INV_EXAMPLES,
            category: "stats/distribution",
            related: &T_INV_RELATED,
        }
    }

    fn call(&self, args: &JsonValue, _ctx: &CalcContext) -> Result<JsonValue, AbError> {
        let p = number_arg(args, "p", "t_inv")?;
        let df = number_arg(args, "df", "t_inv")?;
        Ok(json!(student_t_inverse_cdf(p, df)?))
    }
}

/// Quantile of t(df).
///
/// Solves on the upper tail by bracketing then bisection, which stays
/// monotone for any df > 0 where Newton steps from a normal start can
/// overshoot at small df.
pub fn student_t_inverse_cdf(p: f64, df: f64) -> Result<f64, InputError> {
    if !(p > 0.0 && p < 1.0) {
        return Err(InputError::ProbabilityOutOfRange { field: "p", value: p });
    }
    let df = require_df(df)?;
    if p == 0.5 {
        return Ok(0.0);
    }

    let upper = p > 0.5;
    let target = 2.0 * if upper { 1.0 - p } else { p };

    // two_tailed is decreasing in t on [0, ∞)
    let mut lo = 0.0;
    let mut hi = 1.0;
    while two_tailed(hi, df) > target && hi < 1e300 {
        lo = hi;
        hi *= 2.0;
    }

    for _ in 0..300 {
        let mid = 0.5 * (lo + hi);
        if two_tailed(mid, df) > target {
            lo = mid;
        } else {
            hi = mid;
        }
        if hi - lo <= 1e-14 * hi {
            break;
        }
    }

    let t = 0.5 * (lo + hi);
    Ok(if upper { t } else { -t })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval_ctx() -> CalcContext {
        CalcContext::new()
    }

    #[test]
    fn test_t_cdf_zero() {
        let result = TCdf.call(&json!({"t": 0, "df": 10}), &eval_ctx()).unwrap();
        let f = result.as_f64().unwrap();
        assert!((f - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_t_cdf_known_values() {
        // Two-tailed 5% critical value for df = 10
        let p = student_t_two_tailed(2.228_138_851_986_274, 10.0).unwrap();
        assert!((p - 0.05).abs() < 1e-12);
        let upper = 1.0 - student_t_cdf(2.0, 10.0).unwrap();
        assert!((upper - 0.036_694_017_385_370_26).abs() < 1e-10);
    }

    #[test]
    fn test_fractional_df() {
        let c = student_t_cdf(1.5, 2.5).unwrap();
        assert!((c - 0.876_081_773_456_852).abs() < 1e-9);
        let lower = student_t_cdf(-1.5, 2.5).unwrap();
        assert!((c + lower - 1.0).abs() < 1e-14);
    }

    #[test]
    fn test_t_cdf_rejects_bad_df() {
        assert!(student_t_cdf(1.0, 0.0).is_err());
        assert!(student_t_cdf(1.0, -3.0).is_err());
        let err = TCdf.call(&json!({"t": 1.0, "df": 0}), &eval_ctx()).unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn test_t_inv_known_values() {
        let t = student_t_inverse_cdf(0.975, 10.0).unwrap();
        assert!((t - 2.228_138_851_986_274).abs() < 1e-9);
        let t = student_t_inverse_cdf(0.025, 10.0).unwrap();
        assert!((t + 2.228_138_851_986_274).abs() < 1e-9);
        assert_eq!(student_t_inverse_cdf(0.5, 3.3).unwrap(), 0.0);
    }

    #[test]
    fn test_t_inv_roundtrip_fractional_df() {
        for &df in &[0.7, 2.5, 55.33, 400.0] {
            for &p in &[0.001, 0.2, 0.9, 0.995] {
                let t = student_t_inverse_cdf(p, df).unwrap();
                let back = student_t_cdf(t, df).unwrap();
                assert!((back - p).abs() < 1e-9, "df = {}, p = {}", df, p);
            }
        }
    }

    #[test]
    fn test_t_approaches_normal() {
        let t = student_t_inverse_cdf(0.975, 1e6).unwrap();
        assert!((t - 1.959_963_984_540_054).abs() < 1e-4);
    }
}
