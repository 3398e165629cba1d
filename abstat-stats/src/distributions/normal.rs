//! Normal distribution functions

use super::special::erfc;
use crate::helpers::{number_arg, require_finite};
use abstat_core::InputError;
use abstat_plugin::prelude::*;

// ============ Standard Normal CDF ============

pub struct SnormCdf;

static SNORM_CDF_ARGS: [ArgMeta; 1] = [ArgMeta::required("z", "Number", "Standard score")];

static SNORM_CDF_EXAMPLES: [&str; 2] = ["snorm_cdf(z: 0) → 0.5", "snorm_cdf(z: 1.96) → 0.975..."];

static SNORM_CDF_RELATED: [&str; 2] = ["snorm_inv", "t_cdf"];

impl CalculatorPlugin for SnormCdf {
    fn meta(&self) -> FunctionMeta {
        FunctionMeta {
            name: "snorm_cdf",
            description: "Standard normal CDF P(Z ≤ z)",
            usage: "snorm_cdf(z)",
            args: &SNORM_CDF_ARGS,
            returns: "Number",
            examples: &SNORM_CDF_EXAMPLES,
            category: "stats/distribution",
            related: &SNORM_CDF_RELATED,
        }
    }

    fn call(&self, args: &JsonValue, _ctx: &CalcContext) -> Result<JsonValue, AbError> {
        let z = number_arg(args, "z", "snorm_cdf")?;
        let z = require_finite(z, "z")?;
        Ok(json!(normal_cdf(z)))
    }
}

/// Standard normal CDF Φ(z) = ½·erfc(−z/√2)
///
/// Absolute error stays below 1e-15 over |z| ≤ 10 and the lower tail keeps
/// its relative precision, so values such as Φ(−8) ≈ 6.2e-16 are not
/// flushed to zero.
pub fn normal_cdf(z: f64) -> f64 {
    if z.is_nan() {
        return f64::NAN;
    }
    0.5 * erfc(-z / std::f64::consts::SQRT_2)
}

/// Survival function 1 − Φ(z), computed without cancellation
pub fn normal_sf(z: f64) -> f64 {
    if z.is_nan() {
        return f64::NAN;
    }
    0.5 * erfc(z / std::f64::consts::SQRT_2)
}

/// Two-tailed p-value for a standard normal statistic: 2·(1 − Φ(|z|))
pub fn normal_two_tailed(z: f64) -> f64 {
    (2.0 * normal_sf(z.abs())).min(1.0)
}

// ============ Standard Normal Inverse ============

pub struct SnormInv;

static SNORM_INV_ARGS: [ArgMeta; 1] = [ArgMeta::required("p", "Number", "Probability (0 < p < 1)")];

static SNORM_INV_EXAMPLES: [&str; 2] = ["snorm_inv(p: 0.975) → 1.959964...", "snorm_inv(p: 0.8) → 0.841621..."];

static SNORM_INV_RELATED: [&str; 2] = ["snorm_cdf", "t_inv"];

impl CalculatorPlugin for SnormInv {
    fn meta(&self) -> FunctionMeta {
        FunctionMeta {
            name: "snorm_inv",
            description: "Standard normal inverse (quantile function)",
            usage: "snorm_inv(p)",
            args: &SNORM_INV_ARGS,
            returns: "Number",
            examples: &SNORM_INV_EXAMPLES,
            category: "stats/distribution",
            related: &SNORM_INV_RELATED,
        }
    }

    fn call(&self, args: &JsonValue, _ctx: &CalcContext) -> Result<JsonValue, AbError> {
        let p = number_arg(args, "p", "snorm_inv")?;
        Ok(json!(normal_inverse_cdf(p, "p")?))
    }
}

/// Standard normal quantile Φ⁻¹(p).
///
/// Acklam's rational approximation (relative error 1.15e-9) refined by one
/// Halley step against [`normal_cdf`]. `field` names the argument in the
/// error when `p ∉ (0, 1)`.
pub fn normal_inverse_cdf(p: f64, field: &'static str) -> Result<f64, InputError> {
    if !(p > 0.0 && p < 1.0) {
        return Err(InputError::ProbabilityOutOfRange { field, value: p });
    }

    const A: [f64; 6] = [
        -3.969683028665376e1,
        2.209460984245205e2,
        -2.759285104469687e2,
        1.383577518672690e2,
        -3.066479806614716e1,
        2.506628277459239e0,
    ];
    const B: [f64; 5] = [
        -5.447609879822406e1,
        1.615858368580409e2,
        -1.556989798598866e2,
        6.680131188771972e1,
        -1.328068155288572e1,
    ];
    const C: [f64; 6] = [
        -7.784894002430293e-3,
        -3.223964580411365e-1,
        -2.400758277161838e0,
        -2.549732539343734e0,
        4.374664141464968e0,
        2.938163982698783e0,
    ];
    const D: [f64; 4] = [
        7.784695709041462e-3,
        3.224671290700398e-1,
        2.445134137142996e0,
        3.754408661907416e0,
    ];

    let p_low = 0.02425;
    let p_high = 1.0 - p_low;

    let tail = |q: f64| {
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    };

    let x = if p < p_low {
        tail((-2.0 * p.ln()).sqrt())
    } else if p <= p_high {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        -tail((-2.0 * (1.0 - p).ln()).sqrt())
    };

    // Halley refinement
    let e = normal_cdf(x) - p;
    let u = e * (2.0 * std::f64::consts::PI).sqrt() * (x * x / 2.0).exp();
    Ok(x - u / (1.0 + x * u / 2.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval_ctx() -> CalcContext {
        CalcContext::new()
    }

    #[test]
    fn test_snorm_cdf_zero() {
        let result = SnormCdf.call(&json!({"z": 0}), &eval_ctx()).unwrap();
        let f = result.as_f64().unwrap();
        assert!((f - 0.5).abs() < 1e-15);
    }

    #[test]
    fn test_normal_cdf_known_values() {
        assert!((normal_cdf(1.959963984540054) - 0.975).abs() < 1e-12);
        assert!((normal_cdf(-1.0) - 0.158_655_253_931_457_05).abs() < 1e-12);
        assert!((normal_cdf(3.0) - 0.998_650_101_968_369_9).abs() < 1e-12);
    }

    #[test]
    fn test_normal_cdf_lower_tail_not_flushed() {
        let v = normal_cdf(-8.0);
        assert!(v > 0.0);
        assert!(((v - 6.220_960_574_271_78e-16) / 6.220_960_574_271_78e-16).abs() < 1e-8);
        assert_eq!(normal_sf(8.0), v);
    }

    #[test]
    fn test_two_tailed_at_critical_value() {
        assert!((normal_two_tailed(1.959963984540054) - 0.05).abs() < 1e-12);
        assert!((normal_two_tailed(-1.959963984540054) - 0.05).abs() < 1e-12);
        assert_eq!(normal_two_tailed(0.0), 1.0);
    }

    #[test]
    fn test_snorm_inv_half() {
        let result = SnormInv.call(&json!({"p": 0.5}), &eval_ctx()).unwrap();
        assert!(result.as_f64().unwrap().abs() < 1e-12);
    }

    #[test]
    fn test_inverse_known_values() {
        assert!((normal_inverse_cdf(0.975, "p").unwrap() - 1.959_963_984_540_054).abs() < 1e-12);
        assert!((normal_inverse_cdf(0.8, "p").unwrap() - 0.841_621_233_572_914_3).abs() < 1e-12);
        assert!((normal_inverse_cdf(0.01, "p").unwrap() + 2.326_347_874_040_841).abs() < 1e-10);
    }

    #[test]
    fn test_inverse_roundtrip() {
        for &p in &[1e-10, 0.001, 0.02, 0.3, 0.5, 0.77, 0.99, 0.999999] {
            let z = normal_inverse_cdf(p, "p").unwrap();
            assert!(((normal_cdf(z) - p) / p).abs() < 1e-9, "p = {}", p);
        }
    }

    #[test]
    fn test_inverse_rejects_out_of_range() {
        for &p in &[0.0, 1.0, -0.2, 1.5, f64::NAN] {
            assert!(normal_inverse_cdf(p, "p").is_err());
        }
        let err = SnormInv.call(&json!({"p": 1.0}), &eval_ctx()).unwrap_err();
        assert!(err.is_invalid_input());
    }
}
