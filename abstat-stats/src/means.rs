//! Two-sample tests on continuous metrics: Welch's t, Mann-Whitney U,
//! and the z-test with known population standard deviations

use crate::distributions::normal::{normal_inverse_cdf, normal_two_tailed};
use crate::distributions::t::{student_t_inverse_cdf, student_t_two_tailed};
use crate::helpers::{
    mean, optional_number_arg, optional_typed_arg, ranks, require_finite, require_min_count,
    require_open_unit, to_json, typed_arg,
};
use crate::interpret::{classify, Verdict};
use abstat_plugin::prelude::*;

// ============ Mean Test ============

pub struct MeanTest;

static MEAN_TEST_ARGS: [ArgMeta; 5] = [
    ArgMeta::required("control", "GroupSummary", "Control arm: {sampleSize, mean, stdDev}"),
    ArgMeta::required("variant", "GroupSummary", "Variant arm: {sampleSize, mean, stdDev}"),
    ArgMeta::optional("alpha", "Number", "Significance level (0 < α < 1)", "0.05"),
    ArgMeta::optional("method", "Text", "welch | mann_whitney | z_test", "welch"),
    ArgMeta::optional("rawSamples", "RawSamples", "{control: [..], variant: [..]}; required by mann_whitney", "null"),
];

static MEAN_TEST_EXAMPLES: [&str; 2] = [
    "mean_test(control: {sampleSize: 30, mean: 10, stdDev: 2}, variant: {sampleSize: 30, mean: 11, stdDev: 2.5}) → t ≈ 1.711",
    "mean_test(method: \"mann_whitney\", rawSamples: {control: [1,2,3,4,5], variant: [6,7,8,9,10]}) → U = 25",
];

static MEAN_TEST_RELATED: [&str; 2] = ["plan_mean", "proportion_test"];

impl CalculatorPlugin for MeanTest {
    fn meta(&self) -> FunctionMeta {
        FunctionMeta {
            name: "mean_test",
            description: "Compare a continuous metric between two arms",
            usage: "mean_test(control, variant, alpha?, method?, rawSamples?)",
            args: &MEAN_TEST_ARGS,
            returns: "TestResult",
            examples: &MEAN_TEST_EXAMPLES,
            category: "abtest/significance",
            related: &MEAN_TEST_RELATED,
        }
    }

    fn call(&self, args: &JsonValue, ctx: &CalcContext) -> Result<JsonValue, AbError> {
        let method: MeanTestMethod = optional_typed_arg(args, "method", "mean_test")?.unwrap_or_default();
        let raw: Option<RawSamples> = optional_typed_arg(args, "rawSamples", "mean_test")?;
        let alpha = optional_number_arg(args, "alpha", "mean_test")?.unwrap_or(ctx.default_alpha);

        // Rank tests work from the raw samples alone
        let (control, variant): (GroupSummary, GroupSummary) = match method {
            MeanTestMethod::MannWhitney => (
                optional_typed_arg(args, "control", "mean_test")?.unwrap_or_default(),
                optional_typed_arg(args, "variant", "mean_test")?.unwrap_or_default(),
            ),
            _ => (
                typed_arg(args, "control", "mean_test")?,
                typed_arg(args, "variant", "mean_test")?,
            ),
        };

        let result = compute_mean_test(&control, &variant, alpha, method, raw.as_ref())?;
        to_json(&result)
    }
}

/// Compare a continuous metric between control and variant.
///
/// Statistics are oriented as variant minus control. Mann-Whitney needs
/// `raw`; the other methods read the group summaries and ignore it.
pub fn compute_mean_test(
    control: &GroupSummary,
    variant: &GroupSummary,
    alpha: f64,
    method: MeanTestMethod,
    raw: Option<&RawSamples>,
) -> Result<TestResult, AbError> {
    let alpha = require_open_unit(alpha, "alpha")?;
    match method {
        MeanTestMethod::Welch => welch_t_test(control, variant, alpha),
        MeanTestMethod::ZTest => z_test(control, variant, alpha),
        MeanTestMethod::MannWhitney => {
            let raw = raw.ok_or(InputError::MissingRawSamples)?;
            mann_whitney_u_test(&raw.control, &raw.variant, alpha)
        }
    }
}

/// Summary moments of one arm after validation
struct Moments {
    n: f64,
    mean: f64,
    std_dev: f64,
}

fn moments(
    group: &GroupSummary,
    min_n: u64,
    field: &'static str,
    mean_field: &'static str,
    sd_field: &'static str,
) -> Result<Moments, InputError> {
    require_min_count(group.sample_size, min_n, field)?;
    let mean = group.mean.ok_or(InputError::MissingField { field: mean_field })?;
    let mean = require_finite(mean, mean_field)?;
    let std_dev = group.std_dev.ok_or(InputError::MissingField { field: sd_field })?;
    let std_dev = require_finite(std_dev, sd_field)?;
    if std_dev < 0.0 {
        return Err(InputError::NegativeStdDev { field: sd_field, value: std_dev });
    }
    Ok(Moments {
        n: group.sample_size as f64,
        mean,
        std_dev,
    })
}

fn control_moments(group: &GroupSummary, min_n: u64) -> Result<Moments, InputError> {
    moments(group, min_n, "control", "control.mean", "control.stdDev")
}

fn variant_moments(group: &GroupSummary, min_n: u64) -> Result<Moments, InputError> {
    moments(group, min_n, "variant", "variant.mean", "variant.stdDev")
}

fn relative_effect(diff: f64, base: f64) -> Option<f64> {
    if base != 0.0 {
        Some(diff / base)
    } else {
        None
    }
}

/// Shared shape of a mean-comparison result
struct Outcome {
    method: MeanTestMethod,
    statistic: f64,
    p_value: f64,
    confidence_interval: Option<(f64, f64)>,
    degrees_of_freedom: Option<f64>,
    u_statistic: Option<f64>,
}

/// Assemble the result record. The verdict is always taken from the
/// reported `effect_absolute`; `alpha = None` marks a degenerate outcome.
fn finish(outcome: Outcome, mean_control: f64, mean_variant: f64, alpha: Option<f64>) -> TestResult {
    let effect_absolute = mean_variant - mean_control;
    let verdict = match alpha {
        Some(alpha) => classify(outcome.p_value, alpha, effect_absolute),
        None => Verdict::inconclusive(),
    };
    TestResult {
        method: outcome.method.into(),
        statistic: outcome.statistic,
        p_value: outcome.p_value,
        effect_absolute,
        effect_relative: relative_effect(effect_absolute, mean_control),
        confidence_interval: outcome.confidence_interval,
        is_significant: verdict.is_significant,
        interpretation: verdict.category,
        degrees_of_freedom: outcome.degrees_of_freedom,
        u_statistic: outcome.u_statistic,
        rates: None,
    }
}

/// Welch's unequal-variance t-test from summary statistics.
///
/// Degrees of freedom follow Welch–Satterthwaite and are usually
/// fractional. Zero standard error (both standard deviations zero) yields
/// an inconclusive result.
pub fn welch_t_test(control: &GroupSummary, variant: &GroupSummary, alpha: f64) -> Result<TestResult, AbError> {
    let alpha = require_open_unit(alpha, "alpha")?;
    let a = control_moments(control, 2)?;
    let b = variant_moments(variant, 2)?;

    let va = a.std_dev * a.std_dev / a.n;
    let vb = b.std_dev * b.std_dev / b.n;
    let se_squared = va + vb;
    let se = se_squared.sqrt();

    if se == 0.0 {
        tracing::debug!("both standard deviations are zero; welch test inconclusive");
        let outcome = Outcome {
            method: MeanTestMethod::Welch,
            statistic: 0.0,
            p_value: 1.0,
            confidence_interval: None,
            degrees_of_freedom: None,
            u_statistic: None,
        };
        return Ok(finish(outcome, a.mean, b.mean, None));
    }

    let diff = b.mean - a.mean;
    let t = diff / se;

    // Welch–Satterthwaite on variance shares, so tiny variances do not underflow
    let (wa, wb) = (va / se_squared, vb / se_squared);
    let df = 1.0 / (wa * wa / (a.n - 1.0) + wb * wb / (b.n - 1.0));
    let p_value = student_t_two_tailed(t, df)?;
    let t_crit = student_t_inverse_cdf(1.0 - alpha / 2.0, df)?;

    let outcome = Outcome {
        method: MeanTestMethod::Welch,
        statistic: t,
        p_value,
        confidence_interval: Some((diff - t_crit * se, diff + t_crit * se)),
        degrees_of_freedom: Some(df),
        u_statistic: None,
    };
    Ok(finish(outcome, a.mean, b.mean, Some(alpha)))
}

/// Two-sample z-test treating the supplied standard deviations as known
/// population values
pub fn z_test(control: &GroupSummary, variant: &GroupSummary, alpha: f64) -> Result<TestResult, AbError> {
    let alpha = require_open_unit(alpha, "alpha")?;
    let a = control_moments(control, 1)?;
    let b = variant_moments(variant, 1)?;
    for (m, field) in [(&a, "control.stdDev"), (&b, "variant.stdDev")] {
        if m.std_dev == 0.0 {
            return Err(InputError::NonPositiveStdDev { field, value: m.std_dev }.into());
        }
    }

    let se = (a.std_dev * a.std_dev / a.n + b.std_dev * b.std_dev / b.n).sqrt();
    let diff = b.mean - a.mean;
    let z = diff / se;
    let p_value = normal_two_tailed(z);
    let z_crit = normal_inverse_cdf(1.0 - alpha / 2.0, "alpha")?;

    let outcome = Outcome {
        method: MeanTestMethod::ZTest,
        statistic: z,
        p_value,
        confidence_interval: Some((diff - z_crit * se, diff + z_crit * se)),
        degrees_of_freedom: None,
        u_statistic: None,
    };
    Ok(finish(outcome, a.mean, b.mean, Some(alpha)))
}

fn require_sample(values: &[f64], field: &'static str) -> Result<(), InputError> {
    require_min_count(values.len() as u64, 2, field)?;
    for &v in values {
        require_finite(v, field)?;
    }
    Ok(())
}

/// Mann-Whitney U test with the tie-corrected normal approximation.
///
/// `U` counts the (control, variant) pairs where the variant value is
/// larger, ties counting one half, so `U > n1·n2/2` means the variant
/// tends higher. No continuity correction is applied. When every value is
/// tied the variance vanishes and the result is inconclusive.
///
/// The rank statistic decides significance, but the reported effect is the
/// difference of sample means and the verdict's direction follows it, so an
/// outlier can pair a positive `z` with a negative verdict.
pub fn mann_whitney_u_test(control: &[f64], variant: &[f64], alpha: f64) -> Result<TestResult, AbError> {
    let alpha = require_open_unit(alpha, "alpha")?;
    require_sample(control, "rawSamples.control")?;
    require_sample(variant, "rawSamples.variant")?;

    let n1 = control.len() as f64;
    let n2 = variant.len() as f64;
    let total = n1 + n2;

    let combined: Vec<f64> = control.iter().chain(variant.iter()).copied().collect();
    let (rank_values, tie_term) = ranks(&combined);
    let r1: f64 = rank_values[..control.len()].iter().sum();

    let u = n1 * n2 + n1 * (n1 + 1.0) / 2.0 - r1;
    let mean_u = n1 * n2 / 2.0;
    let sigma_squared = n1 * n2 / 12.0 * ((total + 1.0) - tie_term / (total * (total - 1.0)));

    let mean_control = mean(control);
    let mean_variant = mean(variant);

    if sigma_squared <= 0.0 {
        tracing::debug!(n1, n2, "all observations tied; mann-whitney test inconclusive");
        let outcome = Outcome {
            method: MeanTestMethod::MannWhitney,
            statistic: 0.0,
            p_value: 1.0,
            confidence_interval: None,
            degrees_of_freedom: None,
            u_statistic: Some(u),
        };
        return Ok(finish(outcome, mean_control, mean_variant, None));
    }

    let z = (u - mean_u) / sigma_squared.sqrt();
    let p_value = normal_two_tailed(z);

    let outcome = Outcome {
        method: MeanTestMethod::MannWhitney,
        statistic: z,
        p_value,
        confidence_interval: None,
        degrees_of_freedom: None,
        u_statistic: Some(u),
    };
    Ok(finish(outcome, mean_control, mean_variant, Some(alpha)))
}
