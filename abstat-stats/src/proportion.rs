//! Two-proportion z-test for conversion-rate comparison

use crate::distributions::normal::{normal_inverse_cdf, normal_two_tailed};
use crate::helpers::{optional_number_arg, require_open_unit, to_json, typed_arg};
use crate::interpret::{classify, Verdict};
use abstat_core::{RateEstimate, RateSummary};
use abstat_plugin::prelude::*;

// ============ Proportion Test ============

pub struct ProportionTest;

static PROPORTION_TEST_ARGS: [ArgMeta; 3] = [
    ArgMeta::required("control", "GroupSummary", "Control arm: {sampleSize, successes}"),
    ArgMeta::required("variant", "GroupSummary", "Variant arm: {sampleSize, successes}"),
    ArgMeta::optional("alpha", "Number", "Significance level (0 < α < 1)", "0.05"),
];

static PROPORTION_TEST_EXAMPLES: [&str; 1] = [
    "proportion_test(control: {sampleSize: 1000, successes: 50}, variant: {sampleSize: 1000, successes: 60}) → p ≈ 0.327",
];

static PROPORTION_TEST_RELATED: [&str; 2] = ["plan_proportion", "mean_test"];

impl CalculatorPlugin for ProportionTest {
    fn meta(&self) -> FunctionMeta {
        FunctionMeta {
            name: "proportion_test",
            description: "Two-proportion z-test comparing conversion rates",
            usage: "proportion_test(control, variant, alpha?)",
            args: &PROPORTION_TEST_ARGS,
            returns: "TestResult",
            examples: &PROPORTION_TEST_EXAMPLES,
            category: "abtest/significance",
            related: &PROPORTION_TEST_RELATED,
        }
    }

    fn call(&self, args: &JsonValue, ctx: &CalcContext) -> Result<JsonValue, AbError> {
        let control: GroupSummary = typed_arg(args, "control", "proportion_test")?;
        let variant: GroupSummary = typed_arg(args, "variant", "proportion_test")?;
        let alpha = optional_number_arg(args, "alpha", "proportion_test")?.unwrap_or(ctx.default_alpha);

        let result = compute_proportion_test(&control, &variant, alpha)?;
        to_json(&result)
    }
}

/// Validated (n, successes) pair of one arm
fn conversion_counts(group: &GroupSummary, field: &'static str, successes_field: &'static str) -> Result<(f64, f64), InputError> {
    if group.sample_size == 0 {
        return Err(InputError::NonPositiveSampleSize { field });
    }
    let successes = group
        .successes
        .ok_or(InputError::MissingField { field: successes_field })?;
    if successes > group.sample_size {
        return Err(InputError::SuccessesExceedTrials {
            field,
            successes,
            sample_size: group.sample_size,
        });
    }
    Ok((group.sample_size as f64, successes as f64))
}

/// Rate with its Wald interval, clamped to [0, 1]
fn rate_estimate(rate: f64, n: f64, z_crit: f64) -> RateEstimate {
    let margin = z_crit * (rate * (1.0 - rate) / n).sqrt();
    RateEstimate {
        rate,
        confidence_interval: ((rate - margin).max(0.0), (rate + margin).min(1.0)),
    }
}

/// Compare the conversion rates of two arms.
///
/// The statistic is oriented as variant minus control. A pooled standard
/// error of zero (no conversions anywhere, or conversions everywhere) is
/// reported as an inconclusive result with `p_value = 1`.
pub fn compute_proportion_test(control: &GroupSummary, variant: &GroupSummary, alpha: f64) -> Result<TestResult, AbError> {
    let alpha = require_open_unit(alpha, "alpha")?;
    let (n1, s1) = conversion_counts(control, "control", "control.successes")?;
    let (n2, s2) = conversion_counts(variant, "variant", "variant.successes")?;

    let p1 = s1 / n1;
    let p2 = s2 / n2;
    let p_pool = (s1 + s2) / (n1 + n2);
    let se = (p_pool * (1.0 - p_pool) * (1.0 / n1 + 1.0 / n2)).sqrt();

    let z_crit = normal_inverse_cdf(1.0 - alpha / 2.0, "alpha")?;
    let effect_absolute = p2 - p1;
    let effect_relative = if p1 > 0.0 { Some(effect_absolute / p1) } else { None };
    let rates = RateSummary {
        control: rate_estimate(p1, n1, z_crit),
        variant: rate_estimate(p2, n2, z_crit),
    };

    if se == 0.0 {
        tracing::debug!(p_pool, "pooled standard error is zero; proportion test inconclusive");
        let verdict = Verdict::inconclusive();
        return Ok(TestResult {
            method: TestMethod::TwoProportionZ,
            statistic: 0.0,
            p_value: 1.0,
            effect_absolute,
            effect_relative,
            confidence_interval: None,
            is_significant: verdict.is_significant,
            interpretation: verdict.category,
            degrees_of_freedom: None,
            u_statistic: None,
            rates: Some(rates),
        });
    }

    let z = effect_absolute / se;
    let p_value = normal_two_tailed(z);
    let verdict = classify(p_value, alpha, effect_absolute);

    Ok(TestResult {
        method: TestMethod::TwoProportionZ,
        statistic: z,
        p_value,
        effect_absolute,
        effect_relative,
        confidence_interval: Some((effect_absolute - z_crit * se, effect_absolute + z_crit * se)),
        is_significant: verdict.is_significant,
        interpretation: verdict.category,
        degrees_of_freedom: None,
        u_statistic: None,
        rates: Some(rates),
    })
}
