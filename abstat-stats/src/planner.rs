//! Sample size and duration planning for proportion and mean experiments

use crate::distributions::normal::normal_inverse_cdf;
use crate::helpers::{number_arg, optional_number_arg, optional_typed_arg, require_finite, require_open_unit, to_json};
use abstat_plugin::prelude::*;

/// Quantiles shared by both planners: (z_{1−α/2}, z_{power})
fn critical_values(alpha: f64, power: f64) -> Result<(f64, f64), InputError> {
    let alpha = require_open_unit(alpha, "alpha")?;
    let power = require_open_unit(power, "power")?;
    Ok((normal_inverse_cdf(1.0 - alpha / 2.0, "alpha")?, normal_inverse_cdf(power, "power")?))
}

/// Non-zero absolute MDE
fn absolute_effect(input: &PlannerInput) -> Result<f64, InputError> {
    require_finite(input.minimum_detectable_effect, "minimumDetectableEffect")?;
    let delta = input.absolute_effect();
    if delta == 0.0 {
        return Err(InputError::ZeroEffect);
    }
    Ok(delta)
}

/// Days (and weeks, one decimal) to collect `per_group` observations per arm
fn duration(per_group: u64, input: &PlannerInput) -> Result<(Option<f64>, Option<f64>), InputError> {
    let Some(daily) = input.daily_volume else {
        return Ok((None, None));
    };
    if !(daily.is_finite() && daily > 0.0) {
        return Err(InputError::NonPositiveDailyVolume { value: daily });
    }

    let needed = match input.traffic_basis {
        TrafficBasis::Total => 2.0 * per_group as f64,
        TrafficBasis::PerVariant => per_group as f64,
    };
    let days = (needed / daily).ceil();
    let weeks = (days / 7.0 * 10.0).round() / 10.0;
    Ok((Some(days), Some(weeks)))
}

fn planned(per_group: f64, effect_size: f64, target_value: f64, input: &PlannerInput) -> Result<PlannerResult, AbError> {
    let per_group = per_group.ceil() as u64;
    let (days, weeks) = duration(per_group, input)?;
    Ok(PlannerResult {
        required_sample_size_per_group: per_group,
        required_sample_size_total: per_group.saturating_mul(2),
        estimated_duration_days: days,
        estimated_duration_weeks: weeks,
        effect_size: Some(effect_size),
        target_value,
    })
}

/// Per-arm sample size to detect a change in conversion rate.
///
/// Uses the unpooled-alternative normal approximation
/// `n = (zα·√(2p̄(1−p̄)) + zβ·√(p0(1−p0)+p1(1−p1)))² / Δ²`, rounded up.
pub fn plan_proportion_test(input: &PlannerInput) -> Result<PlannerResult, AbError> {
    let p0 = require_open_unit(input.baseline, "baseline")?;
    let delta = absolute_effect(input)?;
    let p1 = p0 + delta;
    if !(p1 > 0.0 && p1 < 1.0) {
        return Err(InputError::TargetRateOutOfRange { value: p1 }.into());
    }
    let (z_alpha, z_beta) = critical_values(input.alpha, input.power)?;

    let p_bar = (p0 + p1) / 2.0;
    let numerator = z_alpha * (2.0 * p_bar * (1.0 - p_bar)).sqrt()
        + z_beta * (p0 * (1.0 - p0) + p1 * (1.0 - p1)).sqrt();
    let n = numerator * numerator / (delta * delta);

    planned(n, delta.abs(), p1, input)
}

/// Per-arm sample size to detect a shift in a mean, `n = 2·((zα+zβ)/d)²`
/// with Cohen's `d = |Δ|/σ`.
pub fn plan_mean_test(input: &PlannerInput) -> Result<PlannerResult, AbError> {
    let baseline = require_finite(input.baseline, "baseline")?;
    let sd = input.std_dev.ok_or(InputError::MissingField { field: "stdDev" })?;
    if !(sd.is_finite() && sd > 0.0) {
        return Err(InputError::NonPositiveStdDev { field: "stdDev", value: sd }.into());
    }
    let delta = absolute_effect(input)?;
    let (z_alpha, z_beta) = critical_values(input.alpha, input.power)?;

    let d = delta.abs() / sd;
    let ratio = (z_alpha + z_beta) / d;
    let n = 2.0 * ratio * ratio;

    planned(n, d, baseline + delta, input)
}

/// Assemble a planner request from keyed JSON arguments
fn planner_input(args: &JsonValue, func: &str, ctx: &CalcContext, with_sd: bool) -> Result<PlannerInput, AbError> {
    Ok(PlannerInput {
        baseline: number_arg(args, "baseline", func)?,
        std_dev: if with_sd {
            Some(number_arg(args, "stdDev", func)?)
        } else {
            None
        },
        minimum_detectable_effect: number_arg(args, "minimumDetectableEffect", func)?,
        effect_type: optional_typed_arg(args, "effectType", func)?.unwrap_or_default(),
        power: optional_number_arg(args, "power", func)?.unwrap_or(ctx.default_power),
        alpha: optional_number_arg(args, "alpha", func)?.unwrap_or(ctx.default_alpha),
        daily_volume: optional_number_arg(args, "dailyVolume", func)?,
        traffic_basis: optional_typed_arg(args, "trafficBasis", func)?.unwrap_or_default(),
    })
}

// ============ Plan Proportion ============

pub struct PlanProportion;

static PLAN_PROPORTION_ARGS: [ArgMeta; 7] = [
    ArgMeta::required("baseline", "Number", "Baseline conversion rate (0 < p < 1)"),
    ArgMeta::required("minimumDetectableEffect", "Number", "Smallest change worth detecting"),
    ArgMeta::optional("effectType", "Text", "absolute | relative", "absolute"),
    ArgMeta::optional("power", "Number", "Probability of detecting the effect", "0.8"),
    ArgMeta::optional("alpha", "Number", "Significance level", "0.05"),
    ArgMeta::optional("dailyVolume", "Number", "Visitors per day", "null"),
    ArgMeta::optional("trafficBasis", "Text", "total | per_variant", "total"),
];

static PLAN_PROPORTION_EXAMPLES: [&str; 2] = [
    "plan_proportion(baseline: 0.05, minimumDetectableEffect: 0.01) → 8158 per group",
    "plan_proportion(baseline: 0.05, minimumDetectableEffect: 0.2, effectType: \"relative\", dailyVolume: 1000)",
];

static PLAN_PROPORTION_RELATED: [&str; 2] = ["proportion_test", "plan_mean"];

impl CalculatorPlugin for PlanProportion {
    fn meta(&self) -> FunctionMeta {
        FunctionMeta {
            name: "plan_proportion",
            description: "Required sample size and duration for a conversion-rate test",
            usage: "plan_proportion(baseline, minimumDetectableEffect, effectType?, power?, alpha?, dailyVolume?, trafficBasis?)",
            args: &PLAN_PROPORTION_ARGS,
            returns: "PlannerResult",
            examples: &PLAN_PROPORTION_EXAMPLES,
            category: "abtest/planning",
            related: &PLAN_PROPORTION_RELATED,
        }
    }

    fn call(&self, args: &JsonValue, ctx: &CalcContext) -> Result<JsonValue, AbError> {
        let input = planner_input(args, "plan_proportion", ctx, false)?;
        to_json(&plan_proportion_test(&input)?)
    }
}

// ============ Plan Mean ============

pub struct PlanMean;

static PLAN_MEAN_ARGS: [ArgMeta; 8] = [
    ArgMeta::required("baseline", "Number", "Baseline mean of the metric"),
    ArgMeta::required("stdDev", "Number", "Standard deviation of the metric (> 0)"),
    ArgMeta::required("minimumDetectableEffect", "Number", "Smallest change worth detecting"),
    ArgMeta::optional("effectType", "Text", "absolute | relative", "absolute"),
    ArgMeta::optional("power", "Number", "Probability of detecting the effect", "0.8"),
    ArgMeta::optional("alpha", "Number", "Significance level", "0.05"),
    ArgMeta::optional("dailyVolume", "Number", "Visitors per day", "null"),
    ArgMeta::optional("trafficBasis", "Text", "total | per_variant", "total"),
];

static PLAN_MEAN_EXAMPLES: [&str; 1] = ["plan_mean(baseline: 100, stdDev: 15, minimumDetectableEffect: 5) → 142 per group"];

static PLAN_MEAN_RELATED: [&str; 2] = ["mean_test", "plan_proportion"];

impl CalculatorPlugin for PlanMean {
    fn meta(&self) -> FunctionMeta {
        FunctionMeta {
            name: "plan_mean",
            description: "Required sample size and duration for a continuous-metric test",
            usage: "plan_mean(baseline, stdDev, minimumDetectableEffect, effectType?, power?, alpha?, dailyVolume?, trafficBasis?)",
            args: &PLAN_MEAN_ARGS,
            returns: "PlannerResult",
            examples: &PLAN_MEAN_EXAMPLES,
            category: "abtest/planning",
            related: &PLAN_MEAN_RELATED,
        }
    }

    fn call(&self, args: &JsonValue, ctx: &CalcContext) -> Result<JsonValue, AbError> {
        let input = planner_input(args, "plan_mean", ctx, true)?;
        to_json(&plan_mean_test(&input)?)
    }
}
