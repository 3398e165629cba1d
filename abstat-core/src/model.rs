//! Experiment records
//!
//! Request-scoped value objects: built from caller input, consumed by one
//! computation, and discarded once the result is returned.

use serde::{Deserialize, Serialize};

/// Aggregated statistics for one arm of an experiment.
///
/// Proportion tests read `successes`; mean tests read `mean` and `std_dev`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSummary {
    pub sample_size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub successes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub std_dev: Option<f64>,
}

impl GroupSummary {
    /// Conversion counts for a proportion test
    pub fn conversions(sample_size: u64, successes: u64) -> Self {
        Self {
            sample_size,
            successes: Some(successes),
            ..Self::default()
        }
    }

    /// Summary statistics for a mean test
    pub fn continuous(sample_size: u64, mean: f64, std_dev: f64) -> Self {
        Self {
            sample_size,
            mean: Some(mean),
            std_dev: Some(std_dev),
            ..Self::default()
        }
    }
}

/// Raw observations for rank-based tests
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSamples {
    pub control: Vec<f64>,
    pub variant: Vec<f64>,
}

/// Algorithm used for an average-value comparison
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeanTestMethod {
    /// Welch's unequal-variance t-test on summary statistics
    #[default]
    Welch,
    /// Mann-Whitney U on raw samples
    MannWhitney,
    /// Two-sample z-test with known population standard deviations
    ZTest,
}

/// Test that produced a [`TestResult`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestMethod {
    TwoProportionZ,
    Welch,
    MannWhitney,
    ZTest,
}

impl From<MeanTestMethod> for TestMethod {
    fn from(method: MeanTestMethod) -> Self {
        match method {
            MeanTestMethod::Welch => TestMethod::Welch,
            MeanTestMethod::MannWhitney => TestMethod::MannWhitney,
            MeanTestMethod::ZTest => TestMethod::ZTest,
        }
    }
}

/// Locale-free outcome category. Display text is owned by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpretation {
    SignificantPositive,
    SignificantNegative,
    NotSignificant,
    /// Input was valid but could not discriminate (e.g. zero variance)
    Inconclusive,
}

impl Interpretation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Interpretation::SignificantPositive => "significant_positive",
            Interpretation::SignificantNegative => "significant_negative",
            Interpretation::NotSignificant => "not_significant",
            Interpretation::Inconclusive => "inconclusive",
        }
    }
}

impl std::fmt::Display for Interpretation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Observed rate and its Wald interval for one arm
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateEstimate {
    pub rate: f64,
    pub confidence_interval: (f64, f64),
}

/// Per-arm rates reported by the proportion test
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateSummary {
    pub control: RateEstimate,
    pub variant: RateEstimate,
}

/// Outcome of a significance test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub method: TestMethod,
    /// z or t statistic, oriented as variant minus control
    pub statistic: f64,
    pub p_value: f64,
    pub effect_absolute: f64,
    /// `None` when the control value is zero
    pub effect_relative: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_interval: Option<(f64, f64)>,
    pub is_significant: bool,
    pub interpretation: Interpretation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degrees_of_freedom: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub u_statistic: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rates: Option<RateSummary>,
}

/// How a minimum detectable effect is expressed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectType {
    #[default]
    Absolute,
    /// Fraction of the baseline, e.g. 0.1 for a 10% lift
    Relative,
}

/// What `daily_volume` counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrafficBasis {
    /// Arrivals across both arms combined
    #[default]
    Total,
    /// Arrivals into each arm
    PerVariant,
}

/// Input to the sample-size planners
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannerInput {
    /// Baseline conversion rate (proportion planner) or baseline mean
    pub baseline: f64,
    /// Baseline standard deviation, required by the mean planner
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub std_dev: Option<f64>,
    pub minimum_detectable_effect: f64,
    #[serde(default)]
    pub effect_type: EffectType,
    pub power: f64,
    pub alpha: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_volume: Option<f64>,
    #[serde(default)]
    pub traffic_basis: TrafficBasis,
}

impl PlannerInput {
    /// MDE expressed on the baseline's scale
    pub fn absolute_effect(&self) -> f64 {
        match self.effect_type {
            EffectType::Absolute => self.minimum_detectable_effect,
            EffectType::Relative => self.baseline * self.minimum_detectable_effect,
        }
    }
}

/// Output of the sample-size planners
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannerResult {
    /// Always rounded up
    pub required_sample_size_per_group: u64,
    pub required_sample_size_total: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_duration_days: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_duration_weeks: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect_size: Option<f64>,
    /// Variant rate or mean the plan is sized to detect
    pub target_value: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_summary_deserializes_camel_case() {
        let json = r#"{"sampleSize": 1000, "successes": 50}"#;
        let g: GroupSummary = serde_json::from_str(json).unwrap();
        assert_eq!(g, GroupSummary::conversions(1000, 50));
    }

    #[test]
    fn test_mean_method_maps_to_result_method() {
        assert_eq!(TestMethod::from(MeanTestMethod::Welch), TestMethod::Welch);
        assert_eq!(TestMethod::from(MeanTestMethod::MannWhitney), TestMethod::MannWhitney);
        assert_eq!(TestMethod::from(MeanTestMethod::ZTest), TestMethod::ZTest);
    }

    #[test]
    fn test_negative_count_rejected_by_deserializer() {
        let json = r#"{"sampleSize": -3}"#;
        assert!(serde_json::from_str::<GroupSummary>(json).is_err());
    }

    #[test]
    fn test_planner_input_defaults() {
        let json = r#"{"baseline": 0.05, "minimumDetectableEffect": 0.01, "power": 0.8, "alpha": 0.05}"#;
        let input: PlannerInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.effect_type, EffectType::Absolute);
        assert_eq!(input.traffic_basis, TrafficBasis::Total);
        assert!(input.daily_volume.is_none());
    }

    #[test]
    fn test_relative_effect_scales_with_baseline() {
        let input = PlannerInput {
            baseline: 200.0,
            std_dev: Some(40.0),
            minimum_detectable_effect: 0.05,
            effect_type: EffectType::Relative,
            power: 0.8,
            alpha: 0.05,
            daily_volume: None,
            traffic_basis: TrafficBasis::Total,
        };
        assert!((input.absolute_effect() - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_interpretation_wire_names() {
        let json = serde_json::to_string(&Interpretation::SignificantNegative).unwrap();
        assert_eq!(json, "\"significant_negative\"");
        assert_eq!(Interpretation::Inconclusive.to_string(), "inconclusive");
    }
}
