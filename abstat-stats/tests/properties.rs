//! Behavioral properties of the experiment calculators

use abstat_core::prelude::*;
use abstat_stats::{
    compute_mean_test, compute_proportion_test, mann_whitney_u_test, plan_mean_test,
    plan_proportion_test, welch_t_test,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Binomial, Distribution, Normal};

fn planner(baseline: f64, mde: f64) -> PlannerInput {
    PlannerInput {
        baseline,
        std_dev: None,
        minimum_detectable_effect: mde,
        effect_type: EffectType::Absolute,
        power: 0.8,
        alpha: 0.05,
        daily_volume: None,
        traffic_basis: TrafficBasis::Total,
    }
}

// ============ Symmetry ============

#[test]
fn swapping_groups_negates_proportion_statistic() {
    let pairs = [((1000, 50), (1000, 60)), ((250, 31), (400, 22)), ((80, 1), (90, 9))];
    for ((n1, s1), (n2, s2)) in pairs {
        let a = GroupSummary::conversions(n1, s1);
        let b = GroupSummary::conversions(n2, s2);
        let ab = compute_proportion_test(&a, &b, 0.05).unwrap();
        let ba = compute_proportion_test(&b, &a, 0.05).unwrap();
        assert!((ab.statistic + ba.statistic).abs() < 1e-12);
        assert!((ab.p_value - ba.p_value).abs() < 1e-12);
        assert!((ab.effect_absolute + ba.effect_absolute).abs() < 1e-12);
    }
}

#[test]
fn swapping_samples_mirrors_mann_whitney() {
    let a = [3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0];
    let b = [5.0, 3.0, 5.0, 8.0, 9.0, 7.0, 9.0, 3.0];
    let ab = mann_whitney_u_test(&a, &b, 0.05).unwrap();
    let ba = mann_whitney_u_test(&b, &a, 0.05).unwrap();
    assert!((ab.statistic + ba.statistic).abs() < 1e-12);
    assert!((ab.p_value - ba.p_value).abs() < 1e-12);
    assert_eq!(ab.u_statistic.unwrap() + ba.u_statistic.unwrap(), 64.0);
}

// ============ Monotonicity ============

#[test]
fn larger_variant_rate_raises_statistic() {
    let control = GroupSummary::conversions(2000, 100);
    let mut last = f64::NEG_INFINITY;
    let mut last_p = f64::INFINITY;
    for successes in (100..=180).step_by(10) {
        let r = compute_proportion_test(&control, &GroupSummary::conversions(2000, successes), 0.05).unwrap();
        assert!(r.statistic > last);
        assert!(r.p_value < last_p, "p {} at {} successes", r.p_value, successes);
        last = r.statistic;
        last_p = r.p_value;
    }
}

#[test]
fn smaller_variant_rate_lowers_statistic() {
    let control = GroupSummary::conversions(2000, 100);
    let mut last = f64::INFINITY;
    let mut last_p = f64::INFINITY;
    for successes in (20..=100).rev().step_by(10) {
        let r = compute_proportion_test(&control, &GroupSummary::conversions(2000, successes), 0.05).unwrap();
        assert!(r.statistic < last);
        assert!(r.p_value < last_p, "p {} at {} successes", r.p_value, successes);
        if successes < 100 {
            assert!(r.effect_absolute < 0.0);
            assert!(r.statistic < 0.0);
        }
        last = r.statistic;
        last_p = r.p_value;
    }
}

#[test]
fn sample_size_falls_as_effect_grows() {
    let mut last = u64::MAX;
    for mde in [0.005, 0.01, 0.02, 0.04] {
        let n = plan_proportion_test(&planner(0.1, mde)).unwrap().required_sample_size_per_group;
        assert!(n < last, "mde {} gave {}", mde, n);
        last = n;
    }
}

#[test]
fn sample_size_grows_with_power_and_strictness() {
    let base = plan_proportion_test(&planner(0.05, 0.01)).unwrap().required_sample_size_per_group;

    let mut more_power = planner(0.05, 0.01);
    more_power.power = 0.9;
    let stricter = PlannerInput { alpha: 0.01, ..planner(0.05, 0.01) };

    assert!(plan_proportion_test(&more_power).unwrap().required_sample_size_per_group > base);
    assert!(plan_proportion_test(&stricter).unwrap().required_sample_size_per_group > base);
}

// ============ Known values ============

#[test]
fn known_planner_values() {
    assert_eq!(plan_proportion_test(&planner(0.05, 0.01)).unwrap().required_sample_size_per_group, 8158);

    let mean_plan = PlannerInput {
        std_dev: Some(15.0),
        ..planner(100.0, 5.0)
    };
    assert_eq!(plan_mean_test(&mean_plan).unwrap().required_sample_size_per_group, 142);
}

#[test]
fn welch_and_mann_whitney_agree_on_direction() {
    let control = [12.1, 9.8, 11.4, 10.2, 10.9, 9.5, 11.0, 10.4];
    let variant = [13.0, 12.2, 11.9, 13.8, 12.5, 12.9, 11.6, 13.3];
    let summary = |xs: &[f64]| {
        let n = xs.len() as f64;
        let m = xs.iter().sum::<f64>() / n;
        let var = xs.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (n - 1.0);
        GroupSummary::continuous(xs.len() as u64, m, var.sqrt())
    };

    let welch = welch_t_test(&summary(&control), &summary(&variant), 0.05).unwrap();
    let raw = RawSamples { control: control.to_vec(), variant: variant.to_vec() };
    let mw = compute_mean_test(
        &GroupSummary::default(),
        &GroupSummary::default(),
        0.05,
        MeanTestMethod::MannWhitney,
        Some(&raw),
    )
    .unwrap();

    assert_eq!(welch.interpretation, Interpretation::SignificantPositive);
    assert_eq!(mw.interpretation, Interpretation::SignificantPositive);
    assert!((welch.effect_absolute - mw.effect_absolute).abs() < 1e-12);
}

// ============ Degenerate and invalid input ============

#[test]
fn degenerate_inputs_are_inconclusive_not_errors() {
    let zero = compute_proportion_test(
        &GroupSummary::conversions(500, 0),
        &GroupSummary::conversions(700, 0),
        0.05,
    )
    .unwrap();
    let flat = welch_t_test(
        &GroupSummary::continuous(5, 3.0, 0.0),
        &GroupSummary::continuous(5, 3.0, 0.0),
        0.05,
    )
    .unwrap();
    let tied = mann_whitney_u_test(&[7.0, 7.0], &[7.0, 7.0, 7.0], 0.05).unwrap();

    for r in [zero, flat, tied] {
        assert_eq!(r.p_value, 1.0);
        assert!(!r.is_significant);
        assert_eq!(r.interpretation, Interpretation::Inconclusive);
    }
}

#[test]
fn invalid_input_is_always_reported() {
    let err = compute_proportion_test(
        &GroupSummary::conversions(100, 101),
        &GroupSummary::conversions(100, 10),
        0.05,
    )
    .unwrap_err();
    assert_eq!(err.code, codes::INVALID_INPUT);
    assert!(err.suggestion.is_some());

    let err = plan_proportion_test(&planner(0.95, 0.1)).unwrap_err();
    assert_eq!(err.code, codes::INVALID_INPUT);
}

// ============ Simulated power ============

#[test]
fn planned_proportion_sample_reaches_target_power() {
    let plan = plan_proportion_test(&planner(0.05, 0.01)).unwrap();
    let n = plan.required_sample_size_per_group;

    let mut rng = StdRng::seed_from_u64(20240611);
    let control_dist = Binomial::new(n, 0.05).unwrap();
    let variant_dist = Binomial::new(n, 0.06).unwrap();

    let trials = 2000;
    let detected = (0..trials)
        .filter(|_| {
            let control = GroupSummary::conversions(n, control_dist.sample(&mut rng));
            let variant = GroupSummary::conversions(n, variant_dist.sample(&mut rng));
            compute_proportion_test(&control, &variant, 0.05).unwrap().is_significant
        })
        .count();

    let power = detected as f64 / trials as f64;
    assert!((0.76..=0.84).contains(&power), "empirical power {}", power);
}

#[test]
fn null_effect_rejects_near_alpha() {
    let n = 2000;
    let mut rng = StdRng::seed_from_u64(7);
    let dist = Binomial::new(n, 0.1).unwrap();

    let trials = 2000;
    let rejected = (0..trials)
        .filter(|_| {
            let control = GroupSummary::conversions(n, dist.sample(&mut rng));
            let variant = GroupSummary::conversions(n, dist.sample(&mut rng));
            compute_proportion_test(&control, &variant, 0.05).unwrap().is_significant
        })
        .count();

    let rate = rejected as f64 / trials as f64;
    assert!(rate < 0.075, "false positive rate {}", rate);
}

#[test]
fn planned_mean_sample_reaches_target_power() {
    let plan = plan_mean_test(&PlannerInput {
        std_dev: Some(2.0),
        ..planner(10.0, 1.0)
    })
    .unwrap();
    let n = plan.required_sample_size_per_group as usize;
    assert_eq!(n, 63);

    let mut rng = StdRng::seed_from_u64(99);
    let control_dist = Normal::new(10.0, 2.0).unwrap();
    let variant_dist = Normal::new(11.0, 2.0).unwrap();

    let summarize = |xs: Vec<f64>| {
        let m = xs.iter().sum::<f64>() / n as f64;
        let var = xs.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (n as f64 - 1.0);
        GroupSummary::continuous(n as u64, m, var.sqrt())
    };

    let trials = 1000;
    let mut detected = 0;
    for _ in 0..trials {
        let control: Vec<f64> = (0..n).map(|_| control_dist.sample(&mut rng)).collect();
        let variant: Vec<f64> = (0..n).map(|_| variant_dist.sample(&mut rng)).collect();
        if welch_t_test(&summarize(control), &summarize(variant), 0.05).unwrap().is_significant {
            detected += 1;
        }
    }

    let power = detected as f64 / trials as f64;
    assert!(power > 0.74, "empirical power {}", power);
}
