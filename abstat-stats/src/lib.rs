//! abstat Statistics Plugin
//!
//! Significance tests and sample-size planning for two-group experiments.
//! Every calculation is a pure function over its inputs; invalid input is
//! reported as an `AbError` and never panics.

mod helpers;
mod distributions;
mod interpret;
mod proportion;
mod means;
mod planner;

pub use distributions::{
    normal_cdf, normal_inverse_cdf, normal_sf, normal_two_tailed, student_t_cdf,
    student_t_inverse_cdf, student_t_two_tailed,
};
pub use interpret::{classify, Verdict};
pub use means::{compute_mean_test, mann_whitney_u_test, welch_t_test, z_test};
pub use planner::{plan_mean_test, plan_proportion_test};
pub use proportion::compute_proportion_test;

use abstat_plugin::PluginRegistry;

/// Load the experiment calculators into registry
pub fn load_abtest_library(registry: PluginRegistry) -> PluginRegistry {
    registry
        // Significance
        .with_function(proportion::ProportionTest)
        .with_function(means::MeanTest)

        // Planning
        .with_function(planner::PlanProportion)
        .with_function(planner::PlanMean)

        // Distributions
        .with_function(distributions::SnormCdf)
        .with_function(distributions::SnormInv)
        .with_function(distributions::TCdf)
        .with_function(distributions::TInv)
}
