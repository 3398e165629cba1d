//! abstat Core - Fundamental types
//!
//! This crate provides the types shared by every abstat crate:
//! - `GroupSummary`, `RawSamples`, `PlannerInput`: validated request records
//! - `TestResult`, `PlannerResult`: immutable computation outputs
//! - `AbError`, `InputError`: structured errors

mod error;
mod model;

pub use error::{AbError, InputError, codes};
pub use model::{
    EffectType, GroupSummary, Interpretation, MeanTestMethod, PlannerInput, PlannerResult,
    RateEstimate, RateSummary, RawSamples, TestMethod, TestResult, TrafficBasis,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        AbError, EffectType, GroupSummary, InputError, Interpretation, MeanTestMethod,
        PlannerInput, PlannerResult, RawSamples, TestMethod, TestResult, TrafficBasis,
    };
    pub use crate::error::codes;
}
