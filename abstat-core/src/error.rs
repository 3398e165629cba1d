//! Structured errors for callers of the engine
//!
//! Errors are plain values: a machine-readable code, a message, and an
//! optional hint about how to fix the request. Constraint violations are
//! described by [`InputError`] and surface as [`codes::INVALID_INPUT`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Standard error codes (machine-readable)
pub mod codes {
    pub const INVALID_INPUT: &str = "INVALID_INPUT";
    pub const UNDEFINED_FUNC: &str = "UNDEFINED_FUNC";
    pub const ARG_TYPE: &str = "ARG_TYPE";
    pub const INTERNAL: &str = "INTERNAL";
}

/// A constraint violated by caller-supplied input.
///
/// Every variant is a caller data error; none of them is transient.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("{field}: sample size must be greater than 0")]
    NonPositiveSampleSize { field: &'static str },

    #[error("{field}: at least {min} observations required, got {got}")]
    InsufficientSampleSize { field: &'static str, min: u64, got: u64 },

    #[error("{field}: successes ({successes}) exceed sample size ({sample_size})")]
    SuccessesExceedTrials { field: &'static str, successes: u64, sample_size: u64 },

    #[error("{field}: standard deviation must not be negative, got {value}")]
    NegativeStdDev { field: &'static str, value: f64 },

    #[error("{field}: standard deviation must be greater than 0, got {value}")]
    NonPositiveStdDev { field: &'static str, value: f64 },

    #[error("{field}: must lie strictly between 0 and 1, got {value}")]
    ProbabilityOutOfRange { field: &'static str, value: f64 },

    #[error("{field}: value is required")]
    MissingField { field: &'static str },

    #[error("{field}: value must be finite, got {value}")]
    NonFinite { field: &'static str, value: f64 },

    #[error("target rate {value} falls outside (0, 1)")]
    TargetRateOutOfRange { value: f64 },

    #[error("minimum detectable effect must not be zero")]
    ZeroEffect,

    #[error("Mann-Whitney U test needs raw samples for both groups")]
    MissingRawSamples,

    #[error("daily volume must be greater than 0, got {value}")]
    NonPositiveDailyVolume { value: f64 },

    #[error("{field}: degrees of freedom must be greater than 0, got {value}")]
    NonPositiveDegreesOfFreedom { field: &'static str, value: f64 },
}

impl InputError {
    /// Name of the offending input field, when one is known
    pub fn field(&self) -> Option<&'static str> {
        match self {
            InputError::NonPositiveSampleSize { field }
            | InputError::InsufficientSampleSize { field, .. }
            | InputError::SuccessesExceedTrials { field, .. }
            | InputError::NegativeStdDev { field, .. }
            | InputError::NonPositiveStdDev { field, .. }
            | InputError::ProbabilityOutOfRange { field, .. }
            | InputError::MissingField { field }
            | InputError::NonFinite { field, .. }
            | InputError::NonPositiveDegreesOfFreedom { field, .. } => Some(field),
            InputError::TargetRateOutOfRange { .. } => Some("minimumDetectableEffect"),
            InputError::ZeroEffect => Some("minimumDetectableEffect"),
            InputError::MissingRawSamples => Some("rawSamples"),
            InputError::NonPositiveDailyVolume { .. } => Some("dailyVolume"),
        }
    }

    fn suggestion(&self) -> &'static str {
        match self {
            InputError::SuccessesExceedTrials { .. } => {
                "Successes are a subset of the sample; check the two counts were not swapped"
            }
            InputError::TargetRateOutOfRange { .. } => {
                "Lower the minimum detectable effect or switch between absolute and relative"
            }
            InputError::MissingRawSamples => {
                "Pass rawSamples.control and rawSamples.variant, or use the welch method"
            }
            InputError::ProbabilityOutOfRange { .. } => "Use a fraction such as 0.05, not a percentage",
            _ => "Correct the input value and retry",
        }
    }
}

/// Structured error returned by every fallible operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbError {
    /// Machine-readable error code
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Suggestion for fixing the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,

    /// Input field the error refers to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl AbError {
    /// Create a new error
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            suggestion: None,
            field: None,
        }
    }

    /// Builder: add suggestion
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Builder: set offending field
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn is_invalid_input(&self) -> bool {
        self.code == codes::INVALID_INPUT
    }

    // ========== Common Error Constructors ==========

    pub fn invalid_input(details: impl Into<String>) -> Self {
        Self::new(codes::INVALID_INPUT, format!("Invalid input: {}", details.into()))
    }

    pub fn undefined_func(name: &str) -> Self {
        Self::new(codes::UNDEFINED_FUNC, format!("Unknown function: {}", name))
            .with_suggestion("Use list_functions to see available calculators")
    }

    pub fn arg_type(func: &str, details: impl Into<String>) -> Self {
        Self::new(codes::ARG_TYPE, format!("{}(): {}", func, details.into()))
            .with_suggestion(format!("Use help('{}') for the expected argument shape", func))
    }

    pub fn internal(details: impl Into<String>) -> Self {
        Self::new(codes::INTERNAL, format!("Internal error: {}", details.into()))
            .with_suggestion("This is a bug, please report it")
    }
}

impl std::fmt::Display for AbError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, " (suggestion: {})", suggestion)?;
        }
        Ok(())
    }
}

impl std::error::Error for AbError {}

impl From<InputError> for AbError {
    fn from(err: InputError) -> Self {
        let mut out = Self::invalid_input(err.to_string()).with_suggestion(err.suggestion());
        if let Some(field) = err.field() {
            out = out.with_field(field);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_error_maps_to_invalid_input() {
        let err: AbError = InputError::SuccessesExceedTrials {
            field: "control",
            successes: 12,
            sample_size: 10,
        }
        .into();
        assert!(err.is_invalid_input());
        assert_eq!(err.field.as_deref(), Some("control"));
        assert!(err.message.contains("exceed"));
        assert!(err.suggestion.is_some());
    }

    #[test]
    fn test_display_includes_code_and_suggestion() {
        let err = AbError::undefined_func("ztest");
        let text = err.to_string();
        assert!(text.starts_with("[UNDEFINED_FUNC]"));
        assert!(text.contains("suggestion"));
    }

    #[test]
    fn test_serialize_skips_empty_fields() {
        let err = AbError::new(codes::INTERNAL, "boom");
        let json = serde_json::to_value(&err).unwrap();
        assert!(json.get("suggestion").is_none());
        assert!(json.get("field").is_none());
        assert_eq!(json["code"], "INTERNAL");
    }
}
