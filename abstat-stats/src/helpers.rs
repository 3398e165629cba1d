//! Helper functions for statistical operations
//!
//! Common utilities for extracting and validating inputs.

use abstat_core::{AbError, InputError};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

/// Require a JSON object as the argument container
pub fn require_object<'a>(args: &'a JsonValue, func: &str) -> Result<&'a serde_json::Map<String, JsonValue>, AbError> {
    args.as_object()
        .ok_or_else(|| AbError::arg_type(func, "arguments must be an object keyed by name"))
}

/// Extract a required number argument
pub fn number_arg(args: &JsonValue, name: &'static str, func: &str) -> Result<f64, AbError> {
    match optional_number_arg(args, name, func)? {
        Some(v) => Ok(v),
        None => Err(InputError::MissingField { field: name }.into()),
    }
}

/// Extract an optional number argument; `null` counts as absent
pub fn optional_number_arg(args: &JsonValue, name: &'static str, func: &str) -> Result<Option<f64>, AbError> {
    let obj = require_object(args, func)?;
    match obj.get(name) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::Number(n)) => n
            .as_f64()
            .map(Some)
            .ok_or_else(|| AbError::arg_type(func, format!("'{}' is not representable as f64", name))),
        Some(other) => Err(AbError::arg_type(
            func,
            format!("'{}': expected Number, got {}", name, json_type_name(other)),
        )),
    }
}

/// Deserialize a structured argument (group summary, samples, enums)
pub fn typed_arg<T: DeserializeOwned>(args: &JsonValue, name: &'static str, func: &str) -> Result<T, AbError> {
    match optional_typed_arg(args, name, func)? {
        Some(v) => Ok(v),
        None => Err(InputError::MissingField { field: name }.into()),
    }
}

pub fn optional_typed_arg<T: DeserializeOwned>(
    args: &JsonValue,
    name: &'static str,
    func: &str,
) -> Result<Option<T>, AbError> {
    let obj = require_object(args, func)?;
    match obj.get(name) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(value) => serde_json::from_value(value.clone())
            .map(Some)
            .map_err(|e| AbError::invalid_input(format!("'{}': {}", name, e)).with_field(name)),
    }
}

/// Serialize a result record into JSON
pub fn to_json<T: serde::Serialize>(value: &T) -> Result<JsonValue, AbError> {
    serde_json::to_value(value).map_err(|e| AbError::internal(e.to_string()))
}

pub fn json_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "Null",
        JsonValue::Bool(_) => "Bool",
        JsonValue::Number(_) => "Number",
        JsonValue::String(_) => "Text",
        JsonValue::Array(_) => "List",
        JsonValue::Object(_) => "Object",
    }
}

/// Require a finite float
pub fn require_finite(value: f64, field: &'static str) -> Result<f64, InputError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(InputError::NonFinite { field, value })
    }
}

/// Require a probability strictly inside (0, 1)
pub fn require_open_unit(value: f64, field: &'static str) -> Result<f64, InputError> {
    if value > 0.0 && value < 1.0 {
        Ok(value)
    } else {
        Err(InputError::ProbabilityOutOfRange { field, value })
    }
}

/// Require at least `min` observations
pub fn require_min_count(n: u64, min: u64, field: &'static str) -> Result<(), InputError> {
    if n == 0 && min > 0 {
        return Err(InputError::NonPositiveSampleSize { field });
    }
    if n < min {
        return Err(InputError::InsufficientSampleSize { field, min, got: n });
    }
    Ok(())
}

/// Calculate mean of values (caller guarantees non-empty)
pub fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Ranks over a list (1-indexed, average for ties)
///
/// Also returns the tie term Σ(t³ − t) over every group of tied values.
/// Values must be finite.
pub fn ranks(values: &[f64]) -> (Vec<f64>, f64) {
    let n = values.len();
    if n == 0 {
        return (vec![], 0.0);
    }

    let mut indexed: Vec<(f64, usize)> = values.iter().copied().zip(0..n).collect();
    indexed.sort_by(|(a, _), (b, _)| a.total_cmp(b));

    let mut result = vec![0.0; n];
    let mut tie_term = 0.0;
    let mut i = 0;

    while i < n {
        let mut j = i;
        // Find all elements with same value (ties)
        while j < n && indexed[j].0 == indexed[i].0 {
            j += 1;
        }

        // Average rank for ties: (i+1 + j) / 2
        let avg_rank = (i + j + 1) as f64 / 2.0;
        for item in &indexed[i..j] {
            result[item.1] = avg_rank;
        }

        let t = (j - i) as f64;
        tie_term += t * t * t - t;
        i = j;
    }

    (result, tie_term)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ranks_with_ties() {
        let (r, ties) = ranks(&[3.0, 1.0, 2.0, 2.0]);
        assert_eq!(r, vec![4.0, 1.0, 2.5, 2.5]);
        assert_eq!(ties, 6.0);
    }

    #[test]
    fn test_ranks_no_ties() {
        let (r, ties) = ranks(&[10.0, -1.0, 5.0]);
        assert_eq!(r, vec![3.0, 1.0, 2.0]);
        assert_eq!(ties, 0.0);
    }

    #[test]
    fn test_ranks_negative_zero_ties_with_zero() {
        let (r, ties) = ranks(&[0.0, -0.0]);
        assert_eq!(r, vec![1.5, 1.5]);
        assert_eq!(ties, 6.0);
    }

    #[test]
    fn test_number_arg() {
        let args = json!({"alpha": 0.1, "label": "x"});
        assert_eq!(number_arg(&args, "alpha", "f").unwrap(), 0.1);
        assert!(optional_number_arg(&args, "power", "f").unwrap().is_none());
        let err = number_arg(&args, "label", "f").unwrap_err();
        assert_eq!(err.code, abstat_core::codes::ARG_TYPE);
        let err = number_arg(&args, "power", "f").unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn test_require_open_unit() {
        assert!(require_open_unit(0.5, "p").is_ok());
        assert!(require_open_unit(0.0, "p").is_err());
        assert!(require_open_unit(1.0, "p").is_err());
        assert!(require_open_unit(f64::NAN, "p").is_err());
    }

    #[test]
    fn test_require_min_count() {
        assert_eq!(
            require_min_count(0, 2, "control"),
            Err(InputError::NonPositiveSampleSize { field: "control" })
        );
        assert_eq!(
            require_min_count(1, 2, "control"),
            Err(InputError::InsufficientSampleSize { field: "control", min: 2, got: 1 })
        );
        assert!(require_min_count(2, 2, "control").is_ok());
    }
}
