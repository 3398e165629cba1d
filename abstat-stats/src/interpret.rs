//! Significance decision and outcome category

use abstat_core::Interpretation;

/// Classification of a test outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub is_significant: bool,
    pub category: Interpretation,
}

impl Verdict {
    /// Outcome for valid input that cannot discriminate between groups
    pub fn inconclusive() -> Self {
        Self {
            is_significant: false,
            category: Interpretation::Inconclusive,
        }
    }
}

/// Classify a p-value against `alpha`; the sign of `effect_absolute`
/// (variant minus control) picks the direction.
pub fn classify(p_value: f64, alpha: f64, effect_absolute: f64) -> Verdict {
    if p_value.is_nan() || effect_absolute.is_nan() {
        return Verdict::inconclusive();
    }

    let category = if p_value < alpha && effect_absolute > 0.0 {
        Interpretation::SignificantPositive
    } else if p_value < alpha && effect_absolute < 0.0 {
        Interpretation::SignificantNegative
    } else {
        Interpretation::NotSignificant
    };

    Verdict {
        is_significant: category != Interpretation::NotSignificant,
        category,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_directions() {
        assert_eq!(classify(0.01, 0.05, 0.2).category, Interpretation::SignificantPositive);
        assert_eq!(classify(0.01, 0.05, -0.2).category, Interpretation::SignificantNegative);
        assert!(classify(0.01, 0.05, -0.2).is_significant);
    }

    #[test]
    fn test_classify_threshold_is_strict() {
        let v = classify(0.05, 0.05, 1.0);
        assert!(!v.is_significant);
        assert_eq!(v.category, Interpretation::NotSignificant);
    }

    #[test]
    fn test_classify_zero_effect_never_significant() {
        let v = classify(0.0, 0.05, 0.0);
        assert!(!v.is_significant);
        assert_eq!(v.category, Interpretation::NotSignificant);
    }

    #[test]
    fn test_classify_nan_is_inconclusive() {
        assert_eq!(classify(f64::NAN, 0.05, 1.0), Verdict::inconclusive());
    }
}
