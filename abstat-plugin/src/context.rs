//! Evaluation Context

/// Defaults applied when a request omits optional arguments
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalcContext {
    pub default_alpha: f64,
    pub default_power: f64,
}

impl CalcContext {
    pub fn new() -> Self {
        Self {
            default_alpha: 0.05,
            default_power: 0.8,
        }
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.default_alpha = alpha;
        self
    }

    pub fn with_power(mut self, power: f64) -> Self {
        self.default_power = power;
        self
    }
}

impl Default for CalcContext {
    fn default() -> Self {
        Self::new()
    }
}
