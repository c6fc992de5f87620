use super::{BackoffStrategy, StrategyOptions};
use crate::error::InvalidArgument;

/// Each retry waits `attempt^exponent` seconds. With the default exponent of `1` this behaves
/// like [`Linear`](super::Linear).
#[derive(Debug, Clone, PartialEq)]
pub struct Polynomial {
    exponent: f64,
    options: StrategyOptions,
}

impl Default for Polynomial {
    fn default() -> Self {
        Self {
            exponent: 1.0,
            options: StrategyOptions::default(),
        }
    }
}

impl Polynomial {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_exponent(exponent: f64) -> Self {
        Self {
            exponent,
            ..Self::default()
        }
    }

    pub fn exponent(&self) -> f64 {
        self.exponent
    }
}

option_setters!(Polynomial);

impl BackoffStrategy for Polynomial {
    fn base_delay(&self, attempt: u32) -> f64 {
        f64::from(attempt).powf(self.exponent)
    }

    fn options(&self) -> &StrategyOptions {
        &self.options
    }

    fn validate(&self) -> Result<(), InvalidArgument> {
        if !self.exponent.is_finite() {
            return Err(InvalidArgument::new(format!(
                "exponent must be a finite number, got {}",
                self.exponent
            )));
        }
        self.options.validate()
    }
}

#[test]
fn polynomial_squared() {
    let strategy = Polynomial::with_exponent(2.0);
    assert_eq!(strategy.base_delay(3), 9.0);
    assert_eq!(strategy.base_delay(0), 0.0);
}

#[test]
fn polynomial_defaults_to_linear() {
    let polynomial = Polynomial::new();
    let linear = super::Linear::new();
    for attempt in 0..10 {
        assert_eq!(polynomial.base_delay(attempt), linear.base_delay(attempt));
    }
}

#[test]
fn polynomial_rejects_non_finite_exponent() {
    assert!(Polynomial::with_exponent(f64::NAN).validate().is_err());
    assert!(Polynomial::with_exponent(0.5).validate().is_ok());
}
