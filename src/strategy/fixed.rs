use super::{BackoffStrategy, StrategyOptions};
use crate::error::InvalidArgument;

/// Each retry reads its base delay, in seconds, from a sequence.
///
/// Attempts past the end of the sequence keep using its last element. Without a sequence every
/// base delay is one second.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fixed {
    sequence: Option<Vec<u64>>,
    options: StrategyOptions,
}

impl Fixed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new [`Fixed`] that walks through `sequence`.
    pub fn from_sequence(sequence: impl IntoIterator<Item = u64>) -> Self {
        Self {
            sequence: Some(sequence.into_iter().collect()),
            options: StrategyOptions::default(),
        }
    }

    pub fn sequence(&self) -> Option<&[u64]> {
        self.sequence.as_deref()
    }
}

option_setters!(Fixed);

impl BackoffStrategy for Fixed {
    fn base_delay(&self, attempt: u32) -> f64 {
        let Some(sequence) = self.sequence.as_deref() else {
            return 1.0;
        };
        let index = usize::try_from(attempt).unwrap_or(usize::MAX);
        sequence
            .get(index)
            .or_else(|| sequence.last())
            .map_or(1.0, |&seconds| seconds as f64)
    }

    fn options(&self) -> &StrategyOptions {
        &self.options
    }

    fn validate(&self) -> Result<(), InvalidArgument> {
        if self.sequence.as_ref().is_some_and(Vec::is_empty) {
            return Err(InvalidArgument::new("fixed sequence must not be empty"));
        }
        self.options.validate()
    }
}

#[test]
fn fixed_pads_with_last_element() {
    let strategy = Fixed::from_sequence([2, 3, 4, 5]);
    assert_eq!(strategy.base_delay(0), 2.0);
    assert_eq!(strategy.base_delay(3), 5.0);
    assert_eq!(strategy.base_delay(5), 5.0);
    assert_eq!(strategy.base_delay(u32::MAX), 5.0);
}

#[test]
fn fixed_without_sequence() {
    let strategy = Fixed::new();
    assert_eq!(strategy.base_delay(0), 1.0);
    assert_eq!(strategy.base_delay(42), 1.0);
    assert!(strategy.validate().is_ok());
}

#[test]
fn fixed_rejects_empty_sequence() {
    let strategy = Fixed::from_sequence([]);
    assert!(strategy.validate().is_err());
}
