use super::{BackoffStrategy, StrategyOptions};

/// Each retry doubles the delay: `2^attempt` seconds before jitter and scaling.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Exponential {
    options: StrategyOptions,
}

impl Exponential {
    pub fn new() -> Self {
        Self::default()
    }
}

option_setters!(Exponential);

impl BackoffStrategy for Exponential {
    fn base_delay(&self, attempt: u32) -> f64 {
        2f64.powf(f64::from(attempt))
    }

    fn options(&self) -> &StrategyOptions {
        &self.options
    }
}

#[test]
fn exponential_base_delay() {
    let strategy = Exponential::new();
    assert_eq!(strategy.base_delay(0), 1.0);
    assert_eq!(strategy.base_delay(1), 2.0);
    assert_eq!(strategy.base_delay(3), 8.0);
    assert_eq!(strategy.base_delay(10), 1024.0);
}

#[test]
fn exponential_with_factor() {
    use std::time::Duration;

    let strategy = Exponential::new().jitter(false).scale_factor(0.5);
    let mut iter = strategy.schedule();
    assert_eq!(iter.next(), Some(Duration::from_millis(500)));
    assert_eq!(iter.next(), Some(Duration::from_millis(1000)));
    assert_eq!(iter.next(), Some(Duration::from_millis(2000)));
    assert_eq!(iter.next(), Some(Duration::from_millis(4000)));
}

#[test]
fn exponential_overflow() {
    let strategy = Exponential::new().jitter(false);
    assert_eq!(strategy.wait_time(u32::MAX), std::time::Duration::MAX);
}
