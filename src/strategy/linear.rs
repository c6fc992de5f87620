use super::{BackoffStrategy, StrategyOptions};

/// Each retry waits as many seconds as the attempt number.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Linear {
    options: StrategyOptions,
}

impl Linear {
    pub fn new() -> Self {
        Self::default()
    }
}

option_setters!(Linear);

impl BackoffStrategy for Linear {
    fn base_delay(&self, attempt: u32) -> f64 {
        f64::from(attempt)
    }

    fn options(&self) -> &StrategyOptions {
        &self.options
    }
}

#[test]
fn linear() {
    let strategy = Linear::new();
    for attempt in [0, 1, 7, 1_000] {
        assert_eq!(strategy.base_delay(attempt), f64::from(attempt));
    }
}
