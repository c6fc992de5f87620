use super::{BackoffStrategy, StrategyOptions};

/// Each retry uses a delay which is the sum of the two previous delays: 1, 1, 2, 3, 5, 8, ...
///
/// Depending on the problem at hand, a fibonacci delay strategy might perform better and lead to
/// better throughput than the [`Exponential`](super::Exponential) strategy.
///
/// See ["A Performance Comparison of Different Backoff Algorithms under Different Rebroadcast
/// Probabilities for MANETs"](https://www.researchgate.net/publication/255672213_A_Performance_Comparison_of_Different_Backoff_Algorithms_under_Different_Rebroadcast_Probabilities_for_MANET's)
/// for more details.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fibonacci {
    options: StrategyOptions,
}

impl Fibonacci {
    pub fn new() -> Self {
        Self::default()
    }
}

option_setters!(Fibonacci);

impl BackoffStrategy for Fibonacci {
    fn base_delay(&self, attempt: u32) -> f64 {
        let (mut curr, mut next) = (1f64, 1f64);
        for _ in 0..attempt {
            (curr, next) = (next, curr + next);
            // Saturated; further additions cannot change the result.
            if curr.is_infinite() {
                break;
            }
        }
        curr
    }

    fn options(&self) -> &StrategyOptions {
        &self.options
    }
}

#[test]
fn fibonacci() {
    let strategy = Fibonacci::new();
    let delays: Vec<f64> = (0..8).map(|attempt| strategy.base_delay(attempt)).collect();
    assert_eq!(delays, [1.0, 1.0, 2.0, 3.0, 5.0, 8.0, 13.0, 21.0]);
}

#[test]
fn fibonacci_saturated() {
    let strategy = Fibonacci::new().jitter(false);
    assert!(strategy.base_delay(u32::MAX).is_infinite());
    assert_eq!(strategy.wait_time(5_000), std::time::Duration::MAX);
}
