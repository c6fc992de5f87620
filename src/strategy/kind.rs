use std::fmt;
use std::str::FromStr;

use super::{BackoffStrategy, Exponential, Fibonacci, Fixed, Linear, Polynomial, StrategyOptions};
use crate::error::InvalidArgument;

/// Names the available delay algorithms.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum StrategyKind {
    #[default]
    Exponential,
    Fibonacci,
    Fixed,
    Linear,
    Polynomial,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Exponential => "exponential",
            StrategyKind::Fibonacci => "fibonacci",
            StrategyKind::Fixed => "fixed",
            StrategyKind::Linear => "linear",
            StrategyKind::Polynomial => "polynomial",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = InvalidArgument;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exponential" => Ok(StrategyKind::Exponential),
            "fibonacci" => Ok(StrategyKind::Fibonacci),
            "fixed" => Ok(StrategyKind::Fixed),
            "linear" => Ok(StrategyKind::Linear),
            "polynomial" => Ok(StrategyKind::Polynomial),
            other => Err(InvalidArgument::new(format!(
                "unknown backoff strategy: {other}"
            ))),
        }
    }
}

/// Parameters for [`Strategy::new`]. Algorithm-specific fields are ignored by the algorithms
/// that do not use them.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StrategyParams {
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub options: StrategyOptions,
    /// Used by [`StrategyKind::Fixed`].
    pub sequence: Option<Vec<u64>>,
    /// Used by [`StrategyKind::Polynomial`]; defaults to `1`.
    pub exponent: Option<f64>,
}

/// A fully parameterized delay algorithm, selected at runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum Strategy {
    Exponential(Exponential),
    Fibonacci(Fibonacci),
    Fixed(Fixed),
    Linear(Linear),
    Polynomial(Polynomial),
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy::Exponential(Exponential::default())
    }
}

impl Strategy {
    /// Builds and validates the strategy named by `kind`.
    ///
    /// ```
    /// use backoff_utils::strategy::{BackoffStrategy, Strategy, StrategyKind, StrategyParams};
    ///
    /// let strategy = Strategy::new(
    ///     StrategyKind::Fixed,
    ///     StrategyParams { sequence: Some(vec![2, 3, 4, 5]), ..Default::default() },
    /// )
    /// .unwrap();
    /// assert_eq!(strategy.base_delay(5), 5.0);
    /// ```
    pub fn new(kind: StrategyKind, params: StrategyParams) -> Result<Self, InvalidArgument> {
        let StrategyParams {
            options,
            sequence,
            exponent,
        } = params;

        let strategy: Strategy = match kind {
            StrategyKind::Exponential => Exponential::new().with_options(options).into(),
            StrategyKind::Fibonacci => Fibonacci::new().with_options(options).into(),
            StrategyKind::Linear => Linear::new().with_options(options).into(),
            StrategyKind::Fixed => match sequence {
                Some(sequence) => Fixed::from_sequence(sequence).with_options(options).into(),
                None => Fixed::new().with_options(options).into(),
            },
            StrategyKind::Polynomial => Polynomial::with_exponent(exponent.unwrap_or(1.0))
                .with_options(options)
                .into(),
        };

        BackoffStrategy::validate(&strategy)?;
        Ok(strategy)
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            Strategy::Exponential(_) => StrategyKind::Exponential,
            Strategy::Fibonacci(_) => StrategyKind::Fibonacci,
            Strategy::Fixed(_) => StrategyKind::Fixed,
            Strategy::Linear(_) => StrategyKind::Linear,
            Strategy::Polynomial(_) => StrategyKind::Polynomial,
        }
    }

    fn as_dyn(&self) -> &dyn BackoffStrategy {
        match self {
            Strategy::Exponential(s) => s,
            Strategy::Fibonacci(s) => s,
            Strategy::Fixed(s) => s,
            Strategy::Linear(s) => s,
            Strategy::Polynomial(s) => s,
        }
    }
}

impl BackoffStrategy for Strategy {
    fn base_delay(&self, attempt: u32) -> f64 {
        self.as_dyn().base_delay(attempt)
    }

    fn options(&self) -> &StrategyOptions {
        self.as_dyn().options()
    }

    fn validate(&self) -> Result<(), InvalidArgument> {
        self.as_dyn().validate()
    }
}

macro_rules! from_variant {
    ($($name:ident),*) => {
        $(
            impl From<$name> for Strategy {
                fn from(strategy: $name) -> Self {
                    Strategy::$name(strategy)
                }
            }
        )*
    };
}

from_variant!(Exponential, Fibonacci, Fixed, Linear, Polynomial);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_kind_names() {
        assert_eq!("Exponential".parse::<StrategyKind>(), Ok(StrategyKind::Exponential));
        assert_eq!(" fibonacci ".parse::<StrategyKind>(), Ok(StrategyKind::Fibonacci));
        assert_eq!("FIXED".parse::<StrategyKind>(), Ok(StrategyKind::Fixed));
        assert_eq!("linear".parse::<StrategyKind>(), Ok(StrategyKind::Linear));
        assert_eq!("polynomial".parse::<StrategyKind>(), Ok(StrategyKind::Polynomial));
        assert!("".parse::<StrategyKind>().is_err());
        assert!("  ".parse::<StrategyKind>().is_err());
        assert!("quadratic".parse::<StrategyKind>().is_err());
    }

    #[test]
    fn kind_display_parses_back() {
        for kind in [
            StrategyKind::Exponential,
            StrategyKind::Fibonacci,
            StrategyKind::Fixed,
            StrategyKind::Linear,
            StrategyKind::Polynomial,
        ] {
            assert_eq!(kind.to_string().parse::<StrategyKind>(), Ok(kind));
        }
    }

    #[test]
    fn factory_builds_each_kind() {
        let exponential = Strategy::new(StrategyKind::Exponential, StrategyParams::default()).unwrap();
        assert_eq!(exponential.kind(), StrategyKind::Exponential);
        assert_eq!(exponential.base_delay(3), 8.0);

        let fibonacci = Strategy::new(StrategyKind::Fibonacci, StrategyParams::default()).unwrap();
        assert_eq!(fibonacci.base_delay(5), 8.0);

        let linear = Strategy::new(StrategyKind::Linear, StrategyParams::default()).unwrap();
        assert_eq!(linear.base_delay(4), 4.0);

        let polynomial = Strategy::new(
            StrategyKind::Polynomial,
            StrategyParams {
                exponent: Some(2.0),
                ..StrategyParams::default()
            },
        )
        .unwrap();
        assert_eq!(polynomial.base_delay(3), 9.0);

        let fixed = Strategy::new(StrategyKind::Fixed, StrategyParams::default()).unwrap();
        assert_eq!(fixed.base_delay(3), 1.0);
    }

    #[test]
    fn factory_validates() {
        let bad_scale = StrategyParams {
            options: StrategyOptions {
                scale_factor: 0.0,
                ..StrategyOptions::default()
            },
            ..StrategyParams::default()
        };
        assert!(Strategy::new(StrategyKind::Linear, bad_scale).is_err());

        let empty_sequence = StrategyParams {
            sequence: Some(Vec::new()),
            ..StrategyParams::default()
        };
        assert!(Strategy::new(StrategyKind::Fixed, empty_sequence).is_err());
    }

    #[test]
    fn options_pass_through() {
        let strategy = Strategy::new(
            StrategyKind::Exponential,
            StrategyParams {
                options: StrategyOptions {
                    jitter: false,
                    scale_factor: 3.0,
                    minimum: 0.0,
                },
                ..StrategyParams::default()
            },
        )
        .unwrap();
        assert_eq!(strategy.wait_time(1), std::time::Duration::from_secs(6));
    }

    #[test]
    fn default_is_exponential() {
        assert_eq!(Strategy::default().kind(), StrategyKind::Exponential);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn params_deserialize_with_defaults() {
        let params: StrategyParams =
            serde_json::from_str(r#"{"jitter": false, "sequence": [2, 3]}"#).unwrap();
        assert!(!params.options.jitter);
        assert_eq!(params.options.scale_factor, 1.0);
        assert_eq!(params.sequence, Some(vec![2, 3]));
        assert_eq!(params.exponent, None);

        let kind: StrategyKind = serde_json::from_str(r#""fibonacci""#).unwrap();
        assert_eq!(kind, StrategyKind::Fibonacci);
    }
}
