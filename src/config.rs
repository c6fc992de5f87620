use std::time::Duration;

use crate::error::InvalidArgument;

/// Environment variable holding the default try count.
pub const ENV_DEFAULT_TRIES: &str = "BACKOFF_DEFAULT_TRIES";
/// Environment variable holding the default deadline, in seconds.
pub const ENV_DEFAULT_DELAY: &str = "BACKOFF_DEFAULT_DELAY";

const DEFAULT_MAX_TRIES: u32 = 3;

/// Defaults applied when a call leaves the try count or the deadline unset.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BackoffConfig {
    /// Number of retries after the initial attempt.
    pub max_tries: u32,
    /// Deadline in seconds, measured from the first attempt. `None` disables it.
    pub max_delay: Option<f64>,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            max_tries: DEFAULT_MAX_TRIES,
            max_delay: None,
        }
    }
}

impl BackoffConfig {
    /// Reads [`ENV_DEFAULT_TRIES`] and [`ENV_DEFAULT_DELAY`] from the process environment.
    pub fn from_env() -> Result<Self, InvalidArgument> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env), reading values through `lookup`.
    ///
    /// ```
    /// use backoff_utils::BackoffConfig;
    ///
    /// let config = BackoffConfig::from_lookup(|key| match key {
    ///     "BACKOFF_DEFAULT_TRIES" => Some("5".to_string()),
    ///     _ => None,
    /// })
    /// .unwrap();
    /// assert_eq!(config.max_tries, 5);
    /// assert_eq!(config.max_delay, None);
    /// ```
    pub fn from_lookup<F>(lookup: F) -> Result<Self, InvalidArgument>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_DEFAULT_TRIES) {
            config.max_tries = raw.trim().parse().map_err(|_| {
                InvalidArgument::new(format!(
                    "{ENV_DEFAULT_TRIES} must be a non-negative integer, got {raw:?}"
                ))
            })?;
        }

        if let Some(raw) = lookup(ENV_DEFAULT_DELAY) {
            let trimmed = raw.trim();
            if !trimmed.is_empty() {
                let seconds: f64 = trimmed.parse().map_err(|_| {
                    InvalidArgument::new(format!(
                        "{ENV_DEFAULT_DELAY} must be a number of seconds, got {raw:?}"
                    ))
                })?;
                config.max_delay = Some(seconds);
            }
        }

        config.deadline()?;
        Ok(config)
    }

    /// The configured deadline as a [`Duration`].
    pub fn deadline(&self) -> Result<Option<Duration>, InvalidArgument> {
        self.max_delay
            .map(|seconds| {
                Duration::try_from_secs_f64(seconds).map_err(|_| {
                    InvalidArgument::new(format!(
                        "max_delay must be a non-negative number of seconds, got {seconds}"
                    ))
                })
            })
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn default_values() {
        let config = BackoffConfig::default();
        assert_eq!(config.max_tries, 3);
        assert_eq!(config.max_delay, None);
        assert_eq!(config.deadline(), Ok(None));
    }

    #[test]
    fn missing_variables_keep_defaults() {
        let config = BackoffConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, BackoffConfig::default());
    }

    #[test]
    fn reads_both_variables() {
        let config = BackoffConfig::from_lookup(lookup(&[
            (ENV_DEFAULT_TRIES, " 7 "),
            (ENV_DEFAULT_DELAY, "2.5"),
        ]))
        .unwrap();
        assert_eq!(config.max_tries, 7);
        assert_eq!(config.deadline(), Ok(Some(Duration::from_millis(2500))));
    }

    #[test]
    fn empty_delay_means_no_deadline() {
        let config = BackoffConfig::from_lookup(lookup(&[(ENV_DEFAULT_DELAY, "")])).unwrap();
        assert_eq!(config.max_delay, None);
    }

    #[test]
    fn rejects_unparseable_values() {
        assert!(BackoffConfig::from_lookup(lookup(&[(ENV_DEFAULT_TRIES, "three")])).is_err());
        assert!(BackoffConfig::from_lookup(lookup(&[(ENV_DEFAULT_TRIES, "-1")])).is_err());
        assert!(BackoffConfig::from_lookup(lookup(&[(ENV_DEFAULT_DELAY, "soon")])).is_err());
        assert!(BackoffConfig::from_lookup(lookup(&[(ENV_DEFAULT_DELAY, "-4")])).is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_uses_defaults_for_missing_fields() {
        let config: BackoffConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, BackoffConfig::default());

        let config: BackoffConfig = serde_json::from_str(r#"{"max_delay": 30.0}"#).unwrap();
        assert_eq!(config.max_tries, 3);
        assert_eq!(config.deadline(), Ok(Some(Duration::from_secs(30))));
    }
}
