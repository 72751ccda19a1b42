//! Loosely typed retry settings.
//!
//! Settings coming from configuration files or the environment are often
//! strings, or missing, or just wrong. Numeric fields are coerced to integers
//! the forgiving way: a leading run of digits is enough (`"250ms"` is 250),
//! and anything unusable falls back to the default instead of failing.

use crate::retry::{
    BackoffWindow, DEFAULT_RETRY_BACKOFF_MAX_MS, DEFAULT_RETRY_BACKOFF_MIN_MS,
    DEFAULT_RETRY_MAX_COUNT,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Environment variable for the backoff window start, in milliseconds.
pub const ENV_BACKOFF_START_MS: &str = "REPEATABLE_BACKOFF_START_MS";

/// Environment variable for the backoff window end, in milliseconds.
pub const ENV_BACKOFF_END_MS: &str = "REPEATABLE_BACKOFF_END_MS";

/// Environment variable for the retry budget.
pub const ENV_MAX_RETRY_COUNT: &str = "REPEATABLE_MAX_RETRY_COUNT";

/// Raw `{ start, end }` bounds of the backoff window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffRangeSettings {
    /// Window start in milliseconds.
    pub start: Option<Value>,
    /// Window end in milliseconds.
    pub end: Option<Value>,
}

/// Retry settings as read from an untyped source.
///
/// Accepts `snake_case` and `camelCase` field names.
///
/// # Examples
///
/// ```rust
/// use repeatable_request::settings::RetrySettings;
///
/// let settings: RetrySettings = serde_json::from_str(
///     r#"{ "backoffRange": { "start": "50", "end": 100.9 }, "maxRetryCount": "oops" }"#,
/// ).unwrap();
///
/// assert_eq!(settings.backoff_window().start_ms(), 50);
/// assert_eq!(settings.backoff_window().end_ms(), 100);
/// assert_eq!(settings.max_retry_count(), 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Backoff window bounds.
    #[serde(alias = "backoffRange")]
    pub backoff_range: Option<BackoffRangeSettings>,

    /// Maximum number of retries after the first attempt.
    #[serde(alias = "maxRetryCount")]
    pub max_retry_count: Option<Value>,
}

impl RetrySettings {
    /// Load settings from environment variables.
    ///
    /// This will look for:
    /// - `REPEATABLE_BACKOFF_START_MS` for the window start
    /// - `REPEATABLE_BACKOFF_END_MS` for the window end
    /// - `REPEATABLE_MAX_RETRY_COUNT` for the retry budget
    ///
    /// Unset variables keep their defaults.
    pub fn from_env() -> Self {
        use std::env;

        let var = |name: &str| env::var(name).ok().map(Value::String);

        let start = var(ENV_BACKOFF_START_MS);
        let end = var(ENV_BACKOFF_END_MS);
        let backoff_range = (start.is_some() || end.is_some())
            .then_some(BackoffRangeSettings { start, end });

        Self {
            backoff_range,
            max_retry_count: var(ENV_MAX_RETRY_COUNT),
        }
    }

    /// The backoff window, with unusable bounds replaced by defaults.
    pub fn backoff_window(&self) -> BackoffWindow {
        let range = self.backoff_range.as_ref();
        let start = range
            .and_then(|r| r.start.as_ref())
            .and_then(coerce_int)
            .unwrap_or(DEFAULT_RETRY_BACKOFF_MIN_MS);
        let end = range
            .and_then(|r| r.end.as_ref())
            .and_then(coerce_int)
            .unwrap_or(DEFAULT_RETRY_BACKOFF_MAX_MS);
        BackoffWindow::new(start, end)
    }

    /// The retry budget. Unusable values give the default, negative ones zero.
    pub fn max_retry_count(&self) -> u32 {
        match self.max_retry_count.as_ref().and_then(coerce_int) {
            Some(count) => u32::try_from(count.max(0)).unwrap_or(u32::MAX),
            None => DEFAULT_RETRY_MAX_COUNT,
        }
    }
}

/// Coerce a loose value to an integer.
///
/// Numbers truncate toward zero. Strings yield their leading integer after
/// optional whitespace and sign. Everything else is `None`.
pub fn coerce_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite())
                .map(|f| f.trunc() as i64)
        }),
        Value::String(s) => leading_int(s),
        _ => None,
    }
}

fn leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }

    // Overflowing digit runs saturate
    let magnitude = digits[..end].parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -magnitude } else { magnitude })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(json!(42), Some(42))]
    #[case(json!(-7), Some(-7))]
    #[case(json!(99.9), Some(99))]
    #[case(json!(-2.5), Some(-2))]
    #[case(json!("250"), Some(250))]
    #[case(json!("  250ms"), Some(250))]
    #[case(json!("+15"), Some(15))]
    #[case(json!("-15x"), Some(-15))]
    #[case(json!("ms250"), None)]
    #[case(json!(""), None)]
    #[case(json!("-"), None)]
    #[case(json!(true), None)]
    #[case(json!(null), None)]
    #[case(json!({ "start": 1 }), None)]
    #[case(json!([1, 2]), None)]
    fn test_coerce_int(#[case] value: Value, #[case] expected: Option<i64>) {
        assert_eq!(coerce_int(&value), expected);
    }

    #[test]
    fn test_empty_settings_use_defaults() {
        let settings = RetrySettings::default();

        assert_eq!(settings.backoff_window(), BackoffWindow::new(500, 1000));
        assert_eq!(settings.max_retry_count(), 3);
    }

    #[test]
    fn test_zero_retry_count_is_respected() {
        let settings: RetrySettings =
            serde_json::from_value(json!({ "max_retry_count": 0 })).unwrap();

        assert_eq!(settings.max_retry_count(), 0);
    }

    #[test]
    fn test_negative_retry_count_disables_retries() {
        let settings: RetrySettings =
            serde_json::from_value(json!({ "maxRetryCount": "-4" })).unwrap();

        assert_eq!(settings.max_retry_count(), 0);
    }

    #[test]
    fn test_partial_range_falls_back_per_bound() {
        let settings: RetrySettings =
            serde_json::from_value(json!({ "backoffRange": { "start": 50 } })).unwrap();

        assert_eq!(settings.backoff_window().start_ms(), 50);
        assert_eq!(settings.backoff_window().end_ms(), 1000);
    }

    #[test]
    fn test_garbage_values_fall_back() {
        let settings: RetrySettings = serde_json::from_value(json!({
            "backoff_range": { "start": "soon", "end": false },
            "max_retry_count": { "n": 2 },
        }))
        .unwrap();

        assert_eq!(settings.backoff_window(), BackoffWindow::default());
        assert_eq!(settings.max_retry_count(), 3);
    }

    #[test]
    fn test_out_of_range_bounds_keep_their_end() {
        let settings: RetrySettings = serde_json::from_value(json!({
            "backoffRange": { "start": "-99999999999999999999999", "end": 1e300 },
        }))
        .unwrap();

        let window = settings.backoff_window();
        assert_eq!(window.start_ms(), -i64::MAX);
        assert_eq!(window.end_ms(), i64::MAX);
    }

    #[test]
    fn test_swapped_range_is_kept() {
        let settings: RetrySettings = serde_json::from_value(json!({
            "backoffRange": { "start": 900, "end": 300 },
        }))
        .unwrap();

        assert_eq!(settings.backoff_window().delta_ms(), -600);
    }

    #[test]
    fn test_from_toml() {
        let settings: RetrySettings = toml::from_str(
            r#"
            max_retry_count = 5

            [backoff_range]
            start = "50ms"
            end = 100
            "#,
        )
        .unwrap();

        assert_eq!(settings.max_retry_count(), 5);
        assert_eq!(settings.backoff_window(), BackoffWindow::new(50, 100));
    }

    #[test]
    fn test_from_env() {
        temp_env::with_vars(
            [
                (ENV_BACKOFF_START_MS, Some("50")),
                (ENV_BACKOFF_END_MS, Some("100")),
                (ENV_MAX_RETRY_COUNT, Some("5")),
            ],
            || {
                let settings = RetrySettings::from_env();
                assert_eq!(settings.backoff_window(), BackoffWindow::new(50, 100));
                assert_eq!(settings.max_retry_count(), 5);
            },
        );
    }

    #[test]
    fn test_from_env_unset() {
        temp_env::with_vars_unset(
            [ENV_BACKOFF_START_MS, ENV_BACKOFF_END_MS, ENV_MAX_RETRY_COUNT],
            || {
                let settings = RetrySettings::from_env();
                assert_eq!(settings, RetrySettings::default());
                assert_eq!(settings.max_retry_count(), 3);
            },
        );
    }

    #[test]
    fn test_from_env_garbage() {
        temp_env::with_vars(
            [
                (ENV_BACKOFF_START_MS, Some("fast")),
                (ENV_MAX_RETRY_COUNT, Some("lots")),
            ],
            || {
                let settings = RetrySettings::from_env();
                assert_eq!(settings.backoff_window(), BackoffWindow::default());
                assert_eq!(settings.max_retry_count(), 3);
            },
        );
    }
}
