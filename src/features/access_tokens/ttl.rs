//! Lifetime parsing for access tokens.
//!
//! Two encodings reach the API: the `<n>h|m|s` notation and a plain number of
//! milliseconds (what the share dialog computes from its expiry picker).

use chrono::Duration;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::core::error::AppError;
use crate::shared::constants::MAX_ACCESS_TOKEN_TTL_SECS;

lazy_static! {
    static ref TTL_REGEX: Regex = Regex::new(r"^(\d+)([hms])$").unwrap();
}

const FALLBACK_TTL_SECS: i64 = 3600;

/// Requested token lifetime
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum TtlInput {
    /// Milliseconds
    Millis(i64),
    /// `"<n>h"`, `"<n>m"` or `"<n>s"`
    Text(String),
}

/// Resolve a TTL. Unparseable text falls back to one hour; zero or negative
/// lifetimes are rejected; anything longer than 30 days is capped.
pub fn parse_ttl(input: &TtlInput) -> Result<Duration, AppError> {
    let ttl = match input {
        TtlInput::Millis(ms) if *ms <= 0 => Duration::zero(),
        TtlInput::Millis(ms) => Duration::try_milliseconds(*ms)
            .unwrap_or_else(|| Duration::seconds(MAX_ACCESS_TOKEN_TTL_SECS)),
        TtlInput::Text(text) => parse_text(text.trim()),
    };

    if ttl <= Duration::zero() {
        return Err(AppError::Validation(
            "Token lifetime must be positive".to_string(),
        ));
    }

    Ok(ttl.min(Duration::seconds(MAX_ACCESS_TOKEN_TTL_SECS)))
}

fn parse_text(text: &str) -> Duration {
    let Some(caps) = TTL_REGEX.captures(text) else {
        return Duration::seconds(FALLBACK_TTL_SECS);
    };

    let value = caps[1].parse::<i64>().unwrap_or(i64::MAX);
    let unit_secs = match &caps[2] {
        "h" => 3600,
        "m" => 60,
        _ => 1,
    };
    Duration::seconds(value.saturating_mul(unit_secs).min(MAX_ACCESS_TOKEN_TTL_SECS))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> TtlInput {
        TtlInput::Text(s.to_string())
    }

    #[test]
    fn test_text_units() {
        assert_eq!(parse_ttl(&text("2h")).unwrap(), Duration::hours(2));
        assert_eq!(parse_ttl(&text("15m")).unwrap(), Duration::minutes(15));
        assert_eq!(parse_ttl(&text("45s")).unwrap(), Duration::seconds(45));
    }

    #[test]
    fn test_unparseable_text_falls_back_to_one_hour() {
        assert_eq!(parse_ttl(&text("soon")).unwrap(), Duration::hours(1));
        assert_eq!(parse_ttl(&text("3d")).unwrap(), Duration::hours(1));
        assert_eq!(parse_ttl(&text("")).unwrap(), Duration::hours(1));
    }

    #[test]
    fn test_millis() {
        assert_eq!(
            parse_ttl(&TtlInput::Millis(90_000)).unwrap(),
            Duration::seconds(90)
        );
    }

    #[test]
    fn test_zero_and_negative_rejected() {
        assert!(parse_ttl(&TtlInput::Millis(0)).is_err());
        assert!(parse_ttl(&TtlInput::Millis(-5)).is_err());
        assert!(matches!(
            parse_ttl(&TtlInput::Millis(i64::MIN)),
            Err(AppError::Validation(_))
        ));
        assert!(parse_ttl(&text("0h")).is_err());
    }

    #[test]
    fn test_capped_at_thirty_days() {
        let cap = Duration::days(30);
        assert_eq!(parse_ttl(&text("9999h")).unwrap(), cap);
        assert_eq!(parse_ttl(&TtlInput::Millis(i64::MAX)).unwrap(), cap);
        assert_eq!(
            parse_ttl(&text("99999999999999999999999h")).unwrap(),
            cap
        );
    }

    #[test]
    fn test_deserializes_both_shapes() {
        let n: TtlInput = serde_json::from_str("3600000").unwrap();
        assert_eq!(n, TtlInput::Millis(3_600_000));
        let s: TtlInput = serde_json::from_str("\"1h\"").unwrap();
        assert_eq!(s, text("1h"));
    }
}
