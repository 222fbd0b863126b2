//! PIN and OTP primitives shared by the file, share, recycle-bin and account flows.
//!
//! Counters and codes are persisted by the callers; everything here is pure so the
//! lockout rules can be tested without a database.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use subtle::ConstantTimeEq;

/// Generate a random 6-digit one-time code
pub fn generate_otp() -> String {
    rand::thread_rng().gen_range(100_000..=999_999).to_string()
}

/// Constant-time comparison of a stored code with a supplied one
pub fn codes_match(expected: &str, supplied: &str) -> bool {
    bool::from(expected.as_bytes().ct_eq(supplied.as_bytes()))
}

/// Result of a single PIN attempt against a counter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinOutcome {
    Granted,
    Denied { remaining: i32 },
    /// This failure reached the attempt limit
    Locked,
}

impl PinOutcome {
    /// Evaluate an attempt given the failures recorded before it
    pub fn evaluate(matched: bool, previous_failures: i32, max_attempts: i32) -> Self {
        if matched {
            return PinOutcome::Granted;
        }

        let failures = previous_failures.max(0) + 1;
        if failures >= max_attempts {
            PinOutcome::Locked
        } else {
            PinOutcome::Denied {
                remaining: max_attempts - failures,
            }
        }
    }
}

/// Result of checking a stored OTP
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpOutcome {
    Valid,
    Mismatch,
    Expired,
    /// No OTP has been issued
    Missing,
}

impl OtpOutcome {
    pub fn check(
        stored: Option<&str>,
        expires_at: Option<DateTime<Utc>>,
        supplied: &str,
        now: DateTime<Utc>,
    ) -> Self {
        let Some(stored) = stored else {
            return OtpOutcome::Missing;
        };

        // A code without an expiry is treated as already expired
        match expires_at {
            Some(expiry) if expiry > now => {}
            _ => return OtpOutcome::Expired,
        }

        if codes_match(stored.trim(), supplied.trim()) {
            OtpOutcome::Valid
        } else {
            OtpOutcome::Mismatch
        }
    }

    pub fn is_valid(self) -> bool {
        self == OtpOutcome::Valid
    }
}

/// Whether an account-level PIN lock is still in force
pub fn lockout_active(
    failures: i32,
    last_attempt: Option<DateTime<Utc>>,
    max_attempts: i32,
    lockout: Duration,
    now: DateTime<Utc>,
) -> bool {
    if failures < max_attempts {
        return false;
    }
    match last_attempt {
        Some(at) => at + lockout > now,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_otp_is_six_digits() {
        for _ in 0..50 {
            let otp = generate_otp();
            assert_eq!(otp.len(), 6);
            assert!(otp.chars().all(|c| c.is_ascii_digit()));
            assert!(!otp.starts_with('0'));
        }
    }

    #[test]
    fn test_codes_match() {
        assert!(codes_match("123456", "123456"));
        assert!(!codes_match("123456", "123457"));
        assert!(!codes_match("123456", "12345"));
        assert!(!codes_match("123456", ""));
    }

    #[test]
    fn test_pin_outcome_sequence() {
        assert_eq!(PinOutcome::evaluate(true, 2, 3), PinOutcome::Granted);
        assert_eq!(
            PinOutcome::evaluate(false, 0, 3),
            PinOutcome::Denied { remaining: 2 }
        );
        assert_eq!(
            PinOutcome::evaluate(false, 1, 3),
            PinOutcome::Denied { remaining: 1 }
        );
        assert_eq!(PinOutcome::evaluate(false, 2, 3), PinOutcome::Locked);
    }

    #[test]
    fn test_pin_outcome_single_attempt_policy() {
        assert_eq!(PinOutcome::evaluate(false, 0, 1), PinOutcome::Locked);
    }

    #[test]
    fn test_otp_valid_and_mismatch() {
        let now = Utc::now();
        let expiry = Some(now + Duration::minutes(10));
        assert_eq!(
            OtpOutcome::check(Some("654321"), expiry, "654321", now),
            OtpOutcome::Valid
        );
        assert_eq!(
            OtpOutcome::check(Some("654321"), expiry, "000000", now),
            OtpOutcome::Mismatch
        );
    }

    #[test]
    fn test_otp_expired_even_when_matching() {
        let now = Utc::now();
        let outcome = OtpOutcome::check(
            Some("654321"),
            Some(now - Duration::seconds(1)),
            "654321",
            now,
        );
        assert_eq!(outcome, OtpOutcome::Expired);
        assert!(!outcome.is_valid());
        assert_eq!(
            OtpOutcome::check(Some("654321"), None, "654321", now),
            OtpOutcome::Expired
        );
    }

    #[test]
    fn test_otp_missing() {
        assert_eq!(
            OtpOutcome::check(None, None, "654321", Utc::now()),
            OtpOutcome::Missing
        );
    }

    #[test]
    fn test_lockout_window() {
        let now = Utc::now();
        let day = Duration::hours(24);
        assert!(lockout_active(3, Some(now - Duration::hours(1)), 3, day, now));
        assert!(!lockout_active(3, Some(now - Duration::hours(25)), 3, day, now));
        assert!(!lockout_active(2, Some(now), 3, day, now));
        assert!(!lockout_active(3, None, 3, day, now));
    }
}
