use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Exactly six ASCII digits, used for PINs and OTP codes
    /// - Valid: "000123", "987654"
    /// - Invalid: "12345", "1234567", "12a456", "١٢٣٤٥٦"
    pub static ref PIN_REGEX: Regex = Regex::new(r"^[0-9]{6}$").unwrap();

    /// Regex for validating username fields
    /// Must start with letter or underscore and contain only alphanumeric characters and underscores
    /// - Valid: "john_doe", "user123", "_admin", "JohnDoe"
    /// - Invalid: "123user", "-user", "user-name", "user name"
    pub static ref USERNAME_REGEX: Regex = Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$").unwrap();

    /// Loose phone number check: optional leading plus, digits, spaces and dashes
    pub static ref PHONE_REGEX: Regex = Regex::new(r"^\+?[0-9][0-9 \-]{5,19}$").unwrap();
}
