//! Registration field validation.
//!
//! Messages are returned to the caller verbatim.

use std::sync::LazyLock;

use regex::Regex;
use tessera_core::error::{TesseraError, TesseraResult};

static USERNAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_]{3,20}$").expect("valid username regex"));
static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));
static MOBILE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{10}$").expect("valid mobile regex"));
static NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z]{2,30}$").expect("valid name regex"));

pub const INVALID_USERNAME: &str =
    "Invalid username. Must be 3-20 characters long and contain only letters, numbers, or underscores.";
pub const INVALID_EMAIL: &str = "Invalid email format.";
pub const INVALID_MOBILE: &str = "Invalid mobile number. Must be exactly 10 digits.";
pub const INVALID_FIRST_NAME: &str = "First name must be between 2-30 alphabetic characters.";
pub const INVALID_MIDDLE_NAME: &str =
    "Middle name must be between 2-30 alphabetic characters (if provided).";
pub const INVALID_LAST_NAME: &str =
    "Last name must be between 2-30 alphabetic characters (if provided).";

fn check(re: &Regex, value: &str, message: &str) -> TesseraResult<()> {
    if re.is_match(value) {
        Ok(())
    } else {
        Err(TesseraError::validation(message))
    }
}

/// Fields of a self-service registration after decryption.
#[derive(Debug, Clone, Copy)]
pub struct RegistrationFields<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub mobile: &'a str,
    pub first_name: &'a str,
    pub middle_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
}

/// Validate a registration, reporting the first failing field.
/// Empty optional names count as absent.
pub fn validate_registration(fields: &RegistrationFields<'_>) -> TesseraResult<()> {
    check(&USERNAME, fields.username, INVALID_USERNAME)?;
    check(&EMAIL, fields.email, INVALID_EMAIL)?;
    check(&MOBILE, fields.mobile, INVALID_MOBILE)?;
    check(&NAME, fields.first_name, INVALID_FIRST_NAME)?;
    if let Some(middle) = fields.middle_name.filter(|s| !s.is_empty()) {
        check(&NAME, middle, INVALID_MIDDLE_NAME)?;
    }
    if let Some(last) = fields.last_name.filter(|s| !s.is_empty()) {
        check(&NAME, last, INVALID_LAST_NAME)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> RegistrationFields<'static> {
        RegistrationFields {
            username: "alice_01",
            email: "alice@example.com",
            mobile: "9876543210",
            first_name: "Alice",
            middle_name: None,
            last_name: Some("Smith"),
        }
    }

    fn message(fields: RegistrationFields<'_>) -> String {
        validate_registration(&fields).unwrap_err().to_string()
    }

    #[test]
    fn accepts_valid_registration() {
        validate_registration(&valid()).unwrap();
    }

    #[test]
    fn username_rules() {
        for bad in ["ab", "a".repeat(21).as_str(), "alice!", "al ice"] {
            let fields = RegistrationFields {
                username: bad,
                ..valid()
            };
            assert_eq!(message(fields), INVALID_USERNAME);
        }
        let fields = RegistrationFields {
            username: "abc",
            ..valid()
        };
        validate_registration(&fields).unwrap();
    }

    #[test]
    fn email_mobile_and_names() {
        assert_eq!(
            message(RegistrationFields {
                email: "alice@example",
                ..valid()
            }),
            INVALID_EMAIL
        );
        assert_eq!(
            message(RegistrationFields {
                mobile: "12345",
                ..valid()
            }),
            INVALID_MOBILE
        );
        // Only ASCII digits count; Arabic-Indic digits are rejected.
        assert_eq!(
            message(RegistrationFields {
                mobile: "٠١٢٣٤٥٦٧٨٩",
                ..valid()
            }),
            INVALID_MOBILE
        );
        assert_eq!(
            message(RegistrationFields {
                first_name: "A",
                ..valid()
            }),
            INVALID_FIRST_NAME
        );
        assert_eq!(
            message(RegistrationFields {
                middle_name: Some("J."),
                ..valid()
            }),
            INVALID_MIDDLE_NAME
        );
        assert_eq!(
            message(RegistrationFields {
                last_name: Some("O'Neil"),
                ..valid()
            }),
            INVALID_LAST_NAME
        );
    }

    #[test]
    fn empty_optional_names_are_ignored() {
        let fields = RegistrationFields {
            middle_name: Some(""),
            last_name: Some(""),
            ..valid()
        };
        validate_registration(&fields).unwrap();
    }

    #[test]
    fn first_failure_wins() {
        let fields = RegistrationFields {
            username: "x",
            email: "nope",
            ..valid()
        };
        assert_eq!(message(fields), INVALID_USERNAME);
    }
}
