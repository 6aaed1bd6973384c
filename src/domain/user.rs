use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use super::{FieldError, run_validators};

pub const NAME_MAX_LEN: usize = 50;
pub const PASSWORD_MIN_LEN: usize = 6;

/// Local part, `@`, dotted domain, alphabetic TLD. Underscores are allowed
/// in the local part but not in the domain.
static EMAIL_FORMAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[\w+\-.]+@[a-z\d\-.]+\.[a-z]+$").expect("email pattern is valid")
});

/// Signup request for a user account.
///
/// This struct is the whole mass-assignment surface: `admin`,
/// `password_digest` and `remember_token` are not bindable here.
/// `password` and `password_confirmation` are virtual, they never persist.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
}

type UserValidator = fn(&NewUser) -> Option<FieldError>;

const VALIDATORS: &[UserValidator] = &[
    name_present,
    name_length,
    email_present,
    email_format,
    password_present,
    password_length,
    password_confirmation_matches,
];

impl NewUser {
    /// Runs every validator in order and aggregates the failures.
    ///
    /// Email uniqueness is checked at save time, where the datastore is
    /// available; a collision joins the same failure list.
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        run_validators(self, VALIDATORS)
    }

    /// Canonical storage form of the email.
    #[must_use]
    pub fn normalized_email(&self) -> String {
        self.email.trim().to_lowercase()
    }
}

fn name_present(u: &NewUser) -> Option<FieldError> {
    u.name
        .trim()
        .is_empty()
        .then(|| FieldError::new("name", "can't be blank"))
}

fn name_length(u: &NewUser) -> Option<FieldError> {
    (u.name.chars().count() > NAME_MAX_LEN).then(|| {
        FieldError::new(
            "name",
            format!("is too long (maximum is {NAME_MAX_LEN} characters)"),
        )
    })
}

fn email_present(u: &NewUser) -> Option<FieldError> {
    u.email
        .trim()
        .is_empty()
        .then(|| FieldError::new("email", "can't be blank"))
}

fn email_format(u: &NewUser) -> Option<FieldError> {
    let email = u.email.trim();
    (!email.is_empty() && !EMAIL_FORMAT.is_match(email))
        .then(|| FieldError::new("email", "is invalid"))
}

fn password_present(u: &NewUser) -> Option<FieldError> {
    u.password
        .trim()
        .is_empty()
        .then(|| FieldError::new("password", "can't be blank"))
}

fn password_length(u: &NewUser) -> Option<FieldError> {
    let len = u.password.chars().count();
    (len > 0 && len < PASSWORD_MIN_LEN).then(|| {
        FieldError::new(
            "password",
            format!("is too short (minimum is {PASSWORD_MIN_LEN} characters)"),
        )
    })
}

fn password_confirmation_matches(u: &NewUser) -> Option<FieldError> {
    (u.password != u.password_confirmation)
        .then(|| FieldError::new("password_confirmation", "doesn't match password"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_user() -> NewUser {
        NewUser {
            name: "Example User".to_string(),
            email: "user@example.com".to_string(),
            password: "foobar".to_string(),
            password_confirmation: "foobar".to_string(),
        }
    }

    #[test]
    fn test_valid_user_passes() {
        assert!(valid_user().validate().is_ok());
    }

    #[test]
    fn test_blank_name_fails() {
        let mut user = valid_user();
        user.name = String::new();
        let errors = user.validate().unwrap_err();
        assert!(errors.iter().any(|e| e.field == "name"));

        user.name = "   ".to_string();
        assert!(user.validate().is_err());
    }

    #[test]
    fn test_long_name_fails() {
        let mut user = valid_user();
        user.name = "a".repeat(50);
        assert!(user.validate().is_ok());

        user.name = "a".repeat(51);
        let errors = user.validate().unwrap_err();
        assert!(errors.iter().any(|e| e.field == "name"));
    }

    #[test]
    fn test_invalid_email_formats_fail() {
        let mut user = valid_user();
        for addr in [
            "user@foo,com",
            "user_at_foo.org",
            "example.user@foo.",
            "foo@bar_baz.com",
            "fpp@bar+bas.com",
        ] {
            user.email = addr.to_string();
            let errors = user.validate().unwrap_err();
            assert!(
                errors.iter().any(|e| e.field == "email"),
                "expected {addr} to be rejected"
            );
        }
    }

    #[test]
    fn test_valid_email_formats_pass() {
        let mut user = valid_user();
        for addr in ["user@foo.COM", "A_US-ER@f.b.org", "frst.lst@fo.jp", "a+b@baz.cn"] {
            user.email = addr.to_string();
            assert!(user.validate().is_ok(), "expected {addr} to be accepted");
        }
    }

    #[test]
    fn test_normalized_email_is_lower_cased() {
        let mut user = valid_user();
        user.email = "Foo@ExAMPle.CoM".to_string();
        assert_eq!(user.normalized_email(), "foo@example.com");
    }

    #[test]
    fn test_blank_password_fails() {
        let mut user = valid_user();
        user.password = " ".to_string();
        user.password_confirmation = " ".to_string();
        let errors = user.validate().unwrap_err();
        assert!(errors.iter().any(|e| e.field == "password"));
    }

    #[test]
    fn test_short_password_fails() {
        let mut user = valid_user();
        user.password = "a".repeat(5);
        user.password_confirmation = user.password.clone();
        let errors = user.validate().unwrap_err();
        assert!(errors.iter().any(|e| e.field == "password"));
    }

    #[test]
    fn test_mismatched_confirmation_fails() {
        let mut user = valid_user();
        user.password_confirmation = "mismatch".to_string();
        let errors = user.validate().unwrap_err();
        assert!(errors.iter().any(|e| e.field == "password_confirmation"));
    }

    #[test]
    fn test_missing_confirmation_fails() {
        let mut user = valid_user();
        user.password_confirmation = String::new();
        assert!(user.validate().is_err());
    }

    #[test]
    fn test_failures_aggregate_across_fields() {
        let user = NewUser {
            name: String::new(),
            email: "not-an-email".to_string(),
            password: "short".to_string(),
            password_confirmation: "other".to_string(),
        };
        let errors = user.validate().unwrap_err();

        let fields: Vec<&str> = errors.iter().map(|e| e.field).collect();
        assert!(fields.contains(&"name"));
        assert!(fields.contains(&"email"));
        assert!(fields.contains(&"password"));
        assert!(fields.contains(&"password_confirmation"));
    }
}
