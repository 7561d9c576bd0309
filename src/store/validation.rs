//! Registration rules for usernames, emails and passwords.
//!
//! Every violated rule is reported, not just the first, so a client can show
//! the full list in one round trip.

use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

const DEFAULT_REQUIRED_LENGTH: usize = 6;
const DEFAULT_REQUIRED_UNIQUE_CHARS: usize = 1;

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub code: String,
    pub description: String,
}

impl ValidationError {
    fn new(code: &str, description: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            description: description.into(),
        }
    }

    #[must_use]
    pub fn duplicate_username(username: &str) -> Self {
        Self::new(
            "DuplicateUserName",
            format!("Username '{username}' is already taken."),
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PasswordPolicy {
    pub required_length: usize,
    pub required_unique_chars: usize,
    pub require_digit: bool,
    pub require_lowercase: bool,
    pub require_uppercase: bool,
    pub require_non_alphanumeric: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            required_length: DEFAULT_REQUIRED_LENGTH,
            required_unique_chars: DEFAULT_REQUIRED_UNIQUE_CHARS,
            require_digit: true,
            require_lowercase: true,
            require_uppercase: true,
            require_non_alphanumeric: true,
        }
    }
}

impl PasswordPolicy {
    #[must_use]
    pub fn with_required_length(mut self, length: usize) -> Self {
        self.required_length = length;
        self
    }

    /// Check `password` and return every rule it breaks.
    #[must_use]
    pub fn validate(&self, password: &str) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if password.chars().count() < self.required_length {
            errors.push(ValidationError::new(
                "PasswordTooShort",
                format!(
                    "Passwords must be at least {} characters.",
                    self.required_length
                ),
            ));
        }

        if self.require_non_alphanumeric && password.chars().all(|c| c.is_ascii_alphanumeric()) {
            errors.push(ValidationError::new(
                "PasswordRequiresNonAlphanumeric",
                "Passwords must have at least one non alphanumeric character.",
            ));
        }

        if self.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
            errors.push(ValidationError::new(
                "PasswordRequiresDigit",
                "Passwords must have at least one digit ('0'-'9').",
            ));
        }

        if self.require_lowercase && !password.chars().any(|c| c.is_ascii_lowercase()) {
            errors.push(ValidationError::new(
                "PasswordRequiresLower",
                "Passwords must have at least one lowercase ('a'-'z').",
            ));
        }

        if self.require_uppercase && !password.chars().any(|c| c.is_ascii_uppercase()) {
            errors.push(ValidationError::new(
                "PasswordRequiresUpper",
                "Passwords must have at least one uppercase ('A'-'Z').",
            ));
        }

        let mut unique: Vec<char> = password.chars().collect();
        unique.sort_unstable();
        unique.dedup();
        if unique.len() < self.required_unique_chars {
            errors.push(ValidationError::new(
                "PasswordRequiresUniqueChars",
                format!(
                    "Passwords must use at least {} different characters.",
                    self.required_unique_chars
                ),
            ));
        }

        errors
    }
}

/// Usernames may contain letters, digits and `-._@+`.
fn valid_username(username: &str) -> bool {
    Regex::new(r"^[A-Za-z0-9\-._@+]+$").is_ok_and(|re| re.is_match(username))
}

/// Lightweight email sanity check.
fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email))
}

/// Validate everything about a registration except username uniqueness,
/// which only the store can decide.
#[must_use]
pub fn validate_registration(
    username: &str,
    email: Option<&str>,
    password: &str,
    policy: &PasswordPolicy,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if !valid_username(username) {
        errors.push(ValidationError::new(
            "InvalidUserName",
            format!("Username '{username}' is invalid, can only contain letters or digits."),
        ));
    }

    if let Some(email) = email {
        if !valid_email(email) {
            errors.push(ValidationError::new(
                "InvalidEmail",
                format!("Email '{email}' is invalid."),
            ));
        }
    }

    errors.extend(policy.validate(password));

    errors
}
