//! Client-side form validation.
//!
//! Checks run before a request is sent, producing field errors in the same
//! `field -> messages` shape as [`ApiError::Validation`](crate::ApiError).

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::models::{ChangePasswordRequest, PasswordResetConfirmRequest, RegisterRequest};

// =============================================================================
// Patterns
// =============================================================================

static USERNAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("Invalid username regex"));

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)+$")
        .expect("Invalid email regex")
});

static LOWERCASE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-z]").expect("Invalid lowercase regex"));

static UPPERCASE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Z]").expect("Invalid uppercase regex"));

static DIGIT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d").expect("Invalid digit regex"));

static SPECIAL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[!@#$%^&*(),.?":{}|<>]"#).expect("Invalid special char regex"));

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MIN_USERNAME_LEN: usize = 3;
pub const MAX_USERNAME_LEN: usize = 29;

/// Field name to messages.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

// =============================================================================
// Password strength
// =============================================================================

/// One password rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PasswordRule {
    Length,
    Lowercase,
    Uppercase,
    Digit,
    Special,
}

impl PasswordRule {
    pub const ALL: [PasswordRule; 5] = [
        Self::Length,
        Self::Lowercase,
        Self::Uppercase,
        Self::Digit,
        Self::Special,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Length => "At least 8 characters",
            Self::Lowercase => "One lowercase letter",
            Self::Uppercase => "One uppercase letter",
            Self::Digit => "One number",
            Self::Special => "One special character",
        }
    }

    /// Message reported when the rule is not met.
    pub fn error_message(self) -> &'static str {
        match self {
            Self::Length => "Password must be at least 8 characters",
            Self::Lowercase => "Password must contain at least one lowercase letter",
            Self::Uppercase => "Password must contain at least one uppercase letter",
            Self::Digit => "Password must contain at least one number",
            Self::Special => "Password must contain at least one special character",
        }
    }

    pub fn is_met(self, password: &str) -> bool {
        match self {
            Self::Length => password.chars().count() >= MIN_PASSWORD_LEN,
            Self::Lowercase => LOWERCASE_REGEX.is_match(password),
            Self::Uppercase => UPPERCASE_REGEX.is_match(password),
            Self::Digit => DIGIT_REGEX.is_match(password),
            Self::Special => SPECIAL_REGEX.is_match(password),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StrengthLevel {
    VeryWeak,
    Weak,
    Fair,
    Good,
    Strong,
}

impl StrengthLevel {
    fn from_percentage(percentage: u8) -> Self {
        match percentage {
            0..=20 => Self::VeryWeak,
            21..=40 => Self::Weak,
            41..=60 => Self::Fair,
            61..=80 => Self::Good,
            _ => Self::Strong,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::VeryWeak => "very weak",
            Self::Weak => "weak",
            Self::Fair => "fair",
            Self::Good => "good",
            Self::Strong => "strong",
        }
    }
}

/// Result of scoring a password against every [`PasswordRule`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordStrength {
    pub rules: Vec<(PasswordRule, bool)>,
    pub percentage: u8,
    pub level: StrengthLevel,
}

impl PasswordStrength {
    pub fn evaluate(password: &str) -> Self {
        let rules: Vec<(PasswordRule, bool)> = PasswordRule::ALL
            .into_iter()
            .map(|rule| (rule, rule.is_met(password)))
            .collect();
        let met = rules.iter().filter(|(_, ok)| *ok).count();
        let percentage = (met * 100 / PasswordRule::ALL.len()) as u8;
        Self {
            rules,
            percentage,
            level: StrengthLevel::from_percentage(percentage),
        }
    }

    pub fn is_acceptable(&self) -> bool {
        self.rules.iter().all(|(_, ok)| *ok)
    }

    pub fn unmet(&self) -> impl Iterator<Item = PasswordRule> + '_ {
        self.rules.iter().filter(|(_, ok)| !ok).map(|(rule, _)| *rule)
    }
}

// =============================================================================
// Form validation
// =============================================================================

fn push(errors: &mut FieldErrors, field: &str, message: impl Into<String>) {
    errors
        .entry(field.to_string())
        .or_default()
        .push(message.into());
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email.trim())
}

fn check_email(errors: &mut FieldErrors, field: &str, email: &str) {
    if email.trim().is_empty() {
        push(errors, field, "Email is required");
    } else if !is_valid_email(email) {
        push(errors, field, "Please enter a valid email address");
    }
}

fn check_new_password(
    errors: &mut FieldErrors,
    field: &str,
    confirm_field: &str,
    password: &str,
    confirm: &str,
) {
    for rule in PasswordStrength::evaluate(password).unmet() {
        push(errors, field, rule.error_message());
    }
    if confirm.is_empty() {
        push(errors, confirm_field, "Please confirm your password");
    } else if password != confirm {
        push(errors, confirm_field, "Passwords do not match");
    }
}

fn into_result(errors: FieldErrors) -> Result<(), FieldErrors> {
    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

pub fn validate_registration(request: &RegisterRequest) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();

    let username = request.username.trim();
    let len = username.chars().count();
    if len < MIN_USERNAME_LEN {
        push(&mut errors, "username", "Username must be at least 3 characters");
    } else if len > MAX_USERNAME_LEN {
        push(&mut errors, "username", "Username must be less than 30 characters");
    }
    if !username.is_empty() && !USERNAME_REGEX.is_match(username) {
        push(
            &mut errors,
            "username",
            "Username can only contain letters, numbers, and underscores",
        );
    }

    check_email(&mut errors, "email", &request.email);
    check_new_password(
        &mut errors,
        "password",
        "password_confirm",
        &request.password,
        &request.password_confirm,
    );
    into_result(errors)
}

pub fn validate_password_change(request: &ChangePasswordRequest) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    if request.old_password.is_empty() {
        push(&mut errors, "old_password", "Current password is required");
    }
    check_new_password(
        &mut errors,
        "new_password",
        "new_password_confirm",
        &request.new_password,
        &request.new_password_confirm,
    );
    into_result(errors)
}

pub fn validate_password_reset(request: &PasswordResetConfirmRequest) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    if request.token.trim().is_empty() {
        push(&mut errors, "token", "Reset token is required");
    }
    check_new_password(
        &mut errors,
        "password",
        "password_confirm",
        &request.password,
        &request.password_confirm,
    );
    into_result(errors)
}

pub fn validate_login(email: &str, password: &str) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    check_email(&mut errors, "email", email);
    if password.is_empty() {
        push(&mut errors, "password", "Password is required");
    }
    into_result(errors)
}
