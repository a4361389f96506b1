//! Input validation for account registration.

use thiserror::Error;

use crate::FeedlingError;

/// Minimum username length.
pub const MIN_USERNAME_LENGTH: usize = 3;

/// Maximum username length.
pub const MAX_USERNAME_LENGTH: usize = 32;

/// Maximum email length.
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Username is too short.
    #[error("username must be at least {MIN_USERNAME_LENGTH} characters")]
    UsernameTooShort,

    /// Username is too long.
    #[error("username must be at most {MAX_USERNAME_LENGTH} characters")]
    UsernameTooLong,

    /// Username contains invalid characters.
    #[error("username can only contain letters, digits, underscores and hyphens")]
    UsernameInvalidChars,

    /// Email is missing.
    #[error("email is required")]
    EmailMissing,

    /// Email is too long.
    #[error("email must be at most {MAX_EMAIL_LENGTH} characters")]
    EmailTooLong,

    /// Email format is invalid.
    #[error("invalid email format")]
    EmailInvalidFormat,

    /// Password is missing.
    #[error("password is required")]
    PasswordMissing,
}

impl From<ValidationError> for FeedlingError {
    fn from(e: ValidationError) -> Self {
        FeedlingError::Validation(e.to_string())
    }
}

/// Validate a username: 3-32 ASCII letters, digits, `_` or `-`.
///
/// # Examples
///
/// ```
/// use feedling::auth::validation::validate_username;
///
/// assert!(validate_username("john_doe").is_ok());
/// assert!(validate_username("ab").is_err());
/// ```
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.len() < MIN_USERNAME_LENGTH {
        return Err(ValidationError::UsernameTooShort);
    }
    if username.len() > MAX_USERNAME_LENGTH {
        return Err(ValidationError::UsernameTooLong);
    }

    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(ValidationError::UsernameInvalidChars);
    }

    Ok(())
}

/// Validate an email address.
///
/// This is a basic shape check: one `@`, a non-empty local part, a dotted
/// domain and no whitespace.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() {
        return Err(ValidationError::EmailMissing);
    }
    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::EmailTooLong);
    }
    if email.chars().any(|c| c.is_whitespace()) {
        return Err(ValidationError::EmailInvalidFormat);
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err(ValidationError::EmailInvalidFormat);
    };
    if local.is_empty() || domain.contains('@') {
        return Err(ValidationError::EmailInvalidFormat);
    }
    if !domain.contains('.') || domain.split('.').any(|p| p.is_empty()) {
        return Err(ValidationError::EmailInvalidFormat);
    }

    Ok(())
}

/// Validate the login fields before any lookup.
pub fn validate_login(email: &str, password: &str) -> Result<(), ValidationError> {
    if email.trim().is_empty() {
        return Err(ValidationError::EmailMissing);
    }
    if password.is_empty() {
        return Err(ValidationError::PasswordMissing);
    }
    Ok(())
}
