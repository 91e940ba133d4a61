//! Field-level checks applied before a request reaches the store.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ApiError;

pub const POST_MAX_CHARS: usize = 5000;
pub const COMMENT_MAX_CHARS: usize = 1000;
pub const BIO_MAX_CHARS: usize = 500;
pub const URL_MAX_CHARS: usize = 500;
pub const PASSWORD_MIN_CHARS: usize = 6;
pub const PASSWORD_MAX_CHARS: usize = 128;

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]{3,30}$").expect("username regex"));

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("email regex")
});

pub fn username(value: &str) -> Result<(), ApiError> {
    if !USERNAME_RE.is_match(value) {
        return Err(ApiError::validation(
            "Username must be 3-30 characters of letters, digits or underscores",
        ));
    }
    Ok(())
}

pub fn email(value: &str) -> Result<(), ApiError> {
    if value.len() > 120 || !EMAIL_RE.is_match(value) {
        return Err(ApiError::validation("Invalid email address"));
    }
    Ok(())
}

pub fn password(value: &str) -> Result<(), ApiError> {
    let len = value.chars().count();
    if len < PASSWORD_MIN_CHARS {
        return Err(ApiError::validation("Password must be at least 6 characters long"));
    }
    if len > PASSWORD_MAX_CHARS {
        return Err(ApiError::validation("Password is too long (max 128 characters)"));
    }
    Ok(())
}

/// Required, non-blank text bounded by `max` characters.
pub fn content(value: &str, max: usize) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::validation("Content is required"));
    }
    if value.chars().count() > max {
        return Err(ApiError::validation(format!(
            "Content is too long (max {max} characters)"
        )));
    }
    Ok(())
}

/// Optional free text; only the length is checked.
pub fn optional_text(field: &str, value: Option<&str>, max: usize) -> Result<(), ApiError> {
    match value {
        Some(v) if v.chars().count() > max => Err(ApiError::validation(format!(
            "{field} is too long (max {max} characters)"
        ))),
        _ => Ok(()),
    }
}
