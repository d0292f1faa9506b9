//! Business operations of a tenant.
//!
//! Each module adds an `impl TenantContext` block for one area of the shop.

pub mod addresses;
pub mod event_log;
pub mod orders;
pub mod products;
pub mod reviews;
pub mod uploads;
pub mod users;

#[cfg(test)]
pub(crate) mod testing;

use crate::{ApiError, ApiResult};

/// Trims `value` and checks it is non-empty and at most `max` characters.
pub(crate) fn required_text(field: &str, value: &str, max: usize) -> ApiResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation(format!("{field} is required")));
    }
    if trimmed.chars().count() > max {
        return Err(ApiError::validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(trimmed.to_owned())
}

/// Like [`required_text`] but empty values become `None`.
pub(crate) fn optional_text(field: &str, value: Option<&str>, max: usize) -> ApiResult<Option<String>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => required_text(field, text, max).map(Some),
    }
}

/// Lowercases and checks the rough shape `local@domain.tld`.
pub(crate) fn normalize_email(email: &str) -> ApiResult<String> {
    let email = email.trim().to_lowercase();
    let valid = email.len() <= 254 &&
        !email.chars().any(char::is_whitespace) &&
        email.split_once('@').is_some_and(|(local, domain)| {
            !local.is_empty() &&
                !domain.contains('@') &&
                domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
        });
    if valid {
        Ok(email)
    }
    else {
        Err(ApiError::validation("a valid email address is required"))
    }
}
