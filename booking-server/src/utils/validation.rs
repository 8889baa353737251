//! Input validation helpers
//!
//! Centralized text length constants and validation functions.
//! Limits are chosen based on reasonable UX limits for names, notes and
//! descriptions; the document store has no built-in length enforcement.

use crate::utils::AppError;

// ── Text length limits ──────────────────────────────────────────────

/// Person / vehicle / service names
pub const MAX_NAME_LEN: usize = 100;

/// Notes, descriptions, reasons (block description, cancel reason, etc.)
pub const MAX_NOTE_LEN: usize = 500;

/// Contact form messages
pub const MAX_MESSAGE_LEN: usize = 2000;

/// Phone numbers (raw, before normalization)
pub const MAX_PHONE_LEN: usize = 30;

/// Email addresses (RFC 5321)
pub const MAX_EMAIL_LEN: usize = 254;

// ── Validation helpers (CRUD handlers) ──────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} must not be empty")));
    }
    if value.len() > max_len {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.len()
        )));
    }
    Ok(())
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> Result<(), AppError> {
    if let Some(v) = value
        && v.len() > max_len
    {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            v.len()
        )));
    }
    Ok(())
}

/// Keep only ASCII digits. Used for phone comparison and E.164 formatting.
pub fn digits_only(phone: &str) -> String {
    phone.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Last 10 digits of a phone number, tolerating country-code prefixes.
///
/// Returns `None` when fewer than 10 digits remain, since a shorter suffix
/// would produce false matches.
pub fn phone_suffix(phone: &str) -> Option<String> {
    let digits = digits_only(phone);
    if digits.len() < 10 {
        return None;
    }
    Some(digits[digits.len() - 10..].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_suffix_strips_country_code() {
        assert_eq!(phone_suffix("+1 (555) 123-4567").as_deref(), Some("5551234567"));
        assert_eq!(phone_suffix("5551234567").as_deref(), Some("5551234567"));
        assert_eq!(phone_suffix("15551234567").as_deref(), Some("5551234567"));
    }

    #[test]
    fn phone_suffix_rejects_short_numbers() {
        assert_eq!(phone_suffix("12345"), None);
    }

    #[test]
    fn required_text_limits() {
        assert!(validate_required_text("ok", "name", MAX_NAME_LEN).is_ok());
        assert!(validate_required_text("  ", "name", MAX_NAME_LEN).is_err());
        assert!(validate_required_text(&"x".repeat(101), "name", MAX_NAME_LEN).is_err());
    }
}
