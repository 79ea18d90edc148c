//! Recipient contact validation.

/// Maximum length of an email address (RFC 5321 path limit).
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Maximum length of a recipient display name.
pub const MAX_DISPLAY_NAME_LENGTH: usize = 200;

/// Validate an email address and display name pair.
///
/// The check is structural only: one `@` with a non-empty local part and a
/// dotted domain, no whitespace. Deliverability is the notifier's concern.
pub fn validate_contact(email: &str, display_name: &str) -> Result<(), String> {
    validate_email(email)?;
    let name = display_name.trim();
    if name.is_empty() {
        return Err("display_name must not be empty".to_string());
    }
    if name.len() > MAX_DISPLAY_NAME_LENGTH {
        return Err(format!(
            "display_name must be at most {MAX_DISPLAY_NAME_LENGTH} characters"
        ));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() || email.len() > MAX_EMAIL_LENGTH {
        return Err(format!(
            "email must be between 1 and {MAX_EMAIL_LENGTH} characters"
        ));
    }
    if email.chars().any(char::is_whitespace) {
        return Err("email must not contain whitespace".to_string());
    }
    match email.split_once('@') {
        Some((local, domain))
            if !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.') =>
        {
            Ok(())
        }
        _ => Err(format!("'{email}' is not a valid email address")),
    }
}
