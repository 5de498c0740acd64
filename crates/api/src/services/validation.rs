//! Input validation rules shared across services.
//!
//! The same name and address rules apply to users and stores, so they live
//! here rather than in either service.

/// Minimum display/store name length.
pub const NAME_MIN: usize = 20;
/// Maximum display/store name length.
pub const NAME_MAX: usize = 60;
/// Maximum address length.
pub const ADDRESS_MAX: usize = 400;
/// Minimum password length.
pub const PASSWORD_MIN: usize = 8;
/// Maximum password length.
pub const PASSWORD_MAX: usize = 16;

/// Validate a user or store name (20 to 60 characters).
///
/// # Errors
///
/// Returns a human-readable message if the name is out of bounds.
pub fn validate_name(name: &str) -> Result<(), String> {
    let len = name.chars().count();
    if !(NAME_MIN..=NAME_MAX).contains(&len) {
        return Err(format!(
            "name must be between {NAME_MIN} and {NAME_MAX} characters"
        ));
    }
    Ok(())
}

/// Validate an address (non-empty, at most 400 characters).
///
/// # Errors
///
/// Returns a human-readable message if the address is out of bounds.
pub fn validate_address(address: &str) -> Result<(), String> {
    if address.is_empty() {
        return Err("address must not be empty".to_owned());
    }
    if address.chars().count() > ADDRESS_MAX {
        return Err(format!("address must be at most {ADDRESS_MAX} characters"));
    }
    Ok(())
}

/// Validate a password: 8 to 16 characters with at least one uppercase
/// letter and one special character.
///
/// # Errors
///
/// Returns a human-readable message if the password breaks a rule.
pub fn validate_password(password: &str) -> Result<(), String> {
    let len = password.chars().count();
    if !(PASSWORD_MIN..=PASSWORD_MAX).contains(&len) {
        return Err(format!(
            "password must be between {PASSWORD_MIN} and {PASSWORD_MAX} characters"
        ));
    }
    if !password.chars().any(char::is_uppercase) {
        return Err("password must contain at least one uppercase letter".to_owned());
    }
    if !password
        .chars()
        .any(|c| !c.is_alphanumeric() && !c.is_whitespace())
    {
        return Err("password must contain at least one special character".to_owned());
    }
    Ok(())
}
