//! Validation helpers for DTOs.

use validator::ValidationError;

/// Validates that a person or baby name contains only letters (accented
/// Spanish letters included) and spaces.
///
/// # Examples
///
/// ```ignore
/// validate_person_name("María José") // Ok
/// validate_person_name("Ana3")       // Err - digit
/// validate_person_name("Ana_G")      // Err - underscore
/// ```
pub fn validate_person_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        let mut err = ValidationError::new("name_blank");
        err.message = Some("Name must not be blank".into());
        return Err(err);
    }

    if !name.chars().all(|c| c.is_alphabetic() || c == ' ') {
        let mut err = ValidationError::new("name_format");
        err.message = Some("Name must contain only letters and spaces".into());
        return Err(err);
    }

    Ok(())
}

/// Validates that an identity number is digits with an optional final check
/// character, the shape used on the guest list.
pub fn validate_identity_number(id: &str) -> Result<(), ValidationError> {
    let valid = id.len() >= 7
        && id
            .chars()
            .enumerate()
            .all(|(pos, c)| c.is_ascii_digit() || (pos + 1 == id.len() && matches!(c, 'k' | 'K')));

    if !valid {
        let mut err = ValidationError::new("identity_number_format");
        err.message = Some("Identity number must be digits with an optional trailing K".into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_person_name_valid() {
        assert!(validate_person_name("Ana").is_ok());
        assert!(validate_person_name("María José").is_ok());
        assert!(validate_person_name("Ñandú Pérez").is_ok());
    }

    #[test]
    fn test_validate_person_name_invalid() {
        assert!(validate_person_name("").is_err()); // empty
        assert!(validate_person_name("   ").is_err()); // blank
        assert!(validate_person_name("Ana3").is_err()); // digit
        assert!(validate_person_name("Ana_G").is_err()); // underscore
        assert!(validate_person_name("Ana!").is_err()); // punctuation
    }

    #[test]
    fn test_validate_identity_number() {
        assert!(validate_identity_number("12345678").is_ok());
        assert!(validate_identity_number("1234567K").is_ok());
        assert!(validate_identity_number("1234567k").is_ok());
        assert!(validate_identity_number("12345").is_err()); // too short
        assert!(validate_identity_number("12K45678").is_err()); // K not last
        assert!(validate_identity_number("abcdefgh").is_err()); // letters
    }
}
