use crate::error::{Error, Result};

const MAX_USERNAME_LEN: usize = 64;
const MAX_EMAIL_LEN: usize = 254;

/// Checks `start..=end` as a verse range: start at least 1, end not before
/// start, and end within the chapter when its verse count is known.
pub fn validate_verse_range(start: i64, end: i64, verse_count: Option<u32>) -> Result<(u32, u32)> {
    if start < 1 || end < start {
        return Err(Error::InvalidRange("Invalid verse range".to_string()));
    }
    let (Ok(start), Ok(end)) = (u32::try_from(start), u32::try_from(end)) else {
        return Err(Error::InvalidRange("Invalid verse range".to_string()));
    };
    if let Some(count) = verse_count {
        if end > count {
            return Err(Error::InvalidRange("Verse end exceeds chapter".to_string()));
        }
    }
    Ok((start, end))
}

/// Recording durations must be finite and non-negative; absent stays absent.
pub fn validate_duration(duration: Option<f64>) -> Result<Option<f64>> {
    match duration {
        Some(d) if !d.is_finite() || d < 0.0 => {
            Err(Error::BadRequest("Invalid duration_seconds".to_string()))
        }
        other => Ok(other),
    }
}

/// Usernames are free-form display handles. Spaces and non-ASCII letters are
/// fine; blank names, control characters and '@' are not.
pub fn validate_username(username: &str) -> Result<()> {
    if username.trim().is_empty() {
        return Err(Error::BadRequest("Username cannot be empty".to_string()));
    }
    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(Error::BadRequest(format!(
            "Username cannot exceed {MAX_USERNAME_LEN} characters"
        )));
    }
    if username.chars().any(char::is_control) {
        return Err(Error::BadRequest(
            "Username cannot contain control characters".to_string(),
        ));
    }
    // Login accepts either identifier, so a username must not look like an email.
    if username.contains('@') {
        return Err(Error::BadRequest("Username cannot contain '@'".to_string()));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<()> {
    let valid = email.len() <= MAX_EMAIL_LEN
        && !email.chars().any(char::is_whitespace)
        && matches!(email.split_once('@'), Some((local, domain))
            if !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.'));
    if !valid {
        return Err(Error::BadRequest("Invalid email address".to_string()));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<()> {
    if password.is_empty() {
        return Err(Error::BadRequest("Password cannot be empty".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verse_range_bounds() {
        assert_eq!(validate_verse_range(1, 3, Some(31)).unwrap(), (1, 3));
        assert_eq!(validate_verse_range(31, 31, Some(31)).unwrap(), (31, 31));
        assert_eq!(validate_verse_range(2, 200, None).unwrap(), (2, 200));
        assert!(validate_verse_range(0, 3, Some(31)).is_err());
        assert!(validate_verse_range(5, 4, Some(31)).is_err());
        assert!(validate_verse_range(-1, 4, None).is_err());
    }

    #[test]
    fn test_verse_range_past_chapter_end() {
        let err = validate_verse_range(30, 32, Some(31)).unwrap_err();
        assert!(matches!(err, Error::InvalidRange(m) if m == "Verse end exceeds chapter"));
    }

    #[test]
    fn test_duration() {
        assert_eq!(validate_duration(None).unwrap(), None);
        assert_eq!(validate_duration(Some(0.0)).unwrap(), Some(0.0));
        assert_eq!(validate_duration(Some(42.5)).unwrap(), Some(42.5));
        assert!(validate_duration(Some(-30.0)).is_err());
        assert!(validate_duration(Some(f64::INFINITY)).is_err());
        assert!(validate_duration(Some(f64::NAN)).is_err());
    }

    #[test]
    fn test_username() {
        assert!(validate_username("reader_1").is_ok());
        assert!(validate_username("has space").is_ok());
        assert!(validate_username("José Álvarez").is_ok());
        assert!(validate_username(&"é".repeat(64)).is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username("   ").is_err());
        assert!(validate_username("tab\there").is_err());
        assert!(validate_username("a@b.com").is_err());
        assert!(validate_username(&"a".repeat(65)).is_err());
    }

    #[test]
    fn test_email() {
        assert!(validate_email("ann@example.com").is_ok());
        assert!(validate_email("ann").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("ann@localhost").is_err());
        assert!(validate_email("ann @example.com").is_err());
    }
}
