//! Password derivation from a matched date of birth.
//!
//! The password is the day and month zero-padded to two digits followed by
//! the year exactly as captured: `5/3/1990` becomes `05031990`. Encrypted
//! output depends on these exact characters.

use thiserror::Error;

/// Errors from password generation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordError {
    #[error("Invalid DOB: {0}")]
    InvalidDob(String),
}

/// Split a date on `/`, `-` or `.` into day, month and year.
fn split_date(date: &str) -> Result<(&str, &str, &str), PasswordError> {
    let parts: Vec<&str> = date.split(['/', '-', '.']).collect();
    match parts.as_slice() {
        [day, month, year] => Ok((*day, *month, *year)),
        _ => Err(PasswordError::InvalidDob(date.to_string())),
    }
}

/// Left-pad with zeros to two characters.
fn pad2(part: &str) -> String {
    format!("{:0>2}", part)
}

/// Build the `DDMMYYYY` password for a day/month/year date string.
///
/// The year is passed through untouched, whatever its length.
pub fn generate_password(date: &str) -> Result<String, PasswordError> {
    let (day, month, year) = split_date(date)?;
    Ok(format!("{}{}{}", pad2(day), pad2(month), year))
}

/// Canonical `DD/MM/YYYY` form of a day/month/year date string.
pub fn format_dob(date: &str) -> Result<String, PasswordError> {
    let (day, month, year) = split_date(date)?;
    Ok(format!("{}/{}/{}", pad2(day), pad2(month), year))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pads_day_and_month() {
        assert_eq!(generate_password("5/3/1990").unwrap(), "05031990");
        assert_eq!(generate_password("12/11/2001").unwrap(), "12112001");
    }

    #[test]
    fn test_accepts_all_separators() {
        assert_eq!(generate_password("5-3-1990").unwrap(), "05031990");
        assert_eq!(generate_password("5.3.1990").unwrap(), "05031990");
        assert_eq!(generate_password("5/3-1990").unwrap(), "05031990");
    }

    #[test]
    fn test_year_passes_through() {
        assert_eq!(generate_password("1/2/90").unwrap(), "010290");
        assert_eq!(generate_password("1/2/019901").unwrap(), "0102019901");
    }

    #[test]
    fn test_rejects_wrong_part_count() {
        assert_eq!(
            generate_password("1990"),
            Err(PasswordError::InvalidDob("1990".to_string()))
        );
        assert!(generate_password("1/2").is_err());
        assert!(generate_password("1/2/3/4").is_err());
        assert!(generate_password("").is_err());
    }

    #[test]
    fn test_error_message() {
        let err = generate_password("1990").unwrap_err();
        assert_eq!(err.to_string(), "Invalid DOB: 1990");
    }

    #[test]
    fn test_format_dob() {
        assert_eq!(format_dob("1/2/2015").unwrap(), "01/02/2015");
        assert_eq!(format_dob("05-03-1990").unwrap(), "05/03/1990");
        assert!(format_dob("2015").is_err());
    }
}
