//! Input parsing helpers that record field-level messages instead of failing fast.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;

use crate::error::ValidationErrors;

pub const REQUIRED: &str = "This field is required.";
pub const BLANK: &str = "This field may not be blank.";

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$")
        .unwrap_or_else(|e| panic!("email pattern must compile: {e}"))
});

/// A required, non-blank string. Records an error and returns `None` otherwise.
pub fn required_text(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<String>,
) -> Option<String> {
    match value {
        None => {
            errors.add(field, REQUIRED);
            None
        }
        Some(v) if v.trim().is_empty() => {
            errors.add(field, BLANK);
            None
        }
        Some(v) => Some(v.trim().to_string()),
    }
}

/// An optional string where blank means absent.
pub fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn required_email(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<String>,
) -> Option<String> {
    let email = required_text(errors, field, value)?;
    if is_valid_email(&email) {
        Some(normalize_email(&email))
    } else {
        errors.add(field, "Enter a valid email address.");
        None
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Lower-case the domain part, keep the local part as given.
pub fn normalize_email(email: &str) -> String {
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{local}@{}", domain.to_lowercase()),
        None => email.to_string(),
    }
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

/// Accepts `YYYY-MM-DD HH:MM[:SS]`, `YYYY-MM-DDTHH:MM[:SS]` and RFC 3339.
pub fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ]
    .iter()
    .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
}

/// Accepts `HH:MM` and `HH:MM:SS`.
pub fn parse_time(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .ok()
}

pub fn required_date(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<String>,
) -> Option<NaiveDate> {
    let raw = required_text(errors, field, value)?;
    let parsed = parse_date(&raw);
    if parsed.is_none() {
        errors.add(field, "Date has wrong format. Use YYYY-MM-DD.");
    }
    parsed
}

pub fn optional_date(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<String>,
) -> Option<NaiveDate> {
    let raw = optional_text(value)?;
    let parsed = parse_date(&raw);
    if parsed.is_none() {
        errors.add(field, "Date has wrong format. Use YYYY-MM-DD.");
    }
    parsed
}

pub fn required_datetime(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<String>,
) -> Option<NaiveDateTime> {
    let raw = required_text(errors, field, value)?;
    let parsed = parse_datetime(&raw);
    if parsed.is_none() {
        errors.add(field, "Datetime has wrong format. Use YYYY-MM-DD HH:MM:SS.");
    }
    parsed
}

pub fn required_time(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<String>,
) -> Option<NaiveTime> {
    let raw = required_text(errors, field, value)?;
    let parsed = parse_time(&raw);
    if parsed.is_none() {
        errors.add(field, "Time has wrong format. Use HH:MM or HH:MM:SS.");
    }
    parsed
}

/// Parse an enum wire value, recording the accepted choices on failure.
pub fn required_choice<T: std::str::FromStr>(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<String>,
    choices: &[&str],
) -> Option<T> {
    let raw = required_text(errors, field, value)?;
    match raw.parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            errors.add(
                field,
                format!("\"{raw}\" is not a valid choice. Expected one of: {}.", choices.join(", ")),
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_text_distinguishes_missing_and_blank() {
        let mut errors = ValidationErrors::new();
        assert!(required_text(&mut errors, "a", None).is_none());
        assert!(required_text(&mut errors, "b", Some("   ".into())).is_none());
        assert_eq!(required_text(&mut errors, "c", Some(" x ".into())).as_deref(), Some("x"));
        assert_eq!(errors.messages("a"), [REQUIRED]);
        assert_eq!(errors.messages("b"), [BLANK]);
        assert!(!errors.contains("c"));
    }

    #[test]
    fn email_validation_and_normalization() {
        assert!(is_valid_email("john.doe42@example.com"));
        assert!(!is_valid_email("john.doe@"));
        assert!(!is_valid_email("no-at-sign.com"));
        assert_eq!(normalize_email("John@Example.COM"), "John@example.com");
    }

    #[test]
    fn datetime_formats() {
        let expected = parse_datetime("2024-03-01 14:30:00").unwrap();
        assert_eq!(parse_datetime("2024-03-01T14:30:00"), Some(expected));
        assert_eq!(parse_datetime("2024-03-01T14:30:00Z"), Some(expected));
        assert_eq!(parse_datetime("2024-03-01 14:30"), Some(expected));
        assert!(parse_datetime("03/01/2024").is_none());
    }

    #[test]
    fn time_formats() {
        assert_eq!(parse_time("09:00"), NaiveTime::from_hms_opt(9, 0, 0));
        assert_eq!(parse_time("17:00:00"), NaiveTime::from_hms_opt(17, 0, 0));
        assert!(parse_time("5pm").is_none());
    }

    #[test]
    fn invalid_choice_lists_options() {
        let mut errors = ValidationErrors::new();
        let parsed: Option<crate::models::enums::Priority> = required_choice(
            &mut errors,
            "priority",
            Some("CRITICAL".into()),
            crate::models::enums::Priority::choices(),
        );
        assert!(parsed.is_none());
        assert!(errors.messages("priority")[0].contains("LOW, MEDIUM, HIGH, URGENT"));
    }
}
