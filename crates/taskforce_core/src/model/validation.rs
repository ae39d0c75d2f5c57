//! Field-level validation shared by all record types.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

static COLOR_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("valid color regex"));
static DUE_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-(0[1-9]|1[0-2])-(0[1-9]|[12]\d|3[01])$").expect("valid date regex"));
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

/// Record validation failure raised before any write reaches storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required text field is empty after trimming.
    EmptyField(&'static str),
    /// Department colour is not `#RRGGBB`.
    InvalidColorCode(String),
    /// Due date is not `YYYY-MM-DD`.
    InvalidDueDate(String),
    InvalidEmail(String),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyField(field) => write!(f, "`{field}` must not be empty"),
            Self::InvalidColorCode(value) => {
                write!(f, "invalid color code `{value}`; expected #RRGGBB")
            }
            Self::InvalidDueDate(value) => {
                write!(f, "invalid due date `{value}`; expected YYYY-MM-DD")
            }
            Self::InvalidEmail(value) => write!(f, "invalid email `{value}`"),
        }
    }
}

impl Error for ValidationError {}

pub(crate) fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    Ok(())
}

pub(crate) fn require_color_code(value: &str) -> Result<(), ValidationError> {
    if !COLOR_CODE_RE.is_match(value) {
        return Err(ValidationError::InvalidColorCode(value.to_string()));
    }
    Ok(())
}

pub(crate) fn require_due_date(value: &str) -> Result<(), ValidationError> {
    if !DUE_DATE_RE.is_match(value) {
        return Err(ValidationError::InvalidDueDate(value.to_string()));
    }
    Ok(())
}

pub(crate) fn require_email(value: &str) -> Result<(), ValidationError> {
    if !EMAIL_RE.is_match(value.trim()) {
        return Err(ValidationError::InvalidEmail(value.to_string()));
    }
    Ok(())
}

/// Trims entries, drops empty ones and removes duplicates while keeping the
/// first occurrence order.
pub fn normalize_list(values: &[String]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    values
        .iter()
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .filter(|value| seen.insert(value.to_string()))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{normalize_list, require_color_code, require_due_date, require_email};

    #[test]
    fn color_code_requires_six_hex_digits() {
        assert!(require_color_code("#3B82F6").is_ok());
        assert!(require_color_code("#3b82f6").is_ok());
        assert!(require_color_code("3B82F6").is_err());
        assert!(require_color_code("#FFF").is_err());
    }

    #[test]
    fn due_date_rejects_out_of_range_month() {
        assert!(require_due_date("2023-06-15").is_ok());
        assert!(require_due_date("2023-13-01").is_err());
        assert!(require_due_date("15/06/2023").is_err());
    }

    #[test]
    fn email_needs_domain_part() {
        assert!(require_email("daniel@example.com").is_ok());
        assert!(require_email("daniel@").is_err());
    }

    #[test]
    fn normalize_list_trims_and_dedups_in_order() {
        let values = vec![
            " ניווט ".to_string(),
            String::new(),
            "כושר גופני".to_string(),
            "ניווט".to_string(),
        ];
        assert_eq!(normalize_list(&values), vec!["ניווט", "כושר גופני"]);
    }
}
