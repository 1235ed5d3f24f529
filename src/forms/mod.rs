//! Validation shared by the template editor and the measurement recorder.
//!
//! These rules stand in for the browser's native form validation: required
//! fields, numeric inputs and `min`/`max` constraints. A [`FormError`] always
//! stops a submission before any network call.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormError {
    #[error("{field} is required")]
    Required { field: String },
    #[error("{field} must be a number, got '{raw}'")]
    NotANumber { field: String, raw: String },
    #[error("{field} must be at least {min}")]
    BelowMinimum { field: String, min: f64 },
    #[error("{field} must be at most {max}")]
    AboveMaximum { field: String, max: f64 },
    #[error("select a template first")]
    NoTemplate,
    #[error("unknown field '{field}'")]
    UnknownField { field: String },
    #[error("measured at '{raw}' is not a valid local date and time")]
    InvalidTimestamp { raw: String },
}

/// Require a non-blank text input, returning it trimmed.
pub fn required(field: &str, raw: &str) -> Result<String, FormError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(FormError::Required {
            field: field.to_string(),
        });
    }
    Ok(value.to_string())
}

/// Optional text input: blank maps to `None`.
pub fn optional_text(raw: &str) -> Option<String> {
    let value = raw.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Optional numeric input: blank maps to "unset", never zero.
pub fn optional_number(field: &str, raw: &str) -> Result<Option<f64>, FormError> {
    let value = raw.trim();
    if value.is_empty() {
        return Ok(None);
    }
    parse_number(field, value).map(Some)
}

/// Parse a finite number the way a numeric input accepts it.
pub fn parse_number(field: &str, raw: &str) -> Result<f64, FormError> {
    let value = raw.trim();
    value
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| FormError::NotANumber {
            field: field.to_string(),
            raw: raw.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_optional_number_is_unset_not_zero() {
        assert_eq!(optional_number("min", ""), Ok(None));
        assert_eq!(optional_number("min", "   "), Ok(None));
        assert_eq!(optional_number("min", "0"), Ok(Some(0.0)));
        assert_eq!(optional_number("min", "-2.5"), Ok(Some(-2.5)));
    }

    #[test]
    fn malformed_numbers_are_rejected() {
        assert!(matches!(
            optional_number("max", "12abc"),
            Err(FormError::NotANumber { .. })
        ));
        assert!(parse_number("value", "NaN").is_err());
        assert!(parse_number("value", "inf").is_err());
    }

    #[test]
    fn required_trims_and_rejects_blank() {
        assert_eq!(required("name", "  Weight "), Ok("Weight".to_string()));
        assert_eq!(
            required("name", " "),
            Err(FormError::Required {
                field: "name".to_string()
            })
        );
    }

    #[test]
    fn optional_text_maps_blank_to_none() {
        assert_eq!(optional_text(""), None);
        assert_eq!(optional_text(" kg "), Some("kg".to_string()));
    }
}
