//! Field validation for year, rating and runtime
//!
//! Each check is pure and never fails: it returns a [`FieldCheck`] that is
//! either a pass or carries the field name and a message. Empty (or
//! whitespace-only) values always pass.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::Record;

/// Inclusive year range
pub const YEAR_RANGE: (i64, i64) = (1900, 2100);

/// Inclusive rating range
pub const RATING_RANGE: (f64, f64) = (0.0, 10.0);

/// Outcome of a single field check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldCheck {
    pub is_valid: bool,
    pub field: String,
    #[serde(default)]
    pub message: String,
}

impl FieldCheck {
    fn pass(field: &str) -> Self {
        Self {
            is_valid: true,
            field: field.to_string(),
            message: String::new(),
        }
    }

    fn fail(field: &str, message: String) -> Self {
        Self {
            is_valid: false,
            field: field.to_string(),
            message,
        }
    }
}

/// Aggregate result for a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    /// Failed checks only; empty iff `is_valid`
    pub failures: Vec<FieldCheck>,
}

/// A record rejected before being written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError(pub ValidationReport);

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let details: Vec<String> = self
            .0
            .failures
            .iter()
            .map(|c| format!("{}: {}", c.field, c.message))
            .collect();
        write!(f, "Validation failed: {}", details.join("; "))
    }
}

impl std::error::Error for ValidationError {}

pub fn validate_year(year: &str) -> FieldCheck {
    let field = "year";
    let trimmed = year.trim();
    if trimmed.is_empty() {
        return FieldCheck::pass(field);
    }

    let value: i64 = match trimmed.parse() {
        Ok(v) => v,
        Err(_) => {
            return FieldCheck::fail(
                field,
                format!("Year must be a valid integer, got '{}'", year),
            )
        }
    };

    let (min, max) = YEAR_RANGE;
    if value < min || value > max {
        return FieldCheck::fail(
            field,
            format!("Year must be between {} and {}, got {}", min, max, value),
        );
    }

    FieldCheck::pass(field)
}

pub fn validate_rating(rating: &str) -> FieldCheck {
    let field = "rating";
    let trimmed = rating.trim();
    if trimmed.is_empty() {
        return FieldCheck::pass(field);
    }

    let value: f64 = match trimmed.parse() {
        Ok(v) => v,
        Err(_) => {
            return FieldCheck::fail(
                field,
                format!("Rating must be a valid number, got '{}'", rating),
            )
        }
    };

    if !value.is_finite() {
        return FieldCheck::fail(
            field,
            format!("Rating must be a finite number, got '{}'", rating),
        );
    }

    let (min, max) = RATING_RANGE;
    if value < min || value > max {
        return FieldCheck::fail(
            field,
            format!("Rating must be between 0 and 10, got {}", value),
        );
    }

    FieldCheck::pass(field)
}

pub fn validate_runtime(runtime: &str) -> FieldCheck {
    let field = "runtime";
    let trimmed = runtime.trim();
    if trimmed.is_empty() {
        return FieldCheck::pass(field);
    }

    let value: i64 = match trimmed.parse() {
        Ok(v) => v,
        Err(_) => {
            return FieldCheck::fail(
                field,
                format!("Runtime must be a valid integer, got '{}'", runtime),
            )
        }
    };

    if value <= 0 {
        return FieldCheck::fail(
            field,
            format!("Runtime must be a positive integer, got {}", value),
        );
    }

    FieldCheck::pass(field)
}

/// Run every check against a record
pub fn validate_record(record: &Record) -> ValidationReport {
    let failures: Vec<FieldCheck> = [
        validate_year(&record.year),
        validate_rating(&record.rating),
        validate_runtime(&record.runtime),
    ]
    .into_iter()
    .filter(|check| !check.is_valid)
    .collect();

    ValidationReport {
        is_valid: failures.is_empty(),
        failures,
    }
}

/// `validate_record` as a `Result`
pub fn ensure_valid(record: &Record) -> Result<(), ValidationError> {
    let report = validate_record(record);
    if report.is_valid {
        Ok(())
    } else {
        Err(ValidationError(report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_boundaries() {
        assert!(!validate_year("1899").is_valid);
        assert!(validate_year("1900").is_valid);
        assert!(validate_year("2100").is_valid);
        assert!(!validate_year("2101").is_valid);
        assert!(validate_year("").is_valid);
        assert!(validate_year("   ").is_valid);
        assert!(validate_year(" 1999 ").is_valid);

        let check = validate_year("19x9");
        assert_eq!(check.field, "year");
        assert_eq!(check.message, "Year must be a valid integer, got '19x9'");
    }

    #[test]
    fn test_rating_boundaries() {
        assert!(!validate_rating("-0.01").is_valid);
        assert!(validate_rating("0").is_valid);
        assert!(validate_rating("10").is_valid);
        assert!(validate_rating("7.5").is_valid);
        assert!(!validate_rating("10.01").is_valid);
        assert!(validate_rating("").is_valid);
    }

    #[test]
    fn test_rating_rejects_non_finite() {
        for input in ["nan", "NaN", "inf", "-inf", "infinity"] {
            let check = validate_rating(input);
            assert!(!check.is_valid, "{} should fail", input);
            assert!(check.message.contains("finite"));
        }
        assert!(validate_rating("abc").message.contains("valid number"));
    }

    #[test]
    fn test_runtime_boundaries() {
        assert!(!validate_runtime("0").is_valid);
        assert!(validate_runtime("1").is_valid);
        assert!(!validate_runtime("-5").is_valid);
        assert!(!validate_runtime("1.5").is_valid);
        assert!(validate_runtime("").is_valid);
    }

    #[test]
    fn test_validate_record_collects_failures() {
        let mut record = Record::default();
        assert!(validate_record(&record).is_valid);
        assert!(ensure_valid(&record).is_ok());

        record.year = "1800".to_string();
        record.runtime = "0".to_string();
        let report = validate_record(&record);
        assert!(!report.is_valid);
        assert_eq!(report.failures.len(), 2);
        assert_eq!(report.failures[0].field, "year");
        assert_eq!(report.failures[1].field, "runtime");

        let err = ensure_valid(&record).unwrap_err();
        assert!(err.to_string().starts_with("Validation failed: year: "));
        assert!(err.to_string().contains("; runtime: "));
    }
}
