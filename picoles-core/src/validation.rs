//! Input validation and normalisation
//!
//! Every value headed for storage goes through one of these helpers.
//! Text is trimmed and upper-cased before any length check, so a value
//! made only of whitespace is rejected as blank.

use std::fmt;

/// Validation error for entity fields
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Field is empty (or whitespace only) when it shouldn't be
    Blank { field: &'static str },

    /// Field exceeds maximum length
    TooLong { field: &'static str, max: usize },

    /// Field must have an exact length
    WrongLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Identifier or amount must be greater than zero
    NotPositive { field: &'static str },

    /// Value has the wrong kind for the target column
    WrongType {
        field: &'static str,
        expected: &'static str,
    },

    /// Column is not known (or not usable for this lookup)
    UnknownField { field: String },
}

impl ValidationError {
    /// Name of the offending field.
    pub fn field(&self) -> &str {
        match self {
            Self::Blank { field }
            | Self::TooLong { field, .. }
            | Self::WrongLength { field, .. }
            | Self::NotPositive { field }
            | Self::WrongType { field, .. } => field,
            Self::UnknownField { field } => field,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blank { field } => write!(f, "{} cannot be empty", field),
            Self::TooLong { field, max } => {
                write!(f, "{} exceeds maximum length of {} characters", field, max)
            }
            Self::WrongLength {
                field,
                expected,
                actual,
            } => write!(
                f,
                "{} must have exactly {} characters (got {})",
                field, expected, actual
            ),
            Self::NotPositive { field } => write!(f, "{} must be greater than zero", field),
            Self::WrongType { field, expected } => write!(f, "{} must be {}", field, expected),
            Self::UnknownField { field } => write!(f, "unknown field '{}'", field),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Trim and upper-case a text value, rejecting blanks and values longer than `max`.
///
/// # Example
/// ```
/// use picoles_core::validation::normalize_text;
///
/// assert_eq!(normalize_text("nome", "  Vitamina c ", 45).unwrap(), "VITAMINA C");
/// assert!(normalize_text("nome", "   ", 45).is_err());
/// ```
pub fn normalize_text(field: &'static str, raw: &str, max: usize) -> Result<String, ValidationError> {
    let value = raw.trim().to_uppercase();

    if value.is_empty() {
        return Err(ValidationError::Blank { field });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }

    Ok(value)
}

/// Normalise a text value that must have exactly `len` characters (e.g. a CNPJ).
pub fn normalize_exact(field: &'static str, raw: &str, len: usize) -> Result<String, ValidationError> {
    let value = raw.trim().to_uppercase();

    if value.is_empty() {
        return Err(ValidationError::Blank { field });
    }

    let actual = value.chars().count();
    if actual != len {
        return Err(ValidationError::WrongLength {
            field,
            expected: len,
            actual,
        });
    }

    Ok(value)
}

/// Surrogate identities are generated by storage and always start at 1.
pub fn require_positive_id(field: &'static str, id: i64) -> Result<i64, ValidationError> {
    if id <= 0 {
        return Err(ValidationError::NotPositive { field });
    }
    Ok(id)
}

pub fn require_positive_amount(field: &'static str, amount: f64) -> Result<f64, ValidationError> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(ValidationError::NotPositive { field });
    }
    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_and_uppercases() {
        assert_eq!(normalize_text("nome", "  Vitamina C\t", 45).unwrap(), "VITAMINA C");
        assert_eq!(normalize_text("formula_quimica", "c6h8o6", 45).unwrap(), "C6H8O6");
    }

    #[test]
    fn uppercases_accented_text() {
        assert_eq!(normalize_text("sabor", "limão", 45).unwrap(), "LIMÃO");
    }

    #[test]
    fn rejects_blank() {
        let err = normalize_text("nome", " \t\n ", 45).unwrap_err();
        assert_eq!(err, ValidationError::Blank { field: "nome" });

        let err = normalize_text("nome", "", 45).unwrap_err();
        assert!(matches!(err, ValidationError::Blank { .. }));
    }

    #[test]
    fn max_length_counts_chars_after_trim() {
        let padded = format!("  {}  ", "a".repeat(45));
        assert!(normalize_text("nome", &padded, 45).is_ok());

        let err = normalize_text("nome", &"a".repeat(46), 45).unwrap_err();
        assert!(matches!(err, ValidationError::TooLong { max: 45, .. }));
    }

    #[test]
    fn exact_length() {
        assert_eq!(
            normalize_exact("cnpj", " 12345678000199 ", 14).unwrap(),
            "12345678000199"
        );

        let err = normalize_exact("cnpj", "123", 14).unwrap_err();
        assert_eq!(
            err,
            ValidationError::WrongLength {
                field: "cnpj",
                expected: 14,
                actual: 3
            }
        );
    }

    #[test]
    fn positive_ids_and_amounts() {
        assert_eq!(require_positive_id("id", 7).unwrap(), 7);
        assert!(require_positive_id("id", 0).is_err());
        assert!(require_positive_id("id", -3).is_err());

        assert!(require_positive_amount("preco", 4.5).is_ok());
        assert!(require_positive_amount("preco", 0.0).is_err());
        assert!(require_positive_amount("preco", f64::NAN).is_err());
    }

    #[test]
    fn error_display() {
        let err = ValidationError::TooLong {
            field: "nome",
            max: 45,
        };
        assert_eq!(err.to_string(), "nome exceeds maximum length of 45 characters");
        assert_eq!(err.field(), "nome");
    }
}
