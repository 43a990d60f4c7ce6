//! Error types for picoles-db

use std::fmt;

use picoles_core::ValidationError;
use thiserror::Error;

pub type DbResult<T> = Result<T, DbError>;

/// What a foreign-key failure was about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForeignKeyDetail {
    /// Delete blocked: these tables may still hold rows pointing at the record
    Referenced { id: i64, tables: Vec<String> },

    /// Insert/update pointed at rows that do not exist
    MissingReference { references: Vec<(&'static str, i64)> },
}

impl fmt::Display for ForeignKeyDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Referenced { id, tables } => write!(
                f,
                "id={} cannot be deleted, it may be referenced by rows in table(s): {}",
                id,
                tables.join(", ")
            ),
            Self::MissingReference { references } => {
                let refs: Vec<String> = references
                    .iter()
                    .map(|(field, id)| format!("{}={}", field, id))
                    .collect();
                write!(f, "check that the referenced rows exist: {}", refs.join(" | "))
            }
        }
    }
}

#[derive(Error, Debug)]
pub enum DbError {
    #[error("{entity}: {field} must be {expected}")]
    InvalidArgumentType {
        entity: &'static str,
        field: &'static str,
        expected: &'static str,
    },

    #[error("{entity}: {source}")]
    InvalidArgumentValue {
        entity: &'static str,
        #[source]
        source: ValidationError,
    },

    #[error("{entity} with {field} '{value}' already exists; {field} must be unique")]
    UniquenessViolation {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("{entity}: foreign key violation, {detail}")]
    ForeignKeyViolation {
        entity: &'static str,
        detail: ForeignKeyDetail,
    },

    #[error("{entity} with id={id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("integrity error on {entity}: {message}")]
    Integrity {
        entity: &'static str,
        message: String,
    },

    #[error("unexpected database failure: {0}")]
    Unexpected(#[from] sqlx::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DbError {
    /// Map a validation failure onto the argument-type / argument-value split.
    pub fn invalid(entity: &'static str, err: ValidationError) -> Self {
        match err {
            ValidationError::WrongType { field, expected } => Self::InvalidArgumentType {
                entity,
                field,
                expected,
            },
            other => Self::InvalidArgumentValue {
                entity,
                source: other,
            },
        }
    }
}
