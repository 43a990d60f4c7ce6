//! Structured classification of constraint violations
//!
//! The driver's error kind decides *what* failed. *Where* it failed comes
//! from the constraint name (networked backend, `uq_/fk_` convention) or
//! from the engine message (embedded backend, which reports
//! `UNIQUE constraint failed: table.column`).

use sqlx::error::ErrorKind;

use crate::schema::{ColumnDef, TableDef};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    Unique,
    ForeignKey,
    NotNull,
    Check,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintViolation {
    pub kind: ConstraintKind,
    pub table: Option<String>,
    pub columns: Vec<String>,
    pub constraint: Option<String>,
    pub message: String,
}

impl ConstraintViolation {
    /// Classify a driver error; `None` when it is not a constraint failure.
    pub fn classify(err: &sqlx::Error) -> Option<Self> {
        let db_err = err.as_database_error()?;
        let message = db_err.message().to_string();
        let parsed = parse_sqlite_message(&message);

        let kind = match db_err.kind() {
            ErrorKind::UniqueViolation => ConstraintKind::Unique,
            ErrorKind::ForeignKeyViolation => ConstraintKind::ForeignKey,
            ErrorKind::NotNullViolation => ConstraintKind::NotNull,
            ErrorKind::CheckViolation => ConstraintKind::Check,
            _ => match &parsed {
                Some(p) => p.kind,
                None => return None,
            },
        };

        let (table, columns) = match parsed {
            Some(p) => (p.table, p.columns),
            None => (None, Vec::new()),
        };

        Some(Self {
            kind,
            table,
            columns,
            constraint: db_err.constraint().map(str::to_string),
            message,
        })
    }

    /// Resolve the offending column of `table`, if the violation names one.
    pub fn column_in(&self, table: &TableDef) -> Option<&'static ColumnDef> {
        let same_table = self.table.as_deref().map_or(true, |t| t == table.name);

        if same_table {
            if let Some(column) = self.columns.iter().find_map(|c| table.column(c)) {
                return Some(column);
            }
        }

        let name = self.constraint.as_deref()?;
        table.columns.iter().find(|c| {
            table.unique_constraint_name(c.name) == name || table.fk_constraint_name(c.name) == name
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SqliteDetail {
    kind: ConstraintKind,
    table: Option<String>,
    columns: Vec<String>,
}

/// Parse `"<KIND> constraint failed[: t.c[, t.c]]"`.
fn parse_sqlite_message(message: &str) -> Option<SqliteDetail> {
    let (head, rest) = message.split_once(" constraint failed")?;

    let kind = match head.trim() {
        "UNIQUE" | "PRIMARY KEY" => ConstraintKind::Unique,
        "FOREIGN KEY" => ConstraintKind::ForeignKey,
        "NOT NULL" => ConstraintKind::NotNull,
        "CHECK" => ConstraintKind::Check,
        _ => ConstraintKind::Other,
    };

    let mut table = None;
    let mut columns = Vec::new();

    let targets = rest.trim_start_matches(':').trim();
    for target in targets.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if let Some((t, c)) = target.split_once('.') {
            table.get_or_insert_with(|| t.to_string());
            columns.push(c.to_string());
        }
    }

    Some(SqliteDetail {
        kind,
        table,
        columns,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{aditivo_nutritivo, conservante_picole};

    #[test]
    fn parses_unique_message() {
        let detail = parse_sqlite_message("UNIQUE constraint failed: aditivo_nutritivo.nome").unwrap();
        assert_eq!(detail.kind, ConstraintKind::Unique);
        assert_eq!(detail.table.as_deref(), Some("aditivo_nutritivo"));
        assert_eq!(detail.columns, vec!["nome"]);
    }

    #[test]
    fn parses_composite_unique_message() {
        let detail = parse_sqlite_message("UNIQUE constraint failed: t.a, t.b").unwrap();
        assert_eq!(detail.columns, vec!["a", "b"]);
    }

    #[test]
    fn parses_foreign_key_message() {
        let detail = parse_sqlite_message("FOREIGN KEY constraint failed").unwrap();
        assert_eq!(detail.kind, ConstraintKind::ForeignKey);
        assert!(detail.table.is_none());
        assert!(detail.columns.is_empty());
    }

    #[test]
    fn check_message_has_no_columns() {
        let detail = parse_sqlite_message("CHECK constraint failed: preco_positive").unwrap();
        assert_eq!(detail.kind, ConstraintKind::Check);
        assert!(detail.columns.is_empty());
    }

    #[test]
    fn ignores_other_messages() {
        assert!(parse_sqlite_message("no such table: picole").is_none());
    }

    #[test]
    fn resolves_column_from_message() {
        let violation = ConstraintViolation {
            kind: ConstraintKind::Unique,
            table: Some("aditivo_nutritivo".into()),
            columns: vec!["formula_quimica".into()],
            constraint: None,
            message: String::new(),
        };
        let column = violation.column_in(&aditivo_nutritivo::TABLE).unwrap();
        assert_eq!(column.name, "formula_quimica");
    }

    #[test]
    fn resolves_column_from_constraint_name() {
        let violation = ConstraintViolation {
            kind: ConstraintKind::Unique,
            table: None,
            columns: Vec::new(),
            constraint: Some("uq_conservante_picole_conservante_picole".into()),
            message: String::new(),
        };
        let column = violation.column_in(&conservante_picole::TABLE).unwrap();
        assert_eq!(column.name, "conservante_picole");
    }

    #[test]
    fn other_table_does_not_resolve() {
        let violation = ConstraintViolation {
            kind: ConstraintKind::Unique,
            table: Some("revendedor".into()),
            columns: vec!["nome".into()],
            constraint: None,
            message: String::new(),
        };
        assert!(violation.column_in(&aditivo_nutritivo::TABLE).is_none());
    }
}
