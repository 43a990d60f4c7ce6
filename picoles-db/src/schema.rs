//! Table metadata registry and the destructive schema initializer
//!
//! Every entity declares a [`TableDef`]; [`REGISTRY`] lists them parents
//! first. DDL for both backends is generated from the same metadata, with
//! constraint names `uq_<table>_<column>` and `fk_<table>_<column>`.

use chrono::{DateTime, Duration, NaiveDateTime, SubsecRound, TimeZone, Utc};
use picoles_core::Backend;
use tracing::info;

use crate::entities::{
    aditivo_nutritivo, aditivo_nutritivo_picole, conservante, conservante_picole, picole, revendedor,
};
use crate::error::DbResult;
use crate::Database;

pub const ID: &str = "id";
pub const CREATED_AT: &str = "data_criacao";
pub const UPDATED_AT: &str = "data_atualizacao";

/// Fixed-width, lexically ordered UTC timestamp text
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// Every known table, parents before children.
pub const REGISTRY: &[&TableDef] = &[
    &picole::TABLE,
    &conservante::TABLE,
    &aditivo_nutritivo::TABLE,
    &revendedor::TABLE,
    &conservante_picole::TABLE,
    &aditivo_nutritivo_picole::TABLE,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text { max: usize },
    Integer,
    Real,
}

impl ColumnType {
    /// Human description used in argument-type errors
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::Integer => "an integer",
            Self::Real => "a real number",
        }
    }

    fn sql(&self, backend: Backend) -> String {
        match (self, backend) {
            (Self::Text { max }, _) => format!("VARCHAR({})", max),
            (Self::Integer, Backend::Embedded) => "INTEGER".to_string(),
            (Self::Integer, Backend::Networked) => "BIGINT".to_string(),
            (Self::Real, Backend::Embedded) => "REAL".to_string(),
            (Self::Real, Backend::Networked) => "DOUBLE PRECISION".to_string(),
        }
    }
}

/// One data column (the id and timestamp columns are implicit)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: &'static str,
    pub ty: ColumnType,
    pub unique: bool,
    /// Referenced table for foreign-key columns
    pub references: Option<&'static str>,
}

impl ColumnDef {
    pub const fn text(name: &'static str, max: usize) -> Self {
        Self {
            name,
            ty: ColumnType::Text { max },
            unique: false,
            references: None,
        }
    }

    pub const fn real(name: &'static str) -> Self {
        Self {
            name,
            ty: ColumnType::Real,
            unique: false,
            references: None,
        }
    }

    pub const fn foreign_key(name: &'static str, table: &'static str) -> Self {
        Self {
            name,
            ty: ColumnType::Integer,
            unique: false,
            references: Some(table),
        }
    }

    pub const fn unique(self) -> Self {
        Self {
            unique: true,
            ..self
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableDef {
    pub name: &'static str,
    pub columns: &'static [ColumnDef],
}

impl TableDef {
    pub fn column(&self, name: &str) -> Option<&'static ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn foreign_keys(&self) -> impl Iterator<Item = &'static ColumnDef> {
        self.columns.iter().filter(|c| c.references.is_some())
    }

    pub fn unique_constraint_name(&self, column: &str) -> String {
        format!("uq_{}_{}", self.name, column)
    }

    pub fn fk_constraint_name(&self, column: &str) -> String {
        format!("fk_{}_{}", self.name, column)
    }

    /// `id, <data columns>, data_criacao, data_atualizacao`
    pub fn select_list(&self) -> String {
        let mut names = vec![ID];
        names.extend(self.columns.iter().map(|c| c.name));
        names.push(CREATED_AT);
        names.push(UPDATED_AT);
        names.join(", ")
    }

    pub fn create_sql(&self, backend: Backend) -> String {
        let id = match backend {
            Backend::Embedded => "INTEGER PRIMARY KEY AUTOINCREMENT",
            Backend::Networked => "BIGSERIAL PRIMARY KEY",
        };

        let mut lines = vec![format!("{} {}", ID, id)];
        lines.extend(
            self.columns
                .iter()
                .map(|c| format!("{} {} NOT NULL", c.name, c.ty.sql(backend))),
        );
        lines.push(format!("{} VARCHAR(32) NOT NULL", CREATED_AT));
        lines.push(format!("{} VARCHAR(32) NOT NULL", UPDATED_AT));

        for column in self.columns.iter().filter(|c| c.unique) {
            lines.push(format!(
                "CONSTRAINT {} UNIQUE ({})",
                self.unique_constraint_name(column.name),
                column.name
            ));
        }

        for column in self.columns.iter() {
            if let Some(parent) = column.references {
                lines.push(format!(
                    "CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
                    self.fk_constraint_name(column.name),
                    column.name,
                    parent,
                    ID
                ));
            }
        }

        format!("CREATE TABLE {} (\n    {}\n)", self.name, lines.join(",\n    "))
    }

    pub fn drop_sql(&self, backend: Backend) -> String {
        match backend {
            Backend::Embedded => format!("DROP TABLE IF EXISTS {}", self.name),
            Backend::Networked => format!("DROP TABLE IF EXISTS {} CASCADE", self.name),
        }
    }
}

pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT).map(|naive| Utc.from_utc_datetime(&naive))
}

/// Current time at the stored (microsecond) precision
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Update stamp that is always strictly after `previous`.
pub fn next_update_stamp(previous: DateTime<Utc>) -> DateTime<Utc> {
    let current = now();
    if current > previous {
        current
    } else {
        previous + Duration::microseconds(1)
    }
}

impl Database {
    /// Drop and recreate every registered table in one transaction.
    ///
    /// Destroys all stored data. Never called implicitly.
    pub async fn create_tables(&self) -> DbResult<()> {
        let mut session = self.session().await?;
        let backend = session.backend();

        info!(backend = backend.as_str(), tables = REGISTRY.len(), "Recreating schema");

        let mut tx = session.begin_write().await?;

        for table in REGISTRY.iter().rev() {
            sqlx::query(&table.drop_sql(backend)).execute(&mut *tx).await?;
        }

        for table in REGISTRY.iter() {
            sqlx::query(&table.create_sql(backend)).execute(&mut *tx).await?;
        }

        tx.commit().await?;

        info!("Schema recreated");
        Ok(())
    }
}
