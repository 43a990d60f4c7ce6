//! Generic repository
//!
//! Every entity gets the same operations: insert, get, find_by, filter_by,
//! list, update and delete. Each one validates first, runs inside its own
//! session (and transaction for writes), and translates storage failures
//! into [`DbError`] using the entity's [`TableDef`].

use std::fmt;
use std::marker::PhantomData;

use chrono::{DateTime, Utc};
use picoles_core::validation::{normalize_text, require_positive_id};
use picoles_core::ValidationError;
use sqlx::any::{AnyArguments, AnyRow};
use sqlx::query::QueryAs;
use sqlx::{Any, FromRow, Row};
use tracing::{debug, error, info, warn};

use crate::constraint::{ConstraintKind, ConstraintViolation};
use crate::error::{DbError, DbResult, ForeignKeyDetail};
use crate::introspect;
use crate::schema::{self, ColumnDef, ColumnType, TableDef, CREATED_AT, ID, UPDATED_AT};
use crate::session::Session;
use crate::Database;

/// A value bound to a data column
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Integer(i64),
    Real(f64),
}

impl Value {
    fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Integer(_) => "an integer",
            Self::Real(_) => "a real number",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Real(r) => write!(f, "{}", r),
        }
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

/// Validated data-column values, in table order
pub type Columns = Vec<(&'static str, Value)>;

/// A record stored in one registered table.
pub trait Entity: for<'r> FromRow<'r, AnyRow> + Send + Unpin + fmt::Debug {
    /// Name used in error messages and logs
    const NAME: &'static str;
    const TABLE: &'static TableDef;

    /// Insert payload
    type New: Send;
    /// Partial update; `None` fields are left untouched
    type Patch: Send;

    fn validate_new(new: Self::New) -> Result<Columns, ValidationError>;

    /// Normalise every supplied field, rejecting blanks.
    fn validate_patch(patch: Self::Patch) -> Result<Self::Patch, ValidationError>;

    /// Full set of data columns after applying an already validated patch.
    fn apply_patch(&self, patch: Self::Patch) -> Columns;

    fn id(&self) -> i64;
    fn updated_at(&self) -> DateTime<Utc>;
}

/// Decode one of the text timestamp columns.
pub fn timestamp(row: &AnyRow, column: &str) -> Result<DateTime<Utc>, sqlx::Error> {
    let raw: String = row.try_get(column)?;
    schema::parse_timestamp(&raw).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

fn bind<'q, O>(
    query: QueryAs<'q, Any, O, AnyArguments<'q>>,
    value: &Value,
) -> QueryAs<'q, Any, O, AnyArguments<'q>> {
    match value {
        Value::Text(s) => query.bind(s.clone()),
        Value::Integer(i) => query.bind(*i),
        Value::Real(r) => query.bind(*r),
    }
}

fn placeholders(range: std::ops::RangeInclusive<usize>) -> Vec<String> {
    range.map(|i| format!("${}", i)).collect()
}

/// Check a lookup value against the column it targets.
fn lookup_value(column: &ColumnDef, value: Value) -> Result<Value, ValidationError> {
    match (column.ty, value) {
        (ColumnType::Text { max }, Value::Text(raw)) => {
            Ok(Value::Text(normalize_text(column.name, &raw, max)?))
        }
        (ColumnType::Integer, Value::Integer(id)) if column.references.is_some() => {
            Ok(Value::Integer(require_positive_id(column.name, id)?))
        }
        (ColumnType::Integer, Value::Integer(i)) => Ok(Value::Integer(i)),
        (ColumnType::Real, Value::Real(r)) => Ok(Value::Real(r)),
        (ty, other) => {
            debug!(field = column.name, got = other.kind(), "Lookup value has the wrong kind");
            Err(ValidationError::WrongType {
                field: column.name,
                expected: ty.describe(),
            })
        }
    }
}

pub struct Repository<'a, E> {
    db: &'a Database,
    _entity: PhantomData<fn() -> E>,
}

impl<'a, E: Entity> Repository<'a, E> {
    pub fn new(db: &'a Database) -> Self {
        Self {
            db,
            _entity: PhantomData,
        }
    }

    fn invalid(err: ValidationError) -> DbError {
        debug!(entity = E::NAME, field = err.field(), error = %err, "Rejected input");
        DbError::invalid(E::NAME, err)
    }

    fn select_sql(filter: &str) -> String {
        format!(
            "SELECT {} FROM {} {}",
            E::TABLE.select_list(),
            E::TABLE.name,
            filter
        )
    }

    /// Validate, normalise and store a new record.
    pub async fn insert(&self, new: E::New) -> DbResult<E> {
        let columns = E::validate_new(new).map_err(Self::invalid)?;
        let stamp = schema::format_timestamp(schema::now());

        let mut names: Vec<&str> = columns.iter().map(|(name, _)| *name).collect();
        names.push(CREATED_AT);
        names.push(UPDATED_AT);

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
            E::TABLE.name,
            names.join(", "),
            placeholders(1..=names.len()).join(", "),
            E::TABLE.select_list()
        );

        let mut session = self.db.session().await?;
        let mut tx = session.begin_write().await?;

        let mut query = sqlx::query_as::<Any, E>(&sql);
        for (_, value) in &columns {
            query = bind(query, value);
        }
        query = query.bind(stamp.clone()).bind(stamp);

        let record = match query.fetch_one(&mut *tx).await {
            Ok(record) => record,
            Err(err) => return Err(Self::translate_write(err, &columns)),
        };
        tx.commit().await?;

        info!(entity = E::NAME, id = record.id(), "Inserted");
        Ok(record)
    }

    /// Look a record up by id; a miss is `Ok(None)`.
    pub async fn get(&self, id: i64) -> DbResult<Option<E>> {
        require_positive_id(ID, id).map_err(Self::invalid)?;

        let sql = Self::select_sql(&format!("WHERE {} = $1", ID));
        let mut session = self.db.session().await?;

        let record = sqlx::query_as::<Any, E>(&sql)
            .bind(id)
            .fetch_optional(session.connection())
            .await
            .map_err(Self::unexpected)?;

        debug!(entity = E::NAME, id, found = record.is_some(), "Lookup by id");
        Ok(record)
    }

    /// Look a record up by one of its unique columns.
    pub async fn find_by(&self, column: &str, value: impl Into<Value>) -> DbResult<Option<E>> {
        let column = E::TABLE
            .column(column)
            .filter(|c| c.unique)
            .ok_or_else(|| {
                Self::invalid(ValidationError::UnknownField {
                    field: column.to_string(),
                })
            })?;
        let value = lookup_value(column, value.into()).map_err(Self::invalid)?;

        let sql = Self::select_sql(&format!("WHERE {} = $1", column.name));
        let mut session = self.db.session().await?;

        let record = bind(sqlx::query_as::<Any, E>(&sql), &value)
            .fetch_optional(session.connection())
            .await
            .map_err(Self::unexpected)?;

        debug!(entity = E::NAME, field = column.name, found = record.is_some(), "Lookup by key");
        Ok(record)
    }

    /// Every record whose `column` equals `value`, ordered by id.
    pub async fn filter_by(&self, column: &str, value: impl Into<Value>) -> DbResult<Vec<E>> {
        let column = E::TABLE.column(column).ok_or_else(|| {
            Self::invalid(ValidationError::UnknownField {
                field: column.to_string(),
            })
        })?;
        let value = lookup_value(column, value.into()).map_err(Self::invalid)?;

        let sql = Self::select_sql(&format!("WHERE {} = $1 ORDER BY {}", column.name, ID));
        let mut session = self.db.session().await?;

        let records = bind(sqlx::query_as::<Any, E>(&sql), &value)
            .fetch_all(session.connection())
            .await
            .map_err(Self::unexpected)?;

        debug!(entity = E::NAME, field = column.name, count = records.len(), "Filtered");
        Ok(records)
    }

    pub async fn list(&self) -> DbResult<Vec<E>> {
        let sql = Self::select_sql(&format!("ORDER BY {}", ID));
        let mut session = self.db.session().await?;

        let records = sqlx::query_as::<Any, E>(&sql)
            .fetch_all(session.connection())
            .await
            .map_err(Self::unexpected)?;

        Ok(records)
    }

    /// Apply the supplied fields of `patch` and refresh the update stamp.
    pub async fn update(&self, id: i64, patch: E::Patch) -> DbResult<E> {
        require_positive_id(ID, id).map_err(Self::invalid)?;
        let patch = E::validate_patch(patch).map_err(Self::invalid)?;

        let mut session = self.db.session().await?;
        let mut tx = session.begin_write().await?;

        let current = sqlx::query_as::<Any, E>(&Self::select_sql(&format!("WHERE {} = $1", ID)))
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(Self::unexpected)?
            .ok_or(DbError::NotFound {
                entity: E::NAME,
                id,
            })?;

        let stamp = schema::next_update_stamp(current.updated_at());
        let columns = current.apply_patch(patch);

        let assignments: Vec<String> = columns
            .iter()
            .map(|(name, _)| *name)
            .chain(std::iter::once(UPDATED_AT))
            .zip(placeholders(1..=columns.len() + 1))
            .map(|(name, placeholder)| format!("{} = {}", name, placeholder))
            .collect();

        let sql = format!(
            "UPDATE {} SET {} WHERE {} = ${} RETURNING {}",
            E::TABLE.name,
            assignments.join(", "),
            ID,
            columns.len() + 2,
            E::TABLE.select_list()
        );

        let mut query = sqlx::query_as::<Any, E>(&sql);
        for (_, value) in &columns {
            query = bind(query, value);
        }
        query = query.bind(schema::format_timestamp(stamp)).bind(id);

        let record = match query.fetch_one(&mut *tx).await {
            Ok(record) => record,
            Err(err) => return Err(Self::translate_write(err, &columns)),
        };
        tx.commit().await?;

        info!(entity = E::NAME, id, "Updated");
        Ok(record)
    }

    /// Remove a record, returning its state before deletion.
    pub async fn delete(&self, id: i64) -> DbResult<E> {
        require_positive_id(ID, id).map_err(Self::invalid)?;

        let mut session = self.db.session().await?;
        let mut tx = session.begin_write().await?;

        let current = sqlx::query_as::<Any, E>(&Self::select_sql(&format!("WHERE {} = $1", ID)))
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(Self::unexpected)?
            .ok_or(DbError::NotFound {
                entity: E::NAME,
                id,
            })?;

        let sql = format!("DELETE FROM {} WHERE {} = $1", E::TABLE.name, ID);
        let result = sqlx::query(&sql).bind(id).execute(&mut *tx).await;
        match result {
            Ok(_) => {
                tx.commit().await?;
                info!(entity = E::NAME, id, "Deleted");
                Ok(current)
            }
            Err(err) => {
                tx.rollback().await?;
                Err(Self::translate_delete(err, id, &mut session).await)
            }
        }
    }

    fn unexpected(err: sqlx::Error) -> DbError {
        error!(entity = E::NAME, error = %err, "Unexpected database failure");
        DbError::Unexpected(err)
    }

    /// Map a failed insert/update onto the error taxonomy.
    fn translate_write(err: sqlx::Error, columns: &Columns) -> DbError {
        let Some(violation) = ConstraintViolation::classify(&err) else {
            return Self::unexpected(err);
        };

        match violation.kind {
            ConstraintKind::Unique => match violation.column_in(E::TABLE) {
                Some(column) => {
                    let value = columns
                        .iter()
                        .find(|(name, _)| *name == column.name)
                        .map(|(_, value)| value.to_string())
                        .unwrap_or_default();
                    warn!(entity = E::NAME, field = column.name, %value, "Uniqueness violation");
                    DbError::UniquenessViolation {
                        entity: E::NAME,
                        field: column.name,
                        value,
                    }
                }
                None => Self::integrity(violation),
            },
            ConstraintKind::ForeignKey => {
                let references: Vec<(&'static str, i64)> = E::TABLE
                    .foreign_keys()
                    .filter_map(|fk| {
                        columns.iter().find_map(|(name, value)| match value {
                            Value::Integer(id) if *name == fk.name => Some((fk.name, *id)),
                            _ => None,
                        })
                    })
                    .collect();
                warn!(entity = E::NAME, ?references, "Missing foreign reference");
                DbError::ForeignKeyViolation {
                    entity: E::NAME,
                    detail: ForeignKeyDetail::MissingReference { references },
                }
            }
            _ => Self::integrity(violation),
        }
    }

    async fn translate_delete(err: sqlx::Error, id: i64, session: &mut Session) -> DbError {
        match ConstraintViolation::classify(&err) {
            Some(violation) if violation.kind == ConstraintKind::ForeignKey => {
                let backend = session.backend();
                let tables = match introspect::tables_referencing(session.connection(), backend, E::TABLE.name)
                    .await
                {
                    Ok(tables) => tables,
                    Err(e) => {
                        warn!(entity = E::NAME, error = %e, "Could not list referencing tables");
                        Vec::new()
                    }
                };
                warn!(entity = E::NAME, id, ?tables, "Delete blocked by foreign key");
                DbError::ForeignKeyViolation {
                    entity: E::NAME,
                    detail: ForeignKeyDetail::Referenced { id, tables },
                }
            }
            Some(violation) => Self::integrity(violation),
            None => Self::unexpected(err),
        }
    }

    fn integrity(violation: ConstraintViolation) -> DbError {
        warn!(entity = E::NAME, kind = ?violation.kind, message = %violation.message, "Integrity error");
        DbError::Integrity {
            entity: E::NAME,
            message: violation.message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{picole, revendedor};

    #[test]
    fn lookup_normalises_text() {
        let column = revendedor::TABLE.column("nome").unwrap();
        let value = lookup_value(column, Value::from("  loja sul ")).unwrap();
        assert_eq!(value, Value::Text("LOJA SUL".into()));
    }

    #[test]
    fn lookup_rejects_blank_text() {
        let column = revendedor::TABLE.column("cnpj").unwrap();
        let err = lookup_value(column, Value::from("   ")).unwrap_err();
        assert_eq!(err, ValidationError::Blank { field: "cnpj" });
    }

    #[test]
    fn lookup_rejects_wrong_kind() {
        let column = picole::TABLE.column("sabor").unwrap();
        let err = lookup_value(column, Value::from(7_i64)).unwrap_err();
        assert_eq!(
            err,
            ValidationError::WrongType {
                field: "sabor",
                expected: "text"
            }
        );
    }

    #[test]
    fn foreign_key_lookup_requires_positive_id() {
        let column = crate::entities::conservante_picole::TABLE.column("picole_fk").unwrap();
        assert!(lookup_value(column, Value::from(0_i64)).is_err());
        assert_eq!(lookup_value(column, Value::from(3_i64)).unwrap(), Value::Integer(3));
    }

    #[test]
    fn value_display() {
        assert_eq!(Value::from("1-1").to_string(), "1-1");
        assert_eq!(Value::from(42_i64).to_string(), "42");
    }

    #[test]
    fn placeholder_numbering() {
        assert_eq!(placeholders(1..=3), vec!["$1", "$2", "$3"]);
    }
}
