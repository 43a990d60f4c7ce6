//! Products (`picole`)

use chrono::{DateTime, Utc};
use picoles_core::validation::{normalize_text, require_positive_amount};
use picoles_core::ValidationError;
use serde::{Deserialize, Serialize};
use sqlx::any::AnyRow;
use sqlx::{FromRow, Row};

use crate::error::DbResult;
use crate::repo::{timestamp, Columns, Entity, Repository};
use crate::schema::{ColumnDef, TableDef, CREATED_AT, ID, UPDATED_AT};

const SABOR: &str = "sabor";
const PRECO: &str = "preco";
const SABOR_MAX: usize = 45;

pub const TABLE: TableDef = TableDef {
    name: "picole",
    columns: &[ColumnDef::text(SABOR, SABOR_MAX).unique(), ColumnDef::real(PRECO)],
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Picole {
    pub id: i64,
    pub sabor: String,
    pub preco: f64,
    pub data_criacao: DateTime<Utc>,
    pub data_atualizacao: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPicole {
    pub sabor: String,
    pub preco: f64,
}

impl NewPicole {
    pub fn new(sabor: impl Into<String>, preco: f64) -> Self {
        Self {
            sabor: sabor.into(),
            preco,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PicolePatch {
    pub sabor: Option<String>,
    pub preco: Option<f64>,
}

impl<'r> FromRow<'r, AnyRow> for Picole {
    fn from_row(row: &'r AnyRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get(ID)?,
            sabor: row.try_get(SABOR)?,
            preco: row.try_get(PRECO)?,
            data_criacao: timestamp(row, CREATED_AT)?,
            data_atualizacao: timestamp(row, UPDATED_AT)?,
        })
    }
}

impl Entity for Picole {
    const NAME: &'static str = "Picole";
    const TABLE: &'static TableDef = &TABLE;

    type New = NewPicole;
    type Patch = PicolePatch;

    fn validate_new(new: Self::New) -> Result<Columns, ValidationError> {
        Ok(vec![
            (SABOR, normalize_text(SABOR, &new.sabor, SABOR_MAX)?.into()),
            (PRECO, require_positive_amount(PRECO, new.preco)?.into()),
        ])
    }

    fn validate_patch(patch: Self::Patch) -> Result<Self::Patch, ValidationError> {
        Ok(Self::Patch {
            sabor: patch
                .sabor
                .map(|v| normalize_text(SABOR, &v, SABOR_MAX))
                .transpose()?,
            preco: patch
                .preco
                .map(|v| require_positive_amount(PRECO, v))
                .transpose()?,
        })
    }

    fn apply_patch(&self, patch: Self::Patch) -> Columns {
        vec![
            (SABOR, patch.sabor.unwrap_or_else(|| self.sabor.clone()).into()),
            (PRECO, patch.preco.unwrap_or(self.preco).into()),
        ]
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.data_atualizacao
    }
}

impl Repository<'_, Picole> {
    pub async fn by_sabor(&self, sabor: &str) -> DbResult<Option<Picole>> {
        self.find_by(SABOR, sabor).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_must_be_positive() {
        assert_eq!(
            Picole::validate_new(NewPicole::new("Morango", 0.0)).unwrap_err(),
            ValidationError::NotPositive { field: PRECO }
        );
        assert!(Picole::validate_new(NewPicole::new("Morango", f64::NAN)).is_err());
    }

    #[test]
    fn patch_keeps_unsupplied_fields() {
        let now = Utc::now();
        let current = Picole {
            id: 1,
            sabor: "MORANGO".into(),
            preco: 3.5,
            data_criacao: now,
            data_atualizacao: now,
        };
        let columns = current.apply_patch(PicolePatch {
            preco: Some(4.0),
            ..Default::default()
        });
        assert_eq!(columns.len(), 2);
        assert_eq!(columns[0].1.to_string(), "MORANGO");
        assert_eq!(columns[1].1.to_string(), "4");
    }
}
