//! Preservative-to-product associations (`conservante_picole`)
//!
//! The `conservante_picole` column holds `"{conservante_fk}-{picole_fk}"`
//! and is unique, so storage rejects a second identical association. It is
//! recomputed on every write and never supplied by callers.

use chrono::{DateTime, Utc};
use picoles_core::validation::require_positive_id;
use picoles_core::ValidationError;
use serde::{Deserialize, Serialize};
use sqlx::any::AnyRow;
use sqlx::{FromRow, Row};

use super::association_key;
use super::{conservante, picole};
use crate::error::DbResult;
use crate::repo::{timestamp, Columns, Entity, Repository};
use crate::schema::{ColumnDef, TableDef, CREATED_AT, ID, UPDATED_AT};

const PICOLE_FK: &str = "picole_fk";
const CONSERVANTE_FK: &str = "conservante_fk";
const KEY: &str = "conservante_picole";

pub const TABLE: TableDef = TableDef {
    name: "conservante_picole",
    columns: &[
        ColumnDef::foreign_key(PICOLE_FK, picole::TABLE.name),
        ColumnDef::foreign_key(CONSERVANTE_FK, conservante::TABLE.name),
        ColumnDef::text(KEY, 200).unique(),
    ],
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConservantePicole {
    pub id: i64,
    pub picole_fk: i64,
    pub conservante_fk: i64,
    pub conservante_picole: String,
    pub data_criacao: DateTime<Utc>,
    pub data_atualizacao: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy)]
pub struct NewConservantePicole {
    pub picole_fk: i64,
    pub conservante_fk: i64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ConservantePicolePatch {
    pub picole_fk: Option<i64>,
    pub conservante_fk: Option<i64>,
}

impl<'r> FromRow<'r, AnyRow> for ConservantePicole {
    fn from_row(row: &'r AnyRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get(ID)?,
            picole_fk: row.try_get(PICOLE_FK)?,
            conservante_fk: row.try_get(CONSERVANTE_FK)?,
            conservante_picole: row.try_get(KEY)?,
            data_criacao: timestamp(row, CREATED_AT)?,
            data_atualizacao: timestamp(row, UPDATED_AT)?,
        })
    }
}

fn columns(picole_fk: i64, conservante_fk: i64) -> Columns {
    vec![
        (PICOLE_FK, picole_fk.into()),
        (CONSERVANTE_FK, conservante_fk.into()),
        (KEY, association_key(conservante_fk, picole_fk).into()),
    ]
}

impl Entity for ConservantePicole {
    const NAME: &'static str = "ConservantePicole";
    const TABLE: &'static TableDef = &TABLE;

    type New = NewConservantePicole;
    type Patch = ConservantePicolePatch;

    fn validate_new(new: Self::New) -> Result<Columns, ValidationError> {
        Ok(columns(
            require_positive_id(PICOLE_FK, new.picole_fk)?,
            require_positive_id(CONSERVANTE_FK, new.conservante_fk)?,
        ))
    }

    fn validate_patch(patch: Self::Patch) -> Result<Self::Patch, ValidationError> {
        Ok(Self::Patch {
            picole_fk: patch
                .picole_fk
                .map(|id| require_positive_id(PICOLE_FK, id))
                .transpose()?,
            conservante_fk: patch
                .conservante_fk
                .map(|id| require_positive_id(CONSERVANTE_FK, id))
                .transpose()?,
        })
    }

    fn apply_patch(&self, patch: Self::Patch) -> Columns {
        columns(
            patch.picole_fk.unwrap_or(self.picole_fk),
            patch.conservante_fk.unwrap_or(self.conservante_fk),
        )
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.data_atualizacao
    }
}

impl Repository<'_, ConservantePicole> {
    pub async fn by_key(&self, picole_fk: i64, conservante_fk: i64) -> DbResult<Option<ConservantePicole>> {
        self.find_by(KEY, association_key(conservante_fk, picole_fk)).await
    }

    pub async fn list_by_picole(&self, picole_fk: i64) -> DbResult<Vec<ConservantePicole>> {
        self.filter_by(PICOLE_FK, picole_fk).await
    }

    pub async fn list_by_conservante(&self, conservante_fk: i64) -> DbResult<Vec<ConservantePicole>> {
        self.filter_by(CONSERVANTE_FK, conservante_fk).await
    }
}
