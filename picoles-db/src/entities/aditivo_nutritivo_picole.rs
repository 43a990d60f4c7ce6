//! Additive-to-product associations (`aditivo_nutritivo_picole`)

use chrono::{DateTime, Utc};
use picoles_core::validation::require_positive_id;
use picoles_core::ValidationError;
use serde::{Deserialize, Serialize};
use sqlx::any::AnyRow;
use sqlx::{FromRow, Row};

use super::association_key;
use super::{aditivo_nutritivo, picole};
use crate::error::DbResult;
use crate::repo::{timestamp, Columns, Entity, Repository};
use crate::schema::{ColumnDef, TableDef, CREATED_AT, ID, UPDATED_AT};

const PICOLE_FK: &str = "picole_fk";
const ADITIVO_NUTRITIVO_FK: &str = "aditivo_nutritivo_fk";
const KEY: &str = "aditivo_nutritivo_picole";

pub const TABLE: TableDef = TableDef {
    name: "aditivo_nutritivo_picole",
    columns: &[
        ColumnDef::foreign_key(PICOLE_FK, picole::TABLE.name),
        ColumnDef::foreign_key(ADITIVO_NUTRITIVO_FK, aditivo_nutritivo::TABLE.name),
        ColumnDef::text(KEY, 200).unique(),
    ],
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AditivoNutritivoPicole {
    pub id: i64,
    pub picole_fk: i64,
    pub aditivo_nutritivo_fk: i64,
    pub aditivo_nutritivo_picole: String,
    pub data_criacao: DateTime<Utc>,
    pub data_atualizacao: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy)]
pub struct NewAditivoNutritivoPicole {
    pub picole_fk: i64,
    pub aditivo_nutritivo_fk: i64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AditivoNutritivoPicolePatch {
    pub picole_fk: Option<i64>,
    pub aditivo_nutritivo_fk: Option<i64>,
}

impl<'r> FromRow<'r, AnyRow> for AditivoNutritivoPicole {
    fn from_row(row: &'r AnyRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get(ID)?,
            picole_fk: row.try_get(PICOLE_FK)?,
            aditivo_nutritivo_fk: row.try_get(ADITIVO_NUTRITIVO_FK)?,
            aditivo_nutritivo_picole: row.try_get(KEY)?,
            data_criacao: timestamp(row, CREATED_AT)?,
            data_atualizacao: timestamp(row, UPDATED_AT)?,
        })
    }
}

fn columns(picole_fk: i64, aditivo_nutritivo_fk: i64) -> Columns {
    vec![
        (PICOLE_FK, picole_fk.into()),
        (ADITIVO_NUTRITIVO_FK, aditivo_nutritivo_fk.into()),
        (KEY, association_key(aditivo_nutritivo_fk, picole_fk).into()),
    ]
}

impl Entity for AditivoNutritivoPicole {
    const NAME: &'static str = "AditivoNutritivoPicole";
    const TABLE: &'static TableDef = &TABLE;

    type New = NewAditivoNutritivoPicole;
    type Patch = AditivoNutritivoPicolePatch;

    fn validate_new(new: Self::New) -> Result<Columns, ValidationError> {
        Ok(columns(
            require_positive_id(PICOLE_FK, new.picole_fk)?,
            require_positive_id(ADITIVO_NUTRITIVO_FK, new.aditivo_nutritivo_fk)?,
        ))
    }

    fn validate_patch(patch: Self::Patch) -> Result<Self::Patch, ValidationError> {
        Ok(Self::Patch {
            picole_fk: patch
                .picole_fk
                .map(|id| require_positive_id(PICOLE_FK, id))
                .transpose()?,
            aditivo_nutritivo_fk: patch
                .aditivo_nutritivo_fk
                .map(|id| require_positive_id(ADITIVO_NUTRITIVO_FK, id))
                .transpose()?,
        })
    }

    fn apply_patch(&self, patch: Self::Patch) -> Columns {
        columns(
            patch.picole_fk.unwrap_or(self.picole_fk),
            patch.aditivo_nutritivo_fk.unwrap_or(self.aditivo_nutritivo_fk),
        )
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.data_atualizacao
    }
}

impl Repository<'_, AditivoNutritivoPicole> {
    pub async fn by_key(
        &self,
        picole_fk: i64,
        aditivo_nutritivo_fk: i64,
    ) -> DbResult<Option<AditivoNutritivoPicole>> {
        self.find_by(KEY, association_key(aditivo_nutritivo_fk, picole_fk))
            .await
    }

    pub async fn list_by_picole(&self, picole_fk: i64) -> DbResult<Vec<AditivoNutritivoPicole>> {
        self.filter_by(PICOLE_FK, picole_fk).await
    }

    pub async fn list_by_aditivo_nutritivo(
        &self,
        aditivo_nutritivo_fk: i64,
    ) -> DbResult<Vec<AditivoNutritivoPicole>> {
        self.filter_by(ADITIVO_NUTRITIVO_FK, aditivo_nutritivo_fk).await
    }
}
