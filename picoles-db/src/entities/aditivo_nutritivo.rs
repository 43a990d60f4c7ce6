//! Nutritional additives (`aditivo_nutritivo`)

use chrono::{DateTime, Utc};
use picoles_core::validation::normalize_text;
use picoles_core::ValidationError;
use serde::{Deserialize, Serialize};
use sqlx::any::AnyRow;
use sqlx::{FromRow, Row};

use crate::error::DbResult;
use crate::repo::{timestamp, Columns, Entity, Repository};
use crate::schema::{ColumnDef, TableDef, CREATED_AT, ID, UPDATED_AT};

const NOME: &str = "nome";
const FORMULA_QUIMICA: &str = "formula_quimica";
const NOME_MAX: usize = 45;
const FORMULA_MAX: usize = 45;

pub const TABLE: TableDef = TableDef {
    name: "aditivo_nutritivo",
    columns: &[
        ColumnDef::text(NOME, NOME_MAX).unique(),
        ColumnDef::text(FORMULA_QUIMICA, FORMULA_MAX).unique(),
    ],
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AditivoNutritivo {
    pub id: i64,
    pub nome: String,
    pub formula_quimica: String,
    pub data_criacao: DateTime<Utc>,
    pub data_atualizacao: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAditivoNutritivo {
    pub nome: String,
    pub formula_quimica: String,
}

impl NewAditivoNutritivo {
    pub fn new(nome: impl Into<String>, formula_quimica: impl Into<String>) -> Self {
        Self {
            nome: nome.into(),
            formula_quimica: formula_quimica.into(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AditivoNutritivoPatch {
    pub nome: Option<String>,
    pub formula_quimica: Option<String>,
}

impl<'r> FromRow<'r, AnyRow> for AditivoNutritivo {
    fn from_row(row: &'r AnyRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get(ID)?,
            nome: row.try_get(NOME)?,
            formula_quimica: row.try_get(FORMULA_QUIMICA)?,
            data_criacao: timestamp(row, CREATED_AT)?,
            data_atualizacao: timestamp(row, UPDATED_AT)?,
        })
    }
}

impl Entity for AditivoNutritivo {
    const NAME: &'static str = "AditivoNutritivo";
    const TABLE: &'static TableDef = &TABLE;

    type New = NewAditivoNutritivo;
    type Patch = AditivoNutritivoPatch;

    fn validate_new(new: Self::New) -> Result<Columns, ValidationError> {
        Ok(vec![
            (NOME, normalize_text(NOME, &new.nome, NOME_MAX)?.into()),
            (
                FORMULA_QUIMICA,
                normalize_text(FORMULA_QUIMICA, &new.formula_quimica, FORMULA_MAX)?.into(),
            ),
        ])
    }

    fn validate_patch(patch: Self::Patch) -> Result<Self::Patch, ValidationError> {
        Ok(Self::Patch {
            nome: patch
                .nome
                .map(|v| normalize_text(NOME, &v, NOME_MAX))
                .transpose()?,
            formula_quimica: patch
                .formula_quimica
                .map(|v| normalize_text(FORMULA_QUIMICA, &v, FORMULA_MAX))
                .transpose()?,
        })
    }

    fn apply_patch(&self, patch: Self::Patch) -> Columns {
        vec![
            (NOME, patch.nome.unwrap_or_else(|| self.nome.clone()).into()),
            (
                FORMULA_QUIMICA,
                patch
                    .formula_quimica
                    .unwrap_or_else(|| self.formula_quimica.clone())
                    .into(),
            ),
        ]
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.data_atualizacao
    }
}

impl Repository<'_, AditivoNutritivo> {
    pub async fn by_nome(&self, nome: &str) -> DbResult<Option<AditivoNutritivo>> {
        self.find_by(NOME, nome).await
    }

    pub async fn by_formula_quimica(&self, formula_quimica: &str) -> DbResult<Option<AditivoNutritivo>> {
        self.find_by(FORMULA_QUIMICA, formula_quimica).await
    }
}
