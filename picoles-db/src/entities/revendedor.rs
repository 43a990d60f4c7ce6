//! Resellers (`revendedor`)
//!
//! Independent entity: nothing references it and it references nothing.
//! The CNPJ is stored normalised and must be exactly 14 characters.

use chrono::{DateTime, Utc};
use picoles_core::validation::{normalize_exact, normalize_text};
use picoles_core::ValidationError;
use serde::{Deserialize, Serialize};
use sqlx::any::AnyRow;
use sqlx::{FromRow, Row};

use crate::error::DbResult;
use crate::repo::{timestamp, Columns, Entity, Repository};
use crate::schema::{ColumnDef, TableDef, CREATED_AT, ID, UPDATED_AT};

const NOME: &str = "nome";
const CNPJ: &str = "cnpj";
const RAZAO_SOCIAL: &str = "razao_social";
const CONTATO: &str = "contato";

const TEXT_MAX: usize = 100;
pub const CNPJ_LEN: usize = 14;

pub const TABLE: TableDef = TableDef {
    name: "revendedor",
    columns: &[
        ColumnDef::text(NOME, TEXT_MAX),
        ColumnDef::text(CNPJ, CNPJ_LEN).unique(),
        ColumnDef::text(RAZAO_SOCIAL, TEXT_MAX),
        ColumnDef::text(CONTATO, TEXT_MAX),
    ],
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Revendedor {
    pub id: i64,
    pub nome: String,
    pub cnpj: String,
    pub razao_social: String,
    pub contato: String,
    pub data_criacao: DateTime<Utc>,
    pub data_atualizacao: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewRevendedor {
    pub nome: String,
    pub cnpj: String,
    pub razao_social: String,
    pub contato: String,
}

#[derive(Debug, Clone, Default)]
pub struct RevendedorPatch {
    pub nome: Option<String>,
    pub cnpj: Option<String>,
    pub razao_social: Option<String>,
    pub contato: Option<String>,
}

impl<'r> FromRow<'r, AnyRow> for Revendedor {
    fn from_row(row: &'r AnyRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get(ID)?,
            nome: row.try_get(NOME)?,
            cnpj: row.try_get(CNPJ)?,
            razao_social: row.try_get(RAZAO_SOCIAL)?,
            contato: row.try_get(CONTATO)?,
            data_criacao: timestamp(row, CREATED_AT)?,
            data_atualizacao: timestamp(row, UPDATED_AT)?,
        })
    }
}

fn text(field: &'static str, raw: Option<String>) -> Result<Option<String>, ValidationError> {
    raw.map(|v| normalize_text(field, &v, TEXT_MAX)).transpose()
}

impl Entity for Revendedor {
    const NAME: &'static str = "Revendedor";
    const TABLE: &'static TableDef = &TABLE;

    type New = NewRevendedor;
    type Patch = RevendedorPatch;

    fn validate_new(new: Self::New) -> Result<Columns, ValidationError> {
        Ok(vec![
            (NOME, normalize_text(NOME, &new.nome, TEXT_MAX)?.into()),
            (CNPJ, normalize_exact(CNPJ, &new.cnpj, CNPJ_LEN)?.into()),
            (
                RAZAO_SOCIAL,
                normalize_text(RAZAO_SOCIAL, &new.razao_social, TEXT_MAX)?.into(),
            ),
            (CONTATO, normalize_text(CONTATO, &new.contato, TEXT_MAX)?.into()),
        ])
    }

    fn validate_patch(patch: Self::Patch) -> Result<Self::Patch, ValidationError> {
        Ok(Self::Patch {
            nome: text(NOME, patch.nome)?,
            cnpj: patch
                .cnpj
                .map(|v| normalize_exact(CNPJ, &v, CNPJ_LEN))
                .transpose()?,
            razao_social: text(RAZAO_SOCIAL, patch.razao_social)?,
            contato: text(CONTATO, patch.contato)?,
        })
    }

    fn apply_patch(&self, patch: Self::Patch) -> Columns {
        vec![
            (NOME, patch.nome.unwrap_or_else(|| self.nome.clone()).into()),
            (CNPJ, patch.cnpj.unwrap_or_else(|| self.cnpj.clone()).into()),
            (
                RAZAO_SOCIAL,
                patch
                    .razao_social
                    .unwrap_or_else(|| self.razao_social.clone())
                    .into(),
            ),
            (
                CONTATO,
                patch.contato.unwrap_or_else(|| self.contato.clone()).into(),
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

impl Repository<'_, Revendedor> {
    pub async fn by_cnpj(&self, cnpj: &str) -> DbResult<Option<Revendedor>> {
        self.find_by(CNPJ, cnpj).await
    }

    /// Resellers sharing a trade name; names are not unique.
    pub async fn list_by_nome(&self, nome: &str) -> DbResult<Vec<Revendedor>> {
        self.filter_by(NOME, nome).await
    }

    pub async fn list_by_razao_social(&self, razao_social: &str) -> DbResult<Vec<Revendedor>> {
        self.filter_by(RAZAO_SOCIAL, razao_social).await
    }
}
