//! Preservatives (`conservante`)

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
const DESCRICAO: &str = "descricao";
const NOME_MAX: usize = 45;
const DESCRICAO_MAX: usize = 100;

pub const TABLE: TableDef = TableDef {
    name: "conservante",
    columns: &[
        ColumnDef::text(NOME, NOME_MAX).unique(),
        ColumnDef::text(DESCRICAO, DESCRICAO_MAX),
    ],
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conservante {
    pub id: i64,
    pub nome: String,
    pub descricao: String,
    pub data_criacao: DateTime<Utc>,
    pub data_atualizacao: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewConservante {
    pub nome: String,
    pub descricao: String,
}

impl NewConservante {
    pub fn new(nome: impl Into<String>, descricao: impl Into<String>) -> Self {
        Self {
            nome: nome.into(),
            descricao: descricao.into(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConservantePatch {
    pub nome: Option<String>,
    pub descricao: Option<String>,
}

impl<'r> FromRow<'r, AnyRow> for Conservante {
    fn from_row(row: &'r AnyRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get(ID)?,
            nome: row.try_get(NOME)?,
            descricao: row.try_get(DESCRICAO)?,
            data_criacao: timestamp(row, CREATED_AT)?,
            data_atualizacao: timestamp(row, UPDATED_AT)?,
        })
    }
}

impl Entity for Conservante {
    const NAME: &'static str = "Conservante";
    const TABLE: &'static TableDef = &TABLE;

    type New = NewConservante;
    type Patch = ConservantePatch;

    fn validate_new(new: Self::New) -> Result<Columns, ValidationError> {
        Ok(vec![
            (NOME, normalize_text(NOME, &new.nome, NOME_MAX)?.into()),
            (
                DESCRICAO,
                normalize_text(DESCRICAO, &new.descricao, DESCRICAO_MAX)?.into(),
            ),
        ])
    }

    fn validate_patch(patch: Self::Patch) -> Result<Self::Patch, ValidationError> {
        Ok(Self::Patch {
            nome: patch
                .nome
                .map(|v| normalize_text(NOME, &v, NOME_MAX))
                .transpose()?,
            descricao: patch
                .descricao
                .map(|v| normalize_text(DESCRICAO, &v, DESCRICAO_MAX))
                .transpose()?,
        })
    }

    fn apply_patch(&self, patch: Self::Patch) -> Columns {
        vec![
            (NOME, patch.nome.unwrap_or_else(|| self.nome.clone()).into()),
            (
                DESCRICAO,
                patch.descricao.unwrap_or_else(|| self.descricao.clone()).into(),
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

impl Repository<'_, Conservante> {
    pub async fn by_nome(&self, nome: &str) -> DbResult<Option<Conservante>> {
        self.find_by(NOME, nome).await
    }
}
