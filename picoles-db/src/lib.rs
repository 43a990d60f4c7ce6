//! picoles-db: data access for the picoles domain
//!
//! [`Database`] is the one service object callers hold. It owns the
//! [`ConnectionProvider`], hands out [`Session`]s, recreates the schema and
//! gives typed [`Repository`] access to every entity.
//!
//! ```ignore
//! let db = Database::new(DatabaseConfig::embedded_at("db/picoles.sqlite"));
//! db.create_tables().await?;
//!
//! let aditivo = db
//!     .aditivos_nutritivos()
//!     .insert(NewAditivoNutritivo::new("Vitamina C", "C6H8O6"))
//!     .await?;
//! ```

pub mod constraint;
pub mod entities;
pub mod error;
pub mod introspect;
pub mod provider;
pub mod repo;
pub mod schema;
pub mod session;

use std::sync::Arc;

pub use entities::aditivo_nutritivo::{AditivoNutritivo, AditivoNutritivoPatch, NewAditivoNutritivo};
pub use entities::aditivo_nutritivo_picole::{
    AditivoNutritivoPicole, AditivoNutritivoPicolePatch, NewAditivoNutritivoPicole,
};
pub use entities::conservante::{Conservante, ConservantePatch, NewConservante};
pub use entities::conservante_picole::{ConservantePicole, ConservantePicolePatch, NewConservantePicole};
pub use entities::picole::{NewPicole, Picole, PicolePatch};
pub use entities::revendedor::{NewRevendedor, Revendedor, RevendedorPatch};
pub use error::{DbError, DbResult, ForeignKeyDetail};
pub use picoles_core::{Backend, DatabaseConfig};
pub use provider::{ConnectionHandle, ConnectionProvider};
pub use repo::{Entity, Repository, Value};
pub use session::Session;

/// Shared handle to one configured store. Cloning is cheap.
#[derive(Debug, Clone)]
pub struct Database {
    provider: Arc<ConnectionProvider>,
}

impl Database {
    pub fn new(config: DatabaseConfig) -> Self {
        Self {
            provider: Arc::new(ConnectionProvider::new(config)),
        }
    }

    /// Build from `.env` files, config files and environment overrides.
    pub fn from_env() -> DbResult<Self> {
        picoles_core::load_dotenv().map_err(|e| DbError::Config(format!("{:#}", e)))?;
        let config = picoles_core::PicolesConfig::load();
        Ok(Self::new(config.database))
    }

    pub fn provider(&self) -> &ConnectionProvider {
        &self.provider
    }

    /// Generic repository for any registered entity.
    pub fn repo<E: Entity>(&self) -> Repository<'_, E> {
        Repository::new(self)
    }

    /// Switch to a new configuration; open sessions keep their connection.
    pub async fn reset(&self, config: DatabaseConfig) {
        self.provider.reset(config).await;
    }

    pub async fn close(&self) {
        self.provider.close().await;
    }
}
