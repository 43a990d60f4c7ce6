//! Connection provider
//!
//! Owns the one connection pool for a configuration. The pool is built
//! lazily on first use and cached until [`ConnectionProvider::reset`] or
//! [`ConnectionProvider::close`]; configuration never changes behind a
//! caller's back.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use picoles_core::{Backend, DatabaseConfig};
use sqlx::any::{AnyConnectOptions, AnyPoolOptions};
use sqlx::{AnyPool, ConnectOptions};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};

/// Cached, cheaply cloneable handle to the shared pool
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    pub pool: AnyPool,
    pub backend: Backend,
    pub timeout: Duration,
}

#[derive(Debug)]
pub struct ConnectionProvider {
    state: RwLock<ProviderState>,
}

#[derive(Debug)]
struct ProviderState {
    config: DatabaseConfig,
    handle: Option<ConnectionHandle>,
}

impl ConnectionProvider {
    pub fn new(config: DatabaseConfig) -> Self {
        Self {
            state: RwLock::new(ProviderState {
                config,
                handle: None,
            }),
        }
    }

    /// Return the cached handle, connecting on first use.
    pub async fn handle(&self) -> DbResult<ConnectionHandle> {
        {
            let state = self.state.read().await;
            if let Some(handle) = &state.handle {
                return Ok(handle.clone());
            }
        }

        let mut state = self.state.write().await;
        // Another task may have connected while we waited for the lock
        if let Some(handle) = &state.handle {
            return Ok(handle.clone());
        }

        let handle = connect(&state.config).await?;
        state.handle = Some(handle.clone());
        Ok(handle)
    }

    pub async fn is_connected(&self) -> bool {
        self.state.read().await.handle.is_some()
    }

    pub async fn config(&self) -> DatabaseConfig {
        self.state.read().await.config.clone()
    }

    /// Close the cached pool and switch to `config`; the next call reconnects.
    pub async fn reset(&self, config: DatabaseConfig) {
        let mut state = self.state.write().await;
        if let Some(handle) = state.handle.take() {
            handle.pool.close().await;
        }
        info!(backend = config.backend.as_str(), "Connection provider reconfigured");
        state.config = config;
    }

    /// Close the cached pool, if any. The configuration is kept.
    pub async fn close(&self) {
        let mut state = self.state.write().await;
        if let Some(handle) = state.handle.take() {
            handle.pool.close().await;
            debug!("Connection pool closed");
        }
    }
}

async fn connect(config: &DatabaseConfig) -> DbResult<ConnectionHandle> {
    sqlx::any::install_default_drivers();

    let url = match config.backend {
        Backend::Embedded => {
            let path = config
                .resolved_embedded_path()
                .map_err(|e| DbError::Config(format!("{:#}", e)))?;

            // Ensure parent directory exists
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(parent).await?;
                }
            }

            info!("Opening embedded database: {}", path.display());
            embedded_url(&path)
        }
        Backend::Networked => {
            info!("Connecting to networked database");
            config.networked_url()
        }
    };

    let mut options = AnyConnectOptions::from_str(&url)?;
    if !config.echo {
        options = options.disable_statement_logging();
    }

    let pool = AnyPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.timeout())
        .connect_with(options)
        .await?;

    debug!(
        backend = config.backend.as_str(),
        max_connections = config.max_connections,
        "Connection pool established"
    );

    Ok(ConnectionHandle {
        pool,
        backend: config.backend,
        timeout: config.timeout(),
    })
}

/// SQLite URL for `path`. Each component is percent-encoded so `?`, `#`
/// and `%` in directory names reach the driver intact.
fn embedded_url(path: &Path) -> String {
    let encoded: Vec<String> = path
        .to_string_lossy()
        .split('/')
        .map(|part| urlencoding::encode(part).into_owned())
        .collect();
    format!("sqlite://{}?mode=rwc", encoded.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_url_escapes_reserved_characters() {
        assert_eq!(
            embedded_url(Path::new("/srv/picoles/data.sqlite")),
            "sqlite:///srv/picoles/data.sqlite?mode=rwc"
        );
        assert_eq!(
            embedded_url(Path::new("/tmp/a#b?c%d/p.sqlite")),
            "sqlite:///tmp/a%23b%3Fc%25d/p.sqlite?mode=rwc"
        );
    }

    #[tokio::test]
    async fn opens_path_with_reserved_characters() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a#b?c%d").join("picoles.sqlite");
        let provider = ConnectionProvider::new(DatabaseConfig::embedded_at(&path));

        provider.handle().await.expect("connect");
        assert!(path.exists());

        provider.close().await;
    }

    #[tokio::test]
    async fn connects_lazily() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("picoles.sqlite");
        let provider = ConnectionProvider::new(DatabaseConfig::embedded_at(&path));

        assert!(!provider.is_connected().await);
        assert!(!path.exists());

        let handle = provider.handle().await.expect("connect");
        assert_eq!(handle.backend, Backend::Embedded);
        assert!(provider.is_connected().await);
        assert!(path.exists());

        provider.close().await;
        assert!(!provider.is_connected().await);
    }

    #[tokio::test]
    async fn reuses_cached_pool() {
        let dir = tempfile::tempdir().unwrap();
        let provider = ConnectionProvider::new(DatabaseConfig::embedded_at(dir.path().join("a.sqlite")));

        let first = provider.handle().await.unwrap();
        sqlx::query("CREATE TABLE marker (x INTEGER)")
            .execute(&first.pool)
            .await
            .unwrap();

        let second = provider.handle().await.unwrap();
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM marker")
            .fetch_one(&second.pool)
            .await
            .unwrap();
        assert_eq!(count, 0);

        provider.close().await;
    }

    #[tokio::test]
    async fn reset_switches_configuration() {
        let dir = tempfile::tempdir().unwrap();
        let first_path = dir.path().join("first.sqlite");
        let second_path = dir.path().join("second.sqlite");

        let provider = ConnectionProvider::new(DatabaseConfig::embedded_at(&first_path));
        provider.handle().await.unwrap();

        provider.reset(DatabaseConfig::embedded_at(&second_path)).await;
        assert!(!provider.is_connected().await);
        assert_eq!(provider.config().await.embedded_path, second_path);

        provider.handle().await.unwrap();
        assert!(second_path.exists());

        provider.close().await;
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn connects_to_networked_store() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let provider = ConnectionProvider::new(DatabaseConfig::networked_at(url));

        let handle = provider.handle().await.expect("connect");
        assert_eq!(handle.backend, Backend::Networked);

        let (one,): (i32,) = sqlx::query_as("SELECT 1")
            .fetch_one(&handle.pool)
            .await
            .expect("query failed");
        assert_eq!(one, 1);
    }
}
