//! Session factory
//!
//! A [`Session`] owns exactly one pooled connection. Dropping it returns
//! the connection to the pool, whatever path the caller left by.

use picoles_core::Backend;
use sqlx::AnyConnection;
use sqlx::pool::PoolConnection;
use sqlx::{Any, Connection, Transaction};
use tracing::debug;

use crate::error::DbResult;
use crate::Database;

pub struct Session {
    conn: PoolConnection<Any>,
    backend: Backend,
}

impl Session {
    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Open the caller's transaction. Rolled back on drop unless committed.
    pub async fn begin(&mut self) -> DbResult<Transaction<'_, Any>> {
        Ok(Connection::begin(&mut *self.conn).await?)
    }

    /// Open a transaction that will write.
    ///
    /// On the embedded backend this takes SQLite's write lock up front with
    /// `BEGIN IMMEDIATE`. A deferred transaction that reads first cannot
    /// upgrade its lock while another writer holds one, and SQLite fails
    /// that upgrade at once instead of waiting out `busy_timeout`.
    pub async fn begin_write(&mut self) -> DbResult<Transaction<'_, Any>> {
        let tx = match self.backend {
            Backend::Embedded => {
                Connection::begin_with(&mut *self.conn, "BEGIN IMMEDIATE").await?
            }
            Backend::Networked => Connection::begin(&mut *self.conn).await?,
        };
        Ok(tx)
    }

    /// Bare connection for reads that need no transaction.
    pub fn connection(&mut self) -> &mut AnyConnection {
        &mut self.conn
    }
}

impl Database {
    /// Acquire a session from the shared pool, connecting on first use.
    ///
    /// On the embedded backend foreign-key enforcement and the busy timeout
    /// are switched on here, outside any transaction, since SQLite ignores
    /// `PRAGMA foreign_keys` inside one.
    pub async fn session(&self) -> DbResult<Session> {
        let handle = self.provider().handle().await?;
        let mut conn = handle.pool.acquire().await?;

        if handle.backend == Backend::Embedded {
            sqlx::query("PRAGMA foreign_keys = ON")
                .execute(&mut *conn)
                .await?;

            let busy_timeout = format!("PRAGMA busy_timeout = {}", handle.timeout.as_millis());
            sqlx::query(&busy_timeout).execute(&mut *conn).await?;
        }

        debug!(backend = handle.backend.as_str(), "Session opened");

        Ok(Session {
            conn,
            backend: handle.backend,
        })
    }
}
