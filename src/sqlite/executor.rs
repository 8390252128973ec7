use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use bb8::Pool;
use rusqlite::params_from_iter;
use tokio::sync::RwLock;

use super::config::{SharedSqliteConnection, SqliteManager, connection_string, ensure_database_file};
use super::params::Params;
use super::query::build_result_set;
use crate::config::DialectConfig;
use crate::error::OrmError;
use crate::handler::DialectHandler;
use crate::results::ResultSet;
use crate::types::{Dialect, SqlValue};

/// The embedded `sqlite` dialect: a bb8 pool of rusqlite connections.
///
/// Reads share a read lock so concurrent finds proceed together; any write takes the write
/// lock and excludes every other call on this handler.
pub struct SqliteHandler {
    pool: Pool<SqliteManager>,
    connection_string: String,
    lock: RwLock<()>,
}

impl SqliteHandler {
    /// Create the database file if needed, open a pool for it and ping it once.
    ///
    /// # Errors
    /// Returns `OrmError::ConfigurationError` for incomplete settings and
    /// `OrmError::ConnectionError` when the database cannot be opened.
    pub async fn connect(cfg: &DialectConfig) -> Result<Self, OrmError> {
        let connection_string = connection_string(cfg)?;
        if let Some(path) = &cfg.path {
            ensure_database_file(path)?;
        }
        let pool = SqliteManager::new(connection_string.clone())
            .build_pool(cfg)
            .await?;

        let handler = Self {
            pool,
            connection_string,
            lock: RwLock::new(()),
        };
        handler
            .ping()
            .await
            .map_err(|e| OrmError::ConnectionError(format!("sqlite ping failed: {e}")))?;
        Ok(handler)
    }
}

impl fmt::Debug for SqliteHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteHandler")
            .field("state", &self.pool.state())
            .finish_non_exhaustive()
    }
}

/// Run `func` against `conn` on the blocking thread pool.
pub(crate) async fn run_blocking<F, R>(conn: SharedSqliteConnection, func: F) -> Result<R, OrmError>
where
    F: FnOnce(&mut rusqlite::Connection) -> Result<R, OrmError> + Send + 'static,
    R: Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut guard = conn.blocking_lock();
        func(&mut guard)
    })
    .await
    .map_err(|e| OrmError::ExecutionError(format!("sqlite spawn_blocking join error: {e}")))?
}

#[async_trait]
impl DialectHandler for SqliteHandler {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn connection_string(&self) -> &str {
        &self.connection_string
    }

    async fn ping(&self) -> Result<(), OrmError> {
        let _guard = self.lock.read().await;
        let conn = self.pool.get().await?;
        run_blocking(Arc::clone(&*conn), |c| {
            c.query_row("SELECT 1", [], |_| Ok(()))?;
            Ok(())
        })
        .await
    }

    async fn execute(&self, sql: &str, args: &[SqlValue]) -> Result<usize, OrmError> {
        let _guard = self.lock.write().await;
        // The pooled guard stays alive until the blocking call finishes.
        let conn = self.pool.get().await?;
        let handle = Arc::clone(&*conn);
        let sql = sql.to_owned();
        let params = Params::convert(args);
        run_blocking(handle, move |c| {
            let mut stmt = c.prepare(&sql)?;
            Ok(stmt.execute(params_from_iter(params.as_values().iter()))?)
        })
        .await
    }

    async fn fetch(&self, sql: &str, args: &[SqlValue]) -> Result<ResultSet, OrmError> {
        let _guard = self.lock.read().await;
        let conn = self.pool.get().await?;
        let handle = Arc::clone(&*conn);
        let sql = sql.to_owned();
        let params = Params::convert(args);
        run_blocking(handle, move |c| {
            let mut stmt = c.prepare(&sql)?;
            build_result_set(&mut stmt, params.as_values())
        })
        .await
    }
}
