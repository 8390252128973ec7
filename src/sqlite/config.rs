use std::fs::OpenOptions;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use bb8::{ManageConnection, Pool};
use rusqlite::OpenFlags;
use tokio::sync::Mutex;

use crate::config::DialectConfig;
use crate::error::OrmError;

/// A pooled connection; the mutex lets blocking tasks borrow it mutably.
pub type SharedSqliteConnection = Arc<Mutex<rusqlite::Connection>>;

const DEFAULT_POOL_SIZE: u32 = 4;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);
const AUTH_CRYPT: &str = "SHA512";

/// Render the `file:` URI for `cfg`, with authentication parameters when `auth` is set.
///
/// # Errors
/// Returns `OrmError::ConfigurationError` if the path is missing, or if `auth` is set without
/// a user and password.
pub fn connection_string(cfg: &DialectConfig) -> Result<String, OrmError> {
    let path = cfg.path.as_deref().ok_or_else(|| {
        OrmError::ConfigurationError(format!("path is required for {}", cfg.dialect))
    })?;

    let mut dsn = format!("file:{}", encode_uri_component(&path.to_string_lossy(), true));
    if !cfg.auth {
        return Ok(dsn);
    }

    let user = cfg.require("user", &cfg.user)?;
    let password = cfg.require("password", &cfg.password)?;
    dsn.push_str(&format!(
        "?_auth&_auth_user={}&_auth_pass={}&_auth_crypt={AUTH_CRYPT}",
        encode_uri_component(user, false),
        encode_uri_component(password, false)
    ));
    Ok(dsn)
}

fn encode_uri_component(value: &str, keep_slashes: bool) -> String {
    let mut out = String::with_capacity(value.len());
    for b in value.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(char::from(b));
            }
            b'/' | b':' if keep_slashes => out.push(char::from(b)),
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

/// Create the database file at `path` when it does not exist yet.
///
/// # Errors
/// Returns `OrmError::ConnectionError` if the file cannot be created.
pub fn ensure_database_file(path: &Path) -> Result<(), OrmError> {
    if path.exists() {
        return Ok(());
    }

    let full_path = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    tracing::warn!(
        path = %full_path.display(),
        "no sqlite database found at path; creating it now (tables must be created separately)"
    );
    OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&full_path)
        .map(|_| ())
        .map_err(|e| {
            OrmError::ConnectionError(format!(
                "could not create sqlite database {}: {e}",
                full_path.display()
            ))
        })
}

/// bb8 manager for rusqlite connections opened from a `file:` URI.
pub struct SqliteManager {
    uri: String,
}

impl SqliteManager {
    #[must_use]
    pub fn new(uri: String) -> Self {
        Self { uri }
    }

    /// Build a pool from this manager, sized and aged by `cfg`.
    ///
    /// # Errors
    /// Returns `OrmError::ConnectionError` if the pool cannot open its first connections.
    pub async fn build_pool(self, cfg: &DialectConfig) -> Result<Pool<SqliteManager>, OrmError> {
        let max_size = cfg.max_open_connections.unwrap_or(DEFAULT_POOL_SIZE).max(1);
        Pool::builder()
            .max_size(max_size)
            .min_idle(cfg.max_idle_connections.map(|idle| idle.min(max_size)))
            .max_lifetime(cfg.conn_max_lifetime())
            .idle_timeout(cfg.conn_max_idle_time())
            .build(self)
            .await
            .map_err(|e| OrmError::ConnectionError(format!("sqlite pool error: {e}")))
    }
}

impl ManageConnection for SqliteManager {
    type Connection = SharedSqliteConnection;
    type Error = rusqlite::Error;

    #[allow(clippy::manual_async_fn)]
    fn connect(&self) -> impl Future<Output = Result<Self::Connection, Self::Error>> + Send {
        let uri = self.uri.clone();
        async move {
            let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX;
            let conn = rusqlite::Connection::open_with_flags(&uri, flags)?;
            conn.busy_timeout(BUSY_TIMEOUT)?;
            conn.execute_batch("PRAGMA journal_mode = WAL;")?;
            Ok(Arc::new(Mutex::new(conn)))
        }
    }

    #[allow(clippy::manual_async_fn)]
    fn is_valid(
        &self,
        conn: &mut Self::Connection,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send {
        let conn = Arc::clone(conn);
        async move { conn.lock().await.query_row("SELECT 1", [], |_| Ok(())) }
    }

    fn has_broken(&self, _conn: &mut Self::Connection) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Dialect;

    #[test]
    fn plain_file_uri() {
        let cfg = DialectConfig::sqlite("/tmp/app data/dev.db");
        assert_eq!(
            connection_string(&cfg).unwrap(),
            "file:/tmp/app%20data/dev.db"
        );
    }

    #[test]
    fn auth_parameters_are_appended() {
        let cfg = DialectConfig {
            auth: true,
            user: Some("admin".into()),
            password: Some("p&ss".into()),
            ..DialectConfig::sqlite("dev.db")
        };
        assert_eq!(
            connection_string(&cfg).unwrap(),
            "file:dev.db?_auth&_auth_user=admin&_auth_pass=p%26ss&_auth_crypt=SHA512"
        );
    }

    #[test]
    fn auth_without_credentials_is_rejected() {
        let cfg = DialectConfig {
            auth: true,
            ..DialectConfig::sqlite("dev.db")
        };
        assert!(matches!(
            connection_string(&cfg).unwrap_err(),
            OrmError::ConfigurationError(_)
        ));
        assert!(connection_string(&DialectConfig::new(Dialect::Sqlite)).is_err());
    }

    #[test]
    fn creates_missing_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fresh.db");
        assert!(!path.exists());
        ensure_database_file(&path).unwrap();
        assert!(path.exists());
        ensure_database_file(&path).unwrap();
    }
}
