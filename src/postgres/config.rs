use std::future::Future;

use bb8::{ManageConnection, Pool};
use tokio_postgres::{Client, NoTls};

use crate::config::DialectConfig;
use crate::error::OrmError;

const DEFAULT_PORT: u16 = 5432;
const DEFAULT_POOL_SIZE: u32 = 10;

/// Render the key=value connection string for `cfg`.
///
/// # Errors
/// Returns `OrmError::ConfigurationError` if host, user or database is missing.
pub fn connection_string(cfg: &DialectConfig) -> Result<String, OrmError> {
    let host = cfg.require("host", &cfg.host)?;
    let user = cfg.require("user", &cfg.user)?;
    let database = cfg.require("database", &cfg.database)?;

    let mut out = format!(
        "host={} port={} user={}",
        quote(host),
        cfg.port.unwrap_or(DEFAULT_PORT),
        quote(user)
    );
    if let Some(password) = &cfg.password {
        out.push_str(&format!(" password={}", quote(password)));
    }
    out.push_str(&format!(" dbname={} sslmode=disable", quote(database)));
    Ok(out)
}

fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// bb8 manager for Postgres clients.
pub struct PgManager {
    pub(crate) config: tokio_postgres::Config,
}

impl PgManager {
    #[must_use]
    pub fn new(config: tokio_postgres::Config) -> Self {
        Self { config }
    }

    /// Build a pool from this manager, sized and aged by `cfg`.
    ///
    /// # Errors
    /// Returns `OrmError::ConnectionError` if the pool cannot open its first connections.
    pub async fn build_pool(self, cfg: &DialectConfig) -> Result<Pool<PgManager>, OrmError> {
        let max_size = cfg.max_open_connections.unwrap_or(DEFAULT_POOL_SIZE).max(1);
        Pool::builder()
            .max_size(max_size)
            .min_idle(cfg.max_idle_connections.map(|idle| idle.min(max_size)))
            .max_lifetime(cfg.conn_max_lifetime())
            .idle_timeout(cfg.conn_max_idle_time())
            .build(self)
            .await
            .map_err(|e| OrmError::ConnectionError(format!("postgres pool error: {e}")))
    }
}

impl ManageConnection for PgManager {
    type Connection = Client;
    type Error = tokio_postgres::Error;

    #[allow(clippy::manual_async_fn)]
    fn connect(&self) -> impl Future<Output = Result<Self::Connection, Self::Error>> + Send {
        let cfg = self.config.clone();
        async move {
            tracing::debug!(
                hosts = ?cfg.get_hosts(),
                dbname = ?cfg.get_dbname(),
                "postgres connect"
            );
            let (client, connection) = cfg.connect(NoTls).await?;
            tokio::spawn(async move {
                if let Err(e) = connection.await {
                    tracing::error!(error = %e, "postgres connection closed with error");
                }
            });
            Ok(client)
        }
    }

    #[allow(clippy::manual_async_fn)]
    fn is_valid(
        &self,
        conn: &mut Self::Connection,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send {
        async move { conn.simple_query("SELECT 1").await.map(|_| ()) }
    }

    fn has_broken(&self, conn: &mut Self::Connection) -> bool {
        conn.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Dialect;

    fn cfg() -> DialectConfig {
        DialectConfig {
            host: Some("localhost".into()),
            user: Some("app".into()),
            password: Some("it's".into()),
            database: Some("orm_test".into()),
            ..DialectConfig::new(Dialect::Postgres)
        }
    }

    #[test]
    fn renders_quoted_key_values() {
        let s = connection_string(&cfg()).unwrap();
        assert_eq!(
            s,
            "host='localhost' port=5432 user='app' password='it\\'s' dbname='orm_test' sslmode=disable"
        );
        let parsed: tokio_postgres::Config = s.parse().unwrap();
        assert_eq!(parsed.get_dbname(), Some("orm_test"));
        assert_eq!(parsed.get_password(), Some("it's".as_bytes()));
        assert_eq!(parsed.get_ports(), &[5432_u16]);
    }

    #[test]
    fn missing_host_is_a_configuration_error() {
        let cfg = DialectConfig {
            host: None,
            ..cfg()
        };
        let err = connection_string(&cfg).unwrap_err();
        assert!(matches!(err, OrmError::ConfigurationError(_)));
    }
}
