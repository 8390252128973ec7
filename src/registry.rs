//! Named handlers opened from a [`Config`].

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::config::{Config, DEFAULT_CONNECTION, DialectConfig};
use crate::error::OrmError;
use crate::handler::DialectHandler;
use crate::types::Dialect;

/// Open handlers keyed by connection name.
///
/// A registry owns its configuration; handlers are opened on first [`connect`](Registry::connect)
/// and shared afterwards.
#[derive(Debug)]
pub struct Registry {
    config: Config,
    handlers: Mutex<HashMap<String, Arc<dyn DialectHandler>>>,
}

impl Registry {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            handlers: Mutex::new(HashMap::new()),
        }
    }

    /// Registry over the `database.json` found from the working directory.
    ///
    /// # Errors
    /// Returns `OrmError::ConfigurationError` when no configuration file can be loaded.
    pub fn discover() -> Result<Self, OrmError> {
        Ok(Self::new(Config::discover()?))
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Handler for `name`, opening it if this registry has not yet. An empty name means
    /// `development`.
    ///
    /// # Errors
    /// Returns `OrmError::ConfigurationError` for an unknown name or a backend compiled out, and
    /// `OrmError::ConnectionError` when the backend cannot be reached.
    pub async fn connect(&self, name: &str) -> Result<Arc<dyn DialectHandler>, OrmError> {
        let name = if name.is_empty() {
            DEFAULT_CONNECTION
        } else {
            name
        };

        if let Some(handler) = self.handler(name).await {
            return Ok(handler);
        }

        // Bootstrap without the lock held; a concurrent open of the same name keeps the first.
        let cfg = self.config.get(name)?;
        let opened = open_handler(cfg).await?;

        let mut handlers = self.handlers.lock().await;
        if let Some(existing) = handlers.get(name) {
            tracing::debug!(connection = name, "handler opened concurrently; keeping the first");
            return Ok(Arc::clone(existing));
        }
        tracing::debug!(connection = name, dialect = %cfg.dialect, "opened database handler");
        handlers.insert(name.to_string(), Arc::clone(&opened));
        Ok(opened)
    }

    /// Handler for `name` if it is already open.
    pub async fn handler(&self, name: &str) -> Option<Arc<dyn DialectHandler>> {
        self.handlers.lock().await.get(name).cloned()
    }

    /// Connect to every name in `names`, skipping the ones that fail.
    ///
    /// # Errors
    /// Returns `OrmError::ConnectionError` when no connection succeeds.
    pub async fn multi_connect(&self, names: &[&str]) -> Result<MultiTenant, OrmError> {
        let mut tenants = BTreeMap::new();
        for name in names {
            match self.connect(name).await {
                Ok(handler) => {
                    tenants.insert((*name).to_string(), handler);
                }
                Err(e) => {
                    tracing::warn!(connection = %name, error = %e, "skipping tenant");
                }
            }
        }

        if tenants.is_empty() {
            return Err(OrmError::ConnectionError(format!(
                "could not connect to any of: {}",
                names.join(", ")
            )));
        }
        Ok(MultiTenant { handlers: tenants })
    }
}

/// The handlers a [`Registry::multi_connect`] call managed to open.
#[derive(Debug, Clone)]
pub struct MultiTenant {
    handlers: BTreeMap<String, Arc<dyn DialectHandler>>,
}

impl MultiTenant {
    #[must_use]
    pub fn handlers(&self) -> &BTreeMap<String, Arc<dyn DialectHandler>> {
        &self.handlers
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<dyn DialectHandler>> {
        self.handlers.get(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Bootstrap the handler for `cfg.dialect`.
///
/// # Errors
/// Returns `OrmError::ConfigurationError` when the dialect's feature is disabled, otherwise the
/// handler's own connect error.
pub async fn open_handler(cfg: &DialectConfig) -> Result<Arc<dyn DialectHandler>, OrmError> {
    match cfg.dialect {
        Dialect::Postgres => open_postgres(cfg).await,
        Dialect::Mysql => open_mysql(cfg).await,
        Dialect::Sqlite => open_sqlite(cfg).await,
    }
}

#[cfg(feature = "postgres")]
async fn open_postgres(cfg: &DialectConfig) -> Result<Arc<dyn DialectHandler>, OrmError> {
    let handler: Arc<dyn DialectHandler> = Arc::new(crate::postgres::PostgresHandler::connect(cfg).await?);
    Ok(handler)
}

#[cfg(not(feature = "postgres"))]
async fn open_postgres(cfg: &DialectConfig) -> Result<Arc<dyn DialectHandler>, OrmError> {
    Err(disabled(cfg.dialect))
}

#[cfg(feature = "mysql")]
async fn open_mysql(cfg: &DialectConfig) -> Result<Arc<dyn DialectHandler>, OrmError> {
    let handler: Arc<dyn DialectHandler> = Arc::new(crate::mysql::MysqlHandler::connect(cfg).await?);
    Ok(handler)
}

#[cfg(not(feature = "mysql"))]
async fn open_mysql(cfg: &DialectConfig) -> Result<Arc<dyn DialectHandler>, OrmError> {
    Err(disabled(cfg.dialect))
}

#[cfg(feature = "sqlite")]
async fn open_sqlite(cfg: &DialectConfig) -> Result<Arc<dyn DialectHandler>, OrmError> {
    let handler: Arc<dyn DialectHandler> = Arc::new(crate::sqlite::SqliteHandler::connect(cfg).await?);
    Ok(handler)
}

#[cfg(not(feature = "sqlite"))]
async fn open_sqlite(cfg: &DialectConfig) -> Result<Arc<dyn DialectHandler>, OrmError> {
    Err(disabled(cfg.dialect))
}

#[allow(dead_code)]
fn disabled(dialect: Dialect) -> OrmError {
    OrmError::ConfigurationError(format!(
        "the {dialect} dialect is not enabled in this build"
    ))
}
