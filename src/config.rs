//! Named connection settings loaded from `database.json`.
//!
//! ```json
//! {
//!   "development": { "dialect": "sqlite", "path": "dev.db" },
//!   "production": {
//!     "dialect": "postgres",
//!     "host": "db.internal", "port": 5432,
//!     "user": "app", "password": "secret", "database": "app",
//!     "max_open_connections": 20, "conn_max_lifetime_secs": 1800
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::OrmError;
use crate::types::Dialect;

pub const CONFIG_FILE_NAME: &str = "database.json";
/// Number of directories (the start directory included) searched for the config file.
pub const MAX_SEARCH_DEPTH: usize = 5;
/// Connection used when none is named.
pub const DEFAULT_CONNECTION: &str = "development";

/// Settings for one named connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialectConfig {
    pub dialect: Dialect,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub database: Option<String>,
    /// Database file for the embedded backend
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Append at-rest authentication parameters to the embedded backend's URI
    #[serde(default)]
    pub auth: bool,
    #[serde(default)]
    pub max_open_connections: Option<u32>,
    #[serde(default)]
    pub max_idle_connections: Option<u32>,
    #[serde(default)]
    pub conn_max_lifetime_secs: Option<u64>,
    #[serde(default)]
    pub conn_max_idle_time_secs: Option<u64>,
}

impl DialectConfig {
    /// Empty settings for `dialect`; every optional field unset.
    #[must_use]
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            host: None,
            port: None,
            user: None,
            password: None,
            database: None,
            path: None,
            auth: false,
            max_open_connections: None,
            max_idle_connections: None,
            conn_max_lifetime_secs: None,
            conn_max_idle_time_secs: None,
        }
    }

    /// Settings for an embedded database file.
    #[must_use]
    pub fn sqlite(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::new(Dialect::Sqlite)
        }
    }

    #[must_use]
    pub fn conn_max_lifetime(&self) -> Option<Duration> {
        self.conn_max_lifetime_secs.map(Duration::from_secs)
    }

    #[must_use]
    pub fn conn_max_idle_time(&self) -> Option<Duration> {
        self.conn_max_idle_time_secs.map(Duration::from_secs)
    }

    /// A required text field, or a configuration error naming it.
    pub(crate) fn require<'a>(
        &self,
        field: &str,
        value: &'a Option<String>,
    ) -> Result<&'a str, OrmError> {
        value.as_deref().ok_or_else(|| {
            OrmError::ConfigurationError(format!("{field} is required for {}", self.dialect))
        })
    }
}

/// Every named connection from one configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Config {
    connections: BTreeMap<String, DialectConfig>,
}

impl Config {
    /// Load `database.json` from the working directory or one of its parents.
    ///
    /// # Errors
    /// Returns `OrmError::ConfigurationError` when no file is found or it cannot be parsed.
    pub fn discover() -> Result<Self, OrmError> {
        let cwd = std::env::current_dir()?;
        Self::discover_from(&cwd)
    }

    /// Load `database.json` from `dir` or one of its parents.
    ///
    /// # Errors
    /// Returns `OrmError::ConfigurationError` when no file is found or it cannot be parsed.
    pub fn discover_from(dir: &Path) -> Result<Self, OrmError> {
        let path = find_config_file(dir).ok_or_else(|| {
            OrmError::ConfigurationError(format!(
                "could not find {CONFIG_FILE_NAME} in {} or its {} parent directories",
                dir.display(),
                MAX_SEARCH_DEPTH - 1
            ))
        })?;
        Self::from_path(&path)
    }

    /// # Errors
    /// Returns `OrmError::ConfigurationError` if the file cannot be read or parsed.
    pub fn from_path(path: &Path) -> Result<Self, OrmError> {
        let contents = fs::read_to_string(path).map_err(|e| {
            OrmError::ConfigurationError(format!("error reading {}: {e}", path.display()))
        })?;
        Self::from_json(&contents).map_err(|e| {
            OrmError::ConfigurationError(format!("error parsing {}: {e}", path.display()))
        })
    }

    /// # Errors
    /// Returns `OrmError::ConfigurationError` for malformed JSON or an unknown dialect.
    pub fn from_json(json: &str) -> Result<Self, OrmError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Settings for the connection called `name`.
    ///
    /// # Errors
    /// Returns `OrmError::ConfigurationError` when there is no such connection.
    pub fn get(&self, name: &str) -> Result<&DialectConfig, OrmError> {
        self.connections.get(name).ok_or_else(|| {
            OrmError::ConfigurationError(format!(
                "database connection {name} was not found in {CONFIG_FILE_NAME}"
            ))
        })
    }

    pub fn insert(&mut self, name: impl Into<String>, config: DialectConfig) {
        self.connections.insert(name.into(), config);
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.connections.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

/// Path of the nearest `database.json`, looking in `dir` and then upwards.
#[must_use]
pub fn find_config_file(dir: &Path) -> Option<PathBuf> {
    dir.ancestors()
        .take(MAX_SEARCH_DEPTH)
        .map(|ancestor| ancestor.join(CONFIG_FILE_NAME))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "development": { "dialect": "sqlite3", "path": "dev.db", "auth": true },
        "production": {
            "dialect": "psql", "host": "localhost", "port": 5432,
            "user": "app", "password": "pw", "database": "app",
            "max_open_connections": 8, "conn_max_idle_time_secs": 30
        }
    }"#;

    #[test]
    fn parses_named_connections() {
        let config = Config::from_json(SAMPLE).unwrap();
        assert_eq!(config.len(), 2);

        let dev = config.get("development").unwrap();
        assert_eq!(dev.dialect, Dialect::Sqlite);
        assert!(dev.auth);
        assert_eq!(dev.path.as_deref(), Some(Path::new("dev.db")));

        let prod = config.get("production").unwrap();
        assert_eq!(prod.dialect, Dialect::Postgres);
        assert_eq!(prod.port, Some(5432));
        assert_eq!(prod.max_open_connections, Some(8));
        assert_eq!(prod.conn_max_idle_time(), Some(Duration::from_secs(30)));
        assert_eq!(prod.conn_max_lifetime(), None);
    }

    #[test]
    fn unknown_names_and_dialects_are_configuration_errors() {
        let config = Config::from_json(SAMPLE).unwrap();
        assert!(matches!(
            config.get("staging").unwrap_err(),
            OrmError::ConfigurationError(_)
        ));

        let err = Config::from_json(r#"{"x": {"dialect": "oracle"}}"#).unwrap_err();
        assert!(matches!(err, OrmError::ConfigurationError(_)));
    }

    #[test]
    fn discovery_walks_up_parents() {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join(CONFIG_FILE_NAME), SAMPLE).unwrap();
        let nested = root.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();

        let config = Config::discover_from(&nested).unwrap();
        assert!(config.get("production").is_ok());
    }

    #[test]
    fn discovery_stops_at_depth_limit() {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join(CONFIG_FILE_NAME), SAMPLE).unwrap();
        let mut deep = root.path().to_path_buf();
        for part in ["a", "b", "c", "d", "e"] {
            deep.push(part);
        }
        fs::create_dir_all(&deep).unwrap();

        assert!(find_config_file(&deep).is_none());
        assert!(find_config_file(deep.parent().unwrap()).is_some());
    }

    #[test]
    fn require_names_missing_field() {
        let cfg = DialectConfig::new(Dialect::Mysql);
        let err = cfg.require("host", &cfg.host).unwrap_err();
        assert!(err.to_string().contains("host is required for mysql"));
    }
}
