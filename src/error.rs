use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrmError {
    #[cfg(feature = "postgres")]
    #[error(transparent)]
    PostgresError(#[from] tokio_postgres::Error),

    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    #[cfg(feature = "mysql")]
    #[error(transparent)]
    MysqlError(#[from] mysql_async::Error),

    #[cfg(feature = "postgres")]
    #[error(transparent)]
    PoolErrorPostgres(#[from] bb8::RunError<tokio_postgres::Error>),

    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    PoolErrorSqlite(#[from] bb8::RunError<rusqlite::Error>),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),
}

/// Coarse classification of an [`OrmError`], independent of the driver that raised it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    InvalidOperation,
    PreconditionFailed,
    NotFound,
    Configuration,
    Connection,
    Execution,
}

impl OrmError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            OrmError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            OrmError::InvalidOperation(_) => ErrorKind::InvalidOperation,
            OrmError::PreconditionFailed(_) => ErrorKind::PreconditionFailed,
            OrmError::NotFound(_) => ErrorKind::NotFound,
            OrmError::ConfigurationError(_) => ErrorKind::Configuration,
            OrmError::ConnectionError(_) => ErrorKind::Connection,
            OrmError::ExecutionError(_) => ErrorKind::Execution,
            #[cfg(feature = "postgres")]
            OrmError::PostgresError(_) | OrmError::PoolErrorPostgres(_) => ErrorKind::Execution,
            #[cfg(feature = "sqlite")]
            OrmError::SqliteError(_) | OrmError::PoolErrorSqlite(_) => ErrorKind::Execution,
            #[cfg(feature = "mysql")]
            OrmError::MysqlError(_) => ErrorKind::Execution,
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

impl From<std::io::Error> for OrmError {
    fn from(err: std::io::Error) -> Self {
        OrmError::ConfigurationError(format!("io error: {err}"))
    }
}

impl From<serde_json::Error> for OrmError {
    fn from(err: serde_json::Error) -> Self {
        OrmError::ConfigurationError(format!("could not parse configuration: {err}"))
    }
}
