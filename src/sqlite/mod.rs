// SQLite module - the embedded `sqlite` dialect handler
//
// This module is split into several sub-modules:
// - config: File URI synthesis, file creation and the bb8 connection manager
// - params: Binding `SqlValue`s to rusqlite values
// - query: Result extraction and building
// - executor: The handler, its read/write lock and blocking-task plumbing

pub mod config;
pub mod executor;
pub mod params;
pub mod query;

pub use config::{SharedSqliteConnection, SqliteManager, connection_string};
pub use executor::SqliteHandler;
pub use params::Params;
pub use query::build_result_set;
