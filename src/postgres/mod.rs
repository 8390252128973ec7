// PostgreSQL module - the `postgres` dialect handler
//
// This module is split into several sub-modules:
// - config: Connection string synthesis and pool setup
// - params: Binding `SqlValue`s to PostgreSQL parameter types
// - query: Result extraction and building
// - executor: The handler and its locked primitives

pub mod config;
pub mod executor;
pub mod params;
pub mod query;

pub use config::{PgManager, connection_string};
pub use executor::PostgresHandler;
pub use params::Params;
pub use query::build_result_set;
