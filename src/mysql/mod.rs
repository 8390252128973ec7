// MySQL module - the `mysql` dialect handler
//
// This module is split into several sub-modules:
// - config: DSN synthesis and pool options
// - params: Binding `SqlValue`s as mysql_async values
// - query: Result extraction and building
// - executor: The handler and its locked primitives

pub mod config;
pub mod executor;
pub mod params;
pub mod query;

pub use config::{build_pool, connection_string};
pub use executor::MysqlHandler;
pub use params::Params;
pub use query::build_result_set;
