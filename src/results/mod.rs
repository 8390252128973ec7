//! Rows read back from a backend, before they are materialized into records.

mod result_set;
mod row;

pub use result_set::ResultSet;
pub use row::CustomDbRow;
