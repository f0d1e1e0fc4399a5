//! In-memory tables and cell values.

pub mod table;
pub mod types;

pub use table::Table;
pub use types::{FieldValue, GroupKey};
