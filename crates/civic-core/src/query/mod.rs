//! Tabular query engine shared by every administrative list.

pub mod cache;
pub mod engine;
pub mod state;
pub mod value;

pub use cache::QueryCache;
pub use engine::{FilterRule, QueryError, QueryResult, QuerySpec};
pub use state::{ANY, QueryState, SortDirection};
pub use value::{FieldValue, Record};
