//! civic-core library.
//!
//! Lifecycle and presentation engine for civic document requests: the
//! status vocabulary, timeline reconstruction, per-document grouping, and
//! the tabular query engine behind the administrative lists.
//!
//! # Conventions
//!
//! - **Errors**: typed `thiserror` enums in the library, each with a stable
//!   [`error::ErrorCode`]; `anyhow::Result` for config and snapshot loading.
//! - **Logging**: `tracing` macros (`debug!` for lenient recoveries, `warn!`
//!   for corrupt data). The library never installs a subscriber.
//! - **I/O**: none outside [`config`] and [`views::snapshot`]; everything
//!   else works on in-memory records.

#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod flight;
pub mod grouping;
pub mod model;
pub mod query;
pub mod timeline;
pub mod views;

pub use config::EngineConfig;
pub use error::ErrorCode;
pub use grouping::{RequestGroup, group_requests};
pub use model::{DocumentRequest, Status, StatusChange};
pub use timeline::{TimelineStep, reconstruct};
