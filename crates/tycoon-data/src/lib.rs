//! Data-driven catalog loading for the factory tycoon simulation.
//!
//! Content lives in `catalog.{ron,json,toml}`; the default catalog is
//! embedded from `data/catalog.ron`.

pub mod catalog;
pub mod loader;
pub mod schema;

pub use catalog::Catalog;
pub use loader::{DataLoadError, EntryKind};
