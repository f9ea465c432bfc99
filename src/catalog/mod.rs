//! Operations on the in-memory catalog tree that do not touch the store:
//! validation of posted trees, module search and the built-in default catalog.

pub mod defaults;
pub mod search;
pub mod validate;

pub use defaults::default_catalog;
pub use search::search_modules;
pub use validate::{CatalogIssue, validate_catalog};
