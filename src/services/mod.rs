pub mod sync_service;

pub use sync_service::{FlatCatalog, SyncService, SyncStats};
