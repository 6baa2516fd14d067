pub mod config;
pub mod core;
pub mod models;

pub use crate::config::StoreConfig;
pub use crate::core::file_store::FileStore;
pub use crate::core::metadata::{MetadataError, MetadataRecord, Result};
pub use crate::core::store::{MemoryStore, RawStore};
