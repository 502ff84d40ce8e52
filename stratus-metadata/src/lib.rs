//! Stratus Metadata Store
//!
//! Persistence contract for the path tree and chunk sequences:
//! - `FileRecord` / `DirRecord` / `Entry` models
//! - `MetadataStore` async trait (resolve, create, delete, move, copy, list)
//! - `MemoryMetadataStore` reference implementation

pub mod memory;
pub mod models;
pub mod store;

pub use memory::MemoryMetadataStore;
pub use models::{DirRecord, DirectoryListing, Entry, FileRecord};
pub use store::MetadataStore;
