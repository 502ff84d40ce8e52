//! Stratus Provider Backends
//!
//! Provides the capability contract the engine replicates against:
//! - `ProviderClient` trait (upload/download/delete per chunk)
//! - `ProviderRegistry` mapping backend tags to constructors
//! - `MemoryProvider` reference backend for testing

pub mod client;
pub mod memory;
pub mod registry;

pub use client::{ProviderClient, ProviderKind};
pub use memory::MemoryProvider;
pub use registry::{ProviderDescriptor, ProviderFactory, ProviderRegistry};
