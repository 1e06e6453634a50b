//! Platter Storage Library
//!
//! This crate provides the object storage gateway for the ingestion pipeline: the
//! [`Storage`] trait, its S3-compatible, local filesystem and in-memory backends, the
//! storage key allocator, and the reversible key to public URL mapping.
//!
//! # Storage key format
//!
//! All backends use the same key layout: `{folder}/{epoch_millis}-{suffix}.{ext}` where
//! `suffix` is 6 random base36 characters. Keys must not contain `..` or a leading `/`.
//! Public URLs are always `{public_base}/{key}`.

pub mod factory;
pub mod keys;
pub mod local;
pub mod memory;
mod object;
pub mod public_url;
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use keys::{is_valid_folder, StorageKey};
pub use local::LocalStorage;
pub use memory::MemoryStorage;
pub use platter_core::StorageBackend;
pub use public_url::PublicUrlBase;
pub use s3::{S3Settings, S3Storage};
pub use traits::{Storage, StorageError, StorageResult};
