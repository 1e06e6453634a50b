//! Test doubles shared by this crate's tests and downstream integration tests.
//!
//! Enabled in `cfg(test)` and through the `test-helpers` feature.

pub mod fixtures;
mod runtime;
mod storage;

pub use runtime::{EncodeScript, ScriptedProvider, ScriptedRuntime, ThumbnailScript};
pub use storage::RecordingStorage;
