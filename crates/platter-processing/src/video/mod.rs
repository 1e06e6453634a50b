//! Video transcoding.
//!
//! The runtime goes `Uninitialized -> EngineLoading -> Ready` once per process. Each
//! [`VideoEngine`] job then runs
//! `Staging -> Encoding -> ThumbnailExtraction -> Finalizing -> Cleanup -> Done`
//! against a [`TranscodeRuntime`] that is loaded once per process through [`LazyRuntime`].

mod engine;
mod ffmpeg;
mod runtime;
mod workspace;

pub use engine::{
    encode_args, thumbnail_args, EngineSettings, ProgressCallback, TranscodeResult,
    TranscodeStage, VideoEngine, VideoInput,
};
pub use ffmpeg::{FfmpegProvider, FfmpegRuntime};
pub use runtime::{LazyRuntime, ProgressFn, RuntimeProvider, TranscodeRuntime};
pub use workspace::JobWorkspace;
