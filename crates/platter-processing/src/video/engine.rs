//! Video transcoding engine
//!
//! One job: stage the upload, re-encode it to a small H.264/AAC MP4, pull a WebP
//! thumbnail from the encoded output and keep whichever of encoded/original is smaller.
//! Nothing that goes wrong inside a job fails the upload; the caller always gets bytes
//! back, at worst the original ones.

use super::runtime::{LazyRuntime, RuntimeProvider};
use super::workspace::JobWorkspace;
use crate::image::{ImageNormalizer, NormalizedImage};
use bytes::Bytes;
use platter_core::constants::{
    VIDEO_AUDIO_BITRATE_KBPS, VIDEO_CONTENT_TYPE, VIDEO_CRF, VIDEO_EXTENSION, VIDEO_MAX_WIDTH,
};
use platter_core::TranscodeOutcome;
use std::fmt;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;

/// Receives encoding progress as an integer percent, non-decreasing within a job.
pub type ProgressCallback = Arc<dyn Fn(u8) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscodeStage {
    /// Runtime not loaded yet in this process
    Uninitialized,
    EngineLoading,
    /// Runtime loaded and usable
    Ready,
    Staging,
    Encoding,
    ThumbnailExtraction,
    Finalizing,
    Cleanup,
    Done,
}

impl fmt::Display for TranscodeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TranscodeStage::Uninitialized => "uninitialized",
            TranscodeStage::EngineLoading => "engine_loading",
            TranscodeStage::Ready => "ready",
            TranscodeStage::Staging => "staging",
            TranscodeStage::Encoding => "encoding",
            TranscodeStage::ThumbnailExtraction => "thumbnail_extraction",
            TranscodeStage::Finalizing => "finalizing",
            TranscodeStage::Cleanup => "cleanup",
            TranscodeStage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Failures absorbed inside a job. Never returned to callers.
#[derive(Debug, Error)]
enum EngineError {
    #[error("Transcoding runtime unavailable: {0}")]
    RuntimeUnavailable(String),

    #[error("Staging failed: {0}")]
    Staging(String),

    #[error("Encoding failed: {0}")]
    Encoding(String),

    #[error("Reading encoded output failed: {0}")]
    Finalizing(String),
}

/// A video upload handed to the engine.
#[derive(Debug, Clone)]
pub struct VideoInput {
    pub data: Bytes,
    pub content_type: String,
    /// Extension of the original upload, used to name the staged file
    pub extension: String,
}

#[derive(Debug, Clone)]
pub struct TranscodeResult {
    pub data: Bytes,
    /// Always taken from the encoded output, never from the original
    pub thumbnail: Option<NormalizedImage>,
    pub content_type: String,
    pub extension: String,
    pub outcome: TranscodeOutcome,
}

impl TranscodeResult {
    fn original(
        input: &VideoInput,
        thumbnail: Option<NormalizedImage>,
        outcome: TranscodeOutcome,
    ) -> Self {
        Self {
            data: input.data.clone(),
            thumbnail,
            content_type: input.content_type.clone(),
            extension: input.extension.clone(),
            outcome,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EngineSettings {
    /// Inputs above this size are stored untouched
    pub max_input_bytes: usize,
    pub max_concurrent_jobs: usize,
}

/// ffmpeg arguments for the main encode.
pub fn encode_args(input: &str, output: &str) -> Vec<String> {
    vec![
        "-i".to_string(),
        input.to_string(),
        "-vf".to_string(),
        // Never upscale; -2 keeps aspect ratio with an even height
        format!("scale='trunc(min({},iw)/2)*2':-2", VIDEO_MAX_WIDTH),
        "-c:v".to_string(),
        "libx264".to_string(),
        "-crf".to_string(),
        VIDEO_CRF.to_string(),
        "-preset".to_string(),
        "veryfast".to_string(),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
        "-c:a".to_string(),
        "aac".to_string(),
        "-b:a".to_string(),
        format!("{}k", VIDEO_AUDIO_BITRATE_KBPS),
        "-movflags".to_string(),
        "+faststart".to_string(),
        output.to_string(),
    ]
}

/// ffmpeg arguments to grab the first frame of an encoded file.
pub fn thumbnail_args(encoded: &str, output: &str) -> Vec<String> {
    vec![
        "-i".to_string(),
        encoded.to_string(),
        "-frames:v".to_string(),
        "1".to_string(),
        "-f".to_string(),
        "image2".to_string(),
        output.to_string(),
    ]
}

/// Maps runtime ratios to integer percents and drops anything that would go backwards.
struct ProgressReporter {
    callback: Option<ProgressCallback>,
    // Highest percent reported + 1; 0 means nothing reported yet
    last: AtomicU16,
}

impl ProgressReporter {
    fn new(callback: Option<ProgressCallback>) -> Self {
        Self {
            callback,
            last: AtomicU16::new(0),
        }
    }

    fn report(&self, ratio: f64) {
        let Some(callback) = &self.callback else {
            return;
        };
        if !ratio.is_finite() {
            return;
        }

        let percent = (ratio.clamp(0.0, 1.0) * 100.0).floor() as u16;
        let previous = self.last.fetch_max(percent + 1, Ordering::SeqCst);
        if percent + 1 > previous {
            callback(percent as u8);
        }
    }
}

struct EngineInner {
    runtime: LazyRuntime,
    normalizer: ImageNormalizer,
    permits: Semaphore,
    settings: EngineSettings,
}

/// Shared handle to the transcoding engine. Cheap to clone.
#[derive(Clone)]
pub struct VideoEngine {
    inner: Arc<EngineInner>,
}

impl VideoEngine {
    pub fn new(
        provider: Arc<dyn RuntimeProvider>,
        normalizer: ImageNormalizer,
        settings: EngineSettings,
    ) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                runtime: LazyRuntime::new(provider),
                normalizer,
                permits: Semaphore::new(settings.max_concurrent_jobs.max(1)),
                settings,
            }),
        }
    }

    pub fn is_runtime_loaded(&self) -> bool {
        self.inner.runtime.is_loaded()
    }

    /// Transcode a video upload.
    ///
    /// Never fails: any problem yields the original bytes with an outcome saying why. The
    /// job runs on its own task, so dropping the returned future does not stop it; its
    /// workspace is still cleaned up and the result discarded.
    pub async fn transcode(
        &self,
        input: VideoInput,
        progress: Option<ProgressCallback>,
    ) -> TranscodeResult {
        let size = input.data.len();
        if size > self.inner.settings.max_input_bytes {
            tracing::info!(
                size_bytes = size,
                max_bytes = self.inner.settings.max_input_bytes,
                "Video exceeds transcode size limit, storing original"
            );
            return TranscodeResult::original(&input, None, TranscodeOutcome::SkippedOversized);
        }

        let inner = self.inner.clone();
        let job_input = input.clone();
        let handle = tokio::spawn(async move { inner.run(job_input, progress).await });

        match handle.await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(error = %e, "Transcode task failed, storing original");
                TranscodeResult::original(&input, None, TranscodeOutcome::Failed)
            }
        }
    }
}

impl EngineInner {
    async fn run(&self, input: VideoInput, progress: Option<ProgressCallback>) -> TranscodeResult {
        let start = std::time::Instant::now();

        let _permit = match self.permits.acquire().await {
            Ok(permit) => permit,
            Err(e) => {
                tracing::error!(error = %e, "Transcode permits closed, storing original");
                return TranscodeResult::original(&input, None, TranscodeOutcome::Failed);
            }
        };

        if !self.runtime.is_loaded() {
            tracing::debug!(stage = %TranscodeStage::Uninitialized, "Transcode stage");
        }
        tracing::debug!(stage = %TranscodeStage::EngineLoading, "Transcode stage");
        let runtime = match self.runtime.get().await {
            Ok(runtime) => {
                tracing::debug!(stage = %TranscodeStage::Ready, "Transcode stage");
                runtime
            }
            Err(e) => {
                let err = EngineError::RuntimeUnavailable(e.to_string());
                tracing::warn!(error = %err, "Transcoding degraded, storing original");
                return TranscodeResult::original(&input, None, TranscodeOutcome::Failed);
            }
        };

        let mut workspace = JobWorkspace::new(runtime);
        let job_id = workspace.job_id();
        let reporter = ProgressReporter::new(progress);

        let job = self.run_job(&mut workspace, &input, &reporter).await;

        tracing::debug!(job_id = %job_id, stage = %TranscodeStage::Cleanup, "Transcode stage");
        workspace.cleanup().await;

        let result = match job {
            Ok((encoded, thumbnail)) if encoded.len() < input.data.len() => TranscodeResult {
                data: encoded,
                thumbnail,
                content_type: VIDEO_CONTENT_TYPE.to_string(),
                extension: VIDEO_EXTENSION.to_string(),
                outcome: TranscodeOutcome::Compressed,
            },
            Ok((encoded, thumbnail)) => {
                tracing::info!(
                    job_id = %job_id,
                    input_bytes = input.data.len(),
                    encoded_bytes = encoded.len(),
                    "Encoded video not smaller, storing original"
                );
                TranscodeResult::original(&input, thumbnail, TranscodeOutcome::SkippedNotSmaller)
            }
            Err(e) => {
                tracing::warn!(job_id = %job_id, error = %e, "Transcoding degraded, storing original");
                TranscodeResult::original(&input, None, TranscodeOutcome::Failed)
            }
        };

        tracing::info!(
            job_id = %job_id,
            stage = %TranscodeStage::Done,
            outcome = %result.outcome,
            input_bytes = input.data.len(),
            output_bytes = result.data.len(),
            has_thumbnail = result.thumbnail.is_some(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Transcode finished"
        );

        result
    }

    async fn run_job(
        &self,
        workspace: &mut JobWorkspace,
        input: &VideoInput,
        reporter: &ProgressReporter,
    ) -> Result<(Bytes, Option<NormalizedImage>), EngineError> {
        let job_id = workspace.job_id();

        tracing::debug!(job_id = %job_id, stage = %TranscodeStage::Staging, "Transcode stage");
        let input_name = workspace.file_name("input", &input.extension);
        workspace
            .stage(&input_name, &input.data)
            .await
            .map_err(|e| EngineError::Staging(e.to_string()))?;

        tracing::debug!(job_id = %job_id, stage = %TranscodeStage::Encoding, "Transcode stage");
        let output_name = workspace.file_name("output", VIDEO_EXTENSION);
        workspace.track(&output_name);
        reporter.report(0.0);
        let on_progress = |ratio: f64| reporter.report(ratio);
        workspace
            .runtime()
            .exec(&encode_args(&input_name, &output_name), Some(&on_progress))
            .await
            .map_err(|e| EngineError::Encoding(e.to_string()))?;
        reporter.report(1.0);

        tracing::debug!(
            job_id = %job_id,
            stage = %TranscodeStage::ThumbnailExtraction,
            "Transcode stage"
        );
        let thumbnail = self.extract_thumbnail(workspace, &output_name).await;

        tracing::debug!(job_id = %job_id, stage = %TranscodeStage::Finalizing, "Transcode stage");
        let encoded = workspace
            .read(&output_name)
            .await
            .map_err(|e| EngineError::Finalizing(e.to_string()))?;

        Ok((Bytes::from(encoded), thumbnail))
    }

    /// Best effort: any failure is logged and yields `None`.
    async fn extract_thumbnail(
        &self,
        workspace: &mut JobWorkspace,
        encoded_name: &str,
    ) -> Option<NormalizedImage> {
        let job_id = workspace.job_id();
        let frame_name = workspace.file_name("thumb", "png");
        workspace.track(&frame_name);

        if let Err(e) = workspace
            .runtime()
            .exec(&thumbnail_args(encoded_name, &frame_name), None)
            .await
        {
            tracing::warn!(job_id = %job_id, error = %e, "Thumbnail extraction failed");
            return None;
        }

        let frame = match workspace.read(&frame_name).await {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(job_id = %job_id, error = %e, "Thumbnail frame unreadable");
                return None;
            }
        };

        match self.normalizer.normalize_bytes(Bytes::from(frame)).await {
            Ok(thumbnail) => Some(thumbnail),
            Err(e) => {
                tracing::warn!(job_id = %job_id, error = %e, "Thumbnail encoding failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{
        fixtures, EncodeScript, ScriptedProvider, ScriptedRuntime, ThumbnailScript,
    };
    use std::sync::Mutex;
    use std::time::Duration;

    const SETTINGS: EngineSettings = EngineSettings {
        max_input_bytes: 1024 * 1024,
        max_concurrent_jobs: 2,
    };

    fn clip(len: usize) -> VideoInput {
        VideoInput {
            data: Bytes::from(vec![0xAB; len]),
            content_type: "video/quicktime".to_string(),
            extension: "mov".to_string(),
        }
    }

    fn engine_with(runtime: Arc<ScriptedRuntime>) -> (VideoEngine, Arc<ScriptedProvider>) {
        let provider = Arc::new(ScriptedProvider::new(runtime));
        let engine = VideoEngine::new(provider.clone(), ImageNormalizer::default(), SETTINGS);
        (engine, provider)
    }

    #[tokio::test]
    async fn test_smaller_output_replaces_original() {
        let runtime = Arc::new(ScriptedRuntime::new(
            EncodeScript::Output(vec![1; 100]),
            ThumbnailScript::Frame(fixtures::png(640, 360)),
        ));
        let (engine, _) = engine_with(runtime.clone());

        let result = engine.transcode(clip(1000), None).await;

        assert_eq!(result.outcome, TranscodeOutcome::Compressed);
        assert_eq!(result.data.len(), 100);
        assert_eq!(result.content_type, "video/mp4");
        assert_eq!(result.extension, "mp4");
        let thumbnail = result.thumbnail.unwrap();
        assert_eq!(thumbnail.content_type, "image/webp");
        assert_eq!((thumbnail.width, thumbnail.height), (640, 360));
        assert!(runtime.file_names().is_empty());
    }

    #[tokio::test]
    async fn test_not_smaller_returns_original_bytes() {
        let runtime = Arc::new(ScriptedRuntime::new(
            EncodeScript::Output(vec![1; 1000]),
            ThumbnailScript::Frame(fixtures::png(320, 240)),
        ));
        let (engine, _) = engine_with(runtime.clone());
        let input = clip(1000);

        let result = engine.transcode(input.clone(), None).await;

        assert_eq!(result.outcome, TranscodeOutcome::SkippedNotSmaller);
        assert_eq!(result.data, input.data);
        assert_eq!(result.content_type, "video/quicktime");
        assert_eq!(result.extension, "mov");
        assert!(result.thumbnail.is_some());
        assert!(runtime.file_names().is_empty());
    }

    #[tokio::test]
    async fn test_thumbnail_comes_from_encoded_output() {
        let runtime = Arc::new(ScriptedRuntime::new(
            EncodeScript::Output(vec![1; 10]),
            ThumbnailScript::Frame(fixtures::png(16, 16)),
        ));
        let (engine, _) = engine_with(runtime.clone());

        engine.transcode(clip(500), None).await;

        let calls = runtime.exec_calls();
        assert_eq!(calls.len(), 2);
        let encode_output = calls[0].last().unwrap().clone();
        let thumb_input = &calls[1][calls[1].iter().position(|a| a == "-i").unwrap() + 1];
        assert_eq!(thumb_input, &encode_output);
    }

    #[tokio::test]
    async fn test_thumbnail_failure_is_not_fatal() {
        let runtime = Arc::new(ScriptedRuntime::new(
            EncodeScript::Output(vec![1; 10]),
            ThumbnailScript::Fail,
        ));
        let (engine, _) = engine_with(runtime.clone());

        let result = engine.transcode(clip(500), None).await;

        assert_eq!(result.outcome, TranscodeOutcome::Compressed);
        assert!(result.thumbnail.is_none());
        assert!(runtime.file_names().is_empty());
    }

    #[tokio::test]
    async fn test_encode_failure_falls_back_without_thumbnail() {
        let runtime = Arc::new(ScriptedRuntime::new(
            EncodeScript::Fail,
            ThumbnailScript::Frame(fixtures::png(16, 16)),
        ));
        let (engine, _) = engine_with(runtime.clone());
        let input = clip(700);

        let result = engine.transcode(input.clone(), None).await;

        assert_eq!(result.outcome, TranscodeOutcome::Failed);
        assert_eq!(result.data, input.data);
        assert!(result.thumbnail.is_none());
        assert!(runtime.file_names().is_empty());
    }

    #[tokio::test]
    async fn test_staging_failure_falls_back() {
        let runtime = Arc::new(
            ScriptedRuntime::new(EncodeScript::Output(vec![1; 10]), ThumbnailScript::Fail)
                .failing_writes(),
        );
        let (engine, _) = engine_with(runtime.clone());

        let result = engine.transcode(clip(300), None).await;

        assert_eq!(result.outcome, TranscodeOutcome::Failed);
        assert_eq!(result.data.len(), 300);
        assert!(runtime.exec_calls().is_empty());
        assert!(runtime.file_names().is_empty());
    }

    #[tokio::test]
    async fn test_runtime_load_failure_is_contained_and_retried() {
        let runtime = Arc::new(ScriptedRuntime::new(
            EncodeScript::Output(vec![1; 10]),
            ThumbnailScript::Fail,
        ));
        let provider = Arc::new(ScriptedProvider::new(runtime).failing_loads(1));
        let engine = VideoEngine::new(provider.clone(), ImageNormalizer::default(), SETTINGS);

        let first = engine.transcode(clip(200), None).await;
        assert_eq!(first.outcome, TranscodeOutcome::Failed);
        assert!(!engine.is_runtime_loaded());

        let second = engine.transcode(clip(200), None).await;
        assert_eq!(second.outcome, TranscodeOutcome::Compressed);
        assert!(engine.is_runtime_loaded());
        assert_eq!(provider.load_count(), 2);
    }

    #[tokio::test]
    async fn test_oversized_input_skips_engine() {
        let runtime = Arc::new(ScriptedRuntime::new(
            EncodeScript::Output(vec![1; 10]),
            ThumbnailScript::Fail,
        ));
        let (engine, provider) = engine_with(runtime.clone());

        let result = engine
            .transcode(clip(SETTINGS.max_input_bytes + 1), None)
            .await;

        assert_eq!(result.outcome, TranscodeOutcome::SkippedOversized);
        assert_eq!(result.data.len(), SETTINGS.max_input_bytes + 1);
        assert_eq!(provider.load_count(), 0);
        assert!(runtime.exec_calls().is_empty());
    }

    #[tokio::test]
    async fn test_progress_is_monotonic_percent() {
        let runtime = Arc::new(
            ScriptedRuntime::new(EncodeScript::Output(vec![1; 10]), ThumbnailScript::Fail)
                .with_progress(vec![0.1, 0.5, 0.3, 0.999, f64::NAN, 2.0]),
        );
        let (engine, _) = engine_with(runtime);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let callback: ProgressCallback = Arc::new(move |p| sink.lock().unwrap().push(p));

        engine.transcode(clip(100), Some(callback)).await;

        let seen = seen.lock().unwrap().clone();
        assert_eq!(seen, vec![0, 10, 50, 99, 100]);
    }

    #[tokio::test]
    async fn test_concurrent_jobs_do_not_interfere() {
        let runtime = Arc::new(
            ScriptedRuntime::new(EncodeScript::Output(vec![1; 10]), ThumbnailScript::Fail)
                .with_exec_delay(Duration::from_millis(20)),
        );
        let (engine, provider) = engine_with(runtime.clone());

        let jobs: Vec<_> = (0..6)
            .map(|i| {
                let engine = engine.clone();
                tokio::spawn(async move { engine.transcode(clip(100 + i), None).await })
            })
            .collect();

        for job in jobs {
            assert_eq!(job.await.unwrap().outcome, TranscodeOutcome::Compressed);
        }
        assert_eq!(provider.load_count(), 1);
        assert!(runtime.file_names().is_empty());
    }

    #[tokio::test]
    async fn test_dropped_caller_still_cleans_up() {
        let runtime = Arc::new(
            ScriptedRuntime::new(EncodeScript::Output(vec![1; 10]), ThumbnailScript::Fail)
                .with_exec_delay(Duration::from_millis(50)),
        );
        let (engine, _) = engine_with(runtime.clone());

        let pending = engine.transcode(clip(100), None);
        let _ = tokio::time::timeout(Duration::from_millis(5), pending).await;

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(runtime.exec_calls().len(), 2);
        assert!(runtime.file_names().is_empty());
    }

    #[test]
    fn test_encode_args() {
        let args = encode_args("in.mov", "out.mp4");
        assert_eq!(args.first().map(String::as_str), Some("-i"));
        assert_eq!(args.last().map(String::as_str), Some("out.mp4"));
        assert!(args.contains(&"scale='trunc(min(480,iw)/2)*2':-2".to_string()));
        assert!(args.windows(2).any(|w| w[0] == "-crf" && w[1] == "32"));
        assert!(args.windows(2).any(|w| w[0] == "-movflags" && w[1] == "+faststart"));
        assert!(args.windows(2).any(|w| w[0] == "-b:a" && w[1] == "64k"));
    }

    #[tokio::test]
    async fn test_runtime_moves_from_uninitialized_to_ready() {
        let runtime = Arc::new(ScriptedRuntime::new(
            EncodeScript::Output(vec![1; 10]),
            ThumbnailScript::Fail,
        ));
        let (engine, provider) = engine_with(runtime);
        assert!(!engine.is_runtime_loaded());

        engine.transcode(clip(100), None).await;
        engine.transcode(clip(100), None).await;

        assert!(engine.is_runtime_loaded());
        assert_eq!(provider.load_count(), 1);
    }

    #[test]
    fn test_stage_names() {
        let stages = [
            TranscodeStage::Uninitialized,
            TranscodeStage::EngineLoading,
            TranscodeStage::Ready,
            TranscodeStage::Staging,
            TranscodeStage::Encoding,
            TranscodeStage::ThumbnailExtraction,
            TranscodeStage::Finalizing,
            TranscodeStage::Cleanup,
            TranscodeStage::Done,
        ];
        let names: Vec<String> = stages.iter().map(|s| s.to_string()).collect();
        assert_eq!(
            names,
            vec![
                "uninitialized",
                "engine_loading",
                "ready",
                "staging",
                "encoding",
                "thumbnail_extraction",
                "finalizing",
                "cleanup",
                "done",
            ]
        );
    }
}
