//! ffmpeg-backed transcoding runtime.

use super::runtime::{ProgressFn, RuntimeProvider, TranscodeRuntime};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;

const STDERR_TAIL_CHARS: usize = 2000;

/// Loads [`FfmpegRuntime`]: verifies the binary runs and creates a private workspace
/// directory that lives as long as the runtime.
pub struct FfmpegProvider {
    ffmpeg_path: String,
}

impl FfmpegProvider {
    pub fn new(ffmpeg_path: impl Into<String>) -> Result<Self> {
        let ffmpeg_path = ffmpeg_path.into();

        let dangerous_chars = [';', '|', '&', '$', '`', '(', ')', '<', '>', '\n', '\r'];
        if ffmpeg_path.chars().any(|c| dangerous_chars.contains(&c)) {
            return Err(anyhow!("Invalid ffmpeg_path: contains dangerous characters"));
        }

        Ok(Self { ffmpeg_path })
    }
}

#[async_trait]
impl RuntimeProvider for FfmpegProvider {
    async fn load(&self) -> Result<Arc<dyn TranscodeRuntime>> {
        let output = Command::new(&self.ffmpeg_path)
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .context("Failed to execute ffmpeg")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("FFmpeg version check failed: {}", stderr));
        }

        let version = String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()
            .unwrap_or_default()
            .to_string();

        let workdir = tempfile::Builder::new()
            .prefix("platter-transcode-")
            .tempdir()
            .context("Failed to create transcoding workspace")?;

        tracing::info!(
            ffmpeg = %self.ffmpeg_path,
            version = %version,
            workspace = %workdir.path().display(),
            "FFmpeg runtime ready"
        );

        Ok(Arc::new(FfmpegRuntime {
            ffmpeg_path: self.ffmpeg_path.clone(),
            workdir,
        }))
    }
}

/// Runs ffmpeg with its working directory set to a private temp dir.
pub struct FfmpegRuntime {
    ffmpeg_path: String,
    workdir: TempDir,
}

impl FfmpegRuntime {
    fn path_for(&self, name: &str) -> Result<PathBuf> {
        if name.is_empty() || name.contains('/') || name.contains('\\') || name.contains("..") {
            return Err(anyhow!("Invalid workspace file name: {}", name));
        }
        Ok(self.workdir.path().join(name))
    }
}

#[async_trait]
impl TranscodeRuntime for FfmpegRuntime {
    async fn write_file(&self, name: &str, data: &[u8]) -> Result<()> {
        let path = self.path_for(name)?;
        tokio::fs::write(&path, data)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))
    }

    async fn read_file(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.path_for(name)?;
        tokio::fs::read(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))
    }

    async fn delete_file(&self, name: &str) -> Result<()> {
        let path = self.path_for(name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to remove {}", path.display())),
        }
    }

    async fn exec(&self, args: &[String], progress: Option<&ProgressFn<'_>>) -> Result<()> {
        let mut child = Command::new(&self.ffmpeg_path)
            .current_dir(self.workdir.path())
            .args(["-hide_banner", "-y", "-nostats", "-progress", "pipe:1"])
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .context("Failed to execute ffmpeg")?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow!("FFmpeg stdout not captured"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| anyhow!("FFmpeg stderr not captured"))?;

        // Input duration is only printed on stderr
        let duration_us = Arc::new(AtomicU64::new(0));
        let stderr_task = {
            let duration_us = duration_us.clone();
            tokio::spawn(async move {
                let mut collected = String::new();
                let mut buf = [0u8; 4096];
                loop {
                    match stderr.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => {
                            collected.push_str(&String::from_utf8_lossy(&buf[..n]));
                            if duration_us.load(Ordering::Relaxed) == 0 {
                                if let Some(us) = parse_duration_us(&collected) {
                                    duration_us.store(us, Ordering::Relaxed);
                                }
                            }
                        }
                    }
                }
                collected
            })
        };

        let mut lines = BufReader::new(stdout).lines();
        while let Some(line) = lines.next_line().await? {
            let Some(report) = progress else { continue };
            if line.trim() == "progress=end" {
                report(1.0);
                continue;
            }
            let total = duration_us.load(Ordering::Relaxed);
            if let Some(done) = parse_out_time_us(&line) {
                if total > 0 {
                    report((done as f64 / total as f64).clamp(0.0, 1.0));
                }
            }
        }

        let status = child.wait().await.context("Failed to wait for ffmpeg")?;
        let stderr = stderr_task.await.unwrap_or_default();

        if !status.success() {
            let tail: String = {
                let chars: Vec<char> = stderr.chars().collect();
                let start = chars.len().saturating_sub(STDERR_TAIL_CHARS);
                chars[start..].iter().collect()
            };
            return Err(anyhow!("FFmpeg failed: {}", tail));
        }

        Ok(())
    }
}

/// Parse `Duration: HH:MM:SS.ss` from ffmpeg's stderr banner.
fn parse_duration_us(stderr: &str) -> Option<u64> {
    let start = stderr.find("Duration: ")? + "Duration: ".len();
    let value = stderr[start..].split(',').next()?.trim();
    parse_timestamp_us(value)
}

fn parse_timestamp_us(value: &str) -> Option<u64> {
    let mut parts = value.split(':');
    let hours: f64 = parts.next()?.parse().ok()?;
    let minutes: f64 = parts.next()?.parse().ok()?;
    let seconds: f64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    let total = (hours * 3600.0 + minutes * 60.0 + seconds) * 1_000_000.0;
    (total.is_finite() && total >= 0.0).then_some(total as u64)
}

/// Parse an `out_time_us=` (or legacy `out_time_ms=`, also microseconds) progress line.
fn parse_out_time_us(line: &str) -> Option<u64> {
    let (key, value) = line.trim().split_once('=')?;
    match key {
        "out_time_us" | "out_time_ms" => value.parse().ok(),
        _ => None,
    }
}
