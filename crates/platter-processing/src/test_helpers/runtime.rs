use crate::video::{ProgressFn, RuntimeProvider, TranscodeRuntime};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// What the main encode produces.
#[derive(Debug, Clone)]
pub enum EncodeScript {
    /// Write these bytes as the encoded output
    Output(Vec<u8>),
    Fail,
}

/// What the thumbnail extraction produces.
#[derive(Debug, Clone)]
pub enum ThumbnailScript {
    /// Write these image bytes as the extracted frame
    Frame(Vec<u8>),
    Fail,
}

/// In-memory transcoding runtime that follows a script instead of running ffmpeg.
///
/// Encode calls are recognized by `libx264` in the arguments, everything else is treated
/// as thumbnail extraction. Both require their `-i` input to exist in the workspace.
pub struct ScriptedRuntime {
    files: Mutex<HashMap<String, Vec<u8>>>,
    exec_calls: Mutex<Vec<Vec<String>>>,
    encode: EncodeScript,
    thumbnail: ThumbnailScript,
    progress: Vec<f64>,
    exec_delay: Duration,
    fail_writes: bool,
}

impl ScriptedRuntime {
    pub fn new(encode: EncodeScript, thumbnail: ThumbnailScript) -> Self {
        Self {
            files: Mutex::new(HashMap::new()),
            exec_calls: Mutex::new(Vec::new()),
            encode,
            thumbnail,
            progress: Vec::new(),
            exec_delay: Duration::ZERO,
            fail_writes: false,
        }
    }

    /// Ratios reported while encoding
    pub fn with_progress(mut self, ratios: Vec<f64>) -> Self {
        self.progress = ratios;
        self
    }

    pub fn with_exec_delay(mut self, delay: Duration) -> Self {
        self.exec_delay = delay;
        self
    }

    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    /// Files currently in the workspace, sorted
    pub fn file_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.files.lock().unwrap().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn exec_calls(&self) -> Vec<Vec<String>> {
        self.exec_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TranscodeRuntime for ScriptedRuntime {
    async fn write_file(&self, name: &str, data: &[u8]) -> Result<()> {
        if self.fail_writes {
            return Err(anyhow!("workspace is full"));
        }
        self.files
            .lock()
            .unwrap()
            .insert(name.to_string(), data.to_vec());
        Ok(())
    }

    async fn read_file(&self, name: &str) -> Result<Vec<u8>> {
        self.files
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| anyhow!("no such file: {}", name))
    }

    async fn delete_file(&self, name: &str) -> Result<()> {
        self.files.lock().unwrap().remove(name);
        Ok(())
    }

    async fn exec(&self, args: &[String], progress: Option<&ProgressFn<'_>>) -> Result<()> {
        self.exec_calls.lock().unwrap().push(args.to_vec());

        if !self.exec_delay.is_zero() {
            tokio::time::sleep(self.exec_delay).await;
        }

        let input = args
            .iter()
            .position(|a| a == "-i")
            .and_then(|i| args.get(i + 1))
            .ok_or_else(|| anyhow!("no input argument"))?;
        if !self.files.lock().unwrap().contains_key(input) {
            return Err(anyhow!("{}: No such file or directory", input));
        }
        let output = args.last().ok_or_else(|| anyhow!("no output argument"))?;

        let produced = if args.iter().any(|a| a == "libx264") {
            if let Some(report) = progress {
                for ratio in &self.progress {
                    report(*ratio);
                }
            }
            match &self.encode {
                EncodeScript::Output(bytes) => bytes.clone(),
                EncodeScript::Fail => return Err(anyhow!("encoder exited with status 1")),
            }
        } else {
            match &self.thumbnail {
                ThumbnailScript::Frame(bytes) => bytes.clone(),
                ThumbnailScript::Fail => return Err(anyhow!("could not extract frame")),
            }
        };

        self.files.lock().unwrap().insert(output.clone(), produced);
        Ok(())
    }
}

/// Provider handing out one [`ScriptedRuntime`], counting loads.
pub struct ScriptedProvider {
    runtime: Arc<ScriptedRuntime>,
    loads: AtomicUsize,
    failures_remaining: AtomicUsize,
    load_delay: Duration,
}

impl ScriptedProvider {
    pub fn new(runtime: Arc<ScriptedRuntime>) -> Self {
        Self {
            runtime,
            loads: AtomicUsize::new(0),
            failures_remaining: AtomicUsize::new(0),
            load_delay: Duration::ZERO,
        }
    }

    /// Fail the first `count` loads
    pub fn failing_loads(self, count: usize) -> Self {
        self.failures_remaining.store(count, Ordering::SeqCst);
        self
    }

    pub fn with_load_delay(mut self, delay: Duration) -> Self {
        self.load_delay = delay;
        self
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RuntimeProvider for ScriptedProvider {
    async fn load(&self) -> Result<Arc<dyn TranscodeRuntime>> {
        self.loads.fetch_add(1, Ordering::SeqCst);

        if !self.load_delay.is_zero() {
            tokio::time::sleep(self.load_delay).await;
        }

        let failed = self
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(anyhow!("runtime failed to initialize"));
        }

        Ok(self.runtime.clone())
    }
}
