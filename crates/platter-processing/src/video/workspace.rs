//! Job-scoped view of the shared runtime workspace.

use super::runtime::TranscodeRuntime;
use anyhow::Result;
use std::sync::Arc;
use uuid::Uuid;

/// Names and tracks every file one job creates in the runtime workspace.
///
/// All names carry a per-job prefix, so concurrent jobs on the same runtime never touch
/// each other's files. [`cleanup`](Self::cleanup) removes everything the job registered.
pub struct JobWorkspace {
    job_id: Uuid,
    runtime: Arc<dyn TranscodeRuntime>,
    files: Vec<String>,
}

impl JobWorkspace {
    pub fn new(runtime: Arc<dyn TranscodeRuntime>) -> Self {
        Self {
            job_id: Uuid::new_v4(),
            runtime,
            files: Vec::new(),
        }
    }

    pub fn job_id(&self) -> Uuid {
        self.job_id
    }

    pub fn runtime(&self) -> &Arc<dyn TranscodeRuntime> {
        &self.runtime
    }

    /// Job-unique file name for a role (`input`, `output`, `thumb`).
    pub fn file_name(&self, role: &str, extension: &str) -> String {
        format!("job-{}-{}.{}", self.job_id.simple(), role, extension)
    }

    /// Register a file the runtime will create, so cleanup removes it.
    pub fn track(&mut self, name: &str) {
        if !self.files.iter().any(|f| f == name) {
            self.files.push(name.to_string());
        }
    }

    /// Write a file into the workspace. Tracked before writing so a partial write is
    /// still cleaned up.
    pub async fn stage(&mut self, name: &str, data: &[u8]) -> Result<()> {
        self.track(name);
        self.runtime.write_file(name, data).await
    }

    pub async fn read(&self, name: &str) -> Result<Vec<u8>> {
        self.runtime.read_file(name).await
    }

    /// Remove every tracked file. Failures are logged and do not stop the sweep.
    pub async fn cleanup(self) {
        for name in &self.files {
            if let Err(e) = self.runtime.delete_file(name).await {
                tracing::warn!(
                    error = %e,
                    job_id = %self.job_id,
                    file = %name,
                    "Failed to remove transcoding workspace file"
                );
            }
        }
    }
}
