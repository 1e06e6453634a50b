//! Transcoding runtime abstraction and its one-time loader.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Receives encoding progress as a fraction in `[0, 1]`.
pub type ProgressFn<'a> = dyn Fn(f64) + Send + Sync + 'a;

/// A loaded transcoding runtime with a private file workspace.
///
/// File names are flat (no directories). Callers are responsible for choosing names that
/// do not collide between concurrent jobs.
#[async_trait]
pub trait TranscodeRuntime: Send + Sync {
    async fn write_file(&self, name: &str, data: &[u8]) -> Result<()>;

    async fn read_file(&self, name: &str) -> Result<Vec<u8>>;

    /// Remove a file. Removing a file that does not exist is not an error.
    async fn delete_file(&self, name: &str) -> Result<()>;

    /// Run the encoder with `args`, resolving file names against the workspace.
    async fn exec(&self, args: &[String], progress: Option<&ProgressFn<'_>>) -> Result<()>;
}

/// Produces a runtime. Loading is expensive and happens at most once per process.
#[async_trait]
pub trait RuntimeProvider: Send + Sync {
    async fn load(&self) -> Result<Arc<dyn TranscodeRuntime>>;
}

/// Process-wide runtime handle behind a one-time initialization guard.
///
/// Concurrent first callers wait on a single load. A failed load leaves the guard empty so
/// the next caller tries again.
pub struct LazyRuntime {
    provider: Arc<dyn RuntimeProvider>,
    cell: OnceCell<Arc<dyn TranscodeRuntime>>,
}

impl LazyRuntime {
    pub fn new(provider: Arc<dyn RuntimeProvider>) -> Self {
        Self {
            provider,
            cell: OnceCell::new(),
        }
    }

    pub async fn get(&self) -> Result<Arc<dyn TranscodeRuntime>> {
        let runtime = self
            .cell
            .get_or_try_init(|| async {
                let start = std::time::Instant::now();
                let runtime = self.provider.load().await?;
                tracing::info!(
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Transcoding runtime loaded"
                );
                Ok::<_, anyhow::Error>(runtime)
            })
            .await?;

        Ok(Arc::clone(runtime))
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.initialized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{EncodeScript, ScriptedProvider, ScriptedRuntime, ThumbnailScript};
    use std::time::Duration;

    fn provider() -> Arc<ScriptedProvider> {
        let runtime = ScriptedRuntime::new(EncodeScript::Output(vec![0; 4]), ThumbnailScript::Fail);
        Arc::new(ScriptedProvider::new(Arc::new(runtime)))
    }

    #[tokio::test]
    async fn test_loads_once() {
        let provider = provider();
        let lazy = LazyRuntime::new(provider.clone());
        assert!(!lazy.is_loaded());

        lazy.get().await.unwrap();
        lazy.get().await.unwrap();

        assert!(lazy.is_loaded());
        assert_eq!(provider.load_count(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_first_use_serializes() {
        let provider = Arc::new(
            ScriptedProvider::new(Arc::new(ScriptedRuntime::new(
                EncodeScript::Fail,
                ThumbnailScript::Fail,
            )))
            .with_load_delay(Duration::from_millis(50)),
        );
        let lazy = Arc::new(LazyRuntime::new(provider.clone()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let lazy = lazy.clone();
                tokio::spawn(async move { lazy.get().await.is_ok() })
            })
            .collect();

        for handle in handles {
            assert!(handle.await.unwrap());
        }
        assert_eq!(provider.load_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_load_is_retried() {
        let provider = Arc::new(
            ScriptedProvider::new(Arc::new(ScriptedRuntime::new(
                EncodeScript::Fail,
                ThumbnailScript::Fail,
            )))
            .failing_loads(1),
        );
        let lazy = LazyRuntime::new(provider.clone());

        assert!(lazy.get().await.is_err());
        assert!(!lazy.is_loaded());

        assert!(lazy.get().await.is_ok());
        assert_eq!(provider.load_count(), 2);
    }
}
