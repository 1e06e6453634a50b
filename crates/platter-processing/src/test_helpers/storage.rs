use async_trait::async_trait;
use platter_storage::{
    MemoryStorage, PublicUrlBase, Storage, StorageBackend, StorageError, StorageResult,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// In-memory storage that counts backend calls and can be told to fail puts.
pub struct RecordingStorage {
    inner: MemoryStorage,
    puts: AtomicUsize,
    deletes: AtomicUsize,
    /// Fail puts whose key ends with one of these suffixes
    failing_suffixes: Mutex<Vec<String>>,
    /// (key, content_type, size) of every successful put
    stored: Mutex<Vec<(String, String, usize)>>,
}

impl RecordingStorage {
    pub fn new(public_base: &str) -> Self {
        Self {
            inner: MemoryStorage::new(PublicUrlBase::new(public_base)),
            puts: AtomicUsize::new(0),
            deletes: AtomicUsize::new(0),
            failing_suffixes: Mutex::new(Vec::new()),
            stored: Mutex::new(Vec::new()),
        }
    }

    /// Make every put fail
    pub fn fail_all_puts(&self) {
        self.fail_puts_ending_with("");
    }

    pub fn fail_puts_ending_with(&self, suffix: &str) {
        self.failing_suffixes
            .lock()
            .unwrap()
            .push(suffix.to_string());
    }

    /// Number of backend calls (puts, deletes) issued so far
    pub fn call_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst) + self.deletes.load(Ordering::SeqCst)
    }

    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn delete_count(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    pub fn stored(&self) -> Vec<(String, String, usize)> {
        self.stored.lock().unwrap().clone()
    }
}

#[async_trait]
impl Storage for RecordingStorage {
    async fn put(
        &self,
        storage_key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<String> {
        self.puts.fetch_add(1, Ordering::SeqCst);

        let fails = self
            .failing_suffixes
            .lock()
            .unwrap()
            .iter()
            .any(|s| storage_key.ends_with(s.as_str()));
        if fails {
            return Err(StorageError::UploadFailed(
                "connection reset by peer".to_string(),
            ));
        }

        let size = data.len();
        let url = self.inner.put(storage_key, data, content_type).await?;
        self.stored.lock().unwrap().push((
            storage_key.to_string(),
            content_type.to_string(),
            size,
        ));
        Ok(url)
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.inner.delete(storage_key).await
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        self.inner.exists(storage_key).await
    }

    fn public_urls(&self) -> &PublicUrlBase {
        self.inner.public_urls()
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Memory
    }
}
