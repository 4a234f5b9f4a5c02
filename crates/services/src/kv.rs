//! Key/value access that survives a failing backend.
//!
//! The first failed read or write switches the process to an in-memory copy
//! for the rest of its lifetime. Callers never see the error; they can ask
//! [`FallbackKv::is_degraded`] or inspect the [`Persistence`] of a write.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use storage::repository::KeyValueStore;

/// Where a mutation ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persistence {
    /// Written to the backing store.
    Durable,
    /// Kept in process memory only; lost on exit.
    MemoryOnly,
}

impl Persistence {
    #[must_use]
    pub fn is_durable(self) -> bool {
        matches!(self, Persistence::Durable)
    }
}

pub struct FallbackKv {
    backend: Arc<dyn KeyValueStore>,
    memory: Mutex<HashMap<String, String>>,
    degraded: AtomicBool,
}

impl FallbackKv {
    #[must_use]
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self {
            backend,
            memory: Mutex::new(HashMap::new()),
            degraded: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn persistence(&self) -> Persistence {
        if self.is_degraded() {
            Persistence::MemoryOnly
        } else {
            Persistence::Durable
        }
    }

    pub async fn read(&self, key: &str) -> Option<String> {
        if !self.is_degraded() {
            match self.backend.read(key).await {
                Ok(value) => {
                    self.remember(key, value.as_deref());
                    return value;
                }
                Err(err) => self.degrade("read", key, &err),
            }
        }
        self.memory_guard().get(key).cloned()
    }

    pub async fn write(&self, key: &str, value: &str) -> Persistence {
        self.remember(key, Some(value));
        if self.is_degraded() {
            return Persistence::MemoryOnly;
        }
        match self.backend.write(key, value).await {
            Ok(()) => Persistence::Durable,
            Err(err) => {
                self.degrade("write", key, &err);
                Persistence::MemoryOnly
            }
        }
    }

    fn degrade(&self, op: &'static str, key: &str, err: &dyn std::error::Error) {
        let first = !self.degraded.swap(true, Ordering::AcqRel);
        tracing::warn!(op, key, error = %err, first, "storage unavailable, continuing in memory");
    }

    fn remember(&self, key: &str, value: Option<&str>) {
        let mut memory = self.memory_guard();
        match value {
            Some(value) => {
                memory.insert(key.to_owned(), value.to_owned());
            }
            None => {
                memory.remove(key);
            }
        }
    }

    fn memory_guard(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.memory.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use storage::repository::{InMemoryStore, StorageError};

    /// Backend whose operations can be switched to fail.
    #[derive(Default)]
    pub(crate) struct FlakyStore {
        pub(crate) inner: InMemoryStore,
        pub(crate) failing: AtomicBool,
    }

    #[async_trait]
    impl KeyValueStore for FlakyStore {
        async fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(StorageError::Connection("offline".into()));
            }
            self.inner.read(key).await
        }

        async fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(StorageError::Connection("offline".into()));
            }
            self.inner.write(key, value).await
        }
    }

    #[tokio::test]
    async fn healthy_backend_is_durable() {
        let kv = FallbackKv::new(Arc::new(InMemoryStore::new()));
        assert_eq!(kv.write("a", "1").await, Persistence::Durable);
        assert_eq!(kv.read("a").await.as_deref(), Some("1"));
        assert!(!kv.is_degraded());
    }

    #[tokio::test]
    async fn failure_keeps_last_known_values_in_memory() {
        let backend = Arc::new(FlakyStore::default());
        let kv = FallbackKv::new(backend.clone());
        kv.write("a", "1").await;

        backend.failing.store(true, Ordering::SeqCst);
        assert_eq!(kv.read("a").await.as_deref(), Some("1"));
        assert!(kv.is_degraded());

        assert_eq!(kv.write("a", "2").await, Persistence::MemoryOnly);
        assert_eq!(kv.read("a").await.as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn degradation_lasts_for_the_process() {
        let backend = Arc::new(FlakyStore::default());
        let kv = FallbackKv::new(backend.clone());
        backend.failing.store(true, Ordering::SeqCst);
        assert_eq!(kv.write("a", "1").await, Persistence::MemoryOnly);

        backend.failing.store(false, Ordering::SeqCst);
        assert_eq!(kv.write("a", "2").await, Persistence::MemoryOnly);
        assert_eq!(backend.inner.read("a").await.unwrap(), None);
    }
}
