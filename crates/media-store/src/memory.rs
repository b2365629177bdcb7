//! In-memory storage backend for tests and local development.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::backend::ObjectBackend;
use crate::error::StorageError;

/// In-memory [`ObjectBackend`]. All data is lost on drop.
///
/// This is the fake the facade's behavioral laws (round-trip, overwrite,
/// listing) are tested against, and it backs the daemon's route tests.
#[derive(Default)]
pub struct MemoryBackend {
    objects: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ObjectBackend for MemoryBackend {
    fn label(&self) -> &'static str {
        "In-Memory"
    }

    async fn upload(&self, key: &str, content: Vec<u8>) -> Result<String, StorageError> {
        self.objects.write().insert(key.to_string(), content);
        Ok(format!("mem://{key}"))
    }

    async fn download(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        self.objects
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn list(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.objects.read().keys().cloned().collect())
    }
}
