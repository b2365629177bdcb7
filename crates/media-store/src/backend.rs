use async_trait::async_trait;

use crate::error::StorageError;

/// Capability surface every storage provider implements.
///
/// One implementation exists per [`ProviderKind`](crate::ProviderKind)
/// variant, plus an in-memory fake for tests. Implementations must be
/// safe for concurrent use; the facade takes no locks around them.
#[async_trait]
pub trait ObjectBackend: Send + Sync {
    /// Human-readable provider name, e.g. `"AWS S3"`.
    fn label(&self) -> &'static str;

    /// Store `content` under `key`, replacing any existing object.
    /// Returns a provider-specific locator for the stored object.
    async fn upload(&self, key: &str, content: Vec<u8>) -> Result<String, StorageError>;

    /// Fetch the full content of the object at `key`.
    async fn download(&self, key: &str) -> Result<Vec<u8>, StorageError>;

    /// All object keys in the bucket/container, provider-native order.
    async fn list(&self) -> Result<Vec<String>, StorageError>;
}
