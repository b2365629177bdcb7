use std::sync::Arc;

use tracing::{error, info};

use crate::azure::AzureBlobBackend;
use crate::backend::ObjectBackend;
use crate::config::StorageSettings;
use crate::error::StorageError;
use crate::provider::ProviderKind;
use crate::s3::S3Backend;

/// The process-wide storage handle.
///
/// Constructed once at startup, never recreated. Holds the live provider
/// client behind the [`ObjectBackend`] seam; operations delegate to it
/// without any locking — the provider SDKs' clients are safe for
/// concurrent use. No retries, timeouts, or pooling happen here; each
/// call blocks until the provider responds.
pub struct MediaStore {
    backend: Arc<dyn ObjectBackend>,
    setup_warning: Option<String>,
}

impl MediaStore {
    /// Resolve the provider from `settings` and build the matching
    /// client.
    ///
    /// For S3 the bucket is taken on faith; for Azure the media container
    /// is ensured (see [`StorageError`] docs for the failure taxonomy).
    /// An unresolvable endpoint fails with
    /// [`StorageError::NotConfigured`].
    pub async fn connect(settings: &StorageSettings) -> Result<Self, StorageError> {
        match ProviderKind::detect(settings) {
            ProviderKind::S3 => {
                let bucket = settings.store_name.clone().unwrap_or_default();
                let backend = S3Backend::connect(settings.region.clone(), bucket).await;
                Ok(Self {
                    backend: Arc::new(backend),
                    setup_warning: None,
                })
            }
            ProviderKind::AzureBlob => {
                let account = settings.store_name.clone().unwrap_or_default();
                let access_key = settings.access_key.clone().unwrap_or_default();
                let (backend, setup_warning) =
                    AzureBlobBackend::connect(account, access_key).await?;
                Ok(Self {
                    backend: Arc::new(backend),
                    setup_warning,
                })
            }
            ProviderKind::Unconfigured => Err(StorageError::NotConfigured(
                "no storage provider resolved from STORAGE_ENDPOINT".to_string(),
            )),
        }
    }

    /// Wrap an already-built backend. Used by tests and anywhere a
    /// non-environment-driven backend (e.g. [`crate::MemoryBackend`]) is
    /// wanted.
    pub fn with_backend(backend: Arc<dyn ObjectBackend>) -> Self {
        Self {
            backend,
            setup_warning: None,
        }
    }

    /// Display name of the active provider.
    pub fn provider(&self) -> &'static str {
        self.backend.label()
    }

    /// Non-fatal provisioning problem recorded during construction, if
    /// any.
    pub fn setup_warning(&self) -> Option<&str> {
        self.setup_warning.as_deref()
    }

    pub async fn upload(&self, key: &str, content: Vec<u8>) -> Result<String, StorageError> {
        let locator = self.backend.upload(key, content).await?;
        info!(provider = self.provider(), key, "uploaded object");
        Ok(locator)
    }

    pub async fn download(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let content = self.backend.download(key).await?;
        info!(provider = self.provider(), key, "downloaded object");
        Ok(content)
    }

    pub async fn list(&self) -> Result<Vec<String>, StorageError> {
        let keys = self.backend.list().await?;
        info!(provider = self.provider(), count = keys.len(), "listed objects");
        Ok(keys)
    }
}

/// Explicit lifecycle state of the process-wide storage handle.
///
/// Startup runs [`StorageState::initialize`] exactly once; a failed
/// construction is downgraded to [`StorageState::Unconfigured`] instead
/// of aborting the process, so health endpoints keep answering. Request
/// handlers consult [`StorageState::store`] before any provider call.
pub enum StorageState {
    Ready(Arc<MediaStore>),
    Unconfigured { reason: String },
}

impl StorageState {
    /// Build the storage handle, downgrading failure to the unconfigured
    /// state.
    pub async fn initialize(settings: &StorageSettings) -> Self {
        match MediaStore::connect(settings).await {
            Ok(store) => {
                info!(provider = store.provider(), "storage initialized");
                StorageState::Ready(Arc::new(store))
            }
            Err(err) => {
                error!(error = %err, "failed to initialize storage; continuing without it");
                StorageState::Unconfigured {
                    reason: err.to_string(),
                }
            }
        }
    }

    /// The live handle, or a fail-fast `NotConfigured` error without
    /// touching any provider.
    pub fn store(&self) -> Result<&MediaStore, StorageError> {
        match self {
            StorageState::Ready(store) => Ok(store),
            StorageState::Unconfigured { reason } => {
                Err(StorageError::NotConfigured(reason.clone()))
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, StorageState::Ready(_))
    }

    /// Provider label when storage is configured.
    pub fn provider(&self) -> Option<&'static str> {
        match self {
            StorageState::Ready(store) => Some(store.provider()),
            StorageState::Unconfigured { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryBackend;

    #[tokio::test]
    async fn connect_without_settings_fails_not_configured() {
        let err = MediaStore::connect(&StorageSettings::default())
            .await
            .err()
            .expect("construction must fail");
        assert!(matches!(err, StorageError::NotConfigured(_)));
    }

    #[tokio::test]
    async fn unconfigured_state_rejects_before_any_provider_call() {
        let state = StorageState::initialize(&StorageSettings::default()).await;
        assert!(!state.is_ready());
        assert!(state.provider().is_none());
        let err = state.store().err().expect("store must be absent");
        assert!(matches!(err, StorageError::NotConfigured(_)));
    }

    #[tokio::test]
    async fn facade_reports_backend_label() {
        let store = MediaStore::with_backend(Arc::new(MemoryBackend::new()));
        assert_eq!(store.provider(), "In-Memory");
        assert!(store.setup_warning().is_none());
    }
}
