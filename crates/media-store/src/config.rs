use std::env;

/// Connection parameters for the backing object store.
///
/// All fields are optional: which of them matter depends on the provider
/// the endpoint resolves to (`region` is S3-only, `access_key` is
/// Azure-only). Values are read once at startup and never revalidated —
/// a missing or malformed value surfaces as the provider SDK's own error
/// during construction, not here.
#[derive(Debug, Clone, Default)]
pub struct StorageSettings {
    pub endpoint: Option<String>,
    pub store_name: Option<String>,
    pub region: Option<String>,
    pub access_key: Option<String>,
}

impl StorageSettings {
    /// Load settings from the `STORAGE_*` environment variables injected
    /// by the deployment platform. Empty values count as absent.
    pub fn from_env() -> Self {
        Self {
            endpoint: non_empty_env("STORAGE_ENDPOINT"),
            store_name: non_empty_env("STORAGE_NAME"),
            region: non_empty_env("STORAGE_REGION"),
            access_key: non_empty_env("STORAGE_ACCESS_KEY"),
        }
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}
