use crate::config::StorageSettings;

/// Which storage provider family the connection settings describe.
///
/// Resolution is a pure substring sniff on the endpoint and can never
/// fail; only the later client construction can. The S3 marker is checked
/// before the blob marker, so an endpoint that pathologically contains
/// both resolves to S3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    S3,
    AzureBlob,
    Unconfigured,
}

impl ProviderKind {
    /// Resolve the provider from the endpoint string.
    pub fn detect(settings: &StorageSettings) -> Self {
        match settings.endpoint.as_deref() {
            Some(endpoint) if endpoint.contains("s3") => ProviderKind::S3,
            Some(endpoint) if endpoint.contains("blob") => ProviderKind::AzureBlob,
            _ => ProviderKind::Unconfigured,
        }
    }

    /// Display name reported through health/info endpoints.
    pub fn label(&self) -> &'static str {
        match self {
            ProviderKind::S3 => "AWS S3",
            ProviderKind::AzureBlob => "Azure Blob Storage",
            ProviderKind::Unconfigured => "Unconfigured",
        }
    }
}
