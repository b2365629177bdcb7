use async_trait::async_trait;
use azure_core::error::ErrorKind;
use azure_core::StatusCode;
use azure_storage::ConnectionString;
use azure_storage_blobs::prelude::{BlobServiceClient, ContainerClient};
use bytes::Bytes;
use futures::StreamExt;
use tracing::{info, warn};

use crate::backend::ObjectBackend;
use crate::error::StorageError;

/// All media objects live in one fixed container per storage account.
const MEDIA_CONTAINER: &str = "media-files";

/// Azure Blob Storage backend.
pub(crate) struct AzureBlobBackend {
    container: ContainerClient,
    account: String,
}

impl AzureBlobBackend {
    /// Build a client from the account name and key, then make sure the
    /// media container exists.
    ///
    /// The connection string is synthesized here and handed to the SDK's
    /// own parser, so malformed or missing values fail with the SDK's
    /// connection error rather than local validation. Container creation
    /// is attempted exactly once: an already-exists conflict is expected
    /// and swallowed, while any other failure is kept as a setup warning
    /// on the handle — construction still succeeds, and the first
    /// operation failure is where a deeper provisioning problem shows up.
    pub(crate) async fn connect(
        account: String,
        access_key: String,
    ) -> Result<(Self, Option<String>), StorageError> {
        let raw = connection_string(&account, &access_key);
        let parsed = ConnectionString::new(&raw)
            .map_err(|err| StorageError::NotConfigured(err.to_string()))?;
        let credentials = parsed
            .storage_credentials()
            .map_err(|err| StorageError::NotConfigured(err.to_string()))?;

        let service = BlobServiceClient::new(account.clone(), credentials);
        let container = service.container_client(MEDIA_CONTAINER);

        let setup_warning = match container.create().await {
            Ok(_) => {
                info!(container = MEDIA_CONTAINER, "created storage container");
                None
            }
            Err(err) if is_container_already_exists(&err) => None,
            Err(err) => {
                warn!(
                    container = MEDIA_CONTAINER,
                    error = %err,
                    "container provisioning failed; continuing without it"
                );
                Some(format!(
                    "container '{MEDIA_CONTAINER}' could not be ensured: {err}"
                ))
            }
        };

        Ok((Self { container, account }, setup_warning))
    }
}

#[async_trait]
impl ObjectBackend for AzureBlobBackend {
    fn label(&self) -> &'static str {
        "Azure Blob Storage"
    }

    async fn upload(&self, key: &str, content: Vec<u8>) -> Result<String, StorageError> {
        self.container
            .blob_client(key)
            .put_block_blob(Bytes::from(content))
            .await
            .map_err(|err| StorageError::upload(key, err))?;

        Ok(object_uri(&self.account, key))
    }

    async fn download(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        self.container
            .blob_client(key)
            .get_content()
            .await
            .map_err(|err| {
                if is_blob_not_found(&err) {
                    StorageError::NotFound(key.to_string())
                } else {
                    StorageError::download(key, err)
                }
            })
    }

    async fn list(&self) -> Result<Vec<String>, StorageError> {
        let mut pages = self.container.list_blobs().into_stream();

        let mut keys = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|err| StorageError::List(err.to_string()))?;
            for blob in page.blobs.blobs() {
                keys.push(blob.name.clone());
            }
        }

        Ok(keys)
    }
}

fn connection_string(account: &str, access_key: &str) -> String {
    format!(
        "DefaultEndpointsProtocol=https;AccountName={account};AccountKey={access_key};EndpointSuffix=core.windows.net"
    )
}

fn object_uri(account: &str, key: &str) -> String {
    format!("https://{account}.blob.core.windows.net/{MEDIA_CONTAINER}/{key}")
}

fn is_container_already_exists(err: &azure_core::error::Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::HttpResponse { status, error_code }
            if *status == StatusCode::Conflict
                || error_code.as_deref() == Some("ContainerAlreadyExists")
    )
}

fn is_blob_not_found(err: &azure_core::error::Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::HttpResponse { status, error_code }
            if *status == StatusCode::NotFound
                || error_code.as_deref() == Some("BlobNotFound")
    )
}
