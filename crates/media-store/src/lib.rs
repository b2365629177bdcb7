//! Provider-agnostic object storage for the media service.
//!
//! The deployment platform injects a small set of `STORAGE_*` environment
//! variables and this crate turns them into a working client for whichever
//! provider they describe: an S3-compatible bucket or an Azure Blob
//! container. Callers see one handle ([`MediaStore`]) with a unified
//! upload/download/list surface and never branch on the provider
//! themselves. When nothing usable is configured the process keeps running
//! with storage in an explicit [`StorageState::Unconfigured`] state so the
//! HTTP layer can still answer health checks.

mod azure;
mod backend;
mod config;
mod error;
mod memory;
mod provider;
mod s3;
mod store;

pub use backend::ObjectBackend;
pub use config::StorageSettings;
pub use error::StorageError;
pub use memory::MemoryBackend;
pub use provider::ProviderKind;
pub use store::{MediaStore, StorageState};
