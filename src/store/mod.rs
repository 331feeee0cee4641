//! Document store module
//!
//! Boundary to the external document service of record:
//! - `google`: Drive v3 listing/creation and Docs v1 batch updates over HTTPS
//! - `memory`: in-process store for local runs and tests
//! - `directory`: name-to-id lookup with a write-invalidated cache

mod directory;
mod google;
mod memory;

pub use directory::DocumentDirectory;
pub use google::GoogleDocsStore;
pub use memory::InMemoryStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::config::{StoreBackend, StoreConfig};

/// Mime type marker for native Google Docs documents
pub const DOCUMENT_MIME_TYPE: &str = "application/vnd.google-apps.document";

/// Index of the first character of a document body
pub const DOCUMENT_START_INDEX: u32 = 1;

/// A file inside the configured folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub id: String,
    pub name: String,
}

/// Location inside a document body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub index: u32,
}

/// Single edit instruction of a content mutation, serialized in the
/// Docs `batchUpdate` request shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EditDirective {
    InsertText { location: Location, text: String },
}

impl EditDirective {
    pub fn insert_text(index: u32, text: impl Into<String>) -> Self {
        Self::InsertText {
            location: Location { index },
            text: text.into(),
        }
    }
}

/// Errors raised by a document store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("remote returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unexpected response payload: {0}")]
    Decode(String),
    #[error("credentials unavailable: {0}")]
    Credentials(String),
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Operations the dispatcher needs from the external document service
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// List every file whose parent is `folder_id`
    async fn list_documents(&self, folder_id: &str) -> Result<Vec<DocumentSummary>, StoreError>;

    /// Create an empty document named `name` inside `folder_id`
    async fn create_document(
        &self,
        name: &str,
        folder_id: &str,
    ) -> Result<DocumentSummary, StoreError>;

    /// Apply `directives` to a document, in order
    async fn batch_update(
        &self,
        document_id: &str,
        directives: &[EditDirective],
    ) -> Result<(), StoreError>;
}

/// Build the configured store backend
pub fn build_store(config: &StoreConfig) -> Result<Arc<dyn DocumentStore>, StoreError> {
    match config.backend {
        StoreBackend::Google => Ok(Arc::new(GoogleDocsStore::from_config(config)?)),
        StoreBackend::Memory => Ok(Arc::new(InMemoryStore::new())),
    }
}
