//! In-memory document store
//!
//! Keeps documents in process memory. Test builds also record every call so
//! assertions can inspect what would have been sent to the remote service.

use async_trait::async_trait;
use std::sync::Mutex;

use super::{DocumentStore, DocumentSummary, EditDirective, StoreError};

#[derive(Debug, Clone)]
struct StoredDocument {
    summary: DocumentSummary,
    folder_id: String,
    body: String,
}

/// Recorded create request
#[cfg(test)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateCall {
    pub name: String,
    pub folder_id: String,
}

/// Recorded batch update request
#[cfg(test)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateCall {
    pub document_id: String,
    pub directives: Vec<EditDirective>,
}

#[derive(Debug, Default)]
struct Inner {
    documents: Vec<StoredDocument>,
    next_id: u64,
    #[cfg(test)]
    list_calls: usize,
    #[cfg(test)]
    creates: Vec<CreateCall>,
    #[cfg(test)]
    updates: Vec<UpdateCall>,
}

/// Document store backed by process memory
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: Mutex<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
impl InMemoryStore {
    /// Seed a document without recording a create call
    pub fn insert(&self, folder_id: &str, name: &str) -> DocumentSummary {
        let mut inner = self.lock();
        push_document(&mut inner, folder_id, name)
    }

    /// Current body text of a document
    pub fn body(&self, document_id: &str) -> Option<String> {
        self.lock()
            .documents
            .iter()
            .find(|d| d.summary.id == document_id)
            .map(|d| d.body.clone())
    }

    pub fn list_calls(&self) -> usize {
        self.lock().list_calls
    }

    pub fn creates(&self) -> Vec<CreateCall> {
        self.lock().creates.clone()
    }

    pub fn updates(&self) -> Vec<UpdateCall> {
        self.lock().updates.clone()
    }
}

impl InMemoryStore {
    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

fn push_document(inner: &mut Inner, folder_id: &str, name: &str) -> DocumentSummary {
    inner.next_id += 1;
    let summary = DocumentSummary {
        id: format!("mem-{:06}", inner.next_id),
        name: name.to_string(),
    };
    inner.documents.push(StoredDocument {
        summary: summary.clone(),
        folder_id: folder_id.to_string(),
        body: String::new(),
    });
    summary
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn list_documents(&self, folder_id: &str) -> Result<Vec<DocumentSummary>, StoreError> {
        #[cfg(test)]
        {
            self.lock().list_calls += 1;
        }
        let inner = self.lock();
        Ok(inner
            .documents
            .iter()
            .filter(|d| d.folder_id == folder_id)
            .map(|d| d.summary.clone())
            .collect())
    }

    async fn create_document(
        &self,
        name: &str,
        folder_id: &str,
    ) -> Result<DocumentSummary, StoreError> {
        let mut inner = self.lock();
        #[cfg(test)]
        inner.creates.push(CreateCall {
            name: name.to_string(),
            folder_id: folder_id.to_string(),
        });
        Ok(push_document(&mut inner, folder_id, name))
    }

    async fn batch_update(
        &self,
        document_id: &str,
        directives: &[EditDirective],
    ) -> Result<(), StoreError> {
        let mut inner = self.lock();
        #[cfg(test)]
        inner.updates.push(UpdateCall {
            document_id: document_id.to_string(),
            directives: directives.to_vec(),
        });

        let Some(doc) = inner
            .documents
            .iter_mut()
            .find(|d| d.summary.id == document_id)
        else {
            return Err(StoreError::Status {
                status: 404,
                body: format!("Requested entity was not found: {document_id}"),
            });
        };

        for directive in directives {
            match directive {
                EditDirective::InsertText { location, text } => {
                    // Docs indexes start at 1; clamp to the body we hold
                    let offset = usize::try_from(location.index.saturating_sub(1))
                        .unwrap_or(usize::MAX)
                        .min(doc.body.chars().count());
                    let byte_offset = doc
                        .body
                        .char_indices()
                        .nth(offset)
                        .map_or(doc.body.len(), |(i, _)| i);
                    doc.body.insert_str(byte_offset, text);
                }
            }
        }
        Ok(())
    }
}
