//! Command dispatch module
//!
//! Maps a parsed [`Command`] onto document store calls and renders the
//! caller-facing message.

mod message;

pub use message::render_message;

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::command::{parse_command, Command, CommandError, Verb};
use crate::logger;
use crate::store::{
    DocumentDirectory, DocumentStore, EditDirective, StoreError, DOCUMENT_START_INDEX,
};

/// `POST /modify` request body
#[derive(Debug, Clone, Deserialize)]
pub struct ModifyRequest {
    pub text: String,
}

/// `POST /modify` response body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifyResponse {
    pub message: String,
}

/// Successful dispatch results
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Created { name: String },
    Edited { name: String, payload: String },
}

/// Failed dispatch results
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("invalid command: {0}")]
    InvalidCommand(#[from] CommandError),
    #[error("document '{name}' not found")]
    NotFound { name: String },
    #[error("document '{name}' already exists")]
    AlreadyExists { name: String },
    #[error("document store call failed: {0}")]
    Remote(#[from] StoreError),
}

impl DispatchError {
    /// Short label used in log lines
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidCommand(_) => "invalid_command",
            Self::NotFound { .. } => "not_found",
            Self::AlreadyExists { .. } => "already_exists",
            Self::Remote(_) => "remote",
        }
    }
}

/// Dispatcher behaviour switches
#[derive(Debug, Clone, Copy, Default)]
pub struct DispatchPolicy {
    /// Refuse `create` when a document with the same name exists
    pub reject_duplicates: bool,
}

/// Executes commands against one folder of a document store
pub struct Dispatcher {
    store: Arc<dyn DocumentStore>,
    directory: DocumentDirectory,
    policy: DispatchPolicy,
}

impl Dispatcher {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        directory: DocumentDirectory,
        policy: DispatchPolicy,
    ) -> Self {
        Self {
            store,
            directory,
            policy,
        }
    }

    pub const fn directory(&self) -> &DocumentDirectory {
        &self.directory
    }

    /// Parse, dispatch and render one free-text command
    pub async fn handle(&self, text: &str) -> ModifyResponse {
        let result = match parse_command(text) {
            Ok(command) => self.dispatch(&command).await,
            Err(e) => Err(e.into()),
        };

        match &result {
            Ok(outcome) => logger::log_dispatch_success(outcome),
            Err(DispatchError::Remote(e)) => logger::log_store_error(e),
            Err(e) => logger::log_dispatch_rejected(e.kind(), e),
        }

        ModifyResponse {
            message: render_message(&result),
        }
    }

    /// Run a parsed command against the store
    pub async fn dispatch(&self, command: &Command) -> Result<DispatchOutcome, DispatchError> {
        match &command.verb {
            Verb::Create => self.create(&command.document_name).await,
            Verb::Edit => self.edit(&command.document_name, &command.payload).await,
            Verb::Other(verb) => Err(CommandError::UnknownVerb(verb.clone()).into()),
        }
    }

    async fn create(&self, name: &str) -> Result<DispatchOutcome, DispatchError> {
        if self.policy.reject_duplicates && self.directory.lookup_by_name(name).await?.is_some() {
            return Err(DispatchError::AlreadyExists {
                name: name.to_string(),
            });
        }

        let created = self
            .store
            .create_document(name, self.directory.folder_id())
            .await?;
        self.directory.invalidate().await;
        logger::log_info(&format!(
            "[Dispatch] Created document '{}' with id {}",
            created.name, created.id
        ));

        Ok(DispatchOutcome::Created {
            name: name.to_string(),
        })
    }

    async fn edit(&self, name: &str, payload: &str) -> Result<DispatchOutcome, DispatchError> {
        let Some(document) = self.directory.lookup_by_name(name).await? else {
            return Err(DispatchError::NotFound {
                name: name.to_string(),
            });
        };

        // Docs rejects an empty insertText
        if payload.is_empty() {
            return Err(CommandError::EmptyPayload.into());
        }

        self.store
            .batch_update(
                &document.id,
                &[EditDirective::insert_text(DOCUMENT_START_INDEX, payload)],
            )
            .await?;

        Ok(DispatchOutcome::Edited {
            name: name.to_string(),
            payload: payload.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{DocumentSummary, InMemoryStore};
    use async_trait::async_trait;
    use std::time::Duration;

    const FOLDER: &str = "folder-1";

    fn dispatcher_with(
        store: &Arc<InMemoryStore>,
        ttl_secs: u64,
        policy: DispatchPolicy,
    ) -> Dispatcher {
        let dyn_store: Arc<dyn DocumentStore> = store.clone();
        let directory = DocumentDirectory::new(
            Arc::clone(&dyn_store),
            FOLDER.to_string(),
            Duration::from_secs(ttl_secs),
        );
        Dispatcher::new(dyn_store, directory, policy)
    }

    fn dispatcher(store: &Arc<InMemoryStore>) -> Dispatcher {
        dispatcher_with(store, 0, DispatchPolicy::default())
    }

    /// Store whose every call fails like an expired token would
    struct UnauthorizedStore;

    #[async_trait]
    impl DocumentStore for UnauthorizedStore {
        async fn list_documents(&self, _folder_id: &str) -> Result<Vec<DocumentSummary>, StoreError> {
            Err(unauthorized())
        }

        async fn create_document(
            &self,
            _name: &str,
            _folder_id: &str,
        ) -> Result<DocumentSummary, StoreError> {
            Err(unauthorized())
        }

        async fn batch_update(
            &self,
            _document_id: &str,
            _directives: &[EditDirective],
        ) -> Result<(), StoreError> {
            Err(unauthorized())
        }
    }

    fn unauthorized() -> StoreError {
        StoreError::Status {
            status: 401,
            body: "Request had invalid authentication credentials.".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_issues_one_request_in_folder() {
        let store = Arc::new(InMemoryStore::new());
        let response = dispatcher(&store).handle("create Report some ignored words").await;

        let creates = store.creates();
        assert_eq!(creates.len(), 1);
        assert_eq!(creates[0].name, "Report");
        assert_eq!(creates[0].folder_id, FOLDER);
        assert!(response.message.contains("Report"));
        assert!(store.updates().is_empty());
    }

    #[tokio::test]
    async fn test_edit_inserts_payload_at_start() {
        let store = Arc::new(InMemoryStore::new());
        let doc = store.insert(FOLDER, "Notes");

        let response = dispatcher(&store).handle("edit Notes hello   world").await;

        let updates = store.updates();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].document_id, doc.id);
        assert_eq!(
            updates[0].directives,
            vec![EditDirective::insert_text(1, "hello world")]
        );
        assert!(response.message.contains("Notes"));
        assert!(response.message.contains("hello world"));
        assert_eq!(store.body(&doc.id).as_deref(), Some("hello world"));
    }

    #[tokio::test]
    async fn test_edit_unknown_document_is_not_found() {
        let store = Arc::new(InMemoryStore::new());
        store.insert(FOLDER, "Other");
        let d = dispatcher(&store);

        let command = parse_command("edit Missing text").unwrap();
        let err = d.dispatch(&command).await.unwrap_err();
        assert!(matches!(err, DispatchError::NotFound { ref name } if name == "Missing"));
        assert!(store.updates().is_empty());

        let response = d.handle("edit Missing text").await;
        assert!(response.message.contains("not found"));
    }

    #[tokio::test]
    async fn test_edit_unknown_document_without_payload_is_not_found() {
        let store = Arc::new(InMemoryStore::new());
        let response = dispatcher(&store).handle("edit Missing").await;

        assert_eq!(
            response.message,
            "Document Missing not found in the specified folder."
        );
        assert_eq!(store.list_calls(), 1);
        assert!(store.creates().is_empty());
        assert!(store.updates().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_verb_issues_no_request() {
        let store = Arc::new(InMemoryStore::new());
        let d = dispatcher(&store);

        for text in ["delete Report", "RENAME Report New", "Creates Report"] {
            let err = d.dispatch(&parse_command(text).unwrap()).await.unwrap_err();
            assert!(matches!(err, DispatchError::InvalidCommand(CommandError::UnknownVerb(_))));
            assert!(d.handle(text).await.message.starts_with("Invalid command."));
        }
        assert_eq!(store.list_calls(), 0);
        assert!(store.creates().is_empty());
        assert!(store.updates().is_empty());
    }

    #[tokio::test]
    async fn test_verbs_are_case_insensitive() {
        let store = Arc::new(InMemoryStore::new());
        let d = dispatcher(&store);

        d.handle("CREATE Report").await;
        d.handle("Edit Report hi").await;
        assert_eq!(store.creates().len(), 1);
        assert_eq!(store.updates().len(), 1);
    }

    #[tokio::test]
    async fn test_single_token_is_invalid_command() {
        let store = Arc::new(InMemoryStore::new());
        let response = dispatcher(&store).handle("edit").await;

        assert!(response.message.starts_with("Invalid command."));
        assert_eq!(store.list_calls(), 0);
    }

    #[tokio::test]
    async fn test_edit_without_payload_is_rejected() {
        let store = Arc::new(InMemoryStore::new());
        store.insert(FOLDER, "Notes");
        let d = dispatcher(&store);

        let err = d
            .dispatch(&parse_command("edit Notes").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::InvalidCommand(CommandError::EmptyPayload)));
        assert!(store.updates().is_empty());
    }

    #[tokio::test]
    async fn test_create_then_edit_routes_to_new_document() {
        let store = Arc::new(InMemoryStore::new());
        let d = dispatcher_with(&store, 300, DispatchPolicy::default());
        d.directory().warm().await.unwrap();

        d.handle("create Report").await;
        let response = d.handle("edit Report hello world").await;

        let created = store.list_documents(FOLDER).await.unwrap();
        assert_eq!(created.len(), 1);
        let updates = store.updates();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].document_id, created[0].id);
        assert!(response.message.contains("hello world"));
    }

    #[tokio::test]
    async fn test_duplicates_allowed_by_default() {
        let store = Arc::new(InMemoryStore::new());
        let d = dispatcher(&store);

        d.handle("create Report").await;
        d.handle("create Report").await;
        assert_eq!(store.creates().len(), 2);
    }

    #[tokio::test]
    async fn test_duplicates_rejected_when_enabled() {
        let store = Arc::new(InMemoryStore::new());
        store.insert(FOLDER, "Report");
        let d = dispatcher_with(
            &store,
            0,
            DispatchPolicy {
                reject_duplicates: true,
            },
        );

        let err = d
            .dispatch(&parse_command("create Report").unwrap())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "already_exists");
        assert!(store.creates().is_empty());
    }

    #[tokio::test]
    async fn test_remote_failure_is_generic_message() {
        let store: Arc<dyn DocumentStore> = Arc::new(UnauthorizedStore);
        let directory =
            DocumentDirectory::new(Arc::clone(&store), FOLDER.to_string(), Duration::ZERO);
        let d = Dispatcher::new(store, directory, DispatchPolicy::default());

        let err = d
            .dispatch(&parse_command("create Report").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Remote(StoreError::Status { status: 401, .. })));

        for text in ["create Report", "edit Report hi"] {
            let response = d.handle(text).await;
            assert_eq!(
                response.message,
                "An error occurred while processing your request. Please try again."
            );
        }
    }
}
