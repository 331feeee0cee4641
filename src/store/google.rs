//! Google Drive / Docs REST store
//!
//! Drive v3 is used for listing and creating files, Docs v1 for content
//! mutations. Authentication is a pre-issued bearer token read from the
//! credentials file.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use super::{DocumentStore, DocumentSummary, EditDirective, StoreError, DOCUMENT_MIME_TYPE};
use crate::config::StoreConfig;

/// Credentials file contents
#[derive(Debug, Deserialize)]
struct Credentials {
    access_token: String,
}

/// One page of a Drive `files.list` response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileListPage {
    #[serde(default)]
    files: Vec<DocumentSummary>,
    next_page_token: Option<String>,
}

/// Drive `files.create` request body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateFileRequest<'a> {
    name: &'a str,
    parents: [&'a str; 1],
    mime_type: &'a str,
}

/// Docs `documents.batchUpdate` request body
#[derive(Debug, Serialize)]
struct BatchUpdateRequest<'a> {
    requests: &'a [EditDirective],
}

/// Document store talking to the Google REST APIs
pub struct GoogleDocsStore {
    client: reqwest::Client,
    drive_base_url: String,
    docs_base_url: String,
    access_token: String,
}

impl GoogleDocsStore {
    pub fn from_config(config: &StoreConfig) -> Result<Self, StoreError> {
        let path = config
            .credentials_file
            .as_deref()
            .ok_or_else(|| StoreError::Credentials("no credentials_file configured".to_string()))?;
        let access_token = load_access_token(Path::new(path))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout))
            .build()?;

        Ok(Self {
            client,
            drive_base_url: config.drive_base_url.trim_end_matches('/').to_string(),
            docs_base_url: config.docs_base_url.trim_end_matches('/').to_string(),
            access_token,
        })
    }

    async fn fetch_page(
        &self,
        query: &str,
        page_token: Option<&str>,
    ) -> Result<FileListPage, StoreError> {
        let mut params = vec![
            ("q", query),
            ("fields", "nextPageToken, files(id, name)"),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }

        let response = self
            .client
            .get(format!("{}/files", self.drive_base_url))
            .bearer_auth(&self.access_token)
            .query(&params)
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.json::<FileListPage>().await?)
    }
}

/// Read the bearer token out of a JSON credentials file
fn load_access_token(path: &Path) -> Result<String, StoreError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| StoreError::Credentials(format!("{}: {e}", path.display())))?;
    parse_credentials(&raw)
}

fn parse_credentials(raw: &str) -> Result<String, StoreError> {
    let creds: Credentials =
        serde_json::from_str(raw).map_err(|e| StoreError::Credentials(e.to_string()))?;
    let token = creds.access_token.trim();
    if token.is_empty() {
        return Err(StoreError::Credentials("access_token is empty".to_string()));
    }
    Ok(token.to_string())
}

/// Drive search query selecting the children of a folder
fn folder_query(folder_id: &str) -> String {
    format!("'{}' in parents", folder_id.replace('\'', "\\'"))
}

/// Map non-2xx responses to `StoreError::Status`
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(StoreError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl DocumentStore for GoogleDocsStore {
    async fn list_documents(&self, folder_id: &str) -> Result<Vec<DocumentSummary>, StoreError> {
        let query = folder_query(folder_id);
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self.fetch_page(&query, page_token.as_deref()).await?;
            documents.extend(page.files);
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(documents)
    }

    async fn create_document(
        &self,
        name: &str,
        folder_id: &str,
    ) -> Result<DocumentSummary, StoreError> {
        let body = CreateFileRequest {
            name,
            parents: [folder_id],
            mime_type: DOCUMENT_MIME_TYPE,
        };

        let response = self
            .client
            .post(format!("{}/files", self.drive_base_url))
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.json::<DocumentSummary>().await?)
    }

    async fn batch_update(
        &self,
        document_id: &str,
        directives: &[EditDirective],
    ) -> Result<(), StoreError> {
        let body = BatchUpdateRequest {
            requests: directives,
        };

        let response = self
            .client
            .post(format!(
                "{}/documents/{document_id}:batchUpdate",
                self.docs_base_url
            ))
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }
}
