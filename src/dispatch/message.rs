//! Caller-facing messages for dispatch results

use super::{DispatchError, DispatchOutcome};

const INVALID_COMMAND: &str = "Invalid command. Please use 'Create a new document' or 'Edit' \
     followed by the document name and the text to add.";
const REMOTE_FAILURE: &str = "An error occurred while processing your request. Please try again.";

/// Render a dispatch result as the `message` field of a response
///
/// Remote failures collapse into one generic message; their detail only
/// reaches the error log.
pub fn render_message(result: &Result<DispatchOutcome, DispatchError>) -> String {
    match result {
        Ok(DispatchOutcome::Created { name }) => {
            format!("{name} has been created in the specified folder.")
        }
        Ok(DispatchOutcome::Edited { name, payload }) => {
            format!("Added the text '{payload}' to the document {name}.")
        }
        Err(DispatchError::NotFound { name }) => {
            format!("Document {name} not found in the specified folder.")
        }
        Err(DispatchError::AlreadyExists { name }) => {
            format!("Document {name} already exists in the specified folder.")
        }
        Err(DispatchError::InvalidCommand(_)) => INVALID_COMMAND.to_string(),
        Err(DispatchError::Remote(_)) => REMOTE_FAILURE.to_string(),
    }
}
