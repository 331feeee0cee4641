//! Command parsing module
//!
//! Turns the free-text body of a `/modify` request into a verb, a target
//! document name and a payload.

use std::fmt;
use thiserror::Error;

/// Action selected by the first token of a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verb {
    Create,
    Edit,
    /// Unrecognized verb, already lower-cased
    Other(String),
}

impl Verb {
    fn from_token(token: &str) -> Self {
        let lowered = token.to_lowercase();
        match lowered.as_str() {
            "create" => Self::Create,
            "edit" => Self::Edit,
            _ => Self::Other(lowered),
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => f.write_str("create"),
            Self::Edit => f.write_str("edit"),
            Self::Other(verb) => f.write_str(verb),
        }
    }
}

/// Parsed command, built per request and discarded after dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub verb: Verb,
    /// Case-sensitive document name, never contains whitespace
    pub document_name: String,
    /// Remaining tokens joined with single spaces, may be empty
    pub payload: String,
}

/// Validation failures for a command
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("expected a verb and a document name, got {found} token(s)")]
    MissingTokens { found: usize },
    #[error("unknown verb '{0}'")]
    UnknownVerb(String),
    #[error("nothing to insert")]
    EmptyPayload,
}

/// Split raw text into a [`Command`]
///
/// The first token (lower-cased) selects the verb, the second names the
/// document, and everything after it becomes the payload.
pub fn parse_command(text: &str) -> Result<Command, CommandError> {
    let mut tokens = text.split_whitespace();

    let (Some(verb), Some(name)) = (tokens.next(), tokens.next()) else {
        return Err(CommandError::MissingTokens {
            found: text.split_whitespace().count(),
        });
    };

    Ok(Command {
        verb: Verb::from_token(verb),
        document_name: name.to_string(),
        payload: tokens.collect::<Vec<_>>().join(" "),
    })
}
