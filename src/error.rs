use thiserror::Error;

use crate::llm::client::CompletionError;

#[derive(Error, Debug)]
pub enum CardSenseError {
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("No statement text available to extract from")]
    EmptyDocument,

    #[error("Completion error: {0}")]
    Completion(#[from] CompletionError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CardSenseError>;
