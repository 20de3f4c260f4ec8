use thiserror::Error;

use crate::api::ApiError;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Missing required field: {0}")]
    Validation(&'static str),

    #[error("Contract not found: {0}")]
    ContractNotFound(String),

    #[error("Collection entry {entry_id} not found on contract {contract_id}")]
    CollectionNotFound {
        contract_id: String,
        entry_id: String,
    },

    #[error("Collections are restricted to expired contracts: {0}")]
    CollectionNotAllowed(String),

    #[error("No outstanding installments to generate for {0}")]
    NothingToCollect(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Remote sync error: {0}")]
    Remote(#[from] ApiError),
}

impl From<rusqlite::Error> for LedgerError {
    fn from(err: rusqlite::Error) -> Self {
        LedgerError::DatabaseError(err.to_string())
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;
