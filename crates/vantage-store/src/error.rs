use thiserror::Error;
use vantage_core::Collection;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("table {0} does not exist; the database is not set up")]
    TableMissing(String),

    #[error("duplicate entry: {0}")]
    Duplicate(String),

    #[error("referenced record does not exist: {0}")]
    MissingReference(String),

    #[error("{collection} record {id} not found")]
    NotFound { collection: Collection, id: String },

    #[error("unknown company: {0}")]
    UnknownCompany(String),

    #[error("server returned {status}: {message}")]
    Remote { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("serialisation error: {0}")]
    Serde(#[from] serde_json::Error),

    #[cfg(feature = "duckdb")]
    #[error("duckdb error: {0}")]
    DuckDb(#[from] ::duckdb::Error),

    #[error("{0}")]
    Other(String),
}
