//! Error taxonomy for acquisition, persistence and fusion.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AcquireError {
    /// Network failure or a non-success HTTP status. Retried.
    #[error("Transient fetch failure for {locator}: {reason}")]
    TransientFetch { locator: String, reason: String },

    /// The document was fetched but yielded no index data.
    #[error("No index data found in document from {source_name}")]
    NoDataFound { source_name: String },

    #[error("Giving up on {source_name} after {attempts} attempts: {last_error}")]
    ExhaustedRetries {
        source_name: String,
        attempts: usize,
        #[source]
        last_error: Box<AcquireError>,
    },

    /// Every configured source of a family failed. Callers fall back to
    /// degraded data instead of surfacing this.
    #[error("All {tried} sources exhausted for index family {family}")]
    ExhaustedSources { family: String, tried: usize },

    #[error("Unknown index family: {0}")]
    UnknownFamily(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// The batch transaction failed and was rolled back.
    #[error("Persistence failure: {0}")]
    Persistence(#[from] sqlx::Error),

    #[error("Invalid index family name: {0}")]
    InvalidFamily(String),

    #[error("Corrupt row in {table}: {reason}")]
    CorruptRow { table: String, reason: String },
}

#[derive(Debug, Error, PartialEq)]
pub enum FusionError {
    #[error("No index family has data to fuse")]
    NoSourceData,
}
