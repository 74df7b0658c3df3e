use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Input is not a well-formed nftables JSON document
    #[error("failed to parse nftables document: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("failed to encode nftables document: {0}")]
    Encode(#[source] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
