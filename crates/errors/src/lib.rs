//! Error kinds shared across the pipeline (spec §7).
//!
//! Stage code converts foreign errors (I/O, RPC, parse) to the closest
//! `Error` variant at the boundary of the crate that owns that concern, the
//! way `hyperscale-engine::error::ExecutionError` wraps storage/execution
//! failures into one small enum instead of letting foreign error types leak
//! across crate boundaries.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Missing or invalid environment/configuration at startup.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Local/S3 storage I/O failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// State-store (DB) failure.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Signature/hash parse or verification failure.
    #[error("crypto error: {0}")]
    Crypto(String),

    /// Merkle tree/proof structural failure.
    #[error("merkle error: {0}")]
    Merkle(String),

    /// RPC/transaction submission failure.
    #[error("chain error: {0}")]
    Chain(String),

    /// PDF parse/attach/render failure.
    #[error("pdf error: {0}")]
    Pdf(String),

    /// Content-integrity mismatch detected during verification.
    #[error("integrity error: {0}")]
    Integrity(String),

    /// Attempted transition from an invalid state.
    #[error("state error: {0}")]
    State(String),

    /// Caller-supplied input failed validation.
    #[error("validation error: {0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Error::Configuration(msg.into())
    }
    pub fn storage(msg: impl Into<String>) -> Self {
        Error::Storage(msg.into())
    }
    pub fn persistence(msg: impl Into<String>) -> Self {
        Error::Persistence(msg.into())
    }
    pub fn crypto(msg: impl Into<String>) -> Self {
        Error::Crypto(msg.into())
    }
    pub fn merkle(msg: impl Into<String>) -> Self {
        Error::Merkle(msg.into())
    }
    pub fn chain(msg: impl Into<String>) -> Self {
        Error::Chain(msg.into())
    }
    pub fn pdf(msg: impl Into<String>) -> Self {
        Error::Pdf(msg.into())
    }
    pub fn integrity(msg: impl Into<String>) -> Self {
        Error::Integrity(msg.into())
    }
    pub fn state(msg: impl Into<String>) -> Self {
        Error::State(msg.into())
    }
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    /// `true` for kinds P3/P4/P5/P6 treat as transient (§7 propagation
    /// policy (b)): logged and retried on the next scheduler tick rather
    /// than terminally failing the job.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::Chain(_) | Error::Storage(_) | Error::Persistence(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_errors_are_transient() {
        assert!(Error::chain("rpc timeout").is_transient());
    }

    #[test]
    fn validation_errors_are_not_transient() {
        assert!(!Error::validation("bad input").is_transient());
    }
}
