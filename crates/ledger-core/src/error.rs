use thiserror::Error;

pub type Result<T> = std::result::Result<T, LedgerError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LedgerError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("peer {peer} unreachable: {reason}")]
    PeerUnreachable { peer: String, reason: String },

    #[error("peer {peer} sent an invalid response: {reason}")]
    PeerInvalidResponse { peer: String, reason: String },

    #[error("chain validation failed at block {index}: {reason}")]
    ChainValidation { index: u64, reason: String },

    #[error("proof search gave up after {attempts} candidates")]
    ProofSearchExhausted { attempts: u64 },

    #[error("proof search cancelled")]
    ProofSearchCancelled,
}

impl LedgerError {
    /// Errors that only affect a single peer during conflict resolution.
    pub fn is_peer_error(&self) -> bool {
        matches!(
            self,
            LedgerError::PeerUnreachable { .. } | LedgerError::PeerInvalidResponse { .. }
        )
    }
}
