//! Proof-of-work over `(last_proof, proof)` pairs.
//!
//! A proof is valid when SHA-256 of the decimal text of `last_proof`
//! followed by the decimal text of `proof` has at least
//! [`POW_TARGET_DIFFICULTY`] leading zero bits. The search always returns the
//! smallest such proof, so every peer re-deriving it agrees.

use crate::constants::{BYTE, POW_TARGET_DIFFICULTY, PROOF_SEARCH_BATCH};
use crate::{LedgerError, Result};
use rayon::prelude::*;
use sha2::{Digest, Sha256};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

pub fn proof_digest(last_proof: u64, proof: u64) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(format!("{last_proof}{proof}").as_bytes());
    hasher.finalize().into()
}

pub fn is_valid_proof(last_proof: u64, proof: u64) -> bool {
    count_leading_zero_bits(&proof_digest(last_proof, proof)) >= POW_TARGET_DIFFICULTY
}

pub fn count_leading_zero_bits(hash: &[u8; 32]) -> u32 {
    let mut total = 0u32;
    for b in hash {
        if *b == 0 {
            total += BYTE as u32;
        } else {
            total += b.leading_zeros();
            break;
        }
    }
    total
}

/// Unbounded search for the first valid proof after `last_proof`.
pub fn find_proof(last_proof: u64) -> Result<u64> {
    ProofSearch::new().run(last_proof)
}

/// A proof search that can be bounded and cancelled from another thread.
#[derive(Clone, Debug, Default)]
pub struct ProofSearch {
    max_attempts: Option<u64>,
    cancel: Option<Arc<AtomicBool>>,
}

impl ProofSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_attempts(mut self, max_attempts: u64) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    pub fn with_cancel(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn max_attempts(&self) -> Option<u64> {
        self.max_attempts
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// Scan candidates `0, 1, 2, ...` in batches. Within a batch rayon checks
    /// candidates in parallel, and `find_first` keeps the lowest hit.
    pub fn run(&self, last_proof: u64) -> Result<u64> {
        let limit = self.max_attempts.unwrap_or(u64::MAX);
        let mut start = 0u64;
        while start < limit {
            if self.is_cancelled() {
                return Err(LedgerError::ProofSearchCancelled);
            }
            let end = start.saturating_add(PROOF_SEARCH_BATCH).min(limit);
            if let Some(proof) = (start..end)
                .into_par_iter()
                .find_first(|candidate| is_valid_proof(last_proof, *candidate))
            {
                return Ok(proof);
            }
            start = end;
        }
        Err(LedgerError::ProofSearchExhausted { attempts: limit })
    }
}
