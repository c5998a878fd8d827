//! Chain validation and longest-valid-chain conflict resolution.

use crate::pow::is_valid_proof;
use crate::{hash_block, Block, ChainSnapshot, Ledger, LedgerError, Result};
use async_trait::async_trait;
use futures_util::future::join_all;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

/// Check hash links and proofs pairwise, trusting only the first block.
/// Embedded `hash` fields are ignored; every link is re-derived.
pub fn validate_chain(chain: &[Block]) -> Result<()> {
    if chain.is_empty() {
        return Err(LedgerError::ChainValidation {
            index: 0,
            reason: "chain is empty".to_string(),
        });
    }
    for pair in chain.windows(2) {
        let (previous, current) = (&pair[0], &pair[1]);
        if current.previous_hash != hash_block(previous) {
            return Err(LedgerError::ChainValidation {
                index: current.index,
                reason: "previous_hash does not match the preceding block".to_string(),
            });
        }
        if !is_valid_proof(previous.proof, current.proof) {
            return Err(LedgerError::ChainValidation {
                index: current.index,
                reason: format!("proof {} does not follow {}", current.proof, previous.proof),
            });
        }
    }
    Ok(())
}

pub fn is_valid_chain(chain: &[Block]) -> bool {
    validate_chain(chain).is_ok()
}

/// Where conflict resolution gets a peer's view of the chain.
#[async_trait]
pub trait ChainSource: Send + Sync {
    async fn fetch_chain(&self, peer: &str) -> Result<ChainSnapshot>;
}

/// Pick the chain that should replace a local chain of `local_len` blocks.
///
/// Candidates are scanned in order; a candidate wins if it is strictly
/// longer than the best so far and valid, so among several equally long
/// winners the first one scanned is kept. Peer errors are logged and skipped.
pub fn select_longest_chain<I>(local_len: usize, candidates: I) -> Option<Vec<Block>>
where
    I: IntoIterator<Item = (String, Result<ChainSnapshot>)>,
{
    let mut max_length = local_len;
    let mut winning: Option<Vec<Block>> = None;

    for (peer, fetched) in candidates {
        let snapshot = match fetched {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(peer = %peer, error = %e, "skipping peer");
                continue;
            }
        };
        if snapshot.length != snapshot.chain.len() {
            let e = LedgerError::PeerInvalidResponse {
                peer: peer.clone(),
                reason: format!(
                    "reported length {} but sent {} blocks",
                    snapshot.length,
                    snapshot.chain.len()
                ),
            };
            warn!(peer = %peer, error = %e, "skipping peer");
            continue;
        }
        let length = snapshot.chain.len();
        if length <= max_length {
            debug!(peer = %peer, length, max_length, "peer chain not longer");
            continue;
        }
        match validate_chain(&snapshot.chain) {
            Ok(()) => {
                debug!(peer = %peer, length, "peer chain is the longest valid so far");
                max_length = length;
                winning = Some(snapshot.chain);
            }
            Err(e) => warn!(peer = %peer, error = %e, "discarding invalid peer chain"),
        }
    }
    winning
}

/// Poll every peer and replace the local chain with the longest valid one,
/// if it is longer than ours. Returns whether the chain was replaced.
///
/// Fetches run concurrently and no lock is held while they are in flight.
/// The swap is re-checked under the lock because the local chain may have
/// grown in the meantime.
pub async fn resolve_conflicts<S>(ledger: &Mutex<Ledger>, peers: &[String], source: &S) -> bool
where
    S: ChainSource + ?Sized,
{
    let local_len = ledger.lock().len();
    let fetched = join_all(peers.iter().map(|peer| source.fetch_chain(peer))).await;
    let candidates = peers.iter().cloned().zip(fetched);

    let Some(winning) = select_longest_chain(local_len, candidates) else {
        info!(length = local_len, "local chain is authoritative");
        return false;
    };

    let mut guard = ledger.lock();
    if winning.len() <= guard.len() {
        info!(
            local = guard.len(),
            candidate = winning.len(),
            "local chain grew during resolution; keeping it"
        );
        return false;
    }
    let length = winning.len();
    match guard.replace_chain(winning) {
        Ok(()) => {
            info!(length, "local chain replaced by a longer peer chain");
            true
        }
        Err(e) => {
            warn!(error = %e, "chain replacement refused");
            false
        }
    }
}
