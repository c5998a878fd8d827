use crate::constants::{MINING_REWARD, MINING_REWARD_SENDER};
use crate::pow::ProofSearch;
use crate::{hash_block, Block, Ledger, Result};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

/// Mine the next block on top of the current tip.
///
/// The proof search runs without holding the ledger lock. If another block
/// was sealed or the chain was replaced meanwhile, the proof no longer fits
/// the tip and the search starts over. Once a proof fits, the reward
/// transaction is queued and the pool is sealed in one critical section.
pub fn mine_next_block(
    ledger: &Mutex<Ledger>,
    reward_recipient: &str,
    search: &ProofSearch,
) -> Result<Block> {
    mine_with(ledger, reward_recipient, |last_proof| search.run(last_proof))
}

/// [`mine_next_block`] with the proof search supplied by the caller.
/// `search` is called with the tip's proof and never under the ledger lock.
fn mine_with<F>(ledger: &Mutex<Ledger>, reward_recipient: &str, mut search: F) -> Result<Block>
where
    F: FnMut(u64) -> Result<u64>,
{
    loop {
        let (last_proof, last_hash) = {
            let guard = ledger.lock();
            let tip = guard.last_block();
            (tip.proof, hash_block(tip))
        };

        let proof = search(last_proof)?;

        let mut guard = ledger.lock();
        let tip = guard.last_block();
        if tip.proof != last_proof || hash_block(tip) != last_hash {
            warn!(proof, "tip moved while searching; discarding stale proof");
            continue;
        }
        let index = guard.enqueue_transaction(MINING_REWARD_SENDER, reward_recipient, MINING_REWARD);
        info!(index, recipient = %reward_recipient, "queued mining reward");
        let block = guard.seal_block(proof, last_hash);
        debug!(block = %block, "mined block");
        return Ok(block);
    }
}
