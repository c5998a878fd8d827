use crate::constants::{GENESIS_PREVIOUS_HASH, GENESIS_PROOF};
use crate::{Block, ChainSnapshot, LedgerError, Result, Transaction};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info};

/// Ledger handle shared between request handlers, the miner and the resolver.
/// Every mutation goes through this one lock.
pub type SharedLedger = Arc<Mutex<Ledger>>;

/// The chain plus the pool of transactions waiting for the next block.
///
/// The chain sits behind an `Arc` so readers can hold a snapshot while the
/// ledger keeps appending (copy-on-write) or swaps in a replacement.
#[derive(Clone, Debug)]
pub struct Ledger {
    chain: Arc<Vec<Block>>,
    pending: Vec<Transaction>,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    /// A ledger holding only the genesis block.
    pub fn new() -> Self {
        let genesis = genesis_block();
        info!(hash = %genesis.hash, "genesis block created");
        Self {
            chain: Arc::new(vec![genesis]),
            pending: Vec::new(),
        }
    }

    pub fn into_shared(self) -> SharedLedger {
        Arc::new(Mutex::new(self))
    }

    /// Queue a transaction and return the index of the block it will land in.
    pub fn enqueue_transaction(
        &mut self,
        sender: impl Into<String>,
        recipient: impl Into<String>,
        amount: f64,
    ) -> u64 {
        self.pending
            .push(Transaction::new(sender, recipient, amount));
        self.last_block().index + 1
    }

    /// Seal the pending pool into a new block on top of the tip.
    ///
    /// The proof is not checked here; callers run the proof-of-work first.
    pub fn seal_block(&mut self, proof: u64, previous_hash: impl Into<String>) -> Block {
        let index = self.last_block().index + 1;
        let transactions = std::mem::take(&mut self.pending);
        let block = Block::new(index, transactions, proof, previous_hash);
        Arc::make_mut(&mut self.chain).push(block.clone());
        info!(
            index = block.index,
            txs = block.transactions.len(),
            hash = %block.hash,
            "block sealed"
        );
        block
    }

    pub fn last_block(&self) -> &Block {
        // `new` and `replace_chain` never leave the chain empty.
        &self.chain[self.chain.len() - 1]
    }

    /// Swap in a whole new chain. Pending transactions are kept.
    pub fn replace_chain(&mut self, chain: Vec<Block>) -> Result<()> {
        if chain.is_empty() {
            return Err(LedgerError::InvalidInput(
                "replacement chain is empty".to_string(),
            ));
        }
        debug!(old = self.chain.len(), new = chain.len(), "replacing chain");
        self.chain = Arc::new(chain);
        Ok(())
    }

    /// Consistent view of the chain; later seals do not affect it.
    pub fn chain(&self) -> Arc<Vec<Block>> {
        Arc::clone(&self.chain)
    }

    pub fn snapshot(&self) -> ChainSnapshot {
        ChainSnapshot::new(self.chain.as_ref().clone())
    }

    pub fn pending(&self) -> &[Transaction] {
        &self.pending
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }
}

/// Genesis: index 1, seed proof, sentinel previous hash, no transactions.
pub fn genesis_block() -> Block {
    Block::new(1, vec![], GENESIS_PROOF, GENESIS_PREVIOUS_HASH)
}
