#![allow(dead_code)]

use async_trait::async_trait;
use ledger_core::{
    hash_block, pow::find_proof, Block, ChainSnapshot, ChainSource, Ledger, LedgerError,
    Result,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A ledger with `blocks` blocks, each sealed with a real proof.
pub fn mined_ledger(blocks: usize) -> Ledger {
    let mut ledger = Ledger::new();
    while ledger.len() < blocks {
        let last = ledger.last_block().clone();
        let proof = find_proof(last.proof).expect("proof");
        ledger.enqueue_transaction("0", "test-miner", 1.0);
        ledger.seal_block(proof, hash_block(&last));
    }
    ledger
}

pub fn mined_chain(blocks: usize) -> Vec<Block> {
    mined_ledger(blocks).chain().as_ref().clone()
}

/// Canned peer responses keyed by authority; unknown peers are unreachable.
#[derive(Default)]
pub struct StaticPeers {
    chains: HashMap<String, Result<ChainSnapshot>>,
    calls: AtomicUsize,
}

impl StaticPeers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chain(mut self, peer: &str, chain: Vec<Block>) -> Self {
        self.chains
            .insert(peer.to_string(), Ok(ChainSnapshot::new(chain)));
        self
    }

    pub fn with_error(mut self, peer: &str, error: LedgerError) -> Self {
        self.chains.insert(peer.to_string(), Err(error));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainSource for StaticPeers {
    async fn fetch_chain(&self, peer: &str) -> Result<ChainSnapshot> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.chains
            .get(peer)
            .cloned()
            .unwrap_or_else(|| {
                Err(LedgerError::PeerUnreachable {
                    peer: peer.to_string(),
                    reason: "connection refused".to_string(),
                })
            })
    }
}
