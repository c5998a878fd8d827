pub mod constants;
pub mod error;
pub mod ledger;
pub mod mine;
pub mod peers;
pub mod pow;
pub mod resolve;

pub use error::{LedgerError, Result};
pub use ledger::{Ledger, SharedLedger};
pub use peers::PeerRegistry;
pub use resolve::{is_valid_chain, resolve_conflicts, validate_chain, ChainSource};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub sender: String,
    pub recipient: String,
    pub amount: f64,
}

impl Transaction {
    pub fn new(sender: impl Into<String>, recipient: impl Into<String>, amount: f64) -> Self {
        Self {
            sender: sender.into(),
            recipient: recipient.into(),
            amount,
        }
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Sender: {}, Recipient: {}, Amount: {}",
            self.sender, self.recipient, self.amount
        )
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    pub timestamp: u64,
    pub transactions: Vec<Transaction>,
    pub proof: u64,
    pub previous_hash: String,
    pub hash: String,
}

impl Block {
    /// Build a block stamped with the current time and its digest filled in.
    pub fn new(
        index: u64,
        transactions: Vec<Transaction>,
        proof: u64,
        previous_hash: impl Into<String>,
    ) -> Self {
        let mut block = Self {
            index,
            timestamp: unix_now(),
            transactions,
            proof,
            previous_hash: previous_hash.into(),
            hash: String::new(),
        };
        block.hash = hash_block(&block);
        block
    }

    /// Canonical encoding fed to the hash engine. The `hash` field is not part of it.
    pub fn hash_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(64 + self.previous_hash.len() + self.transactions.len() * 48);
        bytes.extend_from_slice(&self.index.to_le_bytes());
        put_str(&mut bytes, &self.previous_hash);
        bytes.extend_from_slice(&self.proof.to_le_bytes());
        bytes.extend_from_slice(&self.timestamp.to_le_bytes());
        bytes.extend_from_slice(&(self.transactions.len() as u64).to_le_bytes());
        for tx in &self.transactions {
            put_str(&mut bytes, &tx.sender);
            put_str(&mut bytes, &tx.recipient);
            bytes.extend_from_slice(&tx.amount.to_bits().to_le_bytes());
        }
        bytes
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Index: {}, Hash: {}, PreviousHash: {}, Proof: {}, Timestamp: {}, Transactions: [",
            self.index, self.hash, self.previous_hash, self.proof, self.timestamp
        )?;
        for (i, tx) in self.transactions.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{tx}")?;
        }
        f.write_str("]")
    }
}

fn put_str(bytes: &mut Vec<u8>, s: &str) {
    bytes.extend_from_slice(&(s.len() as u64).to_le_bytes());
    bytes.extend_from_slice(s.as_bytes());
}

/// Hex SHA-256 digest of a block's canonical fields.
pub fn hash_block(block: &Block) -> String {
    let mut hasher = Sha256::new();
    hasher.update(block.hash_bytes());
    hex::encode(hasher.finalize())
}

/// The `{chain, length}` shape a node reports and peers fetch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChainSnapshot {
    pub chain: Vec<Block>,
    pub length: usize,
}

impl ChainSnapshot {
    pub fn new(chain: Vec<Block>) -> Self {
        let length = chain.len();
        Self { chain, length }
    }
}

pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::HASH_HEX_SIZE;

    fn sample_block() -> Block {
        let mut block = Block::new(
            2,
            vec![
                Transaction::new("Alice", "Bob", 10.0),
                Transaction::new("Bob", "Charlie", 5.5),
            ],
            35_293,
            "abc",
        );
        block.timestamp = 1_600_000_200; // Fix timestamp for test consistency
        block.hash = hash_block(&block);
        block
    }

    #[test]
    fn block_hash_is_hex_sha256() {
        let block = sample_block();
        assert_eq!(block.hash.len(), HASH_HEX_SIZE);
        assert!(block.hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn block_hash_consistency() {
        let block = sample_block();
        assert_eq!(hash_block(&block), hash_block(&block));
        assert_eq!(hash_block(&block), block.hash);
    }

    #[test]
    fn block_hash_ignores_hash_field() {
        let mut block = sample_block();
        let before = hash_block(&block);
        block.hash = "forged".to_string();
        assert_eq!(hash_block(&block), before);
    }

    #[test]
    fn block_hash_changes_with_each_field() {
        let base = sample_block();
        let digest = hash_block(&base);

        let mut b = base.clone();
        b.index += 1;
        assert_ne!(hash_block(&b), digest);

        let mut b = base.clone();
        b.timestamp += 1;
        assert_ne!(hash_block(&b), digest);

        let mut b = base.clone();
        b.proof += 1;
        assert_ne!(hash_block(&b), digest);

        let mut b = base.clone();
        b.previous_hash.push('0');
        assert_ne!(hash_block(&b), digest);

        let mut b = base.clone();
        b.transactions[1].amount = 5.25;
        assert_ne!(hash_block(&b), digest);

        let mut b = base.clone();
        b.transactions.pop();
        assert_ne!(hash_block(&b), digest);
    }

    #[test]
    fn hash_bytes_are_length_prefixed() {
        // "ab" + "c" must not collide with "a" + "bc".
        let mut a = sample_block();
        a.transactions = vec![Transaction::new("ab", "c", 1.0)];
        let mut b = a.clone();
        b.transactions = vec![Transaction::new("a", "bc", 1.0)];
        assert_ne!(a.hash_bytes(), b.hash_bytes());
        assert_ne!(hash_block(&a), hash_block(&b));
    }

    #[test]
    fn hash_bytes_layout_example() {
        let mut block = Block::new(1, vec![], 100, "1");
        block.timestamp = 42;
        let bytes = block.hash_bytes();
        assert_eq!(bytes.len(), 8 + 8 + 1 + 8 + 8 + 8);
        assert_eq!(&bytes[0..8], &1u64.to_le_bytes());
        assert_eq!(&bytes[8..16], &1u64.to_le_bytes());
        assert_eq!(bytes[16], b'1');
        assert_eq!(&bytes[17..25], &100u64.to_le_bytes());
        assert_eq!(&bytes[25..33], &42u64.to_le_bytes());
        assert_eq!(&bytes[33..41], &0u64.to_le_bytes());
    }

    #[test]
    fn block_new_example() {
        let block = Block::new(3, vec![], 7, "prev");
        assert_eq!(block.index, 3);
        assert_eq!(block.proof, 7);
        assert_eq!(block.previous_hash, "prev");
        assert!(block.timestamp > 0);
        assert_eq!(block.hash, hash_block(&block));
    }

    #[test]
    fn transaction_display() {
        let tx = Transaction::new("Alice", "Bob", 1.5);
        assert_eq!(tx.to_string(), "Sender: Alice, Recipient: Bob, Amount: 1.5");
    }

    #[test]
    fn block_display_lists_fields_and_transactions() {
        let block = sample_block();
        let text = block.to_string();
        assert!(text.starts_with(&format!(
            "Index: 2, Hash: {}, PreviousHash: abc, Proof: 35293, Timestamp: 1600000200, ",
            block.hash
        )));
        assert!(text.ends_with(
            "Transactions: [Sender: Alice, Recipient: Bob, Amount: 10; \
             Sender: Bob, Recipient: Charlie, Amount: 5.5]"
        ));
    }

    #[test]
    fn empty_block_display() {
        let mut block = Block::new(1, vec![], 100, "1");
        block.timestamp = 0;
        block.hash = "h".to_string();
        assert_eq!(
            block.to_string(),
            "Index: 1, Hash: h, PreviousHash: 1, Proof: 100, Timestamp: 0, Transactions: []"
        );
    }

    #[test]
    fn transaction_serialization_example() {
        let tx = Transaction::new("Alice", "Bob", 1.2);
        let json = serde_json::to_string(&tx).unwrap();
        let expected_json = r#"{"sender":"Alice","recipient":"Bob","amount":1.2}"#;
        assert_eq!(json, expected_json);
        let deserialized: Transaction = serde_json::from_str(&json).unwrap();
        assert_eq!(tx, deserialized);
    }

    #[test]
    fn block_json_keeps_hash_stable() {
        // Peers re-hash blocks they receive over JSON, so the wire form must
        // reproduce the same digest.
        let mut block = sample_block();
        block.transactions.push(Transaction::new("x", "y", 0.1 + 0.2));
        block.hash = hash_block(&block);
        let json = serde_json::to_string(&block).unwrap();
        let back: Block = serde_json::from_str(&json).unwrap();
        assert_eq!(back, block);
        assert_eq!(hash_block(&back), block.hash);
    }

    #[test]
    fn chain_snapshot_wire_shape() {
        let snapshot = ChainSnapshot::new(vec![sample_block()]);
        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(value["length"], 1);
        let block = &value["chain"][0];
        for key in ["index", "timestamp", "transactions", "proof", "previous_hash", "hash"] {
            assert!(block.get(key).is_some(), "missing {key}");
        }
    }
}
