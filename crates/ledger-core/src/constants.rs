pub const BYTE: usize = 8;
pub const HASH_SIZE: usize = 32;
pub const HASH_HEX_SIZE: usize = HASH_SIZE * 2;

/// Leading zero bits a proof digest needs; 16 bits is a `"0000"` hex prefix.
pub const POW_TARGET_DIFFICULTY: u32 = 16;
/// Candidates handed to rayon per step of the proof search.
pub const PROOF_SEARCH_BATCH: u64 = 4096;

pub const GENESIS_PROOF: u64 = 100;
pub const GENESIS_PREVIOUS_HASH: &str = "1";

pub const MINING_REWARD_SENDER: &str = "0";
pub const MINING_REWARD: f64 = 1.0;
