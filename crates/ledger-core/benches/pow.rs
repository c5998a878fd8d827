use criterion::{criterion_group, criterion_main, Criterion};
use ledger_core::{hash_block, pow::{find_proof, ProofSearch}, Block, Transaction};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::hint::black_box;

fn bench_pow(c: &mut Criterion) {
    c.bench_function("find_proof_genesis_seed", |b| {
        b.iter(|| find_proof(black_box(100)).unwrap());
    });

    c.bench_function("find_proof_bounded_random_seed", |b| {
        let mut rng = StdRng::seed_from_u64(42);
        let search = ProofSearch::new().with_max_attempts(1 << 24);
        b.iter(|| search.run(rng.gen_range(0..1_000_000)).unwrap());
    });
}

fn bench_hash(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(42);
    let txs: Vec<Transaction> = (0..100)
        .map(|i| Transaction::new(format!("alice-{i}"), "bob", rng.gen_range(0.01..10.0)))
        .collect();
    let block = Block::new(2, txs, 35_293, "1");

    c.bench_function("hash_block_100_txs", |b| {
        b.iter(|| hash_block(black_box(&block)));
    });
}

criterion_group!(benches, bench_pow, bench_hash);
criterion_main!(benches);
