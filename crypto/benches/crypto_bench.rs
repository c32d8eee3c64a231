use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tessera_types::{ChainType, Network};

const PHRASE: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

fn seed_derivation_bench(c: &mut Criterion) {
    c.bench_function("bip39_seed_12_words", |b| {
        b.iter(|| tessera_crypto::derive_seed(black_box(PHRASE), None))
    });
}

fn account_derivation_bench(c: &mut Criterion) {
    let seed = tessera_crypto::derive_seed(PHRASE, None).unwrap();

    c.bench_function("derive_eth_account", |b| {
        b.iter(|| tessera_crypto::derive_account(&seed, ChainType::Ethereum, Network::Mainnet, black_box(0)))
    });
    c.bench_function("derive_btc_account", |b| {
        b.iter(|| tessera_crypto::derive_account(&seed, ChainType::Bitcoin, Network::Mainnet, black_box(0)))
    });
}

fn recoverable_sign_bench(c: &mut Criterion) {
    let key = [0x11u8; 32];
    let digest = tessera_crypto::keccak256(b"bench");

    c.bench_function("secp256k1_sign_recoverable", |b| {
        b.iter(|| tessera_crypto::sign_recoverable(&key, black_box(&digest)))
    });
}

fn keccak_bench(c: &mut Criterion) {
    let data = vec![0xCDu8; 1024];

    c.bench_function("keccak256_1KB", |b| {
        b.iter(|| tessera_crypto::keccak256(black_box(&data)))
    });
}

criterion_group!(
    benches,
    seed_derivation_bench,
    account_derivation_bench,
    recoverable_sign_bench,
    keccak_bench,
);
criterion_main!(benches);
