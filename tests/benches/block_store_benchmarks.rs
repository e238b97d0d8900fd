//! # Block Store Benchmarks
//!
//! | Operation | Expectation |
//! |-----------|-------------|
//! | `process_block` (memory) | one batch of three puts |
//! | `get_by_hash` / `get_by_height` | flat in store size |
//! | `process_blocks` | amortizes lock and batch overhead |
//! | `scan_all` | linear in block count |
//! | `process_block` (file) | dominated by rewrite + fsync |

use block_store::test_utils::{hash_of, make_chain};
use block_store::{BlockReaderApi, BlockStore, BlockWriterApi, StorageConfig};
use criterion::{
    black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput,
};
use rand::Rng;
use shared_types::{Block, BlockEntry, BlockHeader, ChainId, ADMIN_CHAIN_ID, ZERO_HASH};
use std::time::Duration;

const BENCH_CHAIN: ChainId = [0xBE; 32];

/// A block with `payload_len` random bytes in a single entry.
fn random_block(height: u32, payload_len: usize) -> Block {
    let mut rng = rand::thread_rng();
    let payload: Vec<u8> = (0..payload_len).map(|_| rng.gen()).collect();
    Block::new(
        BlockHeader::new(BENCH_CHAIN, height, ZERO_HASH, u64::from(height)),
        vec![BlockEntry::new(1, payload)],
    )
}

fn bench_single_commit(c: &mut Criterion) {
    let mut group = c.benchmark_group("block-store-commit");
    group.measurement_time(Duration::from_secs(5));

    for payload_len in [256usize, 4 * 1024, 64 * 1024] {
        group.throughput(Throughput::Bytes(payload_len as u64));
        group.bench_with_input(
            BenchmarkId::new("process_block", payload_len),
            &payload_len,
            |b, &len| {
                let store = BlockStore::new_in_memory(StorageConfig::default()).unwrap();
                let mut height = 0u32;
                b.iter(|| {
                    let block = random_block(height, len);
                    height += 1;
                    black_box(store.process_block(Some(&block)).unwrap())
                })
            },
        );
    }

    group.finish();
}

fn bench_group_commit(c: &mut Criterion) {
    let mut group = c.benchmark_group("block-store-group-commit");

    for size in [10u32, 100, 500] {
        let chain = make_chain(ADMIN_CHAIN_ID, size);
        group.throughput(Throughput::Elements(u64::from(size)));
        group.bench_with_input(BenchmarkId::new("process_blocks", size), &chain, |b, chain| {
            b.iter_batched(
                || BlockStore::new_in_memory(StorageConfig::default()).unwrap(),
                |store| black_box(store.process_blocks(chain).unwrap()),
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

fn bench_lookups(c: &mut Criterion) {
    let mut group = c.benchmark_group("block-store-lookup");

    for size in [1_000u32, 10_000] {
        let chain = make_chain(ADMIN_CHAIN_ID, size);
        let store = BlockStore::new_in_memory(StorageConfig::default()).unwrap();
        store.process_blocks(&chain).unwrap();
        let mid = size / 2;
        let mid_hash = hash_of(&chain[mid as usize]);

        group.bench_with_input(BenchmarkId::new("get_by_hash", size), &mid_hash, |b, hash| {
            b.iter(|| black_box(store.get_by_hash(hash).unwrap()))
        });
        group.bench_with_input(BenchmarkId::new("get_by_height", size), &mid, |b, &height| {
            b.iter(|| black_box(store.get_by_height(&ADMIN_CHAIN_ID, height).unwrap()))
        });
    }

    group.finish();
}

fn bench_scans(c: &mut Criterion) {
    let mut group = c.benchmark_group("block-store-scan");
    group.sample_size(20);

    for size in [1_000u32, 10_000] {
        let store = BlockStore::new_in_memory(StorageConfig::default()).unwrap();
        store.process_blocks(&make_chain(ADMIN_CHAIN_ID, size)).unwrap();
        group.throughput(Throughput::Elements(u64::from(size)));

        group.bench_function(BenchmarkId::new("scan_all_verified", size), |b| {
            b.iter(|| black_box(store.scan_all().unwrap().len()))
        });
        group.bench_function(BenchmarkId::new("chain_blocks", size), |b| {
            b.iter(|| black_box(store.chain_blocks(&ADMIN_CHAIN_ID).unwrap().len()))
        });
    }

    group.finish();
}

fn bench_file_backed_commit(c: &mut Criterion) {
    let mut group = c.benchmark_group("block-store-file");
    group.sample_size(10);

    let dir = tempfile::TempDir::new().unwrap();
    let store = BlockStore::open_dir(dir.path(), StorageConfig::default()).unwrap();
    let mut height = 0u32;
    group.bench_function("process_block_4k", |b| {
        b.iter(|| {
            let block = random_block(height, 4 * 1024);
            height += 1;
            black_box(store.process_block(Some(&block)).unwrap())
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_single_commit,
    bench_group_commit,
    bench_lookups,
    bench_scans,
    bench_file_backed_commit
);
criterion_main!(benches);
