//! # Hashlock-Swap Benchmarks
//!
//! | Area | Operation | Expectation |
//! |------|-----------|-------------|
//! | Hashlock | SHA-256 commit, constant-time verify | < 1µs |
//! | Ledger | create → fund → claim, one record | < 50µs |
//! | Sweep | refund of N expired records | linear in N |
//! | Coordinator | one JSON request end to end | < 100µs |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use node_runtime::adapters::ReplayGuard;
use node_runtime::container::CoordinatorConfig;
use node_runtime::RequestCoordinator;
use serde_json::json;
use shared_types::{hash_to_hex, LedgerKind, TimeSource};
use std::sync::Arc;
use std::time::Duration;
use sw_01_escrow::{commit, generate_pair, verify, EscrowApi};
use swap_tests::integration::fixtures::{
    addr, request_line, sender_keys, SwapHarness, ADMIN, MAKER, NOW, RESOLVER,
};

fn bench_hashlock(c: &mut Criterion) {
    let mut group = c.benchmark_group("sw-01-hashlock");
    let (secret, hashlock) = generate_pair();
    let bytes = secret.expose();

    group.bench_function("commit", |b| b.iter(|| black_box(commit(black_box(&bytes)))));
    group.bench_function("verify", |b| {
        b.iter(|| black_box(verify(black_box(&bytes), black_box(&hashlock))))
    });
    group.bench_function("generate_pair", |b| b.iter(|| black_box(generate_pair())));
    group.finish();
}

fn bench_ledger_lifecycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("sw-01-ledger");
    group.measurement_time(Duration::from_secs(5));
    let h = SwapHarness::new();

    group.bench_function("create_fund_claim", |b| {
        b.iter(|| {
            let (secret, hashlock) = h.open_order(NOW + 3_600);
            h.escrow
                .fund(LedgerKind::Order, &hashlock, &addr(RESOLVER), None)
                .unwrap();
            black_box(h.escrow.claim(LedgerKind::Order, &hashlock, &secret).unwrap())
        })
    });
    group.finish();
}

fn bench_refund_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("sw-01-refund-sweep");
    for size in [10usize, 100, 1_000] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("refund_expired", size), &size, |b, &size| {
            b.iter_batched(
                || {
                    let h = SwapHarness::new();
                    for _ in 0..size {
                        h.open_escrow(NOW + 10);
                    }
                    h.clock.advance(10);
                    h
                },
                |h| black_box(h.escrow.refund_expired(LedgerKind::Escrow)),
                criterion::BatchSize::LargeInput,
            )
        });
    }
    group.finish();
}

fn bench_coordinator_request(c: &mut Criterion) {
    let mut group = c.benchmark_group("node-coordinator");
    let h = SwapHarness::new();
    let replay = Arc::new(ReplayGuard::new(&CoordinatorConfig::default(), h.clock.clone()));
    let coordinator = RequestCoordinator::new(h.escrow.clone(), replay, sender_keys());

    group.bench_function("lock_request", |b| {
        b.iter_batched(
            || {
                let (_, hashlock) = generate_pair();
                request_line(
                    MAKER,
                    h.clock.now(),
                    json!({
                        "op": "Lock",
                        "payload": {
                            "hash": hash_to_hex(&hashlock),
                            "sourceChainId": -3,
                            "destChainId": 1,
                            "asset": "TON",
                            "receiver": "0xreceiver",
                            "timelock": NOW + 3_600,
                            "amount": "1000000",
                        }
                    }),
                )
            },
            |line| black_box(coordinator.handle_json(&line)),
            criterion::BatchSize::SmallInput,
        )
    });
    group.bench_function("whitelist_request", |b| {
        b.iter_batched(
            || {
                request_line(
                    ADMIN,
                    h.clock.now(),
                    json!({
                        "op": "SetWhiteList",
                        "payload": { "resolver": "0xother", "whitelistStatus": true }
                    }),
                )
            },
            |line| black_box(coordinator.handle_json(&line)),
            criterion::BatchSize::SmallInput,
        )
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_hashlock,
    bench_ledger_lifecycle,
    bench_refund_sweep,
    bench_coordinator_request
);
criterion_main!(benches);
