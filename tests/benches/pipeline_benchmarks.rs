//! # Proof Pipeline Benchmarks
//!
//! | Stage | Work |
//! |-------|------|
//! | Proof parsing | Bounds-checked slicing of the blob |
//! | Date validation | IMF-fixdate parse and composition |
//! | Signature verification | SHA-256, ecrecover, keccak address compare |
//! | Full callback | Correlation lookup through rate commit |
//! | Conversion | 512-bit multiply and divide |

use criterion::{
    black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput,
};
use price_oracle::domain::proof;
use price_oracle::{
    parse_rate, validate_date, verify_signature, IssuedQuery, LocalApiSigner, OracleConfig,
    PriceOracleApi, PriceOracleService, RateConverter, SimulatedQueryService,
    StaticAuthorization, U256,
};
use shared_bus::NoopPublisher;
use std::sync::Arc;
use std::time::Duration;

const CONTROLLER: [u8; 20] = [0xC0; 20];
const DISPATCH: [u8; 20] = [0xD1; 20];
const DATE: &str = "Wed, 12 Sep 2018 15:18:14 GMT";

fn bench_proof_stages(c: &mut Criterion) {
    let mut group = c.benchmark_group("proof-stages");
    group.measurement_time(Duration::from_secs(5));

    let signer = LocalApiSigner::random();
    let key = signer.public_key();
    let blob = signer.sign_result("0.001234", DATE).unwrap();
    let parsed = proof::extract(&blob).unwrap();

    group.bench_function("extract", |b| b.iter(|| proof::extract(black_box(&blob))));

    group.bench_function("validate_date", |b| {
        b.iter(|| validate_date(black_box(DATE.as_bytes()), black_box(20180101000000)))
    });

    group.bench_function("verify_signature", |b| {
        b.iter(|| verify_signature(black_box(parsed.headers), black_box(parsed.signature), &key))
    });

    for payload in ["0.001234", "1.2345678901234567890123e-7", "\"42\""] {
        group.bench_with_input(BenchmarkId::new("parse_rate", payload), payload, |b, p| {
            b.iter(|| parse_rate(black_box(p), 18))
        });
    }

    group.finish();
}

fn bench_callback(c: &mut Criterion) {
    let mut group = c.benchmark_group("callback");
    group.measurement_time(Duration::from_secs(5));

    for batch in [1usize, 16, 128] {
        group.throughput(Throughput::Elements(batch as u64));
        group.bench_with_input(BenchmarkId::new("commit", batch), &batch, |b, &batch| {
            b.iter_batched(
                || prepared_batch(batch),
                |(service, signer, queries)| {
                    for query in &queries {
                        let blob = signer.sign_result("0.5", DATE).unwrap();
                        let _ = service.callback(DISPATCH, query.query_id, "0.5", &blob);
                    }
                },
                BatchSize::LargeInput,
            )
        });
    }

    group.finish();
}

type Service = PriceOracleService<Arc<SimulatedQueryService>, StaticAuthorization, NoopPublisher>;

fn prepared_batch(size: usize) -> (Service, LocalApiSigner, Vec<IssuedQuery>) {
    let signer = LocalApiSigner::random();
    let query_service = Arc::new(SimulatedQueryService::new(DISPATCH, "URL", U256::one()));
    let service = PriceOracleService::new(
        Arc::clone(&query_service),
        StaticAuthorization::new([CONTROLLER]),
        NoopPublisher::default(),
        OracleConfig {
            api_public_key: signer.public_key(),
            ..OracleConfig::default()
        },
    );

    let tokens: Vec<[u8; 20]> = (0..size)
        .map(|i| {
            let mut address = [0u8; 20];
            address[12..].copy_from_slice(&(i as u64 + 1).to_be_bytes());
            address
        })
        .collect();
    let symbols: Vec<String> = (0..size).map(|i| format!("T{i}")).collect();
    let magnitudes = vec![U256::exp10(18); size];

    service
        .add_tokens(CONTROLLER, &tokens, &symbols, &magnitudes, 20180101000000)
        .unwrap();
    service.deposit(CONTROLLER, U256::from(size)).unwrap();
    service.update_token_rates(CONTROLLER, 200_000).unwrap();

    let queries = query_service.take_pending();
    (service, signer, queries)
}

fn bench_convert(c: &mut Criterion) {
    let (service, signer, queries) = prepared_batch(1);
    let blob = signer.sign_result("0.001234", DATE).unwrap();
    service
        .callback(DISPATCH, queries[0].query_id, "0.001234", &blob)
        .unwrap();
    let mut token = [0u8; 20];
    token[19] = 1;

    c.bench_function("convert", |b| {
        b.iter(|| service.convert(black_box(&token), black_box(U256::MAX >> 4)))
    });
}

criterion_group!(benches, bench_proof_stages, bench_callback, bench_convert);
criterion_main!(benches);
