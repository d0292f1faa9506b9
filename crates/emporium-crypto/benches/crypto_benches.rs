use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use emporium_crypto::{hash_bytes, hash_data, hash_password, open_token, seal_token, PasswordParams, SigningKeyManager};
use serde_json::json;

fn bench_hash_data(c: &mut Criterion) {
    let data = json!({"name": "Desk lamp", "price_cents": 2999, "images": ["a.png", "b.png"]});

    c.bench_function("hash_data", |b| b.iter(|| hash_data(black_box(&data))));
}

fn bench_hash_bytes(c: &mut Criterion) {
    let blob = vec![7u8; 256 * 1024];

    c.bench_function("hash_bytes_256k", |b| b.iter(|| hash_bytes(black_box(&blob))));
}

fn bench_seal_token(c: &mut Criterion) {
    let key = SigningKeyManager::generate_key();
    let claims = json!({"sub": "user-1", "tenant": "default", "role": "customer", "iat": 0, "exp": 1});

    c.bench_function("seal_token", |b| {
        b.iter(|| seal_token(black_box(&claims), black_box(&key)))
    });
}

fn bench_open_token(c: &mut Criterion) {
    let key = SigningKeyManager::generate_key();
    let public_key = key.verifying_key();
    let token = seal_token(&json!({"sub": "user-1"}), &key).unwrap();

    c.bench_function("open_token", |b| {
        b.iter(|| open_token(black_box(&token), black_box(&public_key)))
    });
}

fn bench_hash_password(c: &mut Criterion) {
    let params = PasswordParams::default();

    c.bench_function("hash_password_default_params", |b| {
        b.iter(|| hash_password(black_box("correct horse battery"), black_box(&params)))
    });
}

criterion_group!(
    benches,
    bench_hash_data,
    bench_hash_bytes,
    bench_seal_token,
    bench_open_token,
    bench_hash_password
);
criterion_main!(benches);
