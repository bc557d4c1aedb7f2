use criterion::{criterion_group, criterion_main, Criterion};
use khelo_api::config::HashCost;
use khelo_api::models::Role;
use khelo_api::services::{PasswordHasher, TokenService};
use std::hint::black_box;

fn benchmark_tokens(c: &mut Criterion) {
    let tokens = TokenService::new(b"bench_signing_key_32_bytes_long!", 3600, 30);
    let token = tokens
        .issue("bench-user", Role::Athlete)
        .expect("Failed to issue token");

    let mut group = c.benchmark_group("session_tokens");

    group.bench_function("issue", |b| {
        b.iter(|| tokens.issue(black_box("bench-user"), Role::Athlete))
    });

    group.bench_function("verify_valid", |b| {
        b.iter(|| tokens.verify(black_box(&token)))
    });

    group.bench_function("verify_garbage", |b| {
        b.iter(|| tokens.verify(black_box("not.a.token")))
    });

    group.finish();
}

fn benchmark_password_verify(c: &mut Criterion) {
    // Production work factor; this is what every login pays.
    let hasher = PasswordHasher::new(HashCost::default()).expect("Invalid hash parameters");
    let hash = hasher
        .hash("correct-horse-battery")
        .expect("Failed to hash password");

    let mut group = c.benchmark_group("password_hash");
    group.sample_size(10);

    group.bench_function("verify_default_cost", |b| {
        b.iter(|| hasher.verify(black_box("correct-horse-battery"), &hash))
    });

    group.finish();
}

criterion_group!(benches, benchmark_tokens, benchmark_password_verify);
criterion_main!(benches);
