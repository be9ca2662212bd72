//! # Validation and Import Benchmarks
//!
//! Run with: `cargo bench --bench ingest`

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use leadgate::{ingest, to_csv, validate, RawRecord};
use serde_json::json;

const HEADER: &str = "fullName,email,phone,city,propertyType,bhk,purpose,budgetMin,budgetMax,timeline,source,notes,tags,status";

fn csv_rows(n: usize, bad_every: usize) -> String {
    let mut text = String::from(HEADER);
    for i in 0..n {
        text.push('\n');
        if bad_every > 0 && i % bad_every == 0 {
            text.push_str("X,nope,123,Delhi,Apartment,,Buy,abc,,soon,Web,,,");
        } else {
            text.push_str(&format!(
                "Lead {i},lead{i}@example.com,98765{i:05},Mohali,Apartment,3,Buy,4000000,6000000,0-3m,Referral,\"Corner unit, east facing\",\"urgent, family\",New"
            ));
        }
    }
    text
}

fn bench_validate_form(c: &mut Criterion) {
    let mut group = c.benchmark_group("validate_form");
    let raw: RawRecord = match json!({
        "fullName": "John Doe",
        "email": "john@example.com",
        "phone": "9876543210",
        "city": "Chandigarh",
        "propertyType": "Apartment",
        "bhk": "2",
        "purpose": "Buy",
        "budgetMin": 5000000,
        "budgetMax": 7000000,
        "timeline": "0-3m",
        "source": "Website",
        "tags": ["urgent", "family"]
    }) {
        serde_json::Value::Object(map) => map,
        _ => unreachable!(),
    };

    group.bench_function("valid", |b| b.iter(|| std::hint::black_box(validate(&raw))));

    let mut bad = raw.clone();
    bad.insert("phone".into(), json!("123"));
    bad.insert("email".into(), json!("nope"));
    group.bench_function("invalid", |b| b.iter(|| std::hint::black_box(validate(&bad))));

    group.finish();
}

fn bench_ingest(c: &mut Criterion) {
    let mut group = c.benchmark_group("ingest");

    for rows in [10usize, 100, 200] {
        let clean = csv_rows(rows, 0);
        let mixed = csv_rows(rows, 4);
        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(BenchmarkId::new("clean", rows), &clean, |b, csv| {
            b.iter(|| std::hint::black_box(ingest(csv)))
        });
        group.bench_with_input(BenchmarkId::new("mixed", rows), &mixed, |b, csv| {
            b.iter(|| std::hint::black_box(ingest(csv)))
        });
    }

    let oversized = csv_rows(1_000, 0);
    group.bench_function("oversized_rejected", |b| {
        b.iter(|| std::hint::black_box(ingest(&oversized)))
    });

    group.finish();
}

fn bench_export(c: &mut Criterion) {
    let leads = ingest(&csv_rows(200, 0)).accepted;
    c.bench_function("export_200", |b| b.iter(|| std::hint::black_box(to_csv(&leads))));
}

criterion_group!(benches, bench_validate_form, bench_ingest, bench_export);
criterion_main!(benches);
