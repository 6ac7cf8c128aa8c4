//! Criterion benchmarks for prompt normalization, CSV parsing and dispatch

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use std::path::PathBuf;
use telcoask::parsers::{CsvDatasetParser, DatasetParser};
use telcoask::services::dispatcher;
use telcoask::services::{normalize, LoadedDataset, Snapshot};
use telcoask::types::BillingRecord;

const MONTHS: [&str; 12] = [
    "Ene", "Feb", "Mar", "Abr", "May", "Jun", "Jul", "Ago", "Sep", "Oct", "Nov", "Dic",
];
const EMITTERS: [&str; 3] = ["Online", "Sucursal", "Telefono"];

/// Synthetic dataset: `clients` clients billed every month of 2024-2025
fn synthetic_records(clients: usize) -> Vec<BillingRecord> {
    let mut records = Vec::with_capacity(clients * 24);
    for year in [2024, 2025] {
        for (m, month) in MONTHS.iter().enumerate() {
            for c in 0..clients {
                let total = 1000.0 + (c * 37 + m * 11) as f64;
                records.push(BillingRecord {
                    client: format!("Cliente {:04}", c),
                    emitter: EMITTERS[c % EMITTERS.len()].to_string(),
                    customer_type: "Empresa".to_string(),
                    period: format!("{}-{}", month, year),
                    total,
                    mobile_lines: total * 0.6,
                    home_internet: total * 0.3,
                    additional_services: total * 0.1,
                    adjustment_notes: 0.0,
                });
            }
        }
    }
    records
}

fn synthetic_snapshot(clients: usize) -> Snapshot {
    Snapshot::build(
        LoadedDataset {
            source: PathBuf::from("synthetic"),
            columns: Vec::new(),
            records: synthetic_records(clients),
        },
        1,
    )
}

fn bench_normalize(c: &mut Criterion) {
    let prompt = "¿Cuál fue la VARIACIÓN mensual por emisora en el último trimestre?";

    let mut group = c.benchmark_group("normalize");
    group.throughput(Throughput::Bytes(prompt.len() as u64));
    group.bench_function("accented_prompt", |b| {
        b.iter(|| normalize(black_box(prompt)));
    });
    group.finish();
}

fn bench_parse_csv(c: &mut Criterion) {
    let fixture = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("billing-sample.csv");

    let sample = match std::fs::read_to_string(&fixture) {
        Ok(text) => text,
        Err(_) => {
            eprintln!("Skipping parse_csv: fixture not found");
            return;
        }
    };
    // repeat the data rows to get a realistic size
    let mut lines = sample.lines();
    let header = lines.next().unwrap_or_default();
    let body: Vec<&str> = lines.collect();
    let mut content = String::from(header);
    for _ in 0..1000 {
        for row in &body {
            content.push('\n');
            content.push_str(row);
        }
    }

    let parser = CsvDatasetParser;
    let mut group = c.benchmark_group("parser");
    group.throughput(Throughput::Bytes(content.len() as u64));
    group.bench_function("parse_csv", |b| {
        b.iter(|| parser.parse_str(black_box(&content)));
    });
    group.finish();
}

fn bench_dispatch(c: &mut Criterion) {
    let prompts = [
        "top 10 clientes",
        "top 10 clientes ultimo mes",
        "variacion por emisora",
        "variacion por servicio",
        "cliente Cliente 0042 variacion",
        "asdf qwer",
    ];

    let mut group = c.benchmark_group("dispatch");
    for clients in [100, 1000] {
        let snapshot = synthetic_snapshot(clients);
        for prompt in prompts {
            group.bench_with_input(
                BenchmarkId::new(prompt, format!("{} rows", snapshot.records.len())),
                &snapshot,
                |b, snapshot| {
                    b.iter(|| dispatcher::ask(snapshot, black_box(prompt)));
                },
            );
        }
    }
    group.finish();
}

fn bench_snapshot_build(c: &mut Criterion) {
    let records = synthetic_records(1000);

    let mut group = c.benchmark_group("snapshot");
    group.sample_size(20);
    group.bench_function("build_24k_rows", |b| {
        b.iter(|| {
            Snapshot::build(
                LoadedDataset {
                    source: PathBuf::from("synthetic"),
                    columns: Vec::new(),
                    records: records.clone(),
                },
                1,
            )
        });
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_normalize,
    bench_parse_csv,
    bench_dispatch,
    bench_snapshot_build
);
criterion_main!(benches);
