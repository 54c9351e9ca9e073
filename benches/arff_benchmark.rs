//! ARFF parsing and preprocessing benchmarks

use arffml::core::ProblemType;
use arffml::data::{ImputeStrategy, Preprocessor, RawTable, TargetSelection};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::fmt::Write;

/// Dense table with numeric and nominal features, a few missing cells
fn dense_arff(rows: usize, numeric: usize) -> String {
    let mut text = String::from("@relation bench\n");
    for i in 0..numeric {
        writeln!(text, "@attribute n{i} numeric").unwrap();
    }
    text.push_str("@attribute colour {red, green, blue}\n");
    text.push_str("@attribute class {a, b}\n@data\n");

    for r in 0..rows {
        for i in 0..numeric {
            if (r + i) % 37 == 0 {
                text.push_str("?, ");
            } else {
                write!(text, "{}, ", (r * numeric + i) as f64 / 10.0).unwrap();
            }
        }
        let colour = ["red", "green", "blue"][r % 3];
        let class = if r % 2 == 0 { "a" } else { "b" };
        writeln!(text, "{colour}, {class}").unwrap();
    }
    text
}

/// Sparse table with roughly one in ten columns set per row
fn sparse_arff(rows: usize, columns: usize) -> String {
    let mut text = String::from("@relation bench\n");
    for i in 0..columns {
        writeln!(text, "@attribute f{i} numeric").unwrap();
    }
    text.push_str("@attribute class {a, b}\n@data\n");

    for r in 0..rows {
        let mut entries: Vec<String> = (0..columns)
            .filter(|c| (r + c) % 10 == 0)
            .map(|c| format!("{c} {}", (r + c) as f64 * 0.5))
            .collect();
        let class = if r % 2 == 0 { "a" } else { "b" };
        entries.push(format!("{columns} {class}"));
        writeln!(text, "{{{}}}", entries.join(", ")).unwrap();
    }
    text
}

fn parse_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("arff_parse");

    for &rows in &[100, 1000, 5000] {
        let dense = dense_arff(rows, 20);
        group.throughput(Throughput::Bytes(dense.len() as u64));
        group.bench_with_input(BenchmarkId::new("dense", rows), &dense, |b, text| {
            b.iter(|| black_box(text.parse::<RawTable>().unwrap()))
        });

        let sparse = sparse_arff(rows, 200);
        group.throughput(Throughput::Bytes(sparse.len() as u64));
        group.bench_with_input(BenchmarkId::new("sparse", rows), &sparse, |b, text| {
            b.iter(|| black_box(text.parse::<RawTable>().unwrap()))
        });
    }

    group.finish();
}

fn preprocess_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("preprocess");

    for &rows in &[1000, 5000] {
        let table: RawTable = dense_arff(rows, 20).parse().unwrap();
        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(BenchmarkId::new("fit", rows), &table, |b, table| {
            b.iter(|| {
                black_box(
                    Preprocessor::fit(
                        table,
                        ProblemType::Classification,
                        &TargetSelection::Default,
                        ImputeStrategy::Mean,
                    )
                    .unwrap(),
                )
            })
        });
    }

    group.finish();
}

criterion_group!(benches, parse_benchmarks, preprocess_benchmarks);
criterion_main!(benches);
