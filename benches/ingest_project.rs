use std::fmt::Write as _;

use criterion::{Criterion, criterion_group, criterion_main};
use csv_reconcile::{FieldSet, ParseOptions, auto_map, ingest, project};

fn generate_statement(rows: usize) -> String {
    let mut csv = String::from("date,contact name,amount,description,account code,reference\n");
    for i in 0..rows {
        let day = (i % 28) + 1;
        let _ = writeln!(
            csv,
            "2024-01-{day:02},\"Vendor {i}, Ltd\",{}.{:02},Invoice payment,{},INV-{i:06}",
            i % 5000,
            i % 100,
            200 + (i % 7) * 10
        );
    }
    csv
}

fn bench_pipeline(c: &mut Criterion) {
    let input = generate_statement(50_000);
    let options = ParseOptions::default();
    let fields = FieldSet::default();

    c.bench_function("parse_50k_rows", |b| {
        b.iter(|| ingest::parse(input.as_bytes(), &options).expect("parse"))
    });

    let table = ingest::parse(input.as_bytes(), &options).expect("parse");
    let mapping = auto_map(&fields, &table.columns);
    c.bench_function("project_50k_rows", |b| {
        b.iter(|| project(&table.rows, &mapping, &fields))
    });
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
