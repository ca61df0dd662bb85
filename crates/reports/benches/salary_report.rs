use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use chrono::{Duration, Utc};
use loomworks_core::{DateRange, LoomNumber, PowerloomEntryId, ProductId, WorkerId};
use loomworks_production::{MachineEntry, PowerloomProduction};
use loomworks_products::Product;
use loomworks_reports::{compute_salary_report, ExportMatrix, SalaryPolicy};
use rust_decimal::Decimal;

fn catalog(n: usize) -> Vec<Product> {
    let now = Utc::now();
    (0..n)
        .map(|i| Product {
            id: ProductId::new(),
            name: format!("Product {i:02}"),
            worker_salary: Decimal::new(150 + i as i64, 2),
            owner_salary: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
        .collect()
}

/// One entry per loom per day for `workers` workers, every machine slot filled.
fn entries(days: i64, workers: &[WorkerId], products: &[Product]) -> Vec<PowerloomProduction> {
    let start = Utc::now() - Duration::days(days);
    let mut out = Vec::new();
    for d in 0..days {
        for (w, worker) in workers.iter().enumerate() {
            let loom = LoomNumber::ALL[w % 3];
            let machines = (1..=loom.machine_count())
                .map(|index| MachineEntry {
                    index,
                    product: products[(index as usize + d as usize) % products.len()].id,
                    quantity: Decimal::new(10 + (d % 7), 0),
                })
                .collect();
            out.push(PowerloomProduction {
                id: PowerloomEntryId::new(),
                loom_number: loom,
                date: start + Duration::days(d),
                worker: *worker,
                machines,
                created_at: start,
                updated_at: start,
            });
        }
    }
    out
}

fn bench_salary_report(c: &mut Criterion) {
    let products = catalog(12);
    let workers: Vec<WorkerId> = (0..30).map(|_| WorkerId::new()).collect();

    let mut group = c.benchmark_group("salary_report");
    for days in [30i64, 180, 365] {
        let all = entries(days, &workers, &products);
        group.throughput(Throughput::Elements(all.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(days), &all, |b, all| {
            b.iter(|| {
                compute_salary_report(
                    black_box(all),
                    black_box(&products),
                    workers[0],
                    DateRange::unbounded(),
                    SalaryPolicy::default(),
                )
                .unwrap()
            })
        });
    }
    group.finish();
}

fn bench_export_matrix(c: &mut Criterion) {
    let products = catalog(12);
    let workers = vec![WorkerId::new()];
    let all = entries(365, &workers, &products);
    let report = compute_salary_report(&all, &products, workers[0], DateRange::unbounded(), SalaryPolicy::default()).unwrap();
    let today = Utc::now().date_naive();

    c.bench_function("export_matrix_csv_365_days", |b| {
        b.iter(|| {
            let matrix = ExportMatrix::build(black_box(&report), "Bench", today);
            matrix.to_csv()
        })
    });
}

criterion_group!(benches, bench_salary_report, bench_export_matrix);
criterion_main!(benches);
