use chrono::NaiveDate;
use common::BatchRef;
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{Batch, OrderLine, Product};

fn product_with_dated_batches(count: u32) -> Product {
    let mut product = Product::new("BENCH-SKU");
    for i in 0..count {
        let eta = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .checked_add_days(chrono::Days::new(u64::from(i)))
            .unwrap();
        product
            .add_batch(Batch::new(
                format!("batch-{i:04}"),
                "BENCH-SKU",
                100,
                Some(eta),
            ))
            .unwrap();
    }
    product
}

fn bench_allocate(c: &mut Criterion) {
    c.bench_function("domain/allocate_100_batches", |b| {
        b.iter_batched(
            || product_with_dated_batches(100),
            |mut product| {
                product.allocate(OrderLine::new("order-1", "BENCH-SKU", 10));
            },
            criterion::BatchSize::SmallInput,
        );
    });
}

fn bench_change_batch_quantity(c: &mut Criterion) {
    c.bench_function("domain/change_batch_quantity_cascade", |b| {
        b.iter_batched(
            || {
                let mut product = product_with_dated_batches(1);
                for i in 0..50 {
                    product.allocate(OrderLine::new(format!("order-{i:03}"), "BENCH-SKU", 2));
                }
                product.take_events();
                product
            },
            |mut product| {
                product
                    .change_batch_quantity(&BatchRef::new("batch-0000"), 10)
                    .unwrap();
            },
            criterion::BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, bench_allocate, bench_change_batch_quantity);
criterion_main!(benches);
