//! Benchmarks for the indicator engine.

use chrono::{Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use trading_core::types::Bar;
use trading_indicators::IndicatorEngine;

fn generate_test_data(symbol: &str, size: usize) -> Vec<Bar> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 2)
        .and_then(|d| d.and_hms_opt(9, 15, 0))
        .unwrap_or_default();

    (0..size)
        .map(|i| {
            let mid = 100.0 + (i as f64 * 0.1).sin() * 10.0;
            Bar::new(
                symbol,
                start + Duration::minutes(i as i64),
                mid,
                mid + 0.8,
                mid - 0.7,
                mid + 0.1,
                1000.0,
            )
        })
        .collect()
}

fn benchmark_directional(c: &mut Criterion) {
    let mut group = c.benchmark_group("DirectionalIndex");

    for size in [1000, 10000, 100000].iter() {
        let data = generate_test_data("BENCH", *size);

        group.bench_with_input(BenchmarkId::new("single_symbol", size), &data, |b, data| {
            b.iter(|| {
                let mut engine = IndicatorEngine::new(14).expect("valid period");
                for bar in data {
                    black_box(engine.update(bar));
                }
            })
        });
    }

    group.finish();
}

fn benchmark_many_symbols(c: &mut Criterion) {
    let symbols: Vec<String> = (0..50).map(|i| format!("SYM{i}")).collect();
    let data: Vec<Bar> = symbols
        .iter()
        .flat_map(|s| generate_test_data(s, 375))
        .collect();

    c.bench_function("DirectionalIndex/50_symbols_one_session", |b| {
        b.iter(|| {
            let mut engine = IndicatorEngine::new(14).expect("valid period");
            for bar in &data {
                black_box(engine.update(bar));
            }
        })
    });
}

criterion_group!(benches, benchmark_directional, benchmark_many_symbols);
criterion_main!(benches);
