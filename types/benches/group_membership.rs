use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use wheelhouse_types::wager::{CustomGroupDef, NumberSet, PayoutRatio, RED_NUMBERS, VOISINS};

fn group_membership(c: &mut Criterion) {
    let mut group = c.benchmark_group("group_membership");
    for (name, numbers) in [("red", &RED_NUMBERS[..]), ("voisins", &VOISINS[..])] {
        let set = NumberSet::from_numbers(numbers).expect("valid numbers");
        let list = numbers.to_vec();

        group.bench_function(BenchmarkId::new("bitmask", name), |b| {
            b.iter(|| (0..=36u8).filter(|n| set.contains(black_box(*n))).count())
        });

        group.bench_function(BenchmarkId::new("slice_scan", name), |b| {
            b.iter(|| (0..=36u8).filter(|n| list.contains(black_box(n))).count())
        });
    }
    group.finish();
}

fn custom_group_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("custom_group_build");
    for size in [1usize, 9, 18, 36] {
        let def = CustomGroupDef::new("bench", (1..=size as u8).collect::<Vec<_>>());
        group.bench_function(BenchmarkId::new("to_group", size), |b| {
            b.iter(|| black_box(def.to_group().expect("valid")))
        });
        group.bench_function(BenchmarkId::new("gross_return", size), |b| {
            let ratio = PayoutRatio::for_coverage(size);
            b.iter(|| black_box(ratio.gross_return(black_box(1_000))))
        });
    }
    group.finish();
}

criterion_group!(benches, group_membership, custom_group_build);
criterion_main!(benches);
