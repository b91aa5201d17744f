#![allow(missing_docs)]
//! Benchmarks for container give/take.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::{hint::black_box, num::NonZeroU32, sync::Arc};

use stockpile_core::{Container, ContainerConfig, ItemKind, ItemStack, KindKey};

fn kind(name: &'static str) -> Arc<ItemKind> {
    Arc::new(ItemKind::new(
        KindKey::new_static(name),
        NonZeroU32::new(64).expect("nonzero"),
    ))
}

fn bench_fixed_fill_and_drain(c: &mut Criterion) {
    let wood = kind("stockpile:wood");
    let mut group = c.benchmark_group("fixed_fill_and_drain");

    for slots in [9usize, 27, 54] {
        group.bench_with_input(BenchmarkId::from_parameter(slots), &slots, |b, &slots| {
            let mut container =
                Container::new(&ContainerConfig::fixed(slots)).expect("valid config");
            container.initialize().expect("fresh container");
            let amount = slots as u32 * 64;

            b.iter(|| {
                let mut stack = ItemStack::new(wood.clone(), amount);
                black_box(container.give(&mut stack).expect("ready"));
                let mut stack = ItemStack::new(wood.clone(), amount);
                black_box(container.take(&mut stack).expect("ready"));
            });
        });
    }
    group.finish();
}

fn bench_flexible_grow_and_shrink(c: &mut Criterion) {
    let gold = kind("stockpile:gold");

    c.bench_function("flexible_grow_and_shrink", |b| {
        let mut container = Container::new(&ContainerConfig::flexible()).expect("valid config");
        container.initialize().expect("fresh container");

        b.iter(|| {
            let mut stack = ItemStack::new(gold.clone(), black_box(64 * 32 + 7));
            black_box(container.give(&mut stack).expect("ready"));
            let mut stack = ItemStack::new(gold.clone(), black_box(64 * 32 + 7));
            black_box(container.take(&mut stack).expect("ready"));
        });
    });
}

fn bench_mixed_kinds(c: &mut Criterion) {
    let wood = kind("stockpile:wood");
    let stone = kind("stockpile:stone");

    c.bench_function("mixed_kinds_probe", |b| {
        let mut container = Container::new(&ContainerConfig::fixed(27)).expect("valid config");
        container.initialize().expect("fresh container");
        for index in 0..27 {
            let kind = if index % 2 == 0 { &wood } else { &stone };
            container
                .set_slot(index, ItemStack::new(kind.clone(), 32))
                .expect("in range");
        }
        let probe = ItemStack::new(stone.clone(), 1);

        b.iter(|| {
            black_box(container.count_of(black_box(&probe)));
            black_box(container.space_for(black_box(&probe)));
        });
    });
}

criterion_group!(
    benches,
    bench_fixed_fill_and_drain,
    bench_flexible_grow_and_shrink,
    bench_mixed_kinds
);
criterion_main!(benches);
