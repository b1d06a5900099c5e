use criterion::{Criterion, black_box, criterion_group, criterion_main};

use squall_cluster::{Backend, Ring};

fn fleet(n: usize, weight: u32) -> Vec<Backend> {
    (0..n)
        .map(|i| Backend {
            addr: format!("127.0.0.1:{}", 8080 + i),
            weight,
        })
        .collect()
}

fn bench_lookup(c: &mut Criterion) {
    let ring = Ring::new();
    ring.adjust(&fleet(50, 200));

    c.bench_function("ring_lookup_50x200", |b| {
        let mut i = 0u64;
        b.iter(|| {
            i = i.wrapping_add(1);
            let key = format!("key:{i}");
            black_box(ring.get(&key))
        })
    });
}

fn bench_adjust(c: &mut Criterion) {
    let backends = fleet(50, 200);

    c.bench_function("ring_adjust_50x200", |b| {
        b.iter(|| {
            let ring = Ring::new();
            ring.adjust(black_box(&backends));
        })
    });
}

criterion_group!(benches, bench_lookup, bench_adjust);
criterion_main!(benches);
