use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use image::RgbaImage;
use jam_kit::sprites::{create_packed_sheet, pack};
use rand::{rngs::StdRng, Rng, SeedableRng};

fn random_images(count: usize, max_side: u32) -> Vec<RgbaImage> {
    let mut rng = StdRng::seed_from_u64(42);
    (0..count)
        .map(|_| RgbaImage::new(rng.gen_range(4..max_side), rng.gen_range(4..max_side)))
        .collect()
}

fn bench_shelf_packing(c: &mut Criterion) {
    let mut group = c.benchmark_group("shelf_packing");
    for count in [64, 256, 1000] {
        let images = random_images(count, 32);
        let keys: Vec<String> = (0..count).map(|i| format!("sprite_{}", i)).collect();
        group.bench_with_input(BenchmarkId::from_parameter(count), &images, |b, images| {
            b.iter(|| {
                let mut atlas = create_packed_sheet(1024, 1024);
                for (key, image) in keys.iter().zip(images) {
                    // Running out of room is part of the workload
                    let _ = pack(&mut atlas, key, image);
                }
                black_box(atlas.sheet.count)
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_shelf_packing);
criterion_main!(benches);
