#[path = "../util/util.rs"]
mod util;

use util::bench_images;

use std::time::Duration;

use criterion::{
    criterion_group, criterion_main, measurement::WallTime, Bencher, BenchmarkId, Criterion,
    SamplingMode,
};
use kmeans_compress::{
    kmeans::{self, KmeansOptions},
    CompressPipeline, PixelBuffer, PixelSet,
};

const MAX_ITERATIONS: u32 = 20;

fn bench(
    c: &mut Criterion,
    group: &str,
    mut f: impl FnMut(&mut Bencher<WallTime>, &(u32, &PixelBuffer)),
) {
    let mut group = c.benchmark_group(group);
    group
        .sample_size(10)
        .noise_threshold(0.05)
        .sampling_mode(SamplingMode::Flat)
        .warm_up_time(Duration::from_millis(500));

    for (k, secs) in [(64, 8), (16, 4), (4, 2)] {
        group.measurement_time(Duration::from_secs(secs));
        for (name, image) in bench_images() {
            group.bench_with_input(BenchmarkId::new(k.to_string(), name), &(k, image), &mut f);
        }
    }
}

fn kmeans_single(c: &mut Criterion) {
    bench(c, "kmeans_single", |b, &(k, image)| {
        let colors = image.colors::<3>().unwrap();
        let pixels = PixelSet::try_from(colors.as_slice()).unwrap();
        let options = KmeansOptions::new().max_iterations(MAX_ITERATIONS);
        b.iter(|| kmeans::cluster(&pixels, k, &options).unwrap())
    })
}

fn kmeans_par(c: &mut Criterion) {
    bench(c, "kmeans_par", |b, &(k, image)| {
        let colors = image.colors::<3>().unwrap();
        let pixels = PixelSet::try_from(colors.as_slice()).unwrap();
        let options = KmeansOptions::new().max_iterations(MAX_ITERATIONS);
        b.iter(|| kmeans::cluster_par(&pixels, k, &options).unwrap())
    })
}

fn compress_par(c: &mut Criterion) {
    bench(c, "compress_par", |b, &(k, image)| {
        let mut pipeline = CompressPipeline::new(image);
        pipeline.k(k).max_iterations(MAX_ITERATIONS);
        b.iter(|| pipeline.compress_par().unwrap())
    })
}

criterion_group!(benches, kmeans_single, kmeans_par, compress_par);
criterion_main!(benches);
