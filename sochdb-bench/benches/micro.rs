//! Criterion microbenchmarks for compressed size, distance and search.
//!
//! Run with: `cargo bench --bench micro`

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use sochdb_bench::{Corpus, DataGen};
use sochdb_similarity::{Backend, Compressor, EngineConfig, Entity, Metric, SimilarityEngine};

fn engine(backend: Backend, metric: Metric) -> SimilarityEngine {
    SimilarityEngine::new(
        EngineConfig::default()
            .with_backend(backend)
            .with_metric(metric),
    )
    .unwrap()
}

fn bench_compressed_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("compressed_size");
    let mut gen = DataGen::new(42);
    let text = (0..8).map(|i| gen.ticket(i)).collect::<Vec<_>>().join(" ");
    let bytes = text.into_bytes();
    group.throughput(Throughput::Bytes(bytes.len() as u64));

    for backend in Backend::ALL {
        let compressor = backend.compressor();
        group.bench_with_input(BenchmarkId::new(backend.label(), bytes.len()), &bytes, |b, data| {
            b.iter(|| compressor.compressed_size(data).unwrap());
        });
    }
    group.finish();
}

fn bench_distance(c: &mut Criterion) {
    let mut group = c.benchmark_group("distance");
    let mut gen = DataGen::new(7);
    let original = gen.ticket(1);
    let copy = gen.near_duplicate(&original);

    for backend in Backend::ALL {
        for metric in Metric::ALL {
            let engine = engine(backend, metric);
            let x = Entity::from_text(original.clone());
            let y = Entity::from_text(copy.clone());
            engine.warm([&x, &y]).unwrap();

            group.bench_function(BenchmarkId::new(backend.label(), metric.name()), |b| {
                b.iter(|| engine.get_similarity(&x, &y).unwrap());
            });
        }
    }
    group.finish();
}

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search_1000");
    let corpus = Corpus::generate(1_000, 0.2, 42).unwrap();
    let engine = engine(Backend::Deflate, Metric::Mcd);
    engine.warm(&corpus.tickets).unwrap();
    let query = &corpus.tickets[17];

    group.bench_function("sequential", |b| {
        b.iter(|| engine.find_similar(query, &corpus.tickets).unwrap().len());
    });
    group.bench_function("parallel", |b| {
        b.iter(|| engine.find_similar_par(query, &corpus.tickets).unwrap().len());
    });
    group.finish();
}

criterion_group!(benches, bench_compressed_size, bench_distance, bench_search);
criterion_main!(benches);
