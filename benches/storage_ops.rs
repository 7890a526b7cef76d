use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use dota_graph::Storage;
use std::fs::File;
use tempfile::NamedTempFile;

fn fresh_storage() -> (NamedTempFile, Storage) {
    let tmp = NamedTempFile::new().unwrap();
    let file = File::options()
        .read(true)
        .write(true)
        .open(tmp.path())
        .unwrap();
    (tmp, Storage::init(file).unwrap())
}

fn bench_create_vertices(c: &mut Criterion) {
    let mut group = c.benchmark_group("create_vertices");
    group.throughput(Throughput::Elements(1000));

    group.bench_function("batch_1000", |b| {
        b.iter_batched(
            fresh_storage,
            |(_tmp, storage)| {
                for i in 0..1000 {
                    let v = storage.create_vertex().unwrap();
                    storage.vertex_add_label(&v, "Person").unwrap();
                    storage
                        .vertex_set_attribute(&v, "name", &format!("Person{i}"))
                        .unwrap();
                    black_box(v);
                }
            },
            criterion::BatchSize::LargeInput,
        );
    });

    group.finish();
}

fn bench_scan_vertices(c: &mut Criterion) {
    let (_tmp, storage) = fresh_storage();
    for i in 0..1000 {
        let v = storage.create_vertex().unwrap();
        storage
            .vertex_set_attribute(&v, "name", &format!("Person{i}"))
            .unwrap();
    }

    c.bench_function("scan_1000_vertices", |b| {
        b.iter(|| {
            let mut count = 0;
            let mut vertex = storage.first_vertex().unwrap();
            while vertex.offset() != 0 {
                count += 1;
                vertex = storage.vertex_next(&vertex).unwrap();
            }
            black_box(count)
        });
    });
}

fn bench_create_edges(c: &mut Criterion) {
    let (_tmp, storage) = fresh_storage();
    let vertices: Vec<_> = (0..100).map(|_| storage.create_vertex().unwrap()).collect();

    let mut group = c.benchmark_group("create_edges");
    group.throughput(Throughput::Elements(100));

    group.bench_function("batch_100", |b| {
        b.iter(|| {
            for i in 0..100 {
                let edge = storage.create_edge().unwrap();
                storage.edge_set_source(&edge, &vertices[i]).unwrap();
                storage
                    .edge_set_destination(&edge, &vertices[(i + 1) % 100])
                    .unwrap();
                black_box(edge);
            }
        });
    });

    group.finish();
}

fn bench_attribute_lookup(c: &mut Criterion) {
    let (_tmp, storage) = fresh_storage();
    let vertex = storage.create_vertex().unwrap();
    for i in 0..200 {
        storage
            .vertex_set_attribute(&vertex, &format!("attr{i}"), "value")
            .unwrap();
    }

    c.bench_function("attribute_lookup_tail_of_200", |b| {
        b.iter(|| black_box(storage.vertex_get_attribute(&vertex, "attr199").unwrap()));
    });
}

criterion_group!(
    benches,
    bench_create_vertices,
    bench_scan_vertices,
    bench_create_edges,
    bench_attribute_lookup
);
criterion_main!(benches);
