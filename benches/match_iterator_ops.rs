use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dota_graph::pattern::{Entity, VertexSpec};
use dota_graph::{MatchIterator, Pattern, Storage};
use std::fs::File;
use tempfile::NamedTempFile;

fn populated_storage(n: usize) -> (NamedTempFile, Storage) {
    let tmp = NamedTempFile::new().unwrap();
    let file = File::options()
        .read(true)
        .write(true)
        .open(tmp.path())
        .unwrap();
    let storage = Storage::init(file).unwrap();

    for i in 0..n {
        let v = storage.create_vertex().unwrap();
        storage.vertex_add_label(&v, "Person").unwrap();
        storage
            .vertex_set_attribute(&v, "name", &format!("Person{i}"))
            .unwrap();
    }

    (tmp, storage)
}

fn bare(name: &str) -> VertexSpec {
    VertexSpec {
        name: Some(name.to_string()),
        labels: vec!["Person".into()],
        attrs: vec![],
    }
}

fn bench_single_slot_scan(c: &mut Criterion) {
    let (_tmp, storage) = populated_storage(1000);
    let pattern = Pattern::build(&[Entity::Vertex(bare("n"))]).unwrap();

    c.bench_function("match_single_slot_1000_vertices", |b| {
        b.iter(|| {
            let mut iter = MatchIterator::new(&storage, &pattern).unwrap();
            let mut count = 0;
            while iter.next().unwrap().is_some() {
                count += 1;
            }
            black_box(count)
        });
    });
}

fn bench_two_slot_product(c: &mut Criterion) {
    let (_tmp, storage) = populated_storage(50);
    let pattern = Pattern::build(&[Entity::Vertex(bare("x")), Entity::Vertex(bare("y"))]).unwrap();

    c.bench_function("match_two_slots_50_vertices", |b| {
        b.iter(|| {
            let mut iter = MatchIterator::new(&storage, &pattern).unwrap();
            let mut count = 0;
            while iter.next().unwrap().is_some() {
                count += 1;
            }
            black_box(count)
        });
    });
}

criterion_group!(benches, bench_single_slot_scan, bench_two_slot_product);
criterion_main!(benches);
