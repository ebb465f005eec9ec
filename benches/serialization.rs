use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use protogroup::{
    flatten, from_json, from_yaml, to_json, to_yaml, unflatten, FlatMap, Operation, Store, Tree,
    TreeMap,
};

/// A tree with `services` branches of a few nested settings each.
fn sample_tree(services: usize) -> Tree {
    let mut root = TreeMap::new();
    for i in 0..services {
        let mut db = TreeMap::new();
        db.insert("host".to_string(), Tree::from(format!("db{i}.internal")));
        db.insert("port".to_string(), Tree::from("5432"));
        let mut service = TreeMap::new();
        service.insert("name".to_string(), Tree::from(format!("Service {i}")));
        service.insert("replicas".to_string(), Tree::from((i % 5).to_string()));
        service.insert("database".to_string(), Tree::Branch(db));
        root.insert(format!("svc{i}"), Tree::Branch(service));
    }
    Tree::Branch(root)
}

fn sample_flat(services: usize) -> FlatMap {
    flatten(&sample_tree(services), ',').unwrap()
}

fn benchmark_flatten(c: &mut Criterion) {
    let mut group = c.benchmark_group("flatten");
    for size in [10, 100, 500].iter() {
        let tree = sample_tree(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &tree, |b, tree| {
            b.iter(|| flatten(black_box(tree), ','))
        });
    }
    group.finish();
}

fn benchmark_unflatten(c: &mut Criterion) {
    let mut group = c.benchmark_group("unflatten");
    for size in [10, 100, 500].iter() {
        let flat = sample_flat(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &flat, |b, flat| {
            b.iter(|| unflatten(black_box(flat), ','))
        });
    }
    group.finish();
}

fn benchmark_json(c: &mut Criterion) {
    let tree = sample_tree(100);
    let text = to_json(&tree).unwrap();

    c.bench_function("json_write", |b| b.iter(|| to_json(black_box(&tree))));
    c.bench_function("json_read", |b| b.iter(|| from_json(black_box(&text))));
}

fn benchmark_yaml(c: &mut Criterion) {
    let tree = sample_tree(100);
    let text = to_yaml(&tree).unwrap();

    c.bench_function("yaml_write", |b| b.iter(|| to_yaml(black_box(&tree))));
    c.bench_function("yaml_read", |b| b.iter(|| from_yaml(black_box(&text))));
}

fn benchmark_legacy(c: &mut Criterion) {
    let mut store = Store::new();
    store.create_from_flat("big", sample_flat(100)).unwrap();
    let text = store.to_legacy("big").unwrap();

    c.bench_function("legacy_write", |b| b.iter(|| store.to_legacy(black_box("big"))));
    c.bench_function("legacy_read", |b| {
        b.iter(|| store.from_legacy("copy", black_box(&text)))
    });
}

fn benchmark_composition(c: &mut Criterion) {
    let mut store = Store::new();
    store.create_from_flat("db", sample_flat(20)).unwrap();

    c.bench_function("compose_record", |b| {
        b.iter(|| {
            store.create_from_lists(
                "app",
                black_box(&["name", "env", "services"]),
                black_box(&["App", "prod", "%db"]),
            )
        })
    });
}

fn benchmark_dispatch_depth(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch_depth");
    let args: [&str; 0] = [];
    for depth in [1, 10, 50].iter() {
        let mut store = Store::new();
        store.create("g0", &["v", "1"]).unwrap();
        store
            .define_operation("g0", "read", Operation::new(|store, this, _| {
                Ok(store.get_by_id(this, "v").unwrap_or_default())
            }))
            .unwrap();
        for i in 1..=*depth {
            store
                .clone_record(&format!("g{i}"), &format!("g{}", i - 1))
                .unwrap();
        }
        let leaf = format!("g{depth}");
        group.bench_with_input(BenchmarkId::from_parameter(depth), &leaf, |b, leaf| {
            b.iter(|| store.dispatch(black_box(leaf), "read", &args))
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    benchmark_flatten,
    benchmark_unflatten,
    benchmark_json,
    benchmark_yaml,
    benchmark_legacy,
    benchmark_composition,
    benchmark_dispatch_depth
);
criterion_main!(benches);
