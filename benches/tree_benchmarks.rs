use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use raquad::render::{SnapL1Error, SnapRenderer};
use raquad::{BBox, Config, Objective, Point, RaQuadTree, TreeBuilder};

fn scatter(n: usize) -> Vec<Point> {
    let mut points = Vec::with_capacity(n);
    let mut x = 0.41237f64;
    for _ in 0..n {
        x = (x * 7919.0).fract();
        let y = (x * 104729.0).fract();
        points.push(Point::new(x, y));
    }
    points
}

fn benchmark_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");
    let points = scatter(100_000);

    group.bench_function("insert_100k", |b| {
        b.iter(|| {
            let mut tree =
                RaQuadTree::new(Config::default(), Objective::centroid()).unwrap();
            for p in &points {
                tree.insert(black_box(*p));
            }
            tree
        })
    });

    group.finish();
}

fn benchmark_finalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("finalize");
    group.sample_size(10);
    let points = scatter(50_000);

    group.bench_function("centroid_50k", |b| {
        b.iter_with_setup(
            || {
                let mut tree =
                    RaQuadTree::new(Config::default(), Objective::centroid()).unwrap();
                tree.load(points.clone());
                tree
            },
            |mut tree| {
                tree.finalize_samples();
                tree
            },
        )
    });

    group.bench_function("snap_50k", |b| {
        b.iter_with_setup(
            || {
                let mut tree = TreeBuilder::new()
                    .config(Config::default().with_max_zoom(8))
                    .objective(Objective::render(SnapRenderer, SnapL1Error))
                    .build()
                    .unwrap();
                tree.load(points.clone());
                tree
            },
            |mut tree| {
                tree.finalize_samples();
                tree
            },
        )
    });

    group.finish();
}

fn benchmark_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search");

    let mut tree = RaQuadTree::new(Config::default(), Objective::centroid()).unwrap();
    tree.load(scatter(100_000));
    tree.finalize_samples();

    for budget in [100, 1_000, 10_000] {
        group.bench_with_input(
            BenchmarkId::new("unit_viewport", budget),
            &budget,
            |b, &budget| b.iter(|| tree.search(black_box(&BBox::unit()), 10, budget)),
        );
    }

    let viewport = BBox::new(0.25, 0.25, 0.5, 0.5);
    group.bench_function("quarter_viewport_1k", |b| {
        b.iter(|| tree.search(black_box(&viewport), 12, 1_000))
    });

    group.finish();
}

criterion_group!(benches, benchmark_insert, benchmark_finalize, benchmark_search);
criterion_main!(benches);
