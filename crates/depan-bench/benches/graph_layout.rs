use criterion::{Criterion, black_box, criterion_group, criterion_main};
use depan_bench::util::generate_synthetic_graph;
use depan_core::{EdgeMatcher, NodeId, RelationId, Rect, Vec2};
use depan_view::{LayoutContext, LayoutKind, LayoutScaler, run_layout};
use std::collections::HashMap;

fn context(node_count: usize) -> LayoutContext {
    let graph = generate_synthetic_graph(node_count, 4, 1);
    let movable: Vec<NodeId> = graph.node_ids().collect();
    LayoutContext::build(
        &graph,
        &movable,
        &EdgeMatcher::forward([RelationId(0)]),
        HashMap::new(),
        Rect::from_center_size(Vec2::ZERO, Vec2::new(200.0, 150.0)),
    )
}

fn bench_layouts(c: &mut Criterion) {
    let scaler = LayoutScaler::default();
    let large = context(1000);
    for kind in [LayoutKind::Grid, LayoutKind::Circle, LayoutKind::Tree, LayoutKind::Radial] {
        let generator = kind.generator();
        c.bench_function(&format!("{kind}_layout_1000_nodes"), |b| {
            b.iter(|| black_box(run_layout(generator.as_ref(), black_box(&large), &scaler)))
        });
    }

    let small = context(200);
    let force = LayoutKind::Force.generator();
    c.bench_function("force_layout_200_nodes", |b| {
        b.iter(|| black_box(run_layout(force.as_ref(), black_box(&small), &scaler)))
    });
}

criterion_group!(benches, bench_layouts);
criterion_main!(benches);
