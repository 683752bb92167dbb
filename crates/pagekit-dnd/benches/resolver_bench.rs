#![forbid(unsafe_code)]

use criterion::{Criterion, criterion_group, criterion_main};
use pagekit_core::{BlockCatalog, Point, Rect};
use pagekit_dnd::{CanvasLayout, DragChannel, DragEngine, DragPayload, InsertionResolver};
use pagekit_tree::{BlockId, BlockStore, NewBlock, Parent, ScopeId};
use std::hint::black_box;

const PAGE: ScopeId = ScopeId::new(1);
const ROW_HEIGHT: f64 = 40.0;

/// `sections` stacked sections of `per_section` text rows, registered in
/// paint order.
fn canvas(sections: usize, per_section: usize) -> (BlockStore, CanvasLayout, Vec<BlockId>) {
    let mut store = BlockStore::new(BlockCatalog::standard());
    let section_height = ROW_HEIGHT * (per_section as f64 + 1.0);
    let mut layout = CanvasLayout::new(
        PAGE,
        Rect::new(0.0, 0.0, 1024.0, section_height * sections as f64),
    );
    let mut leaves = Vec::new();
    for s in 0..sections {
        let top = section_height * s as f64;
        let section = store
            .insert_block(NewBlock::new("section"), Parent::Root(PAGE), s)
            .expect("insert section")
            .id;
        layout.register_block(section, Rect::new(0.0, top, 1024.0, section_height));
        for i in 0..per_section {
            let leaf = store
                .insert_block(NewBlock::new("text"), Parent::Block(section), i)
                .expect("insert leaf")
                .id;
            let y = top + ROW_HEIGHT * (i as f64 + 0.5);
            layout.register_block(leaf, Rect::new(16.0, y, 992.0, ROW_HEIGHT));
            leaves.push(leaf);
        }
    }
    (store, layout, leaves)
}

fn bench_resolver(c: &mut Criterion) {
    let mut group = c.benchmark_group("dnd/resolver");
    let (store, layout, leaves) = canvas(32, 16);
    let resolver = InsertionResolver::default();
    let palette = DragPayload::new_block("image");
    let moving = DragPayload::move_block(leaves[0], "row");

    group.bench_function("palette_sweep_256_samples", |b| {
        b.iter(|| {
            let mut previous = None;
            for step in 0..256 {
                let pointer = Point::new(200.0, f64::from(step) * 83.0);
                let resolution = resolver.resolve(&store, &layout, pointer, &palette, previous);
                previous = resolution.target;
            }
            black_box(previous)
        });
    });

    group.bench_function("move_sweep_256_samples", |b| {
        b.iter(|| {
            let mut previous = None;
            for step in 0..256 {
                let pointer = Point::new(500.0, f64::from(step) * 83.0);
                let resolution = resolver.resolve(&store, &layout, pointer, &moving, previous);
                previous = resolution.target;
            }
            black_box(previous)
        });
    });

    group.finish();
}

fn bench_engine_lifecycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("dnd/engine/lifecycle");
    let (store, layout, leaves) = canvas(8, 8);

    group.bench_function("start_sample_64_cancel", |b| {
        b.iter(|| {
            let mut engine = DragEngine::default();
            let (token, _) = engine.start(
                DragChannel::Synthetic,
                DragPayload::move_block(leaves[3], "row"),
                Point::new(20.0, 20.0),
            );
            let token = token.expect("idle engine arms");
            for step in 0..64 {
                let transition =
                    engine.sample(&store, &layout, token, Point::new(20.0, 24.0 + f64::from(step) * 9.0));
                black_box(transition.to);
            }
            black_box(engine.force_cancel(pagekit_dnd::DragCancelReason::EscapeKey))
        });
    });

    group.finish();
}

criterion_group!(benches, bench_resolver, bench_engine_lifecycle);
criterion_main!(benches);
