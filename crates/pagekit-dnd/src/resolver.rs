#![forbid(unsafe_code)]

//! Geometry-based insertion point resolution.
//!
//! Runs on every pointer sample of an active drag. The rules, in order:
//!
//! 1. Hit-test the topmost live block (or container surface) under the
//!    pointer. Nothing but empty canvas resolves to the end of the scope root.
//! 2. A container hit whose relative height `r` lies strictly inside the nest
//!    band (default `0.25 < r < 0.75`) nests at the end of the container.
//! 3. A leaf hit, or a container hit outside the band, inserts next to the
//!    hit block: before it when `r <= 0.5`, after it otherwise.
//! 4. A container surface (padding/background) appends to that container.
//! 5. A move whose target parent is the dragged block or one of its
//!    descendants is suppressed and the previous target is kept.
//!
//! Resolution reads the store and layout only; it never copies the tree and
//! never allocates.

use pagekit_core::Point;
use pagekit_tree::{BlockStore, Parent};
use serde::{Deserialize, Serialize};

use crate::config::DragConfig;
use crate::layout::{CanvasLayout, DropRegion, RegionEntry};
use crate::payload::DragPayload;

/// Where a pending drop would commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InsertionPoint {
    pub parent: Parent,
    /// Gap index among the parent's current live children.
    pub index: usize,
}

impl InsertionPoint {
    #[must_use]
    pub const fn new(parent: Parent, index: usize) -> Self {
        Self { parent, index }
    }
}

/// Which rule produced a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolveReason {
    /// Empty canvas: append to the scope root.
    CanvasRoot,
    /// Middle band of a container: append inside it.
    Nest,
    /// Upper part of a block: insert before it.
    SiblingBefore,
    /// Lower part of a block: insert after it.
    SiblingAfter,
    /// Container padding/background: append inside it.
    ContainerSurface,
    /// Would drop a block into itself; previous target kept.
    SelfDropSuppressed,
    /// Pointer left the canvas.
    Outside,
}

/// Outcome of resolving one pointer sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub target: Option<InsertionPoint>,
    pub reason: ResolveReason,
    /// `false` when `target` equals the previous target.
    pub changed: bool,
}

/// Maps pointer samples to insertion points.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InsertionResolver {
    config: DragConfig,
}

impl InsertionResolver {
    #[must_use]
    pub fn new(config: DragConfig) -> Self {
        Self {
            config: config.validated(),
        }
    }

    #[must_use]
    pub const fn config(&self) -> &DragConfig {
        &self.config
    }

    /// Resolve the insertion point for `pointer`.
    ///
    /// `previous` is the target currently shown to the user, if any.
    #[must_use]
    pub fn resolve(
        &self,
        store: &BlockStore,
        layout: &CanvasLayout,
        pointer: Point,
        payload: &DragPayload,
        previous: Option<InsertionPoint>,
    ) -> Resolution {
        let (target, reason) = self.raw_target(store, layout, pointer);

        let (target, reason) = match (target, payload.moved_block()) {
            (Some(InsertionPoint { parent: Parent::Block(parent), .. }), Some(dragged))
                if store.is_self_or_descendant(parent, dragged) =>
            {
                (previous, ResolveReason::SelfDropSuppressed)
            }
            _ => (target, reason),
        };

        Resolution {
            target,
            reason,
            changed: target != previous,
        }
    }

    fn raw_target(
        &self,
        store: &BlockStore,
        layout: &CanvasLayout,
        pointer: Point,
    ) -> (Option<InsertionPoint>, ResolveReason) {
        if !layout.on_canvas(pointer) {
            return (None, ResolveReason::Outside);
        }
        let catalog = store.catalog();
        let candidate = layout.hits_at(pointer).find(|entry| {
            let Some(block) = store.block(entry.region.block_id()) else {
                return false;
            };
            if block.scope != layout.scope() || !store.is_live(block.id) {
                return false;
            }
            match entry.region {
                DropRegion::Block(_) => true,
                DropRegion::Surface(_) => catalog.is_container(&block.block_type),
            }
        });

        let Some(RegionEntry { region, rect }) = candidate.copied() else {
            let root = Parent::Root(layout.scope());
            return (
                Some(InsertionPoint::new(root, store.child_count(root))),
                ResolveReason::CanvasRoot,
            );
        };

        let id = region.block_id();
        let append = |reason| {
            let parent = Parent::Block(id);
            (
                Some(InsertionPoint::new(parent, store.child_count(parent))),
                reason,
            )
        };
        if let DropRegion::Surface(_) = region {
            return append(ResolveReason::ContainerSurface);
        }

        let ratio = rect.vertical_ratio(pointer.y);
        let is_container = store
            .block(id)
            .is_some_and(|block| catalog.is_container(&block.block_type));
        if is_container && ratio > self.config.nest_band_low && ratio < self.config.nest_band_high
        {
            return append(ResolveReason::Nest);
        }

        let Some(placement) = store.placement(id) else {
            return (None, ResolveReason::Outside);
        };
        if ratio <= self.config.sibling_split {
            (
                Some(InsertionPoint::new(placement.parent, placement.index)),
                ResolveReason::SiblingBefore,
            )
        } else {
            (
                Some(InsertionPoint::new(placement.parent, placement.index + 1)),
                ResolveReason::SiblingAfter,
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagekit_core::{BlockCatalog, Rect};
    use pagekit_tree::{BlockId, NewBlock, ScopeId};
    use pretty_assertions::assert_eq;

    const PAGE: ScopeId = ScopeId::new(1);
    const ROOT: Parent = Parent::Root(PAGE);

    struct Fixture {
        store: BlockStore,
        layout: CanvasLayout,
        /// Section spanning y 100..200 with two children.
        section: BlockId,
        first: BlockId,
        second: BlockId,
        /// Leaf spanning y 200..240 after the section.
        footer: BlockId,
    }

    fn fixture() -> Fixture {
        let mut store = BlockStore::new(BlockCatalog::standard());
        let header = store
            .insert_block(NewBlock::new("heading"), ROOT, 0)
            .expect("insert")
            .id;
        let section = store
            .insert_block(NewBlock::new("section"), ROOT, 1)
            .expect("insert")
            .id;
        let footer = store
            .insert_block(NewBlock::new("text"), ROOT, 2)
            .expect("insert")
            .id;
        let first = store
            .insert_block(NewBlock::new("text"), Parent::Block(section), 0)
            .expect("insert")
            .id;
        let second = store
            .insert_block(NewBlock::new("row"), Parent::Block(section), 1)
            .expect("insert")
            .id;

        let mut layout = CanvasLayout::new(PAGE, Rect::new(0.0, 0.0, 1000.0, 800.0));
        layout.register_block(header, Rect::new(0.0, 0.0, 1000.0, 100.0));
        layout.register_block(section, Rect::new(0.0, 100.0, 1000.0, 100.0));
        layout.register_block(footer, Rect::new(0.0, 200.0, 1000.0, 40.0));
        // Children occupy the right half of the section only.
        layout.register_block(first, Rect::new(500.0, 110.0, 400.0, 30.0));
        layout.register_block(second, Rect::new(500.0, 150.0, 400.0, 40.0));
        layout.register_surface(section, Rect::new(900.0, 100.0, 100.0, 100.0));

        Fixture {
            store,
            layout,
            section,
            first,
            second,
            footer,
        }
    }

    fn resolve(fx: &Fixture, x: f64, y: f64, payload: &DragPayload) -> Resolution {
        InsertionResolver::default().resolve(&fx.store, &fx.layout, Point::new(x, y), payload, None)
    }

    #[test]
    fn container_band_boundaries() {
        let fx = fixture();
        let payload = DragPayload::new_block("button");
        let section = Parent::Block(fx.section);

        let before = resolve(&fx, 100.0, 124.0, &payload);
        assert_eq!(before.target, Some(InsertionPoint::new(ROOT, 1)));
        assert_eq!(before.reason, ResolveReason::SiblingBefore);

        for y in [126.0, 150.0, 174.0] {
            let nest = resolve(&fx, 100.0, y, &payload);
            assert_eq!(nest.target, Some(InsertionPoint::new(section, 2)), "y={y}");
            assert_eq!(nest.reason, ResolveReason::Nest);
        }

        let after = resolve(&fx, 100.0, 176.0, &payload);
        assert_eq!(after.target, Some(InsertionPoint::new(ROOT, 2)));
        assert_eq!(after.reason, ResolveReason::SiblingAfter);
    }

    #[test]
    fn exact_band_edges_are_sibling_positions() {
        let fx = fixture();
        let payload = DragPayload::new_block("button");
        assert_eq!(
            resolve(&fx, 100.0, 125.0, &payload).reason,
            ResolveReason::SiblingBefore
        );
        assert_eq!(
            resolve(&fx, 100.0, 175.0, &payload).reason,
            ResolveReason::SiblingAfter
        );
    }

    #[test]
    fn leaf_halves_pick_before_or_after() {
        let fx = fixture();
        let payload = DragPayload::new_block("image");
        let section = Parent::Block(fx.section);
        // `first` spans y 110..140; midpoint 125.
        assert_eq!(
            resolve(&fx, 600.0, 125.0, &payload).target,
            Some(InsertionPoint::new(section, 0))
        );
        assert_eq!(
            resolve(&fx, 600.0, 126.0, &payload).target,
            Some(InsertionPoint::new(section, 1))
        );
        // Root-level leaf in the last slot.
        assert_eq!(fx.store.placement(fx.footer).map(|p| p.index), Some(2));
        assert_eq!(
            resolve(&fx, 10.0, 230.0, &payload).target,
            Some(InsertionPoint::new(ROOT, 3))
        );
    }

    #[test]
    fn nested_container_outside_band_goes_beside_it() {
        let fx = fixture();
        let payload = DragPayload::new_block("image");
        // `second` is a row at y 150..190; 152 is in its top quarter.
        let res = resolve(&fx, 600.0, 152.0, &payload);
        assert_eq!(
            res.target,
            Some(InsertionPoint::new(Parent::Block(fx.section), 1))
        );
        let res = resolve(&fx, 600.0, 170.0, &payload);
        assert_eq!(
            res.target,
            Some(InsertionPoint::new(Parent::Block(fx.second), 0))
        );
    }

    #[test]
    fn surface_appends_to_container() {
        let fx = fixture();
        let res = resolve(&fx, 950.0, 105.0, &DragPayload::new_block("text"));
        assert_eq!(res.reason, ResolveReason::ContainerSurface);
        assert_eq!(
            res.target,
            Some(InsertionPoint::new(Parent::Block(fx.section), 2))
        );
    }

    #[test]
    fn empty_canvas_appends_to_root_and_outside_clears() {
        let fx = fixture();
        let payload = DragPayload::new_block("text");
        let res = resolve(&fx, 10.0, 700.0, &payload);
        assert_eq!(res.reason, ResolveReason::CanvasRoot);
        assert_eq!(res.target, Some(InsertionPoint::new(ROOT, 3)));

        let res = resolve(&fx, 10.0, 900.0, &payload);
        assert_eq!(res.reason, ResolveReason::Outside);
        assert_eq!(res.target, None);
    }

    #[test]
    fn self_drop_keeps_previous_target() {
        let fx = fixture();
        let payload = DragPayload::move_block(fx.section, "section");
        let previous = Some(InsertionPoint::new(ROOT, 0));
        let resolver = InsertionResolver::default();

        // Middle of the dragged section would nest it into itself.
        let res = resolver.resolve(&fx.store, &fx.layout, Point::new(100.0, 150.0), &payload, previous);
        assert_eq!(res.reason, ResolveReason::SelfDropSuppressed);
        assert_eq!(res.target, previous);
        assert!(!res.changed);

        // A child of the dragged section is also inside its subtree.
        let res = resolver.resolve(&fx.store, &fx.layout, Point::new(600.0, 115.0), &payload, previous);
        assert_eq!(res.reason, ResolveReason::SelfDropSuppressed);

        // Beside itself is fine.
        let res = resolver.resolve(&fx.store, &fx.layout, Point::new(100.0, 105.0), &payload, previous);
        assert_eq!(res.target, Some(InsertionPoint::new(ROOT, 1)));
        assert!(res.changed);
    }

    #[test]
    fn stale_regions_for_archived_blocks_are_skipped() {
        let mut fx = fixture();
        fx.store.archive_block(fx.first).expect("archive");
        let res = resolve(&fx, 600.0, 115.0, &DragPayload::new_block("text"));
        // Falls through to the section underneath (top quarter → before it).
        assert_eq!(res.target, Some(InsertionPoint::new(ROOT, 1)));
    }

    #[test]
    fn unchanged_sample_reports_no_change() {
        let fx = fixture();
        let payload = DragPayload::new_block("text");
        let resolver = InsertionResolver::default();
        let first = resolver.resolve(&fx.store, &fx.layout, Point::new(100.0, 150.0), &payload, None);
        let second =
            resolver.resolve(&fx.store, &fx.layout, Point::new(120.0, 160.0), &payload, first.target);
        assert!(first.changed);
        assert!(!second.changed);
        assert_eq!(first.target, second.target);
    }
}
