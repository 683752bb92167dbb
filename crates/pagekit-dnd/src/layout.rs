#![forbid(unsafe_code)]

//! Measured canvas geometry for hit testing.
//!
//! The host measures rendered blocks and registers their boxes in paint
//! order; a later registration sits on top of an earlier one, so a nested
//! child registered after its container wins the hit. The layout is rebuilt
//! by the host whenever the canvas re-renders and is only read while
//! resolving pointer samples.

use pagekit_core::{Point, Rect};
use pagekit_tree::{BlockId, ScopeId};

/// What a registered box stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DropRegion {
    /// The rendered box of a block.
    Block(BlockId),
    /// Padding or background of a container that accepts drops but is not a
    /// child element, e.g. an empty slot's placeholder.
    Surface(BlockId),
}

impl DropRegion {
    #[must_use]
    pub const fn block_id(self) -> BlockId {
        match self {
            Self::Block(id) | Self::Surface(id) => id,
        }
    }
}

/// One registered box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionEntry {
    pub region: DropRegion,
    pub rect: Rect,
}

/// Geometry of one rendered scope.
#[derive(Debug, Clone, PartialEq)]
pub struct CanvasLayout {
    scope: ScopeId,
    canvas: Rect,
    regions: Vec<RegionEntry>,
}

impl CanvasLayout {
    /// Empty layout for `scope` whose drop area is `canvas`.
    #[must_use]
    pub fn new(scope: ScopeId, canvas: Rect) -> Self {
        Self {
            scope,
            canvas,
            regions: Vec::new(),
        }
    }

    #[must_use]
    pub const fn scope(&self) -> ScopeId {
        self.scope
    }

    #[must_use]
    pub const fn canvas(&self) -> Rect {
        self.canvas
    }

    /// Register a block's rendered box. Later registrations are on top.
    pub fn register_block(&mut self, id: BlockId, rect: Rect) {
        self.push(DropRegion::Block(id), rect);
    }

    /// Register a container's drop surface. Later registrations are on top.
    pub fn register_surface(&mut self, container: BlockId, rect: Rect) {
        self.push(DropRegion::Surface(container), rect);
    }

    fn push(&mut self, region: DropRegion, rect: Rect) {
        if rect.is_empty() {
            return;
        }
        self.regions.push(RegionEntry { region, rect });
    }

    /// Drop every registered box, keeping scope and canvas.
    pub fn clear(&mut self) {
        self.regions.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Whether `point` is over the canvas drop area at all.
    #[must_use]
    pub fn on_canvas(&self, point: Point) -> bool {
        self.canvas.contains(point)
    }

    /// Boxes under `point`, topmost first.
    pub fn hits_at(&self, point: Point) -> impl Iterator<Item = &RegionEntry> + '_ {
        self.regions
            .iter()
            .rev()
            .filter(move |entry| entry.rect.contains(point))
    }

    /// Topmost box under `point`.
    #[must_use]
    pub fn hit_test(&self, point: Point) -> Option<&RegionEntry> {
        self.hits_at(point).next()
    }

    /// Most recently registered box of `id`.
    #[must_use]
    pub fn rect_of(&self, id: BlockId) -> Option<Rect> {
        self.regions
            .iter()
            .rev()
            .find(|entry| entry.region == DropRegion::Block(id))
            .map(|entry| entry.rect)
    }
}
