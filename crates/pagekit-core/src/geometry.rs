#![forbid(unsafe_code)]

//! Canvas geometry in CSS pixels.
//!
//! Coordinates are host-reported viewport coordinates (origin at top-left).
//! Rectangles are half-open: the left/top edges are inside, the right/bottom
//! edges are not, so adjacent siblings never both claim a boundary pixel.

use serde::{Deserialize, Serialize};

/// A pointer position on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    #[inline]
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// A measured element box used for hit testing.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge (inclusive).
    pub x: f64,
    /// Top edge (inclusive).
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Left edge (alias for x).
    #[inline]
    #[must_use]
    pub const fn left(&self) -> f64 {
        self.x
    }

    /// Top edge (alias for y).
    #[inline]
    #[must_use]
    pub const fn top(&self) -> f64 {
        self.y
    }

    /// Right edge (exclusive).
    #[inline]
    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge (exclusive).
    #[inline]
    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Check if the rectangle has no area (or a non-finite extent).
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    /// Check if a point is inside the rectangle.
    #[inline]
    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        !self.is_empty()
            && point.x >= self.x
            && point.x < self.right()
            && point.y >= self.y
            && point.y < self.bottom()
    }

    /// Relative vertical position of `y` inside the box: `0.0` at the top
    /// edge, `1.0` at the bottom edge. Clamped to `[0, 1]`.
    ///
    /// Degenerate boxes report `0.0`.
    #[must_use]
    pub fn vertical_ratio(&self, y: f64) -> f64 {
        if self.is_empty() || !y.is_finite() {
            return 0.0;
        }
        ((y - self.y) / self.height).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn contains_is_half_open() {
        let r = Rect::new(10.0, 100.0, 50.0, 100.0);
        assert!(r.contains(Point::new(10.0, 100.0)));
        assert!(r.contains(Point::new(59.9, 199.9)));
        assert!(!r.contains(Point::new(60.0, 150.0)));
        assert!(!r.contains(Point::new(30.0, 200.0)));
    }

    #[test]
    fn empty_rect_contains_nothing() {
        let r = Rect::new(0.0, 0.0, 0.0, 40.0);
        assert!(r.is_empty());
        assert!(!r.contains(Point::new(0.0, 10.0)));
        assert_eq!(r.vertical_ratio(10.0), 0.0);
    }

    #[test]
    fn nan_extent_counts_as_empty() {
        let r = Rect::new(0.0, 0.0, f64::NAN, 10.0);
        assert!(r.is_empty());
    }

    #[test]
    fn vertical_ratio_quarter_marks() {
        let r = Rect::new(0.0, 100.0, 300.0, 100.0);
        assert_eq!(r.vertical_ratio(125.0), 0.25);
        assert_eq!(r.vertical_ratio(150.0), 0.5);
        assert_eq!(r.vertical_ratio(50.0), 0.0);
        assert_eq!(r.vertical_ratio(400.0), 1.0);
    }

    #[test]
    fn distance_is_euclidean() {
        assert_eq!(Point::new(0.0, 0.0).distance(Point::new(3.0, 4.0)), 5.0);
    }

    proptest! {
        #[test]
        fn ratio_stays_in_unit_interval(
            top in -1000.0f64..1000.0,
            height in 0.5f64..800.0,
            y in -5000.0f64..5000.0,
        ) {
            let r = Rect::new(0.0, top, 10.0, height);
            let ratio = r.vertical_ratio(y);
            prop_assert!((0.0..=1.0).contains(&ratio));
        }
    }
}
