//! Mapping a pointer position over a layout to a drop side.

use serde::{Deserialize, Serialize};

use crate::layout_engine::graph::Side;

/// Share of the width or height, measured from each edge, that counts as an
/// edge drop.
pub const DEFAULT_EDGE_BAND: f64 = 0.15;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Axis aligned rectangle with its origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    #[serde(default)]
    pub left: f64,
    #[serde(default)]
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Rect { left, top, width, height }
    }

    pub fn right(&self) -> f64 { self.left + self.width }

    pub fn bottom(&self) -> f64 { self.top + self.height }

    pub fn contains(&self, point: Point) -> bool {
        (self.left..=self.right()).contains(&point.x)
            && (self.top..=self.bottom()).contains(&point.y)
    }

    pub fn is_degenerate(&self) -> bool { !(self.width > 0.0 && self.height > 0.0) }
}

/// Which side of `bounds` a pointer at `point` is over.
///
/// The top and bottom bands win over the left and right ones where they
/// overlap in the corners. Returns `None` when the point is outside `bounds`
/// or the rectangle has no area.
pub fn drop_side(point: Point, bounds: Rect, edge_band: f64) -> Option<Side> {
    if bounds.is_degenerate() || !bounds.contains(point) {
        return None;
    }
    let band = edge_band.clamp(0.0, 0.5);
    let rel_x = (point.x - bounds.left) / bounds.width;
    let rel_y = (point.y - bounds.top) / bounds.height;
    let side = if rel_y < band {
        Side::Top
    } else if rel_y > 1.0 - band {
        Side::Bottom
    } else if rel_x < band {
        Side::Left
    } else if rel_x > 1.0 - band {
        Side::Right
    } else {
        Side::Center
    };
    Some(side)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(x: f64, y: f64) -> Point { Point { x, y } }

    const BOUNDS: Rect = Rect { left: 100.0, top: 50.0, width: 200.0, height: 100.0 };

    #[test]
    fn edges_and_center() {
        let side = |x, y| drop_side(at(x, y), BOUNDS, DEFAULT_EDGE_BAND);
        assert_eq!(side(200.0, 55.0), Some(Side::Top));
        assert_eq!(side(200.0, 145.0), Some(Side::Bottom));
        assert_eq!(side(110.0, 100.0), Some(Side::Left));
        assert_eq!(side(290.0, 100.0), Some(Side::Right));
        assert_eq!(side(200.0, 100.0), Some(Side::Center));
    }

    #[test]
    fn corners_prefer_vertical_edges() {
        assert_eq!(drop_side(at(101.0, 51.0), BOUNDS, 0.2), Some(Side::Top));
        assert_eq!(drop_side(at(299.0, 149.0), BOUNDS, 0.2), Some(Side::Bottom));
    }

    #[test]
    fn outside_or_degenerate_is_none() {
        assert_eq!(drop_side(at(99.0, 100.0), BOUNDS, DEFAULT_EDGE_BAND), None);
        assert_eq!(drop_side(at(200.0, 151.0), BOUNDS, DEFAULT_EDGE_BAND), None);
        let flat = Rect::new(0.0, 0.0, 100.0, 0.0);
        assert_eq!(drop_side(at(10.0, 0.0), flat, DEFAULT_EDGE_BAND), None);
    }

    #[test]
    fn zero_band_is_all_center() {
        assert_eq!(drop_side(at(100.0, 50.0), BOUNDS, 0.0), Some(Side::Center));
    }
}
