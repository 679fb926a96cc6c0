// SPDX-License-Identifier: MPL-2.0
//! Content-space geometry: coordinates, extents and viewport sizes.
//!
//! Content space follows the mapping convention: origin at the bottom-left
//! of the video, Y pointing up, one unit per video pixel.

/// A point in content space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
}

impl Coordinate {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned bounding box in content space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Extent {
    #[must_use]
    pub const fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Extent covering a `width` × `height` video anchored at the origin.
    #[must_use]
    pub fn from_size(width: u32, height: u32) -> Self {
        Self::new(0.0, 0.0, f64::from(width), f64::from(height))
    }

    /// Extent of the given half-sizes around `center`.
    #[must_use]
    pub fn around(center: Coordinate, half_width: f64, half_height: f64) -> Self {
        Self::new(
            center.x - half_width,
            center.y - half_height,
            center.x + half_width,
            center.y + half_height,
        )
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    #[must_use]
    pub fn center(&self) -> Coordinate {
        Coordinate::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    #[must_use]
    pub fn contains(&self, point: Coordinate) -> bool {
        point.x >= self.min_x && point.x <= self.max_x && point.y >= self.min_y && point.y <= self.max_y
    }

    /// Moves `point` to the nearest position inside the extent.
    #[must_use]
    pub fn clamp(&self, point: Coordinate) -> Coordinate {
        Coordinate::new(
            point.x.clamp(self.min_x, self.max_x),
            point.y.clamp(self.min_y, self.max_y),
        )
    }
}

/// Viewport size in CSS-like (logical) pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::assert_abs_diff_eq;

    #[test]
    fn from_size_is_anchored_at_origin() {
        let extent = Extent::from_size(640, 360);
        assert_eq!(extent, Extent::new(0.0, 0.0, 640.0, 360.0));
        assert_abs_diff_eq!(extent.width(), 640.0);
        assert_abs_diff_eq!(extent.height(), 360.0);
    }

    #[test]
    fn center_is_geometric_midpoint() {
        let extent = Extent::new(-10.0, 20.0, 30.0, 60.0);
        assert_eq!(extent.center(), Coordinate::new(10.0, 40.0));
    }

    #[test]
    fn clamp_keeps_points_inside() {
        let extent = Extent::from_size(100, 50);
        assert_eq!(
            extent.clamp(Coordinate::new(-5.0, 80.0)),
            Coordinate::new(0.0, 50.0)
        );
        let inside = Coordinate::new(25.0, 25.0);
        assert_eq!(extent.clamp(inside), inside);
        assert!(extent.contains(inside));
    }

    #[test]
    fn zero_sized_extent_is_empty() {
        assert!(Extent::from_size(0, 10).is_empty());
        assert!(Size::new(10, 0).is_empty());
        assert!(!Size::new(10, 10).is_empty());
    }
}
