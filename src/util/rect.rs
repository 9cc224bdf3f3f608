use serde::{Deserialize, Serialize};

use crate::util::vec2::Vec2;

/// Axis-aligned rectangle in world space.
///
/// The y axis grows downward (screen convention), so `top <= bottom` for a
/// well-formed rectangle. Used both for the world border and for per-player
/// view boxes.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Rect {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl Rect {
    pub fn new(left: f32, right: f32, top: f32, bottom: f32) -> Self {
        Self {
            left,
            right,
            top,
            bottom,
        }
    }

    /// Square rectangle spanning `center +/- half_extent` on both axes
    pub fn from_center_half_extent(center: Vec2, half_extent: f32) -> Self {
        Self {
            left: center.x - half_extent,
            right: center.x + half_extent,
            top: center.y - half_extent,
            bottom: center.y + half_extent,
        }
    }

    #[inline]
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.left && point.x <= self.right && point.y >= self.top && point.y <= self.bottom
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new((self.left + self.right) * 0.5, (self.top + self.bottom) * 0.5)
    }

    /// True when the bounds are finite and span a non-empty area
    pub fn is_well_formed(&self) -> bool {
        self.left.is_finite()
            && self.right.is_finite()
            && self.top.is_finite()
            && self.bottom.is_finite()
            && self.left < self.right
            && self.top < self.bottom
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_center_half_extent() {
        let r = Rect::from_center_half_extent(Vec2::new(10.0, 20.0), 5.0);
        assert_eq!(r.left, 5.0);
        assert_eq!(r.right, 15.0);
        assert_eq!(r.top, 15.0);
        assert_eq!(r.bottom, 25.0);
        assert_eq!(r.width(), 10.0);
        assert_eq!(r.height(), 10.0);
    }

    #[test]
    fn test_contains() {
        let r = Rect::new(0.0, 10.0, 0.0, 10.0);
        assert!(r.contains(Vec2::new(5.0, 5.0)));
        assert!(r.contains(Vec2::new(0.0, 10.0))); // edges are inclusive
        assert!(!r.contains(Vec2::new(-0.1, 5.0)));
        assert!(!r.contains(Vec2::new(5.0, 10.1)));
    }

    #[test]
    fn test_center() {
        let r = Rect::new(0.0, 10.0, 20.0, 40.0);
        assert!(r.center().approx_eq(Vec2::new(5.0, 30.0), 1e-6));
    }

    #[test]
    fn test_well_formed() {
        assert!(Rect::new(0.0, 1.0, 0.0, 1.0).is_well_formed());
        assert!(!Rect::new(1.0, 0.0, 0.0, 1.0).is_well_formed());
        assert!(!Rect::new(0.0, f32::NAN, 0.0, 1.0).is_well_formed());
        assert!(!Rect::default().is_well_formed()); // zero area
    }
}
