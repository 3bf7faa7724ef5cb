//! Axis-aligned boxes and circle overlap tests
//!
//! Every entity is a circle of diameter `size` centred on its position.
//! The spatial index works on the bounding square of that circle; callers
//! confirm candidates with the exact circle test.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box (top-left corner + extent)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Aabb {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Bounding square of a circle of diameter `size` centred on `center`
    #[inline]
    pub fn around(center: Vec2, size: f32) -> Self {
        let half = size / 2.0;
        Self::new(center.x - half, center.y - half, size, size)
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Closed-interval overlap (touching edges count)
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.x <= other.right()
            && other.x <= self.right()
            && self.y <= other.bottom()
            && other.y <= self.bottom()
    }

    /// The four equal quadrants, ordered NE, NW, SW, SE
    pub fn quadrants(&self) -> [Aabb; 4] {
        let w = self.width / 2.0;
        let h = self.height / 2.0;
        [
            Aabb::new(self.x + w, self.y, w, h),
            Aabb::new(self.x, self.y, w, h),
            Aabb::new(self.x, self.y + h, w, h),
            Aabb::new(self.x + w, self.y + h, w, h),
        ]
    }
}

/// Exact circle test: centres closer than the sum of radii
#[inline]
pub fn circles_overlap(a: Vec2, radius_a: f32, b: Vec2, radius_b: f32) -> bool {
    a.distance(b) < radius_a + radius_b
}

/// Clamp a circle of diameter `size` inside a `width` x `height` rectangle
pub fn clamp_to_world(pos: Vec2, size: f32, width: f32, height: f32) -> Vec2 {
    let half = size / 2.0;
    Vec2::new(
        pos.x.clamp(half, (width - half).max(half)),
        pos.y.clamp(half, (height - half).max(half)),
    )
}
