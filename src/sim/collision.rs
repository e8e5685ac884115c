//! Circle vs axis-aligned rectangle collision detection
//!
//! Outside the box the contact normal points from the closest rectangle
//! point to the circle centre. Once the centre is inside, the normal is the
//! cheapest axis to push the circle back out along.

use glam::Vec2;

use super::state::TargetBox;
use super::vector::normalize;

/// Contact between a projectile and the target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Closest point on the rectangle to the circle centre
    pub point: Vec2,
    /// Unit normal pointing away from the target, toward the projectile
    pub normal: Vec2,
    /// Overlap depth along `normal`
    pub depth: f32,
    /// Circle centre lies inside the rectangle
    pub inside: bool,
}

/// Clamp `p` onto the rectangle `[min, max]`, per axis
#[inline]
pub fn closest_point(p: Vec2, min: Vec2, max: Vec2) -> Vec2 {
    p.clamp(min, max)
}

/// Whether `p` lies inside (or on the boundary of) `[min, max]`
#[inline]
pub fn contains_point(p: Vec2, min: Vec2, max: Vec2) -> bool {
    p.x >= min.x && p.x <= max.x && p.y >= min.y && p.y <= max.y
}

/// Minimum push-out for a point inside `[min, max]`
///
/// Returns the unit axis and the distance to the nearest edge. Ties go to
/// left, right, top, bottom in that order.
pub fn min_push_out(p: Vec2, min: Vec2, max: Vec2) -> (Vec2, f32) {
    let candidates = [
        (Vec2::NEG_X, p.x - min.x),
        (Vec2::X, max.x - p.x),
        (Vec2::NEG_Y, p.y - min.y),
        (Vec2::Y, max.y - p.y),
    ];

    let mut best = candidates[0];
    for candidate in &candidates[1..] {
        if candidate.1 < best.1 {
            best = *candidate;
        }
    }
    best
}

/// Test a circle against the target box
///
/// Returns `None` when the circle does not touch the box, or when the box has
/// no usable geometry yet.
pub fn detect(center: Vec2, radius: f32, target: &TargetBox) -> Option<Contact> {
    if !target.has_valid_geometry() || !center.is_finite() {
        return None;
    }

    let min = target.position;
    let max = target.max();
    let closest = closest_point(center, min, max);
    let offset = center - closest;

    if offset.length_squared() > radius * radius {
        return None;
    }

    if contains_point(center, min, max) {
        let (normal, edge_distance) = min_push_out(center, min, max);
        return Some(Contact {
            point: closest,
            normal,
            depth: edge_distance + radius,
            inside: true,
        });
    }

    Some(Contact {
        point: closest,
        normal: normalize(offset),
        depth: radius - offset.length(),
        inside: false,
    })
}
