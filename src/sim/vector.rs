//! 2D vector primitives
//!
//! `Vector2` is glam's `Vec2`; these helpers name the handful of operations
//! the collision code leans on and pin down the degenerate cases.

pub use glam::Vec2 as Vector2;

#[inline]
pub fn add(a: Vector2, b: Vector2) -> Vector2 {
    a + b
}

#[inline]
pub fn subtract(a: Vector2, b: Vector2) -> Vector2 {
    a - b
}

#[inline]
pub fn scale(v: Vector2, s: f32) -> Vector2 {
    v * s
}

#[inline]
pub fn dot(a: Vector2, b: Vector2) -> f32 {
    a.x * b.x + a.y * b.y
}

#[inline]
pub fn magnitude(v: Vector2) -> f32 {
    dot(v, v).sqrt()
}

/// Unit vector in the direction of `v`, or zero when `v` has no length
#[inline]
pub fn normalize(v: Vector2) -> Vector2 {
    let len = magnitude(v);
    if len == 0.0 || !len.is_finite() {
        Vector2::ZERO
    } else {
        v / len
    }
}
