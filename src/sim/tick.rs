//! Simulation tick
//!
//! Advances the world by one time slice: target motion, projectile
//! integration, wall reflection, then the collision pass against the target.

use glam::Vec2;

use super::collision::detect;
use super::resolution::resolve;
use super::state::{CollisionEvent, Projectile, TargetBox, World};

/// Advance the world by `dt` seconds
///
/// Returns the collisions resolved during this tick, in projectile id order.
/// A non-positive or non-finite `dt` leaves the world untouched.
pub fn tick(world: &mut World, dt: f32) -> Vec<CollisionEvent> {
    if !dt.is_finite() || dt <= 0.0 {
        return Vec::new();
    }

    world.ticks += 1;
    world.time += f64::from(dt);

    let canvas = world.canvas;
    let wall_elasticity = world.wall_elasticity;

    let displacement = advance_target(&mut world.target, canvas, wall_elasticity, dt);

    for projectile in &mut world.projectiles {
        if projectile.stuck_inside() {
            // Welded: ride along with the box
            projectile.position += displacement;
            projectile.velocity = world.target.velocity;
            continue;
        }

        projectile.velocity += projectile.acceleration * dt;
        projectile.position += projectile.velocity * dt;
        reflect_at_walls(projectile, canvas, wall_elasticity);
    }

    let mut events = Vec::new();
    for projectile in &mut world.projectiles {
        if projectile.stuck_inside() {
            continue;
        }

        let contact = detect(projectile.position, projectile.radius, &world.target);
        if let Some(event) = resolve(world.mode, projectile, &mut world.target, contact) {
            events.push(event);
        }

        if !projectile.stuck_inside() {
            contain(projectile, canvas);
        }
    }

    // Later hits this tick may have changed the target's velocity
    let target_velocity = world.target.velocity;
    for projectile in world.projectiles.iter_mut().filter(|p| p.stuck_inside()) {
        projectile.velocity = target_velocity;
    }

    events
}

/// Move a mobile target and bounce it off the canvas edges
///
/// Returns the displacement actually applied.
fn advance_target(target: &mut TargetBox, canvas: Vec2, wall_elasticity: f32, dt: f32) -> Vec2 {
    if target.is_fixed() {
        return Vec2::ZERO;
    }

    let start = target.position;
    target.position += target.velocity * dt;

    let max = (canvas - target.size()).max(Vec2::ZERO);
    if target.position.x < 0.0 {
        target.position.x = 0.0;
        target.velocity.x = target.velocity.x.abs() * wall_elasticity;
    } else if target.position.x > max.x {
        target.position.x = max.x;
        target.velocity.x = -target.velocity.x.abs() * wall_elasticity;
    }
    if target.position.y < 0.0 {
        target.position.y = 0.0;
        target.velocity.y = target.velocity.y.abs() * wall_elasticity;
    } else if target.position.y > max.y {
        target.position.y = max.y;
        target.velocity.y = -target.velocity.y.abs() * wall_elasticity;
    }

    target.position - start
}

/// Flip and damp the velocity component that crossed a wall, clamping position
pub fn reflect_at_walls(projectile: &mut Projectile, canvas: Vec2, wall_elasticity: f32) {
    let r = projectile.radius;
    let (min, max) = wall_bounds(r, canvas);

    if projectile.position.x < min.x {
        projectile.position.x = min.x;
        projectile.velocity.x = projectile.velocity.x.abs() * wall_elasticity;
    } else if projectile.position.x > max.x {
        projectile.position.x = max.x;
        projectile.velocity.x = -projectile.velocity.x.abs() * wall_elasticity;
    }

    if projectile.position.y < min.y {
        projectile.position.y = min.y;
        projectile.velocity.y = projectile.velocity.y.abs() * wall_elasticity;
    } else if projectile.position.y > max.y {
        projectile.position.y = max.y;
        projectile.velocity.y = -projectile.velocity.y.abs() * wall_elasticity;
    }
}

/// Position-only clamp after collision push-out
fn contain(projectile: &mut Projectile, canvas: Vec2) {
    let (min, max) = wall_bounds(projectile.radius, canvas);
    projectile.position = projectile.position.clamp(min, max);
}

/// Range the centre of a circle of radius `r` may occupy
fn wall_bounds(r: f32, canvas: Vec2) -> (Vec2, Vec2) {
    let min = Vec2::splat(r);
    let max = (canvas - Vec2::splat(r)).max(min);
    (min, max)
}
