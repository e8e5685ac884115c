//! Collision response and body state transitions
//!
//! Every projectile/target state change goes through [`resolve`]. The
//! outcome of an entry is picked by [`decide`], a single table over
//! (target fixed, penetration exhausted, perforates, mode).

use glam::Vec2;

use super::collision::Contact;
use super::state::{
    CollisionEvent, CollisionKind, CollisionMode, EntryMark, Projectile, ProjectileState,
    TargetBox, TargetState,
};
use super::vector::{dot, normalize};
use crate::consts::*;

/// Result of a projectile being inside the target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Punches through; the target is holed and released
    Perforate,
    /// Welds into the target
    Embed,
    /// Deflects back out
    Bounce,
    /// Keeps drilling; decided once penetration runs out
    Drill,
}

/// The entry decision table
pub fn decide(
    mode: CollisionMode,
    target_fixed: bool,
    exhausted: bool,
    perforates: bool,
) -> Outcome {
    use CollisionMode::*;

    match (target_fixed, exhausted, perforates, mode) {
        (true, _, true, _) => Outcome::Perforate,
        (true, _, false, Bullet) => Outcome::Embed,
        (true, _, false, Collision) => Outcome::Bounce,
        (false, false, _, _) => Outcome::Drill,
        (false, true, _, Bullet) => Outcome::Embed,
        (false, true, _, Collision) => Outcome::Bounce,
    }
}

/// Coefficient of restitution for a projectile/target pair
#[inline]
pub fn restitution(projectile_elasticity: f32, target_elasticity: f32) -> f32 {
    projectile_elasticity.min(target_elasticity)
}

/// `speed² * mass / 10`
#[inline]
pub fn projectile_force(speed: f32, mass: f32) -> f32 {
    speed * speed * mass / PROJECTILE_FORCE_DIVISOR
}

/// `hardness * thickness * 0.2`
#[inline]
pub fn perforation_threshold(hardness: f32, thickness: f32) -> f32 {
    hardness * thickness * PERFORATION_THRESHOLD_SCALE
}

/// Depth a projectile starts drilling with
pub fn initial_penetration(speed: f32, mass: f32, hardness: f32, target_fixed: bool) -> f32 {
    let factor = if target_fixed {
        FIXED_PENETRATION_FACTOR
    } else {
        MOBILE_PENETRATION_FACTOR
    };
    (speed * mass / hardness * factor).max(0.0)
}

/// Penetration removed per tick
pub fn penetration_decay(target: &TargetBox) -> f32 {
    if target.is_fixed() && !target.perforated() {
        FIXED_PENETRATION_DECAY
    } else {
        MOBILE_PENETRATION_DECAY
    }
}

/// Whether an impact at `speed` holes a fixed target
pub fn perforates(speed: f32, projectile: &Projectile, target: &TargetBox) -> bool {
    target.is_fixed()
        && projectile_force(speed, projectile.mass)
            > perforation_threshold(target.hardness, target.thickness)
}

/// Momentum-conserving common velocity of two merged bodies
#[inline]
pub fn merged_velocity(m_p: f32, v_p: Vec2, m_t: f32, v_t: Vec2) -> Vec2 {
    (v_p * m_p + v_t * m_t) / (m_p + m_t)
}

/// Restitution impulse along `normal`
///
/// Returns the impulse scalar `j`, or `None` when the bodies are already
/// separating. A fixed target keeps its velocity.
pub fn apply_bounce(projectile: &mut Projectile, target: &mut TargetBox, normal: Vec2) -> Option<f32> {
    let target_velocity = if target.is_fixed() {
        Vec2::ZERO
    } else {
        target.velocity
    };
    let relative = projectile.velocity - target_velocity;
    let closing = dot(relative, normal);
    if closing > 0.0 {
        return None;
    }

    let e = restitution(projectile.elasticity, target.elasticity);
    let inv_target = target.inverse_mass();
    let j = -(1.0 + e) * closing / (1.0 / projectile.mass + inv_target);

    projectile.velocity += normal * (j / projectile.mass);
    if inv_target > 0.0 {
        target.velocity -= normal * (j * inv_target);
    }
    Some(j)
}

/// Give both bodies their common momentum velocity
///
/// Returns the magnitude of the projectile's momentum change.
pub fn apply_merge(projectile: &mut Projectile, target: &mut TargetBox) -> f32 {
    let target_velocity = if target.is_fixed() {
        Vec2::ZERO
    } else {
        target.velocity
    };
    let v_final = merged_velocity(
        projectile.mass,
        projectile.velocity,
        target.mass,
        target_velocity,
    );
    let impulse = ((v_final - projectile.velocity) * projectile.mass).length();
    projectile.velocity = v_final;
    target.velocity = v_final;
    impulse
}

/// Resolve one projectile against the target for the current tick
///
/// `contact` is this tick's detection result. Returns the event to report,
/// if anything happened.
pub fn resolve(
    mode: CollisionMode,
    projectile: &mut Projectile,
    target: &mut TargetBox,
    contact: Option<Contact>,
) -> Option<CollisionEvent> {
    match projectile.state {
        ProjectileState::Embedded { .. } => None,
        ProjectileState::Free | ProjectileState::Contacted { .. } => match contact {
            Some(c) if c.inside => first_entry(mode, projectile, target, c.normal),
            Some(c) => outside_contact(mode, projectile, target, &c),
            None => None,
        },
        ProjectileState::Entering { entry, penetration } => match contact {
            Some(c) if c.inside => {
                let remaining = (penetration - penetration_decay(target)).max(0.0);
                if remaining > 0.0 {
                    projectile.state = ProjectileState::Entering {
                        entry,
                        penetration: remaining,
                    };
                    None
                } else {
                    finish(mode, projectile, target, entry, c.normal)
                }
            }
            // Drilled out of the box before running out of penetration
            Some(c) => finish(mode, projectile, target, entry, c.normal),
            None => {
                let normal = normalize(projectile.position - target.center());
                finish(mode, projectile, target, entry, normal)
            }
        },
        ProjectileState::Perforated { .. } | ProjectileState::Bounced { .. } => match contact {
            Some(c) if !c.inside => outside_contact(mode, projectile, target, &c),
            _ => None,
        },
    }
}

fn outside_contact(
    mode: CollisionMode,
    projectile: &mut Projectile,
    target: &mut TargetBox,
    contact: &Contact,
) -> Option<CollisionEvent> {
    // Bullets keep driving until their centre is inside
    if mode == CollisionMode::Bullet {
        return None;
    }

    let mark = EntryMark {
        point: projectile.position,
        velocity: projectile.velocity,
    };
    let j = apply_bounce(projectile, target, contact.normal)?;
    if projectile.state == ProjectileState::Free {
        projectile.state = ProjectileState::Contacted { entry: mark };
    }
    if contact.depth > 0.0 {
        projectile.position += contact.normal * contact.depth;
    }
    mark_struck(target);

    log::debug!(
        "Projectile {} bounced off target (j = {:.3})",
        projectile.id,
        j
    );
    Some(event(projectile, CollisionKind::Bounce, j.abs(), contact.normal))
}

fn first_entry(
    mode: CollisionMode,
    projectile: &mut Projectile,
    target: &mut TargetBox,
    normal: Vec2,
) -> Option<CollisionEvent> {
    // The mark from an earlier outside contact is never overwritten
    let entry = projectile.state.entry().unwrap_or(EntryMark {
        point: projectile.position,
        velocity: projectile.velocity,
    });
    let speed = projectile.velocity.length();
    let penetration = initial_penetration(speed, projectile.mass, target.hardness, target.is_fixed());

    let outcome = decide(
        mode,
        target.is_fixed(),
        penetration <= 0.0,
        perforates(speed, projectile, target),
    );
    log::debug!(
        "Projectile {} entered target at ({:.1}, {:.1}): {:?}",
        projectile.id,
        entry.point.x,
        entry.point.y,
        outcome
    );

    if outcome == Outcome::Drill {
        projectile.state = ProjectileState::Entering { entry, penetration };
        return Some(event(projectile, CollisionKind::Entry, 0.0, normal));
    }
    apply_outcome(outcome, projectile, target, entry, normal)
}

/// Penetration is used up: settle the projectile for good
fn finish(
    mode: CollisionMode,
    projectile: &mut Projectile,
    target: &mut TargetBox,
    entry: EntryMark,
    normal: Vec2,
) -> Option<CollisionEvent> {
    let speed = entry.velocity.length();
    let outcome = decide(
        mode,
        target.is_fixed(),
        true,
        perforates(speed, projectile, target),
    );
    apply_outcome(outcome, projectile, target, entry, normal)
}

fn apply_outcome(
    outcome: Outcome,
    projectile: &mut Projectile,
    target: &mut TargetBox,
    entry: EntryMark,
    normal: Vec2,
) -> Option<CollisionEvent> {
    match outcome {
        Outcome::Perforate => {
            let impulse = apply_merge(projectile, target);
            target.state = TargetState::Perforated;
            projectile.state = ProjectileState::Perforated { entry };
            log::debug!("Projectile {} perforated the target", projectile.id);
            Some(event(projectile, CollisionKind::Perforation, impulse, normal))
        }
        Outcome::Embed => {
            let impulse = apply_merge(projectile, target);
            if target.state != TargetState::Perforated {
                target.state = TargetState::Mobile;
            }
            projectile.state = ProjectileState::Embedded { entry };
            log::debug!("Projectile {} embedded in the target", projectile.id);
            Some(event(projectile, CollisionKind::Embed, impulse, normal))
        }
        Outcome::Bounce => {
            let j = apply_bounce(projectile, target, normal).unwrap_or(0.0);
            mark_struck(target);
            projectile.state = ProjectileState::Bounced { entry };
            Some(event(projectile, CollisionKind::Bounce, j.abs(), normal))
        }
        Outcome::Drill => {
            let penetration = projectile.penetration().unwrap_or(0.0);
            projectile.state = ProjectileState::Entering { entry, penetration };
            None
        }
    }
}

fn mark_struck(target: &mut TargetBox) {
    if target.state == TargetState::Fixed {
        target.state = TargetState::Struck;
    }
}

fn event(projectile: &Projectile, kind: CollisionKind, impulse: f32, normal: Vec2) -> CollisionEvent {
    CollisionEvent {
        projectile_id: projectile.id,
        kind,
        impulse,
        normal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::TargetSettings;
    use crate::sim::collision::detect;
    use crate::sim::state::NewProjectile;

    const CANVAS: Vec2 = Vec2::new(800.0, 500.0);

    fn target(hardness: f32, thickness: f32) -> TargetBox {
        let settings = TargetSettings {
            mass: 10.0,
            hardness,
            thickness,
            elasticity: 1.0,
            ..Default::default()
        };
        TargetBox::new(&settings, CANVAS)
    }

    fn projectile(position: Vec2, velocity: Vec2) -> Projectile {
        let spec = NewProjectile::at(position, velocity)
            .with_mass(5.0)
            .with_elasticity(1.0);
        Projectile::new(1, &spec, 0)
    }

    /// Just past the left face of the default target
    fn inside_left(t: &TargetBox) -> Vec2 {
        Vec2::new(t.position.x + 1.0, t.center().y)
    }

    #[test]
    fn test_decision_table_covers_every_row() {
        use CollisionMode::*;
        for mode in [Bullet, Collision] {
            for exhausted in [false, true] {
                assert_eq!(decide(mode, true, exhausted, true), Outcome::Perforate);
                assert_eq!(decide(mode, false, false, exhausted), Outcome::Drill);
            }
        }
        assert_eq!(decide(Bullet, true, false, false), Outcome::Embed);
        assert_eq!(decide(Collision, true, false, false), Outcome::Bounce);
        assert_eq!(decide(Bullet, false, true, false), Outcome::Embed);
        assert_eq!(decide(Collision, false, true, true), Outcome::Bounce);
    }

    #[test]
    fn test_threshold_constants() {
        assert_eq!(projectile_force(30.0, 5.0), 450.0);
        assert_eq!(perforation_threshold(100.0, 50.0), 1000.0);
        assert!((initial_penetration(30.0, 5.0, 8.0, true) - 9.375).abs() < 1e-4);
        assert!((initial_penetration(30.0, 5.0, 8.0, false) - 1.875).abs() < 1e-4);
    }

    #[test]
    fn test_elastic_bounce_off_fixed_target() {
        let mut t = target(100.0, 50.0);
        let mut p = projectile(Vec2::new(t.position.x - 5.0, t.center().y), Vec2::new(50.0, 0.0));
        let contact = detect(p.position, p.radius, &t);

        let event = resolve(CollisionMode::Collision, &mut p, &mut t, contact).expect("bounce");
        assert_eq!(event.kind, CollisionKind::Bounce);
        assert!((p.velocity.x + 50.0).abs() < 1e-3);
        assert_eq!(t.velocity, Vec2::ZERO);
        assert_eq!(t.state(), TargetState::Struck);
        assert_eq!(p.entry_point(), Some(Vec2::new(t.position.x - 5.0, t.center().y)));
        assert_eq!(p.entry_velocity(), Some(Vec2::new(50.0, 0.0)));
        assert_eq!(p.penetration(), None);
        // Pushed clear of the face
        assert!(p.position.x + p.radius <= t.position.x + 1e-3);
    }

    #[test]
    fn test_second_outside_contact_keeps_first_mark() {
        let mut t = target(100.0, 50.0);
        let first = Vec2::new(t.position.x - 5.0, t.center().y);
        let mut p = projectile(first, Vec2::new(50.0, 0.0));
        let contact = detect(p.position, p.radius, &t);
        resolve(CollisionMode::Collision, &mut p, &mut t, contact).expect("bounce");

        // Comes back at the top face
        p.position = Vec2::new(t.center().x, t.position.y - 2.0);
        p.velocity = Vec2::new(0.0, 80.0);
        let contact = detect(p.position, p.radius, &t);
        let event = resolve(CollisionMode::Collision, &mut p, &mut t, contact).expect("bounce");
        assert_eq!(event.kind, CollisionKind::Bounce);
        assert!(p.velocity.y < 0.0);
        assert_eq!(p.entry_point(), Some(first));
        assert_eq!(p.entry_velocity(), Some(Vec2::new(50.0, 0.0)));
    }

    #[test]
    fn test_contacted_projectile_can_still_enter() {
        let mut t = target(100.0, 50.0);
        let first = Vec2::new(t.position.x - 5.0, t.center().y);
        let mut p = projectile(first, Vec2::new(50.0, 0.0));
        let contact = detect(p.position, p.radius, &t);
        resolve(CollisionMode::Collision, &mut p, &mut t, contact).expect("bounce");

        p.position = inside_left(&t);
        p.velocity = Vec2::new(30.0, 0.0);
        let contact = detect(p.position, p.radius, &t);
        let event = resolve(CollisionMode::Collision, &mut p, &mut t, contact).expect("bounce");
        assert_eq!(event.kind, CollisionKind::Bounce);
        assert!(matches!(p.state(), ProjectileState::Bounced { .. }));
        assert_eq!(p.entry_point(), Some(first));
    }

    #[test]
    fn test_separating_contact_is_ignored() {
        let mut t = target(100.0, 50.0);
        let mut p = projectile(Vec2::new(t.position.x - 5.0, t.center().y), Vec2::new(-50.0, 0.0));
        let contact = detect(p.position, p.radius, &t);

        assert!(resolve(CollisionMode::Collision, &mut p, &mut t, contact).is_none());
        assert_eq!(p.velocity, Vec2::new(-50.0, 0.0));
        assert_eq!(t.state(), TargetState::Fixed);
    }

    #[test]
    fn test_bullet_ignores_outside_contact() {
        let mut t = target(100.0, 50.0);
        let mut p = projectile(Vec2::new(t.position.x - 5.0, t.center().y), Vec2::new(30.0, 0.0));
        let contact = detect(p.position, p.radius, &t);

        assert!(resolve(CollisionMode::Bullet, &mut p, &mut t, contact).is_none());
        assert_eq!(p.velocity, Vec2::new(30.0, 0.0));
    }

    #[test]
    fn test_embed_in_fixed_target() {
        // force 450 < threshold 1000
        let mut t = target(100.0, 50.0);
        let mut p = projectile(inside_left(&t), Vec2::new(30.0, 0.0));
        let contact = detect(p.position, p.radius, &t);

        let event = resolve(CollisionMode::Bullet, &mut p, &mut t, contact).expect("embed");
        assert_eq!(event.kind, CollisionKind::Embed);
        assert!(p.stuck_inside());
        assert!((p.velocity - Vec2::new(10.0, 0.0)).length() < 1e-4);
        assert!((t.velocity - Vec2::new(10.0, 0.0)).length() < 1e-4);
        assert_eq!(t.state(), TargetState::Mobile);
        assert_eq!(p.entry_velocity(), Some(Vec2::new(30.0, 0.0)));
    }

    #[test]
    fn test_perforate_fixed_target() {
        // force 5000 > threshold 1000
        let mut t = target(100.0, 50.0);
        let mut p = projectile(inside_left(&t), Vec2::new(100.0, 0.0));
        let contact = detect(p.position, p.radius, &t);

        let event = resolve(CollisionMode::Bullet, &mut p, &mut t, contact).expect("perforation");
        assert_eq!(event.kind, CollisionKind::Perforation);
        assert!(t.perforated());
        assert!(!t.is_fixed());
        assert!(!p.stuck_inside());
        let total = p.momentum() + t.momentum();
        assert!((total - Vec2::new(500.0, 0.0)).length() < 1e-3);
    }

    #[test]
    fn test_collision_mode_bounces_from_inside() {
        let mut t = target(100.0, 50.0);
        let mut p = projectile(inside_left(&t), Vec2::new(30.0, 0.0));
        let contact = detect(p.position, p.radius, &t);

        let event = resolve(CollisionMode::Collision, &mut p, &mut t, contact).expect("bounce");
        assert_eq!(event.kind, CollisionKind::Bounce);
        assert!(matches!(p.state(), ProjectileState::Bounced { .. }));
        assert!(p.velocity.x < 0.0);
        assert!(t.is_fixed());

        // Not re-resolved on the way out
        let contact = detect(p.position, p.radius, &t);
        assert!(resolve(CollisionMode::Collision, &mut p, &mut t, contact).is_none());
    }

    #[test]
    fn test_mobile_target_drills_then_embeds() {
        let mut t = target(8.0, 5.0);
        t.state = TargetState::Mobile;
        let mut p = projectile(inside_left(&t), Vec2::new(30.0, 0.0));

        let contact = detect(p.position, p.radius, &t);
        let event = resolve(CollisionMode::Bullet, &mut p, &mut t, contact).expect("entry");
        assert_eq!(event.kind, CollisionKind::Entry);
        let first = p.penetration().expect("penetration");
        assert!((first - 1.875).abs() < 1e-4);

        let mut last = first;
        let mut ticks = 0;
        while !p.stuck_inside() {
            let contact = detect(p.position, p.radius, &t);
            resolve(CollisionMode::Bullet, &mut p, &mut t, contact);
            let now = p.penetration().expect("penetration");
            assert!(now < last || now == 0.0);
            last = now;
            ticks += 1;
            assert!(ticks < 100, "never resolved");
        }
        assert_eq!(ticks, 19);
        assert_eq!(p.penetration(), Some(0.0));
        assert!((p.velocity - t.velocity).length() < 1e-5);
    }

    #[test]
    fn test_refixed_target_drills_at_fixed_rate() {
        let mut t = target(8.0, 5.0);
        t.state = TargetState::Mobile;
        let mut p = projectile(inside_left(&t), Vec2::new(30.0, 0.0));
        let contact = detect(p.position, p.radius, &t);
        resolve(CollisionMode::Bullet, &mut p, &mut t, contact).expect("entry");
        let before = p.penetration().expect("penetration");

        t.apply_patch(&crate::sim::state::TargetPatch {
            fixed: Some(true),
            ..Default::default()
        });
        assert_eq!(penetration_decay(&t), FIXED_PENETRATION_DECAY);

        let contact = detect(p.position, p.radius, &t);
        assert!(resolve(CollisionMode::Bullet, &mut p, &mut t, contact).is_none());
        let after = p.penetration().expect("penetration");
        assert!((before - after - FIXED_PENETRATION_DECAY).abs() < 1e-6);
    }

    #[test]
    fn test_drilling_projectile_leaving_box_resolves() {
        let mut t = target(8.0, 5.0);
        t.state = TargetState::Mobile;
        let mut p = projectile(inside_left(&t), Vec2::new(30.0, 0.0));
        let contact = detect(p.position, p.radius, &t);
        resolve(CollisionMode::Collision, &mut p, &mut t, contact);
        assert!(matches!(p.state(), ProjectileState::Entering { .. }));

        p.position = t.max() + Vec2::splat(100.0);
        resolve(CollisionMode::Collision, &mut p, &mut t, None);
        assert!(matches!(p.state(), ProjectileState::Bounced { .. }));
        assert_eq!(p.penetration(), Some(0.0));
    }

    #[test]
    fn test_embed_keeps_perforated_flag() {
        let mut t = target(100.0, 50.0);
        t.state = TargetState::Perforated;
        let mut p = projectile(inside_left(&t), Vec2::ZERO);
        let contact = detect(p.position, p.radius, &t);
        // Zero speed: nothing to drill, settles at once
        let event = resolve(CollisionMode::Bullet, &mut p, &mut t, contact).expect("embed");
        assert_eq!(event.kind, CollisionKind::Embed);
        assert!(t.perforated());
    }
}
