//! Body types and their lifecycles
//!
//! Projectiles and the target box carry explicit state enums instead of
//! loose flags. Only `sim::resolution` moves a body from one state to another.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::radius_for_mass;
use crate::settings::TargetSettings;

/// Which regime governs every projectile/target contact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CollisionMode {
    /// Projectiles drive into the target and either embed or perforate
    #[default]
    Bullet,
    /// Projectiles bounce off with restitution, never embed
    Collision,
}

/// Stepper run state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    /// Not started, or reset
    Idle,
    /// Advancing on every accepted frame
    Running,
    /// Frozen, resumable with `start`
    Paused,
}

/// Where and how fast a projectile first touched the target
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntryMark {
    pub point: Vec2,
    pub velocity: Vec2,
}

/// Projectile lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ProjectileState {
    /// Has never touched the target
    Free,
    /// Bounced off the outside; may still enter later
    Contacted { entry: EntryMark },
    /// Inside the target, drilling; `penetration` counts down to zero
    Entering { entry: EntryMark, penetration: f32 },
    /// Welded to the target, shares its velocity
    Embedded { entry: EntryMark },
    /// Passed through the target
    Perforated { entry: EntryMark },
    /// Deflected back out of the target
    Bounced { entry: EntryMark },
}

impl ProjectileState {
    /// Entry marker, present once the projectile has touched the target
    pub fn entry(&self) -> Option<EntryMark> {
        match *self {
            ProjectileState::Free => None,
            ProjectileState::Contacted { entry }
            | ProjectileState::Entering { entry, .. }
            | ProjectileState::Embedded { entry }
            | ProjectileState::Perforated { entry }
            | ProjectileState::Bounced { entry } => Some(entry),
        }
    }

    /// Remaining penetration. Zero once resolved, `None` before entry.
    pub fn penetration(&self) -> Option<f32> {
        match *self {
            ProjectileState::Free | ProjectileState::Contacted { .. } => None,
            ProjectileState::Entering { penetration, .. } => Some(penetration),
            _ => Some(0.0),
        }
    }
}

/// Parameters for a projectile added by the collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NewProjectile {
    pub position: Vec2,
    pub velocity: Vec2,
    pub acceleration: Vec2,
    pub mass: f32,
    /// Derived from mass when absent
    pub radius: Option<f32>,
    /// Drawn from the palette when absent
    pub color: Option<u32>,
    pub elasticity: f32,
}

impl Default for NewProjectile {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            mass: PROJECTILE_MASS,
            radius: None,
            color: None,
            elasticity: PROJECTILE_ELASTICITY,
        }
    }
}

impl NewProjectile {
    /// Default projectile at `position` moving with `velocity`
    pub fn at(position: Vec2, velocity: Vec2) -> Self {
        Self {
            position,
            velocity,
            ..Default::default()
        }
    }

    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = mass;
        self
    }

    pub fn with_elasticity(mut self, elasticity: f32) -> Self {
        self.elasticity = elasticity;
        self
    }
}

/// A circular moving body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub id: u32,
    pub position: Vec2,
    pub velocity: Vec2,
    pub acceleration: Vec2,
    pub mass: f32,
    pub radius: f32,
    pub color: u32,
    pub elasticity: f32,
    /// Position at creation; reset returns here
    pub spawn: Vec2,
    pub(crate) state: ProjectileState,
}

impl Projectile {
    pub fn new(id: u32, spec: &NewProjectile, color: u32) -> Self {
        Self {
            id,
            position: spec.position,
            velocity: spec.velocity,
            acceleration: spec.acceleration,
            mass: spec.mass,
            radius: spec.radius.unwrap_or_else(|| radius_for_mass(spec.mass)),
            color,
            elasticity: spec.elasticity,
            spawn: spec.position,
            state: ProjectileState::Free,
        }
    }

    pub fn state(&self) -> ProjectileState {
        self.state
    }

    /// Welded to the target
    pub fn stuck_inside(&self) -> bool {
        matches!(self.state, ProjectileState::Embedded { .. })
    }

    pub fn penetration(&self) -> Option<f32> {
        self.state.penetration()
    }

    pub fn entry_point(&self) -> Option<Vec2> {
        self.state.entry().map(|e| e.point)
    }

    pub fn entry_velocity(&self) -> Option<Vec2> {
        self.state.entry().map(|e| e.velocity)
    }

    pub fn momentum(&self) -> Vec2 {
        self.velocity * self.mass
    }

    /// Back to spawn, at rest, with no entry history
    pub fn reset(&mut self) {
        self.position = self.spawn;
        self.velocity = Vec2::ZERO;
        self.state = ProjectileState::Free;
    }
}

/// Target lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TargetState {
    /// Immovable, untouched
    #[default]
    Fixed,
    /// Immovable, has taken at least one hit
    Struck,
    /// Free to move
    Mobile,
    /// Free to move and holed through. Only reset clears it.
    Perforated,
}

/// Partial edit of the target box. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetPatch {
    pub position: Option<Vec2>,
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub mass: Option<f32>,
    pub color: Option<u32>,
    pub elasticity: Option<f32>,
    pub hardness: Option<f32>,
    pub thickness: Option<f32>,
    pub fixed: Option<bool>,
}

/// The single rectangular target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetBox {
    /// Top-left corner
    pub position: Vec2,
    pub width: f32,
    pub height: f32,
    pub mass: f32,
    pub color: u32,
    pub elasticity: f32,
    /// Zero and ignored while fixed
    pub velocity: Vec2,
    pub hardness: f32,
    pub thickness: f32,
    pub(crate) state: TargetState,
}

impl TargetBox {
    /// Build from settings, centred on the canvas
    pub fn new(settings: &TargetSettings, canvas: Vec2) -> Self {
        let mut target = Self {
            position: Vec2::ZERO,
            width: settings.width,
            height: settings.height,
            mass: settings.mass,
            color: settings.color,
            elasticity: settings.elasticity,
            velocity: Vec2::ZERO,
            hardness: settings.hardness,
            thickness: settings.thickness,
            state: TargetState::Fixed,
        };
        target.recenter(canvas);
        target
    }

    pub fn state(&self) -> TargetState {
        self.state
    }

    pub fn is_fixed(&self) -> bool {
        matches!(self.state, TargetState::Fixed | TargetState::Struck)
    }

    pub fn perforated(&self) -> bool {
        self.state == TargetState::Perforated
    }

    /// Zero while fixed (infinite effective mass)
    pub fn inverse_mass(&self) -> f32 {
        if self.is_fixed() { 0.0 } else { 1.0 / self.mass }
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    /// Bottom-right corner
    pub fn max(&self) -> Vec2 {
        self.position + self.size()
    }

    pub fn center(&self) -> Vec2 {
        self.position + self.size() * 0.5
    }

    /// Geometry usable for collision tests
    pub fn has_valid_geometry(&self) -> bool {
        self.position.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0
    }

    pub fn momentum(&self) -> Vec2 {
        if self.is_fixed() {
            Vec2::ZERO
        } else {
            self.velocity * self.mass
        }
    }

    /// Centre the box on a canvas of the given size
    pub fn recenter(&mut self, canvas: Vec2) {
        self.position = (canvas - self.size()) * 0.5;
    }

    /// Back to a fixed, intact, centred box. Geometry and material stay.
    pub fn reset(&mut self, canvas: Vec2) {
        self.velocity = Vec2::ZERO;
        self.state = TargetState::Fixed;
        self.recenter(canvas);
    }

    /// Apply a collaborator edit without range validation
    pub fn apply_patch(&mut self, patch: &TargetPatch) {
        if let Some(position) = patch.position {
            self.position = position;
        }
        if let Some(width) = patch.width {
            self.width = width;
        }
        if let Some(height) = patch.height {
            self.height = height;
        }
        if let Some(mass) = patch.mass {
            self.mass = mass;
        }
        if let Some(color) = patch.color {
            self.color = color;
        }
        if let Some(elasticity) = patch.elasticity {
            self.elasticity = elasticity;
        }
        if let Some(hardness) = patch.hardness {
            self.hardness = hardness;
        }
        if let Some(thickness) = patch.thickness {
            self.thickness = thickness;
        }
        match patch.fixed {
            Some(true) if self.perforated() => {
                log::warn!("Ignoring request to fix a perforated target");
            }
            Some(true) if !self.is_fixed() => {
                self.state = TargetState::Fixed;
                self.velocity = Vec2::ZERO;
            }
            Some(false) if self.is_fixed() => {
                self.state = TargetState::Mobile;
            }
            _ => {}
        }
    }
}

/// Running collision summary shown by the collaborator
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CollisionTelemetry {
    pub has_collided: bool,
    /// Largest impulse magnitude of the most recent tick with a collision
    pub impulse: f32,
    pub collision_count: u32,
}

impl CollisionTelemetry {
    /// Fold one tick's events into the summary
    pub fn record(&mut self, events: &[CollisionEvent]) {
        if events.is_empty() {
            return;
        }
        self.has_collided = true;
        self.impulse = events.iter().map(|e| e.impulse).fold(0.0, f32::max);
        self.collision_count += events.len() as u32;
    }
}

/// What happened in a single resolved contact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollisionKind {
    /// Restitution bounce
    Bounce,
    /// Projectile entered the target and started drilling
    Entry,
    /// Projectile holed the target
    Perforation,
    /// Projectile welded into the target
    Embed,
}

/// A collision reported for one tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CollisionEvent {
    pub projectile_id: u32,
    pub kind: CollisionKind,
    pub impulse: f32,
    pub normal: Vec2,
}

/// Everything the stepper advances
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct World {
    /// Canvas size; walls sit at 0 and at these extents
    pub canvas: Vec2,
    pub wall_elasticity: f32,
    pub mode: CollisionMode,
    pub target: TargetBox,
    /// Sorted by id
    pub projectiles: Vec<Projectile>,
    /// Simulated seconds since the last reset
    pub time: f64,
    pub ticks: u64,
}

impl World {
    pub fn new(
        canvas: Vec2,
        wall_elasticity: f32,
        mode: CollisionMode,
        target_settings: &TargetSettings,
    ) -> Self {
        Self {
            canvas,
            wall_elasticity,
            mode,
            target: TargetBox::new(target_settings, canvas),
            projectiles: Vec::new(),
            time: 0.0,
            ticks: 0,
        }
    }

    pub fn projectile(&self, id: u32) -> Option<&Projectile> {
        self.projectiles.iter().find(|p| p.id == id)
    }

    /// Bring welded projectiles along after the target was moved by `delta`
    /// outside the stepper
    pub fn carry_welded(&mut self, delta: Vec2) {
        let velocity = self.target.velocity;
        for projectile in self.projectiles.iter_mut().filter(|p| p.stuck_inside()) {
            projectile.position += delta;
            projectile.velocity = velocity;
        }
    }

    /// Total linear momentum of every body that can move
    pub fn momentum(&self) -> Vec2 {
        self.projectiles
            .iter()
            .map(Projectile::momentum)
            .fold(self.target.momentum(), |acc, m| acc + m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> TargetBox {
        TargetBox::new(&TargetSettings::default(), Vec2::new(800.0, 500.0))
    }

    #[test]
    fn test_target_starts_fixed_and_centered() {
        let t = target();
        assert!(t.is_fixed());
        assert!(!t.perforated());
        assert_eq!(t.inverse_mass(), 0.0);
        assert!((t.center() - Vec2::new(400.0, 250.0)).length() < 1e-4);
    }

    #[test]
    fn test_patch_release_and_refix() {
        let mut t = target();
        t.apply_patch(&TargetPatch {
            fixed: Some(false),
            mass: Some(20.0),
            ..Default::default()
        });
        assert_eq!(t.state(), TargetState::Mobile);
        assert!((t.inverse_mass() - 0.05).abs() < 1e-6);

        t.velocity = Vec2::new(3.0, 0.0);
        t.apply_patch(&TargetPatch {
            fixed: Some(true),
            ..Default::default()
        });
        assert_eq!(t.state(), TargetState::Fixed);
        assert_eq!(t.velocity, Vec2::ZERO);
    }

    #[test]
    fn test_perforated_target_cannot_be_refixed() {
        let mut t = target();
        t.state = TargetState::Perforated;
        t.apply_patch(&TargetPatch {
            fixed: Some(true),
            ..Default::default()
        });
        assert!(t.perforated());
    }

    #[test]
    fn test_projectile_reset_clears_entry() {
        let mut p = Projectile::new(1, &NewProjectile::at(Vec2::new(10.0, 20.0), Vec2::X), 0);
        let entry = EntryMark {
            point: Vec2::new(50.0, 20.0),
            velocity: Vec2::X,
        };
        p.position = Vec2::new(60.0, 20.0);
        p.state = ProjectileState::Embedded { entry };
        assert!(p.stuck_inside());
        assert_eq!(p.penetration(), Some(0.0));

        p.reset();
        assert_eq!(p.position, Vec2::new(10.0, 20.0));
        assert_eq!(p.velocity, Vec2::ZERO);
        assert_eq!(p.entry_point(), None);
        assert_eq!(p.penetration(), None);
    }

    #[test]
    fn test_radius_derived_from_mass() {
        let p = Projectile::new(1, &NewProjectile::default().with_mass(16.0), 0);
        assert!((p.radius - 12.0).abs() < 1e-6);
    }

    #[test]
    fn test_telemetry_keeps_peak_of_latest_tick() {
        let mut telemetry = CollisionTelemetry::default();
        let event = |impulse| CollisionEvent {
            projectile_id: 1,
            kind: CollisionKind::Bounce,
            impulse,
            normal: Vec2::X,
        };
        telemetry.record(&[event(5.0), event(9.0)]);
        telemetry.record(&[]);
        assert!(telemetry.has_collided);
        assert_eq!(telemetry.impulse, 9.0);
        assert_eq!(telemetry.collision_count, 2);

        telemetry.record(&[event(2.0)]);
        assert_eq!(telemetry.impulse, 2.0);
        assert_eq!(telemetry.collision_count, 3);
    }
}
