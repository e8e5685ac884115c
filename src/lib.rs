//! Bullet Box - projectile/target collision and penetration engine
//!
//! Core modules:
//! - `sim`: Deterministic simulation (integration, collisions, body lifecycles)
//! - `settings`: Data-driven defaults for canvas, target and run parameters

pub mod settings;
pub mod sim;

pub use settings::{SimSettings, TargetSettings};
pub use sim::{CollisionMode, Simulation, Snapshot};

/// Engine configuration constants
pub mod consts {
    /// Host redraw cadence the frame governor targets (seconds)
    pub const MIN_FRAME_INTERVAL: f64 = 1.0 / 60.0 - 0.001;
    /// Gaps longer than this (host suspended, tab hidden) are dropped
    pub const MAX_FRAME_GAP: f64 = 0.1;

    /// Canvas defaults
    pub const CANVAS_WIDTH: f32 = 800.0;
    pub const CANVAS_HEIGHT: f32 = 500.0;
    pub const WALL_ELASTICITY: f32 = 0.8;

    /// Projectile defaults
    pub const PROJECTILE_MASS: f32 = 5.0;
    pub const PROJECTILE_ELASTICITY: f32 = 0.8;
    pub const PROJECTILE_BASE_RADIUS: f32 = 4.0;
    pub const PROJECTILE_RADIUS_PER_SQRT_MASS: f32 = 2.0;

    /// Target box defaults
    pub const TARGET_WIDTH: f32 = 100.0;
    pub const TARGET_HEIGHT: f32 = 150.0;
    pub const TARGET_MASS: f32 = 10.0;
    pub const TARGET_ELASTICITY: f32 = 0.8;
    pub const TARGET_HARDNESS: f32 = 100.0;
    pub const TARGET_THICKNESS: f32 = 50.0;
    pub const TARGET_COLOR: u32 = 0x8b5a2b;

    /// Initial penetration scale against a fixed target.
    /// Empirically tuned, not derived from a physical law. Entries into a
    /// fixed target settle at once, so the depth only matters if the target
    /// is fixed again while a projectile is still drilling.
    pub const FIXED_PENETRATION_FACTOR: f32 = 0.5;
    /// Initial penetration scale against a mobile target
    pub const MOBILE_PENETRATION_FACTOR: f32 = 0.1;
    /// Per-tick penetration decrement while the target is fixed and intact.
    /// Reached only when a drilling target is fixed again by a patch.
    pub const FIXED_PENETRATION_DECAY: f32 = 0.05;
    /// Per-tick penetration decrement otherwise
    pub const MOBILE_PENETRATION_DECAY: f32 = 0.1;
    /// `projectile_force = speed² * mass / PROJECTILE_FORCE_DIVISOR`
    pub const PROJECTILE_FORCE_DIVISOR: f32 = 10.0;
    /// `threshold = hardness * thickness * PERFORATION_THRESHOLD_SCALE`
    pub const PERFORATION_THRESHOLD_SCALE: f32 = 0.2;

    /// Palette for projectiles added without an explicit color
    pub const PROJECTILE_PALETTE: [u32; 8] = [
        0xe74c3c, 0x3498db, 0x2ecc71, 0xf1c40f, 0x9b59b6, 0xe67e22, 0x1abc9c, 0xecf0f1,
    ];
}

/// Radius of a projectile with the given mass
#[inline]
pub fn radius_for_mass(mass: f32) -> f32 {
    use consts::{PROJECTILE_BASE_RADIUS, PROJECTILE_RADIUS_PER_SQRT_MASS};
    PROJECTILE_BASE_RADIUS + mass.max(0.0).sqrt() * PROJECTILE_RADIUS_PER_SQRT_MASS
}
