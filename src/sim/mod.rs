//! Deterministic simulation module
//!
//! All physics lives here. This module must stay pure and deterministic:
//! - Time only advances through `tick`
//! - Seeded RNG only (presentation colors)
//! - Stable iteration order (by projectile id)
//! - No rendering or platform dependencies

pub mod clock;
pub mod collision;
pub mod engine;
pub mod resolution;
pub mod state;
pub mod tick;
pub mod vector;

pub use clock::{FrameGovernor, FrameScheduler, FrameToken};
pub use collision::{Contact, detect};
pub use engine::{Command, CommandError, ProjectileView, Simulation, Snapshot, TargetView};
pub use resolution::{Outcome, decide};
pub use state::{
    CollisionEvent, CollisionKind, CollisionMode, CollisionTelemetry, EntryMark, NewProjectile,
    Projectile, ProjectileState, RunState, TargetBox, TargetPatch, TargetState, World,
};
pub use tick::tick;
pub use vector::Vector2;
