//! Simulation stepper and collaborator contract
//!
//! `Simulation` owns every body. The presentation layer issues commands
//! between frames and reads owned [`Snapshot`]s; it never touches the world
//! directly. Since all access goes through `&mut Simulation`, a command can
//! only land on a tick boundary and a snapshot never shows half a tick.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::clock::{FrameGovernor, FrameScheduler, FrameToken};
use super::state::{
    CollisionEvent, CollisionMode, CollisionTelemetry, NewProjectile, Projectile,
    ProjectileState, RunState, TargetBox, TargetPatch, TargetState, World,
};
use super::tick::tick;
use crate::consts::PROJECTILE_PALETTE;
use crate::settings::SimSettings;

/// A command the simulation refused. State is left unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum CommandError {
    #[error("cannot start without projectiles")]
    NoProjectiles,
    #[error("collision mode can only change while idle")]
    ModeLocked,
    #[error("time scale must be positive and finite, got {0}")]
    InvalidTimeScale(f32),
    #[error("wall elasticity must be within [0, 1], got {0}")]
    InvalidWallElasticity(f32),
}

/// Intents a host may queue and apply between frames
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Command {
    AddProjectile(NewProjectile),
    UpdateTarget(TargetPatch),
    SetTimeScale(f32),
    SetWallElasticity(f32),
    SetMode(CollisionMode),
    Start,
    Pause,
    Reset,
    ClearProjectiles,
    Resize { width: f32, height: f32 },
}

/// Read-only view of a projectile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectileView {
    pub id: u32,
    pub position: Vec2,
    pub velocity: Vec2,
    pub acceleration: Vec2,
    pub mass: f32,
    pub radius: f32,
    pub color: u32,
    pub elasticity: f32,
    pub penetration: Option<f32>,
    pub entry_point: Option<Vec2>,
    pub entry_velocity: Option<Vec2>,
    pub stuck_inside: bool,
    pub state: ProjectileState,
}

impl From<&Projectile> for ProjectileView {
    fn from(p: &Projectile) -> Self {
        Self {
            id: p.id,
            position: p.position,
            velocity: p.velocity,
            acceleration: p.acceleration,
            mass: p.mass,
            radius: p.radius,
            color: p.color,
            elasticity: p.elasticity,
            penetration: p.penetration(),
            entry_point: p.entry_point(),
            entry_velocity: p.entry_velocity(),
            stuck_inside: p.stuck_inside(),
            state: p.state(),
        }
    }
}

/// Read-only view of the target box
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetView {
    pub position: Vec2,
    pub width: f32,
    pub height: f32,
    pub mass: f32,
    pub color: u32,
    pub elasticity: f32,
    pub velocity: Vec2,
    pub is_fixed: bool,
    pub hardness: f32,
    pub thickness: f32,
    pub perforated: bool,
    pub state: TargetState,
    pub mode: CollisionMode,
}

impl TargetView {
    fn new(t: &TargetBox, mode: CollisionMode) -> Self {
        Self {
            position: t.position,
            width: t.width,
            height: t.height,
            mass: t.mass,
            color: t.color,
            elasticity: t.elasticity,
            velocity: t.velocity,
            is_fixed: t.is_fixed(),
            hardness: t.hardness,
            thickness: t.thickness,
            perforated: t.perforated(),
            state: t.state(),
            mode,
        }
    }
}

/// Everything the presentation layer needs to draw one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub projectiles: Vec<ProjectileView>,
    pub target: TargetView,
    pub is_running: bool,
    pub run_state: RunState,
    pub telemetry: CollisionTelemetry,
    /// Collisions resolved during the most recent tick
    pub events: Vec<CollisionEvent>,
    pub time: f64,
    pub time_scale: f32,
    pub wall_elasticity: f32,
    pub canvas: Vec2,
}

/// The projectile/target simulation
#[derive(Debug, Clone)]
pub struct Simulation {
    world: World,
    run_state: RunState,
    time_scale: f32,
    telemetry: CollisionTelemetry,
    last_events: Vec<CollisionEvent>,
    governor: FrameGovernor,
    scheduler: FrameScheduler,
    rng: Pcg32,
    next_id: u32,
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new(&SimSettings::default())
    }
}

impl Simulation {
    pub fn new(settings: &SimSettings) -> Self {
        let canvas = Vec2::new(settings.canvas_width, settings.canvas_height);
        Self {
            world: World::new(
                canvas,
                settings.wall_elasticity,
                settings.mode,
                &settings.target,
            ),
            run_state: RunState::Idle,
            time_scale: settings.time_scale,
            telemetry: CollisionTelemetry::default(),
            last_events: Vec::new(),
            governor: FrameGovernor::new(),
            scheduler: FrameScheduler::default(),
            rng: Pcg32::seed_from_u64(settings.seed),
            next_id: 1,
        }
    }

    /// Apply a queued command
    pub fn apply(&mut self, command: Command) -> Result<(), CommandError> {
        match command {
            Command::AddProjectile(spec) => {
                self.add_projectile(spec);
                Ok(())
            }
            Command::UpdateTarget(patch) => {
                self.update_target(&patch);
                Ok(())
            }
            Command::SetTimeScale(scale) => self.set_time_scale(scale),
            Command::SetWallElasticity(e) => self.set_wall_elasticity(e),
            Command::SetMode(mode) => self.set_mode(mode),
            Command::Start => self.start(),
            Command::Pause => {
                self.pause();
                Ok(())
            }
            Command::Reset => {
                self.reset();
                Ok(())
            }
            Command::ClearProjectiles => {
                self.clear_projectiles();
                Ok(())
            }
            Command::Resize { width, height } => {
                self.resize(width, height);
                Ok(())
            }
        }
    }

    /// Add a projectile and return its id
    pub fn add_projectile(&mut self, spec: NewProjectile) -> u32 {
        let id = self.next_id;
        self.next_id += 1;

        let color = match spec.color {
            Some(color) => color,
            None => PROJECTILE_PALETTE[self.rng.random_range(0..PROJECTILE_PALETTE.len())],
        };
        self.world.projectiles.push(Projectile::new(id, &spec, color));
        log::debug!("Added projectile {} at {:?}", id, spec.position);
        id
    }

    /// Edit target parameters; values are not range-checked here
    pub fn update_target(&mut self, patch: &TargetPatch) {
        let before = self.world.target.position;
        self.world.target.apply_patch(patch);
        self.world.carry_welded(self.world.target.position - before);
    }

    pub fn set_time_scale(&mut self, scale: f32) -> Result<(), CommandError> {
        if !scale.is_finite() || scale <= 0.0 {
            log::warn!("Rejected time scale {}", scale);
            return Err(CommandError::InvalidTimeScale(scale));
        }
        self.time_scale = scale;
        Ok(())
    }

    pub fn set_wall_elasticity(&mut self, elasticity: f32) -> Result<(), CommandError> {
        if !(0.0..=1.0).contains(&elasticity) {
            log::warn!("Rejected wall elasticity {}", elasticity);
            return Err(CommandError::InvalidWallElasticity(elasticity));
        }
        self.world.wall_elasticity = elasticity;
        Ok(())
    }

    /// Change collision mode. Only allowed while idle.
    pub fn set_mode(&mut self, mode: CollisionMode) -> Result<(), CommandError> {
        if self.run_state != RunState::Idle {
            log::warn!("Ignoring mode change to {:?} while {:?}", mode, self.run_state);
            return Err(CommandError::ModeLocked);
        }
        self.world.mode = mode;
        Ok(())
    }

    /// Begin or resume stepping
    pub fn start(&mut self) -> Result<(), CommandError> {
        if self.world.projectiles.is_empty() {
            return Err(CommandError::NoProjectiles);
        }
        if self.run_state == RunState::Running {
            return Ok(());
        }

        log::info!(
            "Simulation running ({:?} mode, {} projectiles)",
            self.world.mode,
            self.world.projectiles.len()
        );
        self.run_state = RunState::Running;
        self.governor.clear();
        self.scheduler.arm();
        Ok(())
    }

    /// Freeze without clearing state
    pub fn pause(&mut self) {
        if self.run_state != RunState::Running {
            return;
        }
        self.scheduler.cancel();
        self.governor.clear();
        self.run_state = RunState::Paused;
        log::info!("Simulation paused at t = {:.3}s", self.world.time);
    }

    /// Return every body to its starting condition and go idle
    pub fn reset(&mut self) {
        self.scheduler.cancel();
        self.governor.clear();

        for projectile in &mut self.world.projectiles {
            projectile.reset();
        }
        self.world.target.reset(self.world.canvas);
        self.world.time = 0.0;
        self.world.ticks = 0;
        self.telemetry = CollisionTelemetry::default();
        self.last_events.clear();

        if self.run_state != RunState::Idle {
            log::info!("Simulation reset");
        }
        self.run_state = RunState::Idle;
    }

    /// Remove every projectile and go idle
    pub fn clear_projectiles(&mut self) {
        self.scheduler.cancel();
        self.governor.clear();
        self.world.projectiles.clear();
        self.telemetry = CollisionTelemetry::default();
        self.last_events.clear();
        self.run_state = RunState::Idle;
    }

    /// New canvas size; the target recentres
    pub fn resize(&mut self, width: f32, height: f32) {
        self.world.canvas = Vec2::new(width, height);
        let before = self.world.target.position;
        self.world.target.recenter(self.world.canvas);
        self.world.carry_welded(self.world.target.position - before);
    }

    /// Token for the next host redraw callback, while running
    pub fn request_frame(&self) -> Option<FrameToken> {
        match self.run_state {
            RunState::Running => self.scheduler.request(),
            _ => None,
        }
    }

    /// Host redraw callback
    ///
    /// `now` is the host timestamp in seconds. Returns whether a tick ran;
    /// stale tokens and governor-dropped frames do nothing.
    pub fn on_frame(&mut self, token: FrameToken, now: f64) -> bool {
        if self.run_state != RunState::Running || !self.scheduler.accepts(token) {
            return false;
        }
        match self.governor.advance(now, self.time_scale) {
            Some(dt) => {
                self.advance(dt);
                true
            }
            None => false,
        }
    }

    /// Advance by a fixed `dt` (already scaled) if running
    pub fn step(&mut self, dt: f32) -> bool {
        if self.run_state != RunState::Running {
            return false;
        }
        self.advance(dt);
        true
    }

    fn advance(&mut self, dt: f32) {
        let events = tick(&mut self.world, dt);
        self.telemetry.record(&events);
        self.last_events = events;
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            projectiles: self.world.projectiles.iter().map(ProjectileView::from).collect(),
            target: TargetView::new(&self.world.target, self.world.mode),
            is_running: self.is_running(),
            run_state: self.run_state,
            telemetry: self.telemetry,
            events: self.last_events.clone(),
            time: self.world.time,
            time_scale: self.time_scale,
            wall_elasticity: self.world.wall_elasticity,
            canvas: self.world.canvas,
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn telemetry(&self) -> CollisionTelemetry {
        self.telemetry
    }

    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    pub fn is_running(&self) -> bool {
        self.run_state == RunState::Running
    }

    pub fn mode(&self) -> CollisionMode {
        self.world.mode
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }
}
