//! Simulation settings
//!
//! Canvas, run parameters and target defaults. Loaded from JSON by the
//! native binary; missing fields fall back to the defaults below.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;
use crate::sim::CollisionMode;

/// Errors loading a settings file
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid settings JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Target box defaults (geometry and material)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetSettings {
    pub width: f32,
    pub height: f32,
    pub mass: f32,
    pub color: u32,
    pub elasticity: f32,
    pub hardness: f32,
    pub thickness: f32,
}

impl Default for TargetSettings {
    fn default() -> Self {
        Self {
            width: TARGET_WIDTH,
            height: TARGET_HEIGHT,
            mass: TARGET_MASS,
            color: TARGET_COLOR,
            elasticity: TARGET_ELASTICITY,
            hardness: TARGET_HARDNESS,
            thickness: TARGET_THICKNESS,
        }
    }
}

/// Engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimSettings {
    pub canvas_width: f32,
    pub canvas_height: f32,
    /// Multiplier applied to wall-clock frame time
    pub time_scale: f32,
    /// Fraction of velocity kept on a wall bounce (0.0 - 1.0)
    pub wall_elasticity: f32,
    pub mode: CollisionMode,
    /// Seed for the projectile color palette
    pub seed: u64,
    pub target: TargetSettings,
}

impl Default for SimSettings {
    fn default() -> Self {
        Self {
            canvas_width: CANVAS_WIDTH,
            canvas_height: CANVAS_HEIGHT,
            time_scale: 1.0,
            wall_elasticity: WALL_ELASTICITY,
            mode: CollisionMode::Bullet,
            seed: 0x5eed,
            target: TargetSettings::default(),
        }
    }
}

impl SimSettings {
    /// Parse settings from a JSON string
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
