//! Run configuration.
//!
//! [`Settings`] is fixed for the lifetime of a [`SceneController`](crate::scene::SceneController)
//! and may be loaded from JSON. [`Tunables`] are the difficulty parameters
//! that start from their defaults on reset and are scaled every time a swarm
//! is cleared.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::EngineError;

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Host-provided settings. Missing JSON fields fall back to [`Default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Simulation ticks per second. Every per-second quantity is divided by it.
    pub tick_rate: f64,
    pub scene_width: f32,
    pub scene_height: f32,
    /// Ships at the start of a run, the one in play included.
    pub initial_lives: u32,
    pub ammo_capacity: u32,
    /// Seconds to reload one round.
    pub reload_time: f64,
    /// Factor applied to the level multiplier and difficulty each new swarm.
    pub difficulty_buildup: f64,
    /// Stop an eliminated actor in place instead of letting it drift.
    pub zero_velocity_on_explosion: bool,
    /// Player speed in scene units per second.
    pub player_speed: f32,
    pub player_width: f32,
    /// Seconds the formation descends after touching a side wall.
    pub descend_time: f64,
    /// Share of the scene height below which the formation stops descending.
    pub bottom_guard_ratio: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tick_rate: 60.0,
            scene_width: 640.0,
            scene_height: 480.0,
            initial_lives: 3,
            ammo_capacity: 4,
            reload_time: 0.4,
            difficulty_buildup: 1.15,
            zero_velocity_on_explosion: false,
            player_speed: 240.0,
            player_width: 36.0,
            descend_time: 0.25,
            bottom_guard_ratio: 0.7,
        }
    }
}

impl Settings {
    /// Parse settings from a JSON document and validate them.
    pub fn from_json_str(json: &str) -> Result<Self, EngineError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Read and parse a JSON settings file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| EngineError::SettingsIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Reject values the simulation cannot run with.
    pub fn validate(&self) -> Result<(), EngineError> {
        fn invalid(reason: String) -> Result<(), EngineError> {
            Err(EngineError::InvalidSettings { reason })
        }

        if !(self.tick_rate.is_finite() && self.tick_rate > 0.0) {
            return invalid(format!("tick_rate must be positive, got {}", self.tick_rate));
        }
        if !(self.scene_width.is_finite()
            && self.scene_height.is_finite()
            && self.scene_width > 0.0
            && self.scene_height > 0.0)
        {
            return invalid(format!(
                "scene must have a positive finite size, got {}x{}",
                self.scene_width, self.scene_height
            ));
        }
        if self.initial_lives == 0 {
            return invalid("initial_lives must be at least 1".to_owned());
        }
        if self.ammo_capacity == 0 {
            return invalid("ammo_capacity must be at least 1".to_owned());
        }
        if !(self.reload_time.is_finite() && self.reload_time >= 0.0) {
            return invalid(format!("reload_time must be >= 0, got {}", self.reload_time));
        }
        if !(self.difficulty_buildup.is_finite() && self.difficulty_buildup >= 1.0) {
            return invalid(format!(
                "difficulty_buildup must be >= 1, got {}",
                self.difficulty_buildup
            ));
        }
        if !(self.player_width > 0.0 && self.player_width < self.scene_width) {
            return invalid(format!(
                "player_width must be inside (0, scene_width), got {}",
                self.player_width
            ));
        }
        if !(self.descend_time.is_finite() && self.descend_time > 0.0) {
            return invalid(format!("descend_time must be positive, got {}", self.descend_time));
        }
        if !(self.bottom_guard_ratio > 0.0 && self.bottom_guard_ratio <= 1.0) {
            return invalid(format!(
                "bottom_guard_ratio must be in (0, 1], got {}",
                self.bottom_guard_ratio
            ));
        }
        Ok(())
    }

    /// Seconds per tick.
    pub fn dt(&self) -> f64 {
        1.0 / self.tick_rate
    }

    /// Whole ticks covering `seconds`, rounded up.
    pub fn ticks_for(&self, seconds: f64) -> u32 {
        (seconds * self.tick_rate).ceil().max(0.0) as u32
    }

    /// Convert a per-second speed into a per-tick step.
    pub fn per_tick(&self, per_second: f32) -> f32 {
        (per_second as f64 / self.tick_rate) as f32
    }
}

// ---------------------------------------------------------------------------
// Tunables
// ---------------------------------------------------------------------------

/// Difficulty parameters, rebuilt on reset and scaled on every new swarm.
///
/// Probabilities are per alien per tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tunables {
    pub level: u32,
    pub level_multiplier: f64,
    /// Formation speed in scene units per second, before the speedup factor.
    pub alien_speed: f32,
    /// Multiplier on the formation speed.
    pub speedup_factor: f32,
    pub animation_probability: f64,
    pub shoot_probability: f64,
    pub raid_probability: f64,
    pub raid_shoot_probability: f64,
    pub boss_probability: f64,
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            level: 1,
            level_multiplier: 1.0,
            alien_speed: 30.0,
            speedup_factor: 1.0,
            animation_probability: 0.004,
            shoot_probability: 0.0006,
            raid_probability: 0.0003,
            raid_shoot_probability: 0.01,
            boss_probability: 0.0008,
        }
    }
}

impl Tunables {
    /// Move to the next level, scaling the multiplier, formation speed and
    /// alien aggression by `buildup`. Probabilities saturate at 1.
    pub fn advance_level(&mut self, buildup: f64) {
        self.level += 1;
        self.level_multiplier *= buildup;
        self.speedup_factor *= buildup as f32;
        self.shoot_probability = (self.shoot_probability * buildup).min(1.0);
        self.raid_probability = (self.raid_probability * buildup).min(1.0);
        self.raid_shoot_probability = (self.raid_shoot_probability * buildup).min(1.0);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
