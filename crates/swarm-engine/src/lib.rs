//! Swarm Engine -- arcade-shooter simulation core.
//!
//! This crate builds on [`swarm_ecs`] to provide the game: an alien
//! formation that sweeps and descends, raiding aliens, a boss, a player ship
//! steered by control input, pixel-exact collisions and the scene state
//! machine that ties them together. Rendering, audio and randomness are
//! injected through the traits in [`services`], so the whole simulation runs
//! headless and deterministic under a seeded random source.
//!
//! # Quick Start
//!
//! ```
//! use swarm_engine::prelude::*;
//!
//! let mut scene = SceneController::new(
//!     Settings::default(),
//!     SpriteAtlas::arcade(),
//!     AudioLog::new(),
//!     PcgRandom::seeded(42),
//! )
//! .unwrap();
//! scene.reset(0);
//!
//! assert!(matches!(scene.phase(), ScenePhase::PlayerEntry(_)));
//!
//! for tick in 0..200 {
//!     scene.render_actual_scene(tick, ControlState::FIRE, 0);
//! }
//!
//! assert!(!scene.game_over());
//! assert_eq!(scene.level(), 1);
//! ```

#![deny(unsafe_code)]

use std::path::PathBuf;

pub mod collision;
pub mod components;
pub mod config;
pub mod consts;
pub mod effects;
pub mod events;
pub mod factory;
pub mod formation;
pub mod input;
pub mod pipeline;
pub mod processors;
pub mod scene;
pub mod services;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

/// Re-export the ECS crate for convenience.
pub use swarm_ecs;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A visual resource id could not be resolved by the visual provider.
    #[error("visual resource '{id}' is not available")]
    MissingVisual { id: String },

    /// Settings failed validation.
    #[error("invalid settings: {reason}")]
    InvalidSettings { reason: String },

    /// The settings file could not be read.
    #[error("cannot read settings from {path:?}")]
    SettingsIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The settings file is not valid JSON for [`config::Settings`].
    #[error("cannot parse settings: {0}")]
    SettingsParse(#[from] serde_json::Error),

    /// A store operation failed.
    #[error(transparent)]
    Ecs(#[from] swarm_ecs::EcsError),
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for hosts.
pub mod prelude {
    pub use swarm_ecs::prelude::*;

    pub use crate::components::{
        AlienBossStatus, AlienStatus, Geometry, Graphics, Health, Identity, PlayerStatus,
        Position, Velocity,
    };
    pub use crate::config::{Settings, Tunables};
    pub use crate::input::{ControlInput, ControlState};
    pub use crate::pipeline::{Pipeline, PipelineDiagnostics};
    pub use crate::processors::ProcessorKind;
    pub use crate::scene::{ScenePhase, SceneController};
    pub use crate::services::{
        AudioLog, AudioProvider, Caption, PcgRandom, RandomSource, SpriteAtlas, VisualProvider,
    };
    pub use crate::EngineError;
}
