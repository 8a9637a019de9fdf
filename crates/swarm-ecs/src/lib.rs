//! Swarm ECS -- generational entity table with sparse per-kind components.
//!
//! This crate is the Component Store of the Swarm engine. Entities are opaque
//! generational handles; all state lives in components, one sparse column per
//! component kind. Destroying an entity bumps its slot generation so stale
//! handles fail safely instead of aliasing a reused slot.
//!
//! # Quick Start
//!
//! ```
//! use swarm_ecs::prelude::*;
//!
//! #[derive(Debug, Clone, PartialEq, serde::Serialize)]
//! struct Position { x: f32, y: f32 }
//!
//! impl Component for Position {
//!     const NAME: &'static str = "position";
//! }
//!
//! let mut store = ComponentStore::new();
//! let entity = store.create();
//! store.insert(entity, Position { x: 0.0, y: 0.0 }).unwrap();
//!
//! assert_eq!(store.get::<Position>(entity), Some(&Position { x: 0.0, y: 0.0 }));
//! store.destroy(entity).unwrap();
//! assert!(store.get::<Position>(entity).is_none());
//! ```

#![deny(unsafe_code)]

pub mod component;
pub mod entity;
pub mod store;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EcsError {
    /// The entity does not exist (stale generation or never allocated).
    #[error("entity {entity:?} does not exist (stale or never allocated)")]
    StaleEntity { entity: entity::EntityId },

    /// The entity is alive but lacks a component the caller requires.
    #[error("entity {entity:?} has no '{component}' component")]
    MissingComponent {
        entity: entity::EntityId,
        component: &'static str,
    },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::component::{Component, ComponentColumn};
    pub use crate::entity::EntityId;
    pub use crate::store::ComponentStore;
    pub use crate::EcsError;
}

// ---------------------------------------------------------------------------
// Integration Tests
// ---------------------------------------------------------------------------
