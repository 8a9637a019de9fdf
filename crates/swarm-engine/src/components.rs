//! Component kinds attached to scene entities.
//!
//! Every actor is assembled from these by the [`EntityFactory`](crate::factory::EntityFactory).
//! Status components double as kind markers: an entity with [`AlienStatus`]
//! is a formation alien, one with [`AlienBossStatus`] is the boss, and one
//! with [`PlayerStatus`] is the player. Everything else (missiles, explosions)
//! is [`ActorKind::Other`].

use serde::Serialize;
use swarm_ecs::prelude::*;

use crate::effects::{Effect, VisualState};
use crate::events::EventQueue;
use crate::services::VisualHandle;

/// Numeric id, tag, liveness flag, and whether pruning is reported back to
/// the scene.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Identity {
    pub id: u32,
    pub tag: String,
    /// Inactive entities are destroyed by the garbage collector next tick.
    pub active: bool,
    pub notice_on_pruning: bool,
}

/// Center of the entity. `z` is the depth level used for draw ordering.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Per-tick displacement.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Velocity {
    pub dx: f32,
    pub dy: f32,
    pub dz: f32,
}

impl Velocity {
    pub const ZERO: Self = Self {
        dx: 0.0,
        dy: 0.0,
        dz: 0.0,
    };

    /// `speed` along the direction of `(dx, dy)`; zero for a zero direction.
    pub fn toward(dx: f32, dy: f32, speed: f32) -> Self {
        let len = (dx * dx + dy * dy).sqrt();
        if len <= f32::EPSILON {
            return Self::ZERO;
        }
        Self {
            dx: dx / len * speed,
            dy: dy / len * speed,
            dz: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Geometry {
    pub width: f32,
    pub height: f32,
}

/// Per-alien behaviour parameters, copied from the tunables at spawn time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AlienBehavior {
    pub animation_probability: f64,
    pub shoot_probability: f64,
    pub raid_probability: f64,
    pub raid_shoot_probability: f64,
    pub score: u32,
}

/// State of a formation alien.
///
/// `formation_x`/`formation_y` is the anchor: where the alien sits while in
/// formation. `slot_x`/`slot_y` is the fixed offset of that anchor from the
/// formation origin, used to find the way home after a raid.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct AlienStatus {
    pub is_animating: bool,
    pub is_firing: bool,
    pub is_shoot_requested: bool,
    pub is_dying: bool,
    pub is_in_raid: bool,
    pub is_returning_to_formation: bool,
    pub raid_ticks_left: u32,
    pub formation_x: f32,
    pub formation_y: f32,
    pub slot_x: f32,
    pub slot_y: f32,
}

impl AlienStatus {
    /// Flying on its own velocity instead of with the formation.
    pub fn is_detached(&self) -> bool {
        self.is_in_raid || self.is_returning_to_formation
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct AlienBossStatus {
    pub is_animating: bool,
    pub is_firing: bool,
    pub is_shoot_requested: bool,
    pub is_dying: bool,
}

/// Marks the entity steered by control input.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PlayerBehavior;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PlayerStatus {
    pub is_invulnerable: bool,
    pub is_shoot_requested: bool,
    pub is_dying: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Health {
    pub current: u32,
    pub max: u32,
}

impl Health {
    pub fn full(max: u32) -> Self {
        Self { current: max, max }
    }
}

/// Harm done on contact and to whom.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Damage {
    pub points: u32,
    pub danger_to_aliens: bool,
    pub danger_to_player: bool,
    /// The source is spent by its first hit.
    pub remove_on_hit: bool,
}

// ---------------------------------------------------------------------------
// Graphics
// ---------------------------------------------------------------------------

/// Which of the three effect slots of a [`Graphics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectSlot {
    Standard,
    Firing,
    Dying,
}

/// Visual resource, base frame, effect slots and the private animation clock.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Graphics {
    pub visual: VisualHandle,
    pub frame: u32,
    pub standard: Option<Effect>,
    pub firing: Option<Effect>,
    pub dying: Option<Effect>,
    pub hidden: bool,
    pub state: VisualState,
    local_tick: u64,
}

impl Graphics {
    pub fn new(visual: VisualHandle) -> Self {
        Self {
            visual,
            frame: 0,
            standard: None,
            firing: None,
            dying: None,
            hidden: false,
            state: VisualState::default(),
            local_tick: 0,
        }
    }

    pub fn with_effect(mut self, slot: EffectSlot, effect: Effect) -> Self {
        *self.slot_mut(slot) = Some(effect);
        self
    }

    pub fn local_tick(&self) -> u64 {
        self.local_tick
    }

    /// Rewind the private clock to zero.
    pub fn reset_clock(&mut self) {
        self.local_tick = 0;
    }

    pub fn slot(&self, slot: EffectSlot) -> Option<&Effect> {
        match slot {
            EffectSlot::Standard => self.standard.as_ref(),
            EffectSlot::Firing => self.firing.as_ref(),
            EffectSlot::Dying => self.dying.as_ref(),
        }
    }

    fn slot_mut(&mut self, slot: EffectSlot) -> &mut Option<Effect> {
        match slot {
            EffectSlot::Standard => &mut self.standard,
            EffectSlot::Firing => &mut self.firing,
            EffectSlot::Dying => &mut self.dying,
        }
    }

    /// Restart the effect in `slot` from the current clock. Returns false
    /// when the slot is empty.
    pub fn restart(&mut self, slot: EffectSlot) -> bool {
        let now = self.local_tick;
        match self.slot_mut(slot) {
            Some(effect) => {
                effect.restart(now);
                true
            }
            None => false,
        }
    }

    /// Advance the clock one tick and apply every effect slot, queueing the
    /// completion of each effect that finishes on this tick.
    pub fn advance(&mut self, entity: EntityId, events: &mut EventQueue) {
        self.local_tick += 1;
        let now = self.local_tick;
        let state = &mut self.state;
        for effect in [&mut self.standard, &mut self.firing, &mut self.dying]
            .into_iter()
            .flatten()
        {
            if effect.apply(state, now) {
                events.effect_finished(entity, effect.completion);
            }
        }
    }

    /// Drawn this frame: not hidden and not in the dark half of a blink.
    pub fn is_drawn(&self) -> bool {
        !self.hidden && self.state.shown
    }
}

// ---------------------------------------------------------------------------
// Component registrations
// ---------------------------------------------------------------------------

macro_rules! component {
    ($($ty:ty => $name:literal),* $(,)?) => {
        $(impl Component for $ty {
            const NAME: &'static str = $name;
        })*
    };
}

component! {
    Identity => "identity",
    Position => "position",
    Velocity => "velocity",
    Geometry => "geometry",
    AlienBehavior => "alien_behavior",
    AlienStatus => "alien_status",
    AlienBossStatus => "alien_boss_status",
    PlayerBehavior => "player_behavior",
    PlayerStatus => "player_status",
    Health => "health",
    Damage => "damage",
    Graphics => "graphics",
}

// ---------------------------------------------------------------------------
// Kind queries
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorKind {
    Player,
    Alien,
    Boss,
    Other,
}

pub fn actor_kind(store: &ComponentStore, entity: EntityId) -> ActorKind {
    if store.has::<PlayerStatus>(entity) {
        ActorKind::Player
    } else if store.has::<AlienStatus>(entity) {
        ActorKind::Alien
    } else if store.has::<AlienBossStatus>(entity) {
        ActorKind::Boss
    } else {
        ActorKind::Other
    }
}

/// Whether the entity's status marks it as dying. Entities without a status
/// component never die, they are only deactivated.
pub fn is_dying(store: &ComponentStore, entity: EntityId) -> bool {
    store.get::<AlienStatus>(entity).is_some_and(|s| s.is_dying)
        || store.get::<AlienBossStatus>(entity).is_some_and(|s| s.is_dying)
        || store.get::<PlayerStatus>(entity).is_some_and(|s| s.is_dying)
}

pub fn is_active(store: &ComponentStore, entity: EntityId) -> bool {
    store.get::<Identity>(entity).is_some_and(|i| i.active)
}

/// Mark an entity for pruning. Returns false for stale or identity-less
/// entities.
pub fn deactivate(store: &mut ComponentStore, entity: EntityId) -> bool {
    match store.get_mut::<Identity>(entity) {
        Some(identity) => {
            identity.active = false;
            true
        }
        None => false,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
