//! Archetype constructors.
//!
//! Every spawn resolves its visual first and fails with
//! [`EngineError::MissingVisual`] before touching the store, so a failed
//! spawn never leaves a half-built entity behind. Heights follow the
//! sprite's aspect ratio; velocities are given in units per second and
//! stored per tick.

use swarm_ecs::prelude::*;
use tracing::warn;

use crate::components::{
    AlienBehavior, AlienBossStatus, AlienStatus, Damage, EffectSlot, Geometry, Graphics, Health,
    Identity, PlayerBehavior, PlayerStatus, Position, Velocity,
};
use crate::consts::{self, visual};
use crate::effects::{Completion, Effect};
use crate::services::{VisualHandle, VisualProvider};
use crate::EngineError;

/// Alien to place in the formation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlienSpawn<'a> {
    pub visual: &'a str,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    /// Anchor offset from the formation origin.
    pub slot_x: f32,
    pub slot_y: f32,
    pub behavior: AlienBehavior,
}

/// Boss crossing the scene horizontally.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BossSpawn {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    /// +1 to fly rightwards, -1 leftwards.
    pub direction: f32,
    pub behavior: AlienBehavior,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissileKind {
    /// Travels up, hurts aliens.
    Player,
    /// Travels down, hurts the player.
    Alien,
}

/// Builds entities from archetypes and hands out numeric ids.
#[derive(Debug, Clone)]
pub struct EntityFactory {
    tick_rate: f64,
    next_id: u32,
}

impl EntityFactory {
    pub fn new(tick_rate: f64) -> Self {
        Self {
            tick_rate,
            next_id: 1,
        }
    }

    /// Restart numeric ids from 1.
    pub fn reset(&mut self) {
        self.next_id = 1;
    }

    fn per_tick(&self, per_second: f32) -> f32 {
        (per_second as f64 / self.tick_rate) as f32
    }

    fn identity(&mut self, tag: &str, notice_on_pruning: bool) -> Identity {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        Identity {
            id,
            tag: tag.to_owned(),
            active: true,
            notice_on_pruning,
        }
    }

    // -- archetypes ---------------------------------------------------------

    pub fn spawn_alien(
        &mut self,
        store: &mut ComponentStore,
        visuals: &dyn VisualProvider,
        spawn: &AlienSpawn<'_>,
    ) -> Result<EntityId, EngineError> {
        let handle = resolve(visuals, spawn.visual)?;
        let frames = visuals.frame_count(handle);
        let graphics = Graphics::new(handle)
            .with_effect(
                EffectSlot::Standard,
                Effect::animation(frames, consts::ANIMATION_TICKS_PER_FRAME)
                    .suspended()
                    .on_finish(Completion::ClearAnimating),
            )
            .with_effect(
                EffectSlot::Firing,
                Effect::animation(frames, consts::ANIMATION_TICKS_PER_FRAME)
                    .suspended()
                    .on_finish(Completion::FireShot),
            )
            .with_effect(
                EffectSlot::Dying,
                Effect::shrink(consts::SHRINK_TICKS)
                    .suspended()
                    .on_finish(Completion::Deactivate),
            );

        let entity = store.create();
        store.insert(entity, self.identity("alien", true))?;
        store.insert(entity, Position { x: spawn.x, y: spawn.y, z: consts::Z_ALIEN })?;
        store.insert(entity, Velocity::ZERO)?;
        store.insert(entity, geometry_for(visuals, handle, spawn.width))?;
        store.insert(entity, spawn.behavior)?;
        store.insert(
            entity,
            AlienStatus {
                formation_x: spawn.x,
                formation_y: spawn.y,
                slot_x: spawn.slot_x,
                slot_y: spawn.slot_y,
                ..Default::default()
            },
        )?;
        store.insert(entity, Health::full(consts::ALIEN_HIT_POINTS))?;
        store.insert(
            entity,
            Damage {
                points: 1,
                danger_to_aliens: false,
                danger_to_player: true,
                remove_on_hit: false,
            },
        )?;
        store.insert(entity, graphics)?;
        Ok(entity)
    }

    pub fn spawn_alien_boss(
        &mut self,
        store: &mut ComponentStore,
        visuals: &dyn VisualProvider,
        spawn: &BossSpawn,
    ) -> Result<EntityId, EngineError> {
        let handle = resolve(visuals, visual::BOSS)?;
        let frames = visuals.frame_count(handle);
        let graphics = Graphics::new(handle)
            .with_effect(
                EffectSlot::Standard,
                Effect::shift(0.0, consts::BOSS_BOB_AMPLITUDE, consts::BOSS_BOB_TICKS).looping(),
            )
            .with_effect(
                EffectSlot::Firing,
                Effect::animation(frames, consts::ANIMATION_TICKS_PER_FRAME)
                    .suspended()
                    .on_finish(Completion::FireShot),
            )
            .with_effect(
                EffectSlot::Dying,
                Effect::rotate(consts::SPIN_OUT_TURNS, consts::SPIN_OUT_TICKS)
                    .suspended()
                    .on_finish(Completion::Deactivate),
            );
        let speed = self.per_tick(consts::BOSS_SPEED);

        let entity = store.create();
        store.insert(entity, self.identity("alien_boss", true))?;
        store.insert(entity, Position { x: spawn.x, y: spawn.y, z: consts::Z_ALIEN })?;
        store.insert(entity, Velocity::toward(spawn.direction, 0.0, speed))?;
        store.insert(entity, geometry_for(visuals, handle, spawn.width))?;
        store.insert(entity, spawn.behavior)?;
        store.insert(entity, AlienBossStatus::default())?;
        store.insert(entity, Health::full(consts::BOSS_HIT_POINTS))?;
        store.insert(entity, graphics)?;
        Ok(entity)
    }

    pub fn spawn_player(
        &mut self,
        store: &mut ComponentStore,
        visuals: &dyn VisualProvider,
        x: f32,
        y: f32,
        width: f32,
        invulnerable_ticks: u32,
    ) -> Result<EntityId, EngineError> {
        let handle = resolve(visuals, visual::PLAYER)?;
        let graphics = Graphics::new(handle)
            .with_effect(
                EffectSlot::Standard,
                Effect::blink(consts::BLINK_PERIOD_TICKS, invulnerable_ticks)
                    .suspended()
                    .on_finish(Completion::ClearInvulnerable),
            )
            .with_effect(
                EffectSlot::Dying,
                Effect::shrink(consts::SHRINK_TICKS)
                    .suspended()
                    .on_finish(Completion::Deactivate),
            );

        let entity = store.create();
        store.insert(entity, self.identity("player", true))?;
        store.insert(entity, Position { x, y, z: consts::Z_PLAYER })?;
        store.insert(entity, Velocity::ZERO)?;
        store.insert(entity, geometry_for(visuals, handle, width))?;
        store.insert(entity, PlayerBehavior)?;
        store.insert(entity, PlayerStatus::default())?;
        store.insert(entity, Health::full(consts::PLAYER_HIT_POINTS))?;
        store.insert(entity, graphics)?;
        Ok(entity)
    }

    /// Missile centered on `(x, y)`.
    pub fn spawn_missile(
        &mut self,
        store: &mut ComponentStore,
        visuals: &dyn VisualProvider,
        kind: MissileKind,
        x: f32,
        y: f32,
    ) -> Result<EntityId, EngineError> {
        let (id, tag, dir_y, speed, damage) = match kind {
            MissileKind::Player => (
                visual::PLAYER_MISSILE,
                "player_missile",
                -1.0,
                consts::PLAYER_MISSILE_SPEED,
                Damage {
                    points: 1,
                    danger_to_aliens: true,
                    danger_to_player: false,
                    remove_on_hit: true,
                },
            ),
            MissileKind::Alien => (
                visual::ALIEN_MISSILE,
                "alien_missile",
                1.0,
                consts::ALIEN_MISSILE_SPEED,
                Damage {
                    points: 1,
                    danger_to_aliens: false,
                    danger_to_player: true,
                    remove_on_hit: true,
                },
            ),
        };
        let handle = resolve(visuals, id)?;
        let frames = visuals.frame_count(handle);
        let graphics = Graphics::new(handle).with_effect(
            EffectSlot::Standard,
            Effect::animation(frames, consts::ANIMATION_TICKS_PER_FRAME).looping(),
        );
        let speed = self.per_tick(speed);

        let entity = store.create();
        store.insert(entity, self.identity(tag, false))?;
        store.insert(entity, Position { x, y, z: consts::Z_MISSILE })?;
        store.insert(entity, Velocity::toward(0.0, dir_y, speed))?;
        store.insert(entity, geometry_for(visuals, handle, consts::MISSILE_WIDTH))?;
        store.insert(entity, damage)?;
        store.insert(entity, graphics)?;
        Ok(entity)
    }

    /// One-shot explosion that deactivates itself when its animation ends.
    pub fn spawn_explosion(
        &mut self,
        store: &mut ComponentStore,
        visuals: &dyn VisualProvider,
        x: f32,
        y: f32,
        width: f32,
        velocity: Velocity,
    ) -> Result<EntityId, EngineError> {
        let handle = resolve(visuals, visual::EXPLOSION)?;
        let frames = visuals.frame_count(handle);
        let graphics = Graphics::new(handle).with_effect(
            EffectSlot::Standard,
            Effect::animation(frames, consts::EXPLOSION_TICKS_PER_FRAME)
                .on_finish(Completion::Deactivate),
        );

        let entity = store.create();
        store.insert(entity, self.identity("explosion", false))?;
        store.insert(entity, Position { x, y, z: consts::Z_EXPLOSION })?;
        store.insert(entity, velocity)?;
        store.insert(entity, geometry_for(visuals, handle, width))?;
        store.insert(entity, graphics)?;
        Ok(entity)
    }
}

fn resolve(visuals: &dyn VisualProvider, id: &str) -> Result<VisualHandle, EngineError> {
    visuals.resolve(id).ok_or_else(|| {
        warn!(visual = id, "visual resource missing, spawn skipped");
        EngineError::MissingVisual { id: id.to_owned() }
    })
}

/// Geometry of `width` with the height following the sprite's aspect ratio.
/// A sprite without a size is treated as square.
fn geometry_for(visuals: &dyn VisualProvider, visual: VisualHandle, width: f32) -> Geometry {
    let (w, h) = visuals.natural_size(visual);
    let height = if w == 0 {
        width
    } else {
        width * h as f32 / w as f32
    };
    Geometry { width, height }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Tunables;
    use crate::services::{Sprite, SpriteAtlas};

    fn behavior() -> AlienBehavior {
        let t = Tunables::default();
        AlienBehavior {
            animation_probability: t.animation_probability,
            shoot_probability: t.shoot_probability,
            raid_probability: t.raid_probability,
            raid_shoot_probability: t.raid_shoot_probability,
            score: 10,
        }
    }

    #[test]
    fn alien_height_follows_aspect_and_anchor_matches_position() {
        let mut store = ComponentStore::new();
        let atlas = SpriteAtlas::arcade();
        let mut factory = EntityFactory::new(60.0);
        let alien = factory
            .spawn_alien(
                &mut store,
                &atlas,
                &AlienSpawn {
                    visual: visual::ALIEN_SCOUT,
                    x: 100.0,
                    y: 50.0,
                    width: 32.0,
                    slot_x: 20.0,
                    slot_y: 10.0,
                    behavior: behavior(),
                },
            )
            .unwrap();

        assert_eq!(store.get::<Geometry>(alien).unwrap().height, 24.0);
        let status = store.get::<AlienStatus>(alien).unwrap();
        assert_eq!((status.formation_x, status.formation_y), (100.0, 50.0));
        assert_eq!((status.slot_x, status.slot_y), (20.0, 10.0));
        assert!(store.get::<Identity>(alien).unwrap().notice_on_pruning);
        let gfx = store.get::<Graphics>(alien).unwrap();
        assert!(!gfx.slot(EffectSlot::Standard).unwrap().is_running());
        assert!(!gfx.slot(EffectSlot::Dying).unwrap().is_running());
    }

    #[test]
    fn missile_velocity_is_per_tick() {
        let mut store = ComponentStore::new();
        let atlas = SpriteAtlas::arcade();
        let mut factory = EntityFactory::new(60.0);
        let shot = factory
            .spawn_missile(&mut store, &atlas, MissileKind::Player, 10.0, 400.0)
            .unwrap();

        let vel = store.get::<Velocity>(shot).unwrap();
        assert_eq!(vel.dx, 0.0);
        assert!((vel.dy + consts::PLAYER_MISSILE_SPEED / 60.0).abs() < 1e-4);
        let damage = store.get::<Damage>(shot).unwrap();
        assert!(damage.danger_to_aliens && damage.remove_on_hit);
        assert!(!store.get::<Identity>(shot).unwrap().notice_on_pruning);
    }

    #[test]
    fn missing_visual_is_reported_without_spawning() {
        let mut store = ComponentStore::new();
        let atlas = SpriteAtlas::new();
        let mut factory = EntityFactory::new(60.0);
        let err = factory
            .spawn_explosion(&mut store, &atlas, 0.0, 0.0, 10.0, Velocity::ZERO)
            .unwrap_err();
        assert!(matches!(err, EngineError::MissingVisual { ref id } if id == visual::EXPLOSION));
        assert_eq!(store.entity_count(), 0);
    }

    #[test]
    fn boss_moves_in_given_direction() {
        let mut store = ComponentStore::new();
        let atlas = SpriteAtlas::arcade();
        let mut factory = EntityFactory::new(50.0);
        let boss = factory
            .spawn_alien_boss(
                &mut store,
                &atlas,
                &BossSpawn {
                    x: 0.0,
                    y: 20.0,
                    width: 64.0,
                    direction: -1.0,
                    behavior: behavior(),
                },
            )
            .unwrap();
        let vel = store.get::<Velocity>(boss).unwrap();
        assert!((vel.dx + consts::BOSS_SPEED / 50.0).abs() < 1e-4);
        assert_eq!(store.get::<Geometry>(boss).unwrap().height, 28.0);
        assert!(store.get::<Graphics>(boss).unwrap().standard.unwrap().is_running());
    }

    #[test]
    fn ids_are_sequential_until_reset() {
        let mut store = ComponentStore::new();
        let mut atlas = SpriteAtlas::new();
        atlas.insert(visual::EXPLOSION, Sprite::solid(4, 4, 2));
        let mut factory = EntityFactory::new(60.0);
        let a = factory
            .spawn_explosion(&mut store, &atlas, 0.0, 0.0, 4.0, Velocity::ZERO)
            .unwrap();
        let b = factory
            .spawn_explosion(&mut store, &atlas, 0.0, 0.0, 4.0, Velocity::ZERO)
            .unwrap();
        factory.reset();
        let c = factory
            .spawn_explosion(&mut store, &atlas, 0.0, 0.0, 4.0, Velocity::ZERO)
            .unwrap();
        let id = |e| store.get::<Identity>(e).unwrap().id;
        assert_eq!((id(a), id(b), id(c)), (1, 2, 1));
    }
}
