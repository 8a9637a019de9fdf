//! The scene controller: owns the store and drives one game tick at a time.
//!
//! The [`SceneController`] is the only owner of the [`ComponentStore`]. Each
//! call to [`render_actual_scene`](SceneController::render_actual_scene)
//!
//! 1. starts a new frame on the visual provider,
//! 2. regenerates the swarm if the last one was cleared,
//! 3. advances the player entry sequence if one is running,
//! 4. runs the processor pipeline,
//! 5. resolves the collision pairs the pipeline found,
//! 6. drains the event queue (effect completions and prune notices).
//!
//! Nothing raised inside a tick escapes it: failed spawns and wrongly shaped
//! entities are logged and skipped.

use swarm_ecs::prelude::*;
use tracing::{debug, info, warn};

use crate::collision::CollisionPair;
use crate::components::{
    actor_kind, deactivate, is_dying, ActorKind, AlienBossStatus, AlienStatus, Damage,
    EffectSlot, Geometry, Graphics, Health, Identity, PlayerStatus, Position, Velocity,
};
use crate::config::{Settings, Tunables};
use crate::consts::{self, sound};
use crate::effects::Completion;
use crate::events::{EventQueue, PruneNotice, PrunedKind, SimEvent};
use crate::factory::{AlienSpawn, EntityFactory};
use crate::formation::{layout_formation, FormationState, SharedState, FORMATION_LAYOUT};
use crate::input::{ControlInput, ControlState};
use crate::pipeline::{Pipeline, PipelineDiagnostics};
use crate::processors::{ProcessorKind, TickContext};
use crate::services::{AudioProvider, Caption, RandomSource, VisualProvider};
use crate::EngineError;

/// Processors held back while the player is being brought in.
const ENTRY_SUSPENDED: [ProcessorKind; 4] = [
    ProcessorKind::AlienBoundsGuard,
    ProcessorKind::PlayerSpeedUpdater,
    ProcessorKind::PlayerFireUpdater,
    ProcessorKind::SpecialActorSpawner,
];

// ---------------------------------------------------------------------------
// ScenePhase
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenePhase {
    /// Building the formation.
    Generating,
    /// Bringing the player in; the caption shows the sub-phase.
    PlayerEntry(Caption),
    Active,
    /// Every formation alien is gone; the next tick starts a new swarm.
    SwarmCleared,
    GameOver,
}

// ---------------------------------------------------------------------------
// SceneController
// ---------------------------------------------------------------------------

/// Owns the simulation and its injected services.
///
/// Call [`reset`](Self::reset) once before the first tick.
pub struct SceneController<V, A, R> {
    settings: Settings,
    tunables: Tunables,
    store: ComponentStore,
    factory: EntityFactory,
    pipeline: Pipeline,
    shared: SharedState,
    events: EventQueue,
    collisions: Vec<CollisionPair>,
    visuals: V,
    audio: A,
    rng: R,
    phase: ScenePhase,
    entry_started_at: u64,
    player: Option<EntityId>,
    score: u32,
    lives: u32,
    outstanding_aliens: u32,
    current_tick: u64,
}

impl<V, A, R> SceneController<V, A, R>
where
    V: VisualProvider,
    A: AudioProvider,
    R: RandomSource,
{
    /// Validate `settings` and build an empty scene.
    pub fn new(settings: Settings, visuals: V, audio: A, rng: R) -> Result<Self, EngineError> {
        settings.validate()?;
        Ok(Self {
            factory: EntityFactory::new(settings.tick_rate),
            shared: SharedState {
                ammo: settings.ammo_capacity,
                ..Default::default()
            },
            lives: settings.initial_lives,
            settings,
            tunables: Tunables::default(),
            store: ComponentStore::new(),
            pipeline: Pipeline::new(),
            events: EventQueue::default(),
            collisions: Vec::new(),
            visuals,
            audio,
            rng,
            phase: ScenePhase::Generating,
            entry_started_at: 0,
            player: None,
            score: 0,
            outstanding_aliens: 0,
            current_tick: 0,
        })
    }

    // -- host operations ----------------------------------------------------

    /// Start a fresh game at `tick`: empty store, level 1, full lives and
    /// ammo, a new formation and the player entry sequence.
    pub fn reset(&mut self, tick: u64) {
        self.store.clear();
        self.factory.reset();
        self.events.clear();
        self.collisions.clear();
        self.pipeline.reset_all();
        self.tunables = Tunables::default();
        self.shared = SharedState {
            ammo: self.settings.ammo_capacity,
            ..Default::default()
        };
        self.score = 0;
        self.lives = self.settings.initial_lives;
        self.player = None;
        self.current_tick = tick;
        self.audio.stop(sound::BOSS_SIREN);
        info!(tick, lives = self.lives, "scene reset");

        self.generate_new_scene();
        self.begin_player_entry(tick);
    }

    /// Lay out and spawn the alien formation for the current level. Returns
    /// how many aliens were placed.
    pub fn generate_new_scene(&mut self) -> u32 {
        self.phase = ScenePhase::Generating;
        let (origin, slots) = layout_formation(FORMATION_LAYOUT, &self.settings, &self.tunables);
        self.shared.formation = FormationState::at(origin);

        let mut placed = 0;
        for slot in &slots {
            let spawn = AlienSpawn {
                visual: slot.visual,
                x: origin.0 + slot.slot_x,
                y: origin.1 + slot.slot_y,
                width: slot.width,
                slot_x: slot.slot_x,
                slot_y: slot.slot_y,
                behavior: slot.behavior,
            };
            match self.factory.spawn_alien(&mut self.store, &self.visuals, &spawn) {
                Ok(_) => placed += 1,
                Err(err) => warn!(%err, "alien left out of the formation"),
            }
        }
        self.outstanding_aliens = placed;
        info!(level = self.tunables.level, aliens = placed, "swarm generated");
        placed
    }

    /// Spawn the player at its start position, vulnerable. Returns the live
    /// player instead if there already is one.
    pub fn spawn_player(&mut self) -> Result<EntityId, EngineError> {
        if let Some(player) = self.live_player() {
            return Ok(player);
        }
        let (x, y) = self.player_start();
        let invulnerable_ticks = self.settings.ticks_for(consts::INVULNERABLE_SECONDS);
        let player = self.factory.spawn_player(
            &mut self.store,
            &self.visuals,
            x,
            y,
            self.settings.player_width,
            invulnerable_ticks,
        )?;
        self.player = Some(player);
        debug!(entity = %player, "player spawned");
        Ok(player)
    }

    /// Run one scene tick. Returns false once the game is over.
    pub fn render_actual_scene(&mut self, tick: u64, state: ControlState, value: i32) -> bool {
        self.current_tick = tick;
        self.visuals.begin_frame();

        if self.phase == ScenePhase::SwarmCleared {
            self.new_swarm(tick);
        }
        self.player_entry_processing(tick);

        self.run_pipeline(ControlInput::new(state, value));
        self.resolve_collisions();
        self.process_events();

        !self.game_over()
    }

    /// Advance the player entry sequence: show the caption for the current
    /// sub-phase, or finish the entry once all three have elapsed. Returns
    /// true while the entry is still running.
    pub fn player_entry_processing(&mut self, tick: u64) -> bool {
        let ScenePhase::PlayerEntry(_) = self.phase else {
            return false;
        };
        let phase_ticks = u64::from(self.settings.ticks_for(consts::ENTRY_PHASE_SECONDS).max(1));
        let caption = match tick.saturating_sub(self.entry_started_at) / phase_ticks {
            0 => Caption::Attention,
            1 => Caption::Ready,
            2 => Caption::Go,
            _ => {
                self.complete_player_entry();
                return false;
            }
        };
        self.phase = ScenePhase::PlayerEntry(caption);
        self.visuals.draw_caption(caption);
        true
    }

    /// True once the last life has been lost.
    pub fn game_over(&self) -> bool {
        self.phase == ScenePhase::GameOver
    }

    /// Points scored since the last reset.
    pub fn current_score(&self) -> u32 {
        self.score
    }

    // -- resolution ---------------------------------------------------------

    /// Apply one hit to a player, alien or boss. Returns true when the hit
    /// landed.
    pub fn eliminate_entity(&mut self, entity: EntityId) -> bool {
        let kind = actor_kind(&self.store, entity);
        if kind == ActorKind::Other {
            return false;
        }
        let invulnerable = self
            .store
            .get::<PlayerStatus>(entity)
            .is_some_and(|s| s.is_invulnerable);
        if invulnerable || is_dying(&self.store, entity) {
            return false;
        }
        let health = match self.store.require_mut::<Health>(entity) {
            Ok(health) => health,
            Err(err) => {
                warn!(%err, "hit on an entity without health ignored");
                return false;
            }
        };
        health.current = health.current.saturating_sub(1);
        if health.current > 0 {
            debug!(%entity, hit_points = health.current, "hit");
            return true;
        }

        self.mark_dying(entity);
        if self.settings.zero_velocity_on_explosion {
            if let Some(velocity) = self.store.get_mut::<Velocity>(entity) {
                *velocity = Velocity::ZERO;
            }
        }
        self.spawn_explosion_for(entity);

        let restarted = self
            .store
            .get_mut::<Graphics>(entity)
            .is_some_and(|g| g.restart(EffectSlot::Dying));
        if !restarted {
            deactivate(&mut self.store, entity);
        }

        self.audio.play_once(sound::EXPLOSION);
        if kind == ActorKind::Boss {
            self.audio.stop(sound::BOSS_SIREN);
        }
        debug!(%entity, ?kind, "eliminated");
        true
    }

    /// React to an entity the garbage collector just destroyed.
    pub fn entity_just_pruned(&mut self, notice: PruneNotice) {
        match notice.kind {
            PrunedKind::Player => {
                if self.player == Some(notice.entity) {
                    self.player = None;
                }
                self.lives = self.lives.saturating_sub(1);
                debug!(entity = %notice.entity, lives = self.lives, "player lost");
                if self.lives == 0 {
                    self.phase = ScenePhase::GameOver;
                    info!(score = self.score, level = self.tunables.level, "game over");
                } else if !matches!(self.phase, ScenePhase::SwarmCleared | ScenePhase::GameOver) {
                    self.begin_player_entry(self.current_tick);
                }
            }
            PrunedKind::Alien { score, eliminated } => {
                if eliminated {
                    self.score += score;
                }
                self.outstanding_aliens = self.outstanding_aliens.saturating_sub(1);
                debug!(id = notice.id, eliminated, left = self.outstanding_aliens, "alien pruned");
                if self.outstanding_aliens == 0 && self.phase != ScenePhase::GameOver {
                    self.phase = ScenePhase::SwarmCleared;
                    info!(level = self.tunables.level, score = self.score, "swarm cleared");
                }
            }
            PrunedKind::Boss { score, eliminated } => {
                if eliminated {
                    self.score += score;
                }
                self.audio.stop(sound::BOSS_SIREN);
                debug!(id = notice.id, eliminated, "boss pruned");
            }
            PrunedKind::Other => debug!(id = notice.id, "pruned"),
        }
    }

    /// Clear leftovers, advance the level and bring in a fresh formation.
    pub fn new_swarm(&mut self, tick: u64) {
        let strays: Vec<EntityId> = self
            .store
            .entities_with::<Identity>()
            .into_iter()
            .filter(|&e| actor_kind(&self.store, e) == ActorKind::Other)
            .collect();
        for entity in strays {
            deactivate(&mut self.store, entity);
        }

        self.tunables.advance_level(self.settings.difficulty_buildup);
        info!(
            level = self.tunables.level,
            multiplier = self.tunables.level_multiplier,
            "new swarm"
        );
        self.generate_new_scene();
        self.begin_player_entry(tick);
    }

    /// Hex blake3 digest of the store and the scene counters.
    pub fn state_hash(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.store.snapshot().to_string().as_bytes());
        hasher.update(&self.score.to_le_bytes());
        hasher.update(&self.lives.to_le_bytes());
        hasher.update(&self.tunables.level.to_le_bytes());
        hasher.update(&self.outstanding_aliens.to_le_bytes());
        hasher.update(&self.shared.ammo.to_le_bytes());
        hasher.finalize().to_hex().to_string()
    }

    // -- accessors ----------------------------------------------------------

    /// Current scene phase.
    pub fn phase(&self) -> ScenePhase {
        self.phase
    }

    /// Ships left, counting the one in play.
    pub fn lives(&self) -> u32 {
        self.lives
    }

    /// Current level, starting at 1.
    pub fn level(&self) -> u32 {
        self.tunables.level
    }

    /// Player shots available right now.
    pub fn ammo(&self) -> u32 {
        self.shared.ammo
    }

    /// Formation aliens still alive in the current swarm.
    pub fn outstanding_aliens(&self) -> u32 {
        self.outstanding_aliens
    }

    /// Read access to every entity and component.
    pub fn store(&self) -> &ComponentStore {
        &self.store
    }

    /// Write access to the store, for hosts and scripted setups.
    pub fn store_mut(&mut self) -> &mut ComponentStore {
        &mut self.store
    }

    /// The player entity, if one is alive.
    pub fn player(&self) -> Option<EntityId> {
        self.live_player()
    }

    /// Settings the scene was created with.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Difficulty values for the current level.
    pub fn tunables(&self) -> &Tunables {
        &self.tunables
    }

    /// Shared formation movement state.
    pub fn formation(&self) -> &FormationState {
        &self.shared.formation
    }

    /// The injected visual provider.
    pub fn visuals(&self) -> &V {
        &self.visuals
    }

    /// The injected audio provider.
    pub fn audio(&self) -> &A {
        &self.audio
    }

    /// True while `kind` is skipped by the pipeline.
    pub fn is_suspended(&self, kind: ProcessorKind) -> bool {
        self.pipeline.is_suspended(kind)
    }

    /// Processor timings from the last tick.
    pub fn diagnostics(&self) -> &PipelineDiagnostics {
        self.pipeline.diagnostics()
    }

    // -- internal -----------------------------------------------------------

    fn live_player(&self) -> Option<EntityId> {
        self.player.filter(|&p| self.store.is_alive(p))
    }

    fn player_start(&self) -> (f32, f32) {
        (
            self.settings.scene_width / 2.0,
            self.settings.scene_height * consts::PLAYER_Y_RATIO,
        )
    }

    fn run_pipeline(&mut self, input: ControlInput) {
        let mut ctx = TickContext {
            store: &mut self.store,
            factory: &mut self.factory,
            visuals: &mut self.visuals,
            audio: &mut self.audio,
            rng: &mut self.rng,
            settings: &self.settings,
            tunables: &self.tunables,
            shared: &mut self.shared,
            events: &mut self.events,
            collisions: &mut self.collisions,
            input,
            tick: self.current_tick,
            dt: self.settings.dt(),
        };
        self.pipeline.run(&mut ctx);
    }

    fn begin_player_entry(&mut self, tick: u64) {
        self.entry_started_at = tick;
        self.phase = ScenePhase::PlayerEntry(Caption::Attention);
        for kind in ENTRY_SUSPENDED {
            self.pipeline.suspend(kind);
        }
        self.shared.formation.frozen = true;
        if let Some(player) = self.live_player() {
            if let Some(graphics) = self.store.get_mut::<Graphics>(player) {
                graphics.hidden = true;
            }
            if let Some(velocity) = self.store.get_mut::<Velocity>(player) {
                *velocity = Velocity::ZERO;
            }
        }
        info!(tick, "player entry");
    }

    fn complete_player_entry(&mut self) {
        let player = match self.live_player() {
            Some(player) => {
                self.replace_player(player);
                Some(player)
            }
            None => match self.spawn_player() {
                Ok(player) => Some(player),
                Err(err) => {
                    warn!(%err, "player could not be spawned");
                    None
                }
            },
        };

        let formation = &mut self.shared.formation;
        if formation.dx == 0.0 && !formation.is_descending() {
            formation.dx = self.settings.per_tick(self.tunables.alien_speed);
        }
        formation.frozen = false;
        for kind in ENTRY_SUSPENDED {
            self.pipeline.resume(kind);
        }
        if let Some(graphics) = player.and_then(|p| self.store.get_mut::<Graphics>(p)) {
            graphics.hidden = false;
        }
        self.phase = ScenePhase::Active;
        info!(lives = self.lives, level = self.tunables.level, "player entry complete");
    }

    /// Put a surviving player back at the start, invulnerable and blinking.
    fn replace_player(&mut self, player: EntityId) {
        let (x, y) = self.player_start();
        if let Some(position) = self.store.get_mut::<Position>(player) {
            position.x = x;
            position.y = y;
        }
        if let Some(velocity) = self.store.get_mut::<Velocity>(player) {
            *velocity = Velocity::ZERO;
        }
        if let Some(status) = self.store.get_mut::<PlayerStatus>(player) {
            status.is_invulnerable = true;
        }
        let blinking = self
            .store
            .get_mut::<Graphics>(player)
            .is_some_and(|g| g.restart(EffectSlot::Standard));
        if !blinking {
            warn!(entity = %player, "player has no blink effect, invulnerability kept");
        }
    }

    fn resolve_collisions(&mut self) {
        let mut pairs = std::mem::take(&mut self.collisions);
        for pair in &pairs {
            let removable = self
                .store
                .get::<Damage>(pair.source)
                .is_some_and(|d| d.remove_on_hit);
            if removable {
                deactivate(&mut self.store, pair.source);
            }
            self.eliminate_entity(pair.target);
        }
        pairs.clear();
        self.collisions = pairs;
    }

    fn process_events(&mut self) {
        for event in self.events.drain() {
            match event {
                SimEvent::EffectFinished { entity, completion } => {
                    self.complete_effect(entity, completion)
                }
                SimEvent::Pruned(notice) => self.entity_just_pruned(notice),
            }
        }
    }

    fn complete_effect(&mut self, entity: EntityId, completion: Completion) {
        if !self.store.is_alive(entity) {
            debug!(%entity, ?completion, "completion for a pruned entity dropped");
            return;
        }
        match completion {
            Completion::None => {}
            Completion::ClearAnimating => {
                if let Some(status) = self.store.get_mut::<AlienStatus>(entity) {
                    status.is_animating = false;
                }
                if let Some(status) = self.store.get_mut::<AlienBossStatus>(entity) {
                    status.is_animating = false;
                }
            }
            Completion::FireShot => {
                if let Some(status) = self.store.get_mut::<AlienStatus>(entity) {
                    status.is_firing = false;
                    status.is_shoot_requested = !status.is_dying;
                }
                if let Some(status) = self.store.get_mut::<AlienBossStatus>(entity) {
                    status.is_firing = false;
                    status.is_shoot_requested = !status.is_dying;
                }
            }
            Completion::Deactivate => {
                deactivate(&mut self.store, entity);
            }
            Completion::ClearInvulnerable => {
                if let Some(status) = self.store.get_mut::<PlayerStatus>(entity) {
                    status.is_invulnerable = false;
                }
            }
        }
    }

    fn mark_dying(&mut self, entity: EntityId) {
        if let Some(status) = self.store.get_mut::<AlienStatus>(entity) {
            status.is_dying = true;
            status.is_shoot_requested = false;
        }
        if let Some(status) = self.store.get_mut::<AlienBossStatus>(entity) {
            status.is_dying = true;
            status.is_shoot_requested = false;
        }
        if let Some(status) = self.store.get_mut::<PlayerStatus>(entity) {
            status.is_dying = true;
            status.is_shoot_requested = false;
        }
    }

    fn spawn_explosion_for(&mut self, entity: EntityId) {
        let (Some(position), Some(geometry)) = (
            self.store.get::<Position>(entity).copied(),
            self.store.get::<Geometry>(entity).copied(),
        ) else {
            warn!(%entity, "dying entity has no shape, no explosion");
            return;
        };
        let velocity = self
            .store
            .get::<Velocity>(entity)
            .copied()
            .unwrap_or_default();
        if let Err(err) = self.factory.spawn_explosion(
            &mut self.store,
            &self.visuals,
            position.x,
            position.y,
            geometry.width * consts::EXPLOSION_SCALE,
            velocity,
        ) {
            warn!(%entity, %err, "explosion skipped");
        }
    }
}

impl<V, A, R> std::fmt::Debug for SceneController<V, A, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneController")
            .field("phase", &self.phase)
            .field("level", &self.tunables.level)
            .field("score", &self.score)
            .field("lives", &self.lives)
            .field("outstanding_aliens", &self.outstanding_aliens)
            .field("store", &self.store)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
