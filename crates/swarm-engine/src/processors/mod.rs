//! Per-tick processors.
//!
//! Each processor is one pass over the component store with a single
//! responsibility. The [`Pipeline`](crate::pipeline::Pipeline) runs them in
//! the fixed order of [`ProcessorKind::ORDER`], handing each the same
//! [`TickContext`]. Processors never reach the scene directly: anything the
//! scene must resolve goes through [`TickContext::events`] or
//! [`TickContext::collisions`].

use swarm_ecs::prelude::*;

use crate::collision::CollisionPair;
use crate::config::{Settings, Tunables};
use crate::events::EventQueue;
use crate::factory::EntityFactory;
use crate::formation::SharedState;
use crate::input::ControlInput;
use crate::services::{AudioProvider, RandomSource, VisualProvider};

mod alien_bounds;
mod collision_detector;
mod garbage;
mod mover;
mod out_of_scene;
mod player;
mod raid;
mod render;
mod spawners;
mod state_selector;

pub use alien_bounds::AlienBoundsGuard;
pub use collision_detector::CollisionDetector;
pub use garbage::GarbageCollector;
pub use mover::ActorMover;
pub use out_of_scene::ActorOutOfSceneCheck;
pub use player::{PlayerBoundsGuard, PlayerFireUpdater, PlayerSpeedUpdater};
pub use raid::AlienRaidDriver;
pub use render::ActorRender;
pub use spawners::{EntitySpawner, SpecialActorSpawner};
pub use state_selector::ActorStateSelector;

/// Everything a processor may read or write during one tick.
pub struct TickContext<'a> {
    pub store: &'a mut ComponentStore,
    pub factory: &'a mut EntityFactory,
    pub visuals: &'a mut dyn VisualProvider,
    pub audio: &'a mut dyn AudioProvider,
    pub rng: &'a mut dyn RandomSource,
    pub settings: &'a Settings,
    pub tunables: &'a Tunables,
    pub shared: &'a mut SharedState,
    pub events: &'a mut EventQueue,
    pub collisions: &'a mut Vec<CollisionPair>,
    pub input: ControlInput,
    /// Host tick number.
    pub tick: u64,
    /// Seconds per tick.
    pub dt: f64,
}

/// Identifies a processor slot in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessorKind {
    GarbageCollector,
    ActorStateSelector,
    EntitySpawner,
    SpecialActorSpawner,
    PlayerSpeedUpdater,
    PlayerFireUpdater,
    PlayerBoundsGuard,
    AlienBoundsGuard,
    ActorMover,
    AlienRaidDriver,
    ActorOutOfSceneCheck,
    CollisionDetector,
    ActorRender,
}

impl ProcessorKind {
    /// Execution order within a tick.
    pub const ORDER: [ProcessorKind; 13] = [
        ProcessorKind::GarbageCollector,
        ProcessorKind::ActorStateSelector,
        ProcessorKind::EntitySpawner,
        ProcessorKind::SpecialActorSpawner,
        ProcessorKind::PlayerSpeedUpdater,
        ProcessorKind::PlayerFireUpdater,
        ProcessorKind::PlayerBoundsGuard,
        ProcessorKind::AlienBoundsGuard,
        ProcessorKind::ActorMover,
        ProcessorKind::AlienRaidDriver,
        ProcessorKind::ActorOutOfSceneCheck,
        ProcessorKind::CollisionDetector,
        ProcessorKind::ActorRender,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ProcessorKind::GarbageCollector => "garbage_collector",
            ProcessorKind::ActorStateSelector => "actor_state_selector",
            ProcessorKind::EntitySpawner => "entity_spawner",
            ProcessorKind::SpecialActorSpawner => "special_actor_spawner",
            ProcessorKind::PlayerSpeedUpdater => "player_speed_updater",
            ProcessorKind::PlayerFireUpdater => "player_fire_updater",
            ProcessorKind::PlayerBoundsGuard => "player_bounds_guard",
            ProcessorKind::AlienBoundsGuard => "alien_bounds_guard",
            ProcessorKind::ActorMover => "actor_mover",
            ProcessorKind::AlienRaidDriver => "alien_raid_driver",
            ProcessorKind::ActorOutOfSceneCheck => "actor_out_of_scene_check",
            ProcessorKind::CollisionDetector => "collision_detector",
            ProcessorKind::ActorRender => "actor_render",
        }
    }

    /// A fresh processor of this kind.
    pub fn build(self) -> Box<dyn Processor> {
        match self {
            ProcessorKind::GarbageCollector => Box::new(GarbageCollector),
            ProcessorKind::ActorStateSelector => Box::new(ActorStateSelector),
            ProcessorKind::EntitySpawner => Box::new(EntitySpawner),
            ProcessorKind::SpecialActorSpawner => Box::new(SpecialActorSpawner::default()),
            ProcessorKind::PlayerSpeedUpdater => Box::new(PlayerSpeedUpdater),
            ProcessorKind::PlayerFireUpdater => Box::new(PlayerFireUpdater::default()),
            ProcessorKind::PlayerBoundsGuard => Box::new(PlayerBoundsGuard),
            ProcessorKind::AlienBoundsGuard => Box::new(AlienBoundsGuard),
            ProcessorKind::ActorMover => Box::new(ActorMover),
            ProcessorKind::AlienRaidDriver => Box::new(AlienRaidDriver),
            ProcessorKind::ActorOutOfSceneCheck => Box::new(ActorOutOfSceneCheck),
            ProcessorKind::CollisionDetector => Box::new(CollisionDetector),
            ProcessorKind::ActorRender => Box::new(ActorRender),
        }
    }
}

pub trait Processor {
    fn kind(&self) -> ProcessorKind;

    fn run(&mut self, ctx: &mut TickContext<'_>);

    /// Drop any state carried across ticks.
    fn reset(&mut self) {}
}

// ---------------------------------------------------------------------------
// Test support
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod testing {
    //! A self-contained context for driving single processors.

    use super::*;
    use crate::services::{AudioLog, PcgRandom, SpriteAtlas};

    /// Random source that replays a fixed script, then repeats its last value.
    pub struct Scripted {
        values: Vec<f64>,
        next: usize,
    }

    impl Scripted {
        pub fn new(values: &[f64]) -> Self {
            Self {
                values: values.to_vec(),
                next: 0,
            }
        }
    }

    impl RandomSource for Scripted {
        fn next_unit(&mut self) -> f64 {
            let value = self.values[self.next.min(self.values.len() - 1)];
            self.next += 1;
            value
        }
    }

    pub struct Harness {
        pub store: ComponentStore,
        pub factory: EntityFactory,
        pub visuals: SpriteAtlas,
        pub audio: AudioLog,
        pub rng: Box<dyn RandomSource>,
        pub settings: Settings,
        pub tunables: Tunables,
        pub shared: SharedState,
        pub events: EventQueue,
        pub collisions: Vec<CollisionPair>,
        pub input: ControlInput,
        pub tick: u64,
    }

    impl Harness {
        pub fn new() -> Self {
            let settings = Settings::default();
            Self {
                store: ComponentStore::new(),
                factory: EntityFactory::new(settings.tick_rate),
                visuals: SpriteAtlas::arcade(),
                audio: AudioLog::new(),
                rng: Box::new(PcgRandom::seeded(7)),
                shared: SharedState {
                    ammo: settings.ammo_capacity,
                    ..Default::default()
                },
                settings,
                tunables: Tunables::default(),
                events: EventQueue::default(),
                collisions: Vec::new(),
                input: ControlInput::default(),
                tick: 0,
            }
        }

        pub fn with_rng(mut self, rng: impl RandomSource + 'static) -> Self {
            self.rng = Box::new(rng);
            self
        }

        /// Run `processor` once and advance the tick counter.
        pub fn run(&mut self, processor: &mut dyn Processor) {
            let mut ctx = TickContext {
                store: &mut self.store,
                factory: &mut self.factory,
                visuals: &mut self.visuals,
                audio: &mut self.audio,
                rng: self.rng.as_mut(),
                settings: &self.settings,
                tunables: &self.tunables,
                shared: &mut self.shared,
                events: &mut self.events,
                collisions: &mut self.collisions,
                input: self.input,
                tick: self.tick,
                dt: self.settings.dt(),
            };
            processor.run(&mut ctx);
            self.tick += 1;
        }
    }
}
