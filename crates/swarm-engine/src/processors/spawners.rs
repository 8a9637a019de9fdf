use swarm_ecs::prelude::*;
use tracing::{info, warn};

use super::{Processor, ProcessorKind, TickContext};
use crate::collision::entity_quad;
use crate::components::{AlienBehavior, AlienBossStatus, AlienStatus};
use crate::config::Settings;
use crate::consts::{self, sound};
use crate::factory::{BossSpawn, MissileKind};

// ---------------------------------------------------------------------------
// EntitySpawner
// ---------------------------------------------------------------------------

/// Turns alien shoot requests into missiles leaving the shooter's bottom edge.
#[derive(Debug, Default)]
pub struct EntitySpawner;

impl Processor for EntitySpawner {
    fn kind(&self) -> ProcessorKind {
        ProcessorKind::EntitySpawner
    }

    fn run(&mut self, ctx: &mut TickContext<'_>) {
        let mut shooters = Vec::new();
        for (entity, status) in ctx.store.iter_mut::<AlienStatus>() {
            if std::mem::take(&mut status.is_shoot_requested) && !status.is_dying {
                shooters.push(entity);
            }
        }
        for (entity, status) in ctx.store.iter_mut::<AlienBossStatus>() {
            if std::mem::take(&mut status.is_shoot_requested) && !status.is_dying {
                shooters.push(entity);
            }
        }

        for shooter in shooters {
            let Some((quad, _)) = entity_quad(ctx.store, ctx.visuals, shooter) else {
                warn!(entity = %shooter, "shooter has no rendered shape, shot dropped");
                continue;
            };
            let x = (quad.bounds.left + quad.bounds.right) / 2.0;
            match ctx
                .factory
                .spawn_missile(ctx.store, ctx.visuals, MissileKind::Alien, x, quad.bounds.bottom)
            {
                Ok(_) => ctx.audio.play_once(sound::ALIEN_SHOT),
                Err(err) => warn!(entity = %shooter, %err, "alien shot dropped"),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// SpecialActorSpawner
// ---------------------------------------------------------------------------

/// Occasionally sends the boss across the top of the scene, entering from a
/// random side. At most one boss is alive at a time.
#[derive(Debug, Default)]
pub struct SpecialActorSpawner {
    /// Left and right entry points, computed on first use.
    spawn_points: Option<[(f32, f32); 2]>,
}

fn boss_spawn_points(settings: &Settings) -> [(f32, f32); 2] {
    let half = settings.scene_width * consts::BOSS_WIDTH_RATIO / 2.0;
    let lane = settings.scene_height * consts::BOSS_LANE_RATIO;
    [(-half, lane), (settings.scene_width + half, lane)]
}

impl Processor for SpecialActorSpawner {
    fn kind(&self) -> ProcessorKind {
        ProcessorKind::SpecialActorSpawner
    }

    fn run(&mut self, ctx: &mut TickContext<'_>) {
        if ctx.store.iter::<AlienBossStatus>().next().is_some() {
            return;
        }
        if ctx.rng.next_unit() >= ctx.tunables.boss_probability {
            return;
        }

        let points = *self
            .spawn_points
            .get_or_insert_with(|| boss_spawn_points(ctx.settings));
        let from_left = ctx.rng.next_unit() < 0.5;
        let ((x, y), direction) = if from_left {
            (points[0], 1.0)
        } else {
            (points[1], -1.0)
        };
        let spawn = BossSpawn {
            x,
            y,
            width: ctx.settings.scene_width * consts::BOSS_WIDTH_RATIO,
            direction,
            behavior: AlienBehavior {
                animation_probability: 0.0,
                shoot_probability: ctx.tunables.raid_shoot_probability,
                raid_probability: 0.0,
                raid_shoot_probability: 0.0,
                score: consts::BOSS_SCORE,
            },
        };

        match ctx.factory.spawn_alien_boss(ctx.store, ctx.visuals, &spawn) {
            Ok(boss) => {
                info!(entity = %boss, from_left, "boss incoming");
                ctx.audio.play_looped(sound::BOSS_SIREN);
            }
            Err(err) => warn!(%err, "boss spawn failed"),
        }
    }

    fn reset(&mut self) {
        self.spawn_points = None;
    }
}
