use swarm_ecs::prelude::*;
use tracing::debug;

use super::{Processor, ProcessorKind, TickContext};
use crate::components::{AlienBehavior, AlienStatus, Position, Velocity};
use crate::consts;

/// Sends formation aliens on raids at the player and brings them home.
///
/// A raid lasts at most `RAID_SECONDS`. The raider re-aims at the player
/// every tick and breaks off when time runs out, the player is gone, or it
/// reaches the point it was aiming at. It then flies back to its live slot
/// (formation origin plus slot offset) and snaps into place, anchor included,
/// once within one step.
#[derive(Debug, Default)]
pub struct AlienRaidDriver;

impl Processor for AlienRaidDriver {
    fn kind(&self) -> ProcessorKind {
        ProcessorKind::AlienRaidDriver
    }

    fn run(&mut self, ctx: &mut TickContext<'_>) {
        let speed = ctx.settings.per_tick(consts::RAID_SPEED);
        let reach = speed * ctx.tunables.speedup_factor;
        let formation = ctx.shared.formation;
        let target = ctx.shared.player_position;

        for entity in ctx.store.entities_with::<AlienStatus>() {
            let (Some(mut status), Some(position)) = (
                ctx.store.get::<AlienStatus>(entity).copied(),
                ctx.store.get::<Position>(entity).copied(),
            ) else {
                continue;
            };
            if status.is_dying {
                continue;
            }
            let mut velocity = ctx.store.get::<Velocity>(entity).copied().unwrap_or_default();
            let mut snap_to = None;

            if status.is_in_raid {
                status.raid_ticks_left = status.raid_ticks_left.saturating_sub(1);
                match target {
                    Some((tx, ty))
                        if status.raid_ticks_left > 0
                            && distance(position, tx, ty) > reach =>
                    {
                        velocity = Velocity::toward(tx - position.x, ty - position.y, speed);
                    }
                    _ => {
                        status.is_in_raid = false;
                        status.is_returning_to_formation = true;
                        debug!(%entity, "raid over, returning");
                    }
                }
            } else if !status.is_returning_to_formation && !formation.frozen {
                let Some((tx, ty)) = target else {
                    continue;
                };
                let Some(behavior) = ctx.store.get::<AlienBehavior>(entity).copied() else {
                    continue;
                };
                if ctx.rng.next_unit() < behavior.raid_probability {
                    status.is_in_raid = true;
                    status.raid_ticks_left = ctx.settings.ticks_for(consts::RAID_SECONDS).max(1);
                    velocity = Velocity::toward(tx - position.x, ty - position.y, speed);
                    debug!(%entity, "raid started");
                }
            }

            if status.is_returning_to_formation {
                let home_x = formation.origin_x + status.slot_x;
                let home_y = formation.origin_y + status.slot_y;
                if distance(position, home_x, home_y) <= reach {
                    status.is_returning_to_formation = false;
                    status.formation_x = home_x;
                    status.formation_y = home_y;
                    velocity = Velocity::ZERO;
                    snap_to = Some((home_x, home_y));
                } else {
                    velocity = Velocity::toward(home_x - position.x, home_y - position.y, speed);
                }
            }

            write_back(ctx.store, entity, status, velocity, snap_to);
        }
    }
}

fn distance(position: Position, x: f32, y: f32) -> f32 {
    ((x - position.x).powi(2) + (y - position.y).powi(2)).sqrt()
}

fn write_back(
    store: &mut ComponentStore,
    entity: EntityId,
    status: AlienStatus,
    velocity: Velocity,
    snap_to: Option<(f32, f32)>,
) {
    if let Some(slot) = store.get_mut::<AlienStatus>(entity) {
        *slot = status;
    }
    if let Some(slot) = store.get_mut::<Velocity>(entity) {
        *slot = velocity;
    }
    if let (Some((x, y)), Some(position)) = (snap_to, store.get_mut::<Position>(entity)) {
        position.x = x;
        position.y = y;
    }
}
