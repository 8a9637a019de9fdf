use swarm_ecs::prelude::*;
use tracing::warn;

use super::{Processor, ProcessorKind, TickContext};
use crate::components::{AlienBehavior, AlienBossStatus, AlienStatus, EffectSlot, Graphics};

/// Rolls each idle alien into its basic animation or its firing animation.
///
/// The firing animation restarts the alien's private clock; when it ends the
/// scene raises the shoot request that the [`EntitySpawner`](super::EntitySpawner)
/// turns into a missile. The boss only ever rolls for firing, its standard
/// effect runs continuously.
#[derive(Debug, Default)]
pub struct ActorStateSelector;

impl Processor for ActorStateSelector {
    fn kind(&self) -> ProcessorKind {
        ProcessorKind::ActorStateSelector
    }

    fn run(&mut self, ctx: &mut TickContext<'_>) {
        for entity in ctx.store.entities_with::<AlienStatus>() {
            let Some(status) = ctx.store.get::<AlienStatus>(entity).copied() else {
                continue;
            };
            if status.is_dying || status.is_animating || status.is_firing {
                continue;
            }
            let Some(behavior) = behavior_of(ctx.store, entity) else {
                continue;
            };

            if ctx.rng.next_unit() < behavior.animation_probability {
                if restart(ctx.store, entity, EffectSlot::Standard, false) {
                    set_alien(ctx.store, entity, |s| s.is_animating = true);
                }
                continue;
            }
            let shoot = if status.is_in_raid {
                behavior.raid_shoot_probability
            } else {
                behavior.shoot_probability
            };
            if ctx.rng.next_unit() < shoot && restart(ctx.store, entity, EffectSlot::Firing, true) {
                set_alien(ctx.store, entity, |s| s.is_firing = true);
            }
        }

        for entity in ctx.store.entities_with::<AlienBossStatus>() {
            let Some(status) = ctx.store.get::<AlienBossStatus>(entity).copied() else {
                continue;
            };
            if status.is_dying || status.is_firing {
                continue;
            }
            let Some(behavior) = behavior_of(ctx.store, entity) else {
                continue;
            };
            if ctx.rng.next_unit() < behavior.shoot_probability
                && restart(ctx.store, entity, EffectSlot::Firing, true)
            {
                if let Some(s) = ctx.store.get_mut::<AlienBossStatus>(entity) {
                    s.is_firing = true;
                }
            }
        }
    }
}

fn behavior_of(store: &ComponentStore, entity: EntityId) -> Option<AlienBehavior> {
    match store.require::<AlienBehavior>(entity) {
        Ok(behavior) => Some(*behavior),
        Err(err) => {
            warn!(%entity, %err, "alien skipped by state selector");
            None
        }
    }
}

/// Restart the effect in `slot`, optionally rewinding the private clock
/// first. Returns false when the entity cannot animate.
fn restart(store: &mut ComponentStore, entity: EntityId, slot: EffectSlot, rewind: bool) -> bool {
    match store.require_mut::<Graphics>(entity) {
        Ok(graphics) => {
            if rewind {
                graphics.reset_clock();
            }
            graphics.restart(slot)
        }
        Err(err) => {
            warn!(%entity, %err, "alien skipped by state selector");
            false
        }
    }
}

fn set_alien(store: &mut ComponentStore, entity: EntityId, f: impl FnOnce(&mut AlienStatus)) {
    if let Some(status) = store.get_mut::<AlienStatus>(entity) {
        f(status);
    }
}
