use swarm_ecs::prelude::*;
use tracing::{debug, warn};

use super::{Processor, ProcessorKind, TickContext};
use crate::components::{
    AlienBehavior, AlienBossStatus, AlienStatus, Identity, PlayerStatus,
};
use crate::events::{PruneNotice, PrunedKind};

/// Destroys every inactive entity, queueing a prune notice first for those
/// that asked for one.
#[derive(Debug, Default)]
pub struct GarbageCollector;

impl Processor for GarbageCollector {
    fn kind(&self) -> ProcessorKind {
        ProcessorKind::GarbageCollector
    }

    fn run(&mut self, ctx: &mut TickContext<'_>) {
        let doomed: Vec<(EntityId, Identity)> = ctx
            .store
            .iter::<Identity>()
            .filter(|(_, identity)| !identity.active)
            .map(|(entity, identity)| (entity, identity.clone()))
            .collect();

        for (entity, identity) in doomed {
            if identity.notice_on_pruning {
                let kind = pruned_kind(ctx.store, entity);
                ctx.events.pruned(PruneNotice {
                    entity,
                    id: identity.id,
                    kind,
                });
            }
            if let Err(err) = ctx.store.destroy(entity) {
                warn!(%entity, %err, "failed to prune entity");
                continue;
            }
            debug!(%entity, tag = %identity.tag, "pruned");
        }
    }
}

/// Classify an entity from its components while they still exist.
fn pruned_kind(store: &ComponentStore, entity: EntityId) -> PrunedKind {
    let score = store.get::<AlienBehavior>(entity).map_or(0, |b| b.score);
    if store.has::<PlayerStatus>(entity) {
        PrunedKind::Player
    } else if let Some(status) = store.get::<AlienStatus>(entity) {
        PrunedKind::Alien {
            score,
            eliminated: status.is_dying,
        }
    } else if let Some(status) = store.get::<AlienBossStatus>(entity) {
        PrunedKind::Boss {
            score,
            eliminated: status.is_dying,
        }
    } else {
        PrunedKind::Other
    }
}
