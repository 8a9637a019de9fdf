use tracing::trace;

use super::{Processor, ProcessorKind, TickContext};
use crate::components::{deactivate, Geometry, Identity, Position};

/// Deactivates entities whose box has left the scene entirely.
#[derive(Debug, Default)]
pub struct ActorOutOfSceneCheck;

impl Processor for ActorOutOfSceneCheck {
    fn kind(&self) -> ProcessorKind {
        ProcessorKind::ActorOutOfSceneCheck
    }

    fn run(&mut self, ctx: &mut TickContext<'_>) {
        let (width, height) = (ctx.settings.scene_width, ctx.settings.scene_height);
        let gone: Vec<_> = ctx
            .store
            .iter::<Position>()
            .filter(|&(entity, _)| ctx.store.get::<Identity>(entity).is_some_and(|i| i.active))
            .filter_map(|(entity, p)| {
                let g = ctx.store.get::<Geometry>(entity)?;
                let (half_w, half_h) = (g.width / 2.0, g.height / 2.0);
                let outside = p.x + half_w < 0.0
                    || p.x - half_w > width
                    || p.y + half_h < 0.0
                    || p.y - half_h > height;
                outside.then_some(entity)
            })
            .collect();

        for entity in gone {
            trace!(%entity, "left the scene");
            deactivate(ctx.store, entity);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::is_active;
    use crate::processors::testing::Harness;
    use swarm_ecs::prelude::*;

    fn boxed(h: &mut Harness, x: f32, y: f32) -> EntityId {
        let e = h.store.create();
        h.store
            .insert(
                e,
                Identity {
                    id: 1,
                    tag: "missile".into(),
                    active: true,
                    notice_on_pruning: false,
                },
            )
            .unwrap();
        h.store.insert(e, Position { x, y, z: 0.0 }).unwrap();
        h.store.insert(e, Geometry { width: 10.0, height: 10.0 }).unwrap();
        e
    }

    #[test]
    fn only_fully_outside_boxes_are_deactivated() {
        let mut h = Harness::new();
        let inside = boxed(&mut h, 100.0, 100.0);
        let straddling = boxed(&mut h, -4.0, 100.0);
        let above = boxed(&mut h, 100.0, -6.0);
        let right = boxed(&mut h, 700.0, 100.0);

        h.run(&mut ActorOutOfSceneCheck);

        assert!(is_active(&h.store, inside));
        assert!(is_active(&h.store, straddling));
        assert!(!is_active(&h.store, above));
        assert!(!is_active(&h.store, right));
    }
}
