use std::collections::BTreeMap;

use swarm_ecs::prelude::*;

use super::{Processor, ProcessorKind, TickContext};
use crate::collision::rendered_quad;
use crate::components::{Geometry, Graphics, Position};
use crate::services::DrawCall;

/// Advances every entity's effects and submits draw calls back to front.
///
/// Entities are grouped by depth level (`Position::z` rounded); within a
/// level they are drawn in entity order. Hidden entities and entities in the
/// dark half of a blink are advanced but not drawn.
#[derive(Debug, Default)]
pub struct ActorRender;

impl Processor for ActorRender {
    fn kind(&self) -> ProcessorKind {
        ProcessorKind::ActorRender
    }

    fn run(&mut self, ctx: &mut TickContext<'_>) {
        let mut levels: BTreeMap<i32, Vec<EntityId>> = BTreeMap::new();
        for (entity, position) in ctx.store.iter::<Position>() {
            if ctx.store.has::<Graphics>(entity) {
                levels
                    .entry(position.z.round() as i32)
                    .or_default()
                    .push(entity);
            }
        }

        for (depth, entities) in levels {
            for entity in entities {
                let Some(graphics) = ctx.store.get_mut::<Graphics>(entity) else {
                    continue;
                };
                graphics.advance(entity, ctx.events);
                if !graphics.is_drawn() {
                    continue;
                }
                let graphics = graphics.clone();
                let (Some(position), Some(geometry)) = (
                    ctx.store.get::<Position>(entity),
                    ctx.store.get::<Geometry>(entity),
                ) else {
                    continue;
                };
                let frames = ctx.visuals.frame_count(graphics.visual);
                let call = DrawCall {
                    entity,
                    visual: graphics.visual,
                    depth,
                    quad: rendered_quad(position, geometry, &graphics, frames),
                    angle: graphics.state.angle,
                };
                ctx.visuals.draw(&call);
            }
        }
    }
}
