use super::{Processor, ProcessorKind, TickContext};
use crate::components::{AlienStatus, Position, Velocity};

/// Integrates positions.
///
/// Aliens in formation move with the group step (their own velocity is
/// ignored) and carry their anchor along; detached aliens fly on their own
/// velocity scaled by the speedup factor; everything else moves by its
/// velocity. While the formation is frozen, formation aliens, their anchors
/// and the formation origin stay put.
#[derive(Debug, Default)]
pub struct ActorMover;

impl Processor for ActorMover {
    fn kind(&self) -> ProcessorKind {
        ProcessorKind::ActorMover
    }

    fn run(&mut self, ctx: &mut TickContext<'_>) {
        let speedup = ctx.tunables.speedup_factor;
        let formation = &mut ctx.shared.formation;
        let (group_x, group_y) = formation.step(speedup);
        let frozen = formation.frozen;
        if !frozen {
            formation.origin_x += group_x;
            formation.origin_y += group_y;
        }

        for entity in ctx.store.entities_with::<Velocity>() {
            let Some(velocity) = ctx.store.get::<Velocity>(entity).copied() else {
                continue;
            };
            let (dx, dy, dz) = match ctx.store.get_mut::<AlienStatus>(entity) {
                Some(status) if status.is_detached() => (
                    velocity.dx * speedup,
                    velocity.dy * speedup,
                    velocity.dz * speedup,
                ),
                Some(_) if frozen => continue,
                Some(status) => {
                    status.formation_x += group_x;
                    status.formation_y += group_y;
                    (group_x, group_y, 0.0)
                }
                None => (velocity.dx, velocity.dy, velocity.dz),
            };
            if let Some(position) = ctx.store.get_mut::<Position>(entity) {
                position.x += dx;
                position.y += dy;
                position.z += dz;
            }
        }
    }
}
