use super::{Processor, ProcessorKind, TickContext};
use crate::collision::detect_collisions;

/// Collects this tick's source/target contacts for the scene to resolve.
#[derive(Debug, Default)]
pub struct CollisionDetector;

impl Processor for CollisionDetector {
    fn kind(&self) -> ProcessorKind {
        ProcessorKind::CollisionDetector
    }

    fn run(&mut self, ctx: &mut TickContext<'_>) {
        let pairs = detect_collisions(ctx.store, ctx.visuals);
        ctx.collisions.extend(pairs);
    }
}
