use swarm_ecs::prelude::*;
use tracing::debug;

use super::{Processor, ProcessorKind, TickContext};
use crate::components::{AlienStatus, Geometry};
use crate::formation::GuardState;

/// Keeps the formation inside the scene.
///
/// When the next group step would push an anchor past a side wall, the
/// formation stops, descends for `descend_time` seconds and then resumes in
/// the opposite direction. Once any anchor reaches the bottom guard line the
/// formation no longer descends; it simply reverses at the walls. Raiding
/// aliens are not part of the formation and are ignored.
#[derive(Debug, Default)]
pub struct AlienBoundsGuard;

impl Processor for AlienBoundsGuard {
    fn kind(&self) -> ProcessorKind {
        ProcessorKind::AlienBoundsGuard
    }

    fn run(&mut self, ctx: &mut TickContext<'_>) {
        let formation = &mut ctx.shared.formation;
        if formation.frozen {
            return;
        }
        let (step_x, _) = formation.step(ctx.tunables.speedup_factor);
        let scene_width = ctx.settings.scene_width;
        let guard_line = ctx.settings.scene_height * ctx.settings.bottom_guard_ratio;

        let mut any = false;
        let mut crosses_side = false;
        let mut at_bottom = false;
        for (entity, status) in ctx.store.iter::<AlienStatus>() {
            if status.is_detached() {
                continue;
            }
            let Some(geometry) = ctx.store.get::<Geometry>(entity) else {
                continue;
            };
            any = true;
            let (half_w, half_h) = (geometry.width / 2.0, geometry.height / 2.0);
            let x = status.formation_x + step_x;
            crosses_side |= x - half_w < 0.0 || x + half_w > scene_width;
            at_bottom |= status.formation_y + half_h >= guard_line;
        }
        if !any {
            return;
        }

        match formation.guard {
            GuardState::Descending {
                ticks_left,
                resume_dx,
            } => {
                let ticks_left = ticks_left.saturating_sub(1);
                if ticks_left == 0 {
                    formation.dx = -resume_dx;
                    formation.dy = 0.0;
                    formation.guard = GuardState::Scanning;
                    debug!(dx = formation.dx, "formation resumes");
                } else {
                    formation.guard = GuardState::Descending {
                        ticks_left,
                        resume_dx,
                    };
                }
            }
            GuardState::Scanning if crosses_side && at_bottom => {
                formation.dx = -formation.dx;
                debug!(dx = formation.dx, "formation reverses at bottom");
            }
            GuardState::Scanning if crosses_side => {
                let ticks = ctx.settings.ticks_for(ctx.settings.descend_time).max(1);
                formation.guard = GuardState::Descending {
                    ticks_left: ticks,
                    resume_dx: formation.dx,
                };
                formation.dx = 0.0;
                formation.dy = ctx.settings.per_tick(ctx.tunables.alien_speed);
                debug!(ticks, "formation descends");
            }
            GuardState::Scanning => {}
        }
    }
}
