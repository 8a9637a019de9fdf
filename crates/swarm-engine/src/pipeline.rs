//! The ordered processor pipeline run once per scene tick.
//!
//! The [`Pipeline`] owns one instance of every processor, in the fixed order
//! of [`ProcessorKind::ORDER`]. Each tick it hands the same [`TickContext`]
//! to every processor that is not suspended, recording wall-clock timings
//! per processor. Suspension is how the scene freezes gameplay during player
//! entry: the processor keeps its state and simply does not run.
//!
//! Ordering is fixed and every source of randomness goes through the
//! context's [`RandomSource`](crate::services::RandomSource), so the same
//! store, the same inputs and the same random sequence produce the same
//! result.

use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::processors::{Processor, ProcessorKind, TickContext};

// ---------------------------------------------------------------------------
// PipelineDiagnostics
// ---------------------------------------------------------------------------

/// Timing diagnostics for the last pipeline run.
#[derive(Debug, Clone, Default)]
pub struct PipelineDiagnostics {
    /// Wall-clock time per processor that ran, in execution order.
    pub processor_times: Vec<(&'static str, Duration)>,
    /// Total time for the run.
    pub total_time: Duration,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

struct Slot {
    processor: Box<dyn Processor>,
    suspended: bool,
}

/// Fixed-order processor pipeline.
pub struct Pipeline {
    slots: Vec<Slot>,
    last_diagnostics: PipelineDiagnostics,
}

impl Pipeline {
    /// A pipeline holding a fresh instance of every processor kind.
    pub fn new() -> Self {
        Self::with_processors(ProcessorKind::ORDER.iter().map(|kind| kind.build()))
    }

    /// A pipeline running `processors` in the order given.
    ///
    /// # Panics
    ///
    /// Panics if two processors report the same [`ProcessorKind`].
    pub fn with_processors(processors: impl IntoIterator<Item = Box<dyn Processor>>) -> Self {
        let mut slots: Vec<Slot> = Vec::new();
        for processor in processors {
            let kind = processor.kind();
            assert!(
                slots.iter().all(|s| s.processor.kind() != kind),
                "processor '{}' registered twice",
                kind.name()
            );
            slots.push(Slot {
                processor,
                suspended: false,
            });
        }
        Self {
            slots,
            last_diagnostics: PipelineDiagnostics::default(),
        }
    }

    /// Kinds in execution order.
    pub fn kinds(&self) -> Vec<ProcessorKind> {
        self.slots.iter().map(|s| s.processor.kind()).collect()
    }

    fn slot_mut(&mut self, kind: ProcessorKind) -> Option<&mut Slot> {
        self.slots.iter_mut().find(|s| s.processor.kind() == kind)
    }

    /// Stop running `kind` until [`resume`](Self::resume). Unknown kinds are
    /// ignored.
    pub fn suspend(&mut self, kind: ProcessorKind) {
        if let Some(slot) = self.slot_mut(kind) {
            slot.suspended = true;
            debug!(processor = kind.name(), "suspended");
        }
    }

    pub fn resume(&mut self, kind: ProcessorKind) {
        if let Some(slot) = self.slot_mut(kind) {
            slot.suspended = false;
            debug!(processor = kind.name(), "resumed");
        }
    }

    pub fn is_suspended(&self, kind: ProcessorKind) -> bool {
        self.slots
            .iter()
            .any(|s| s.processor.kind() == kind && s.suspended)
    }

    /// Reset every processor's carried state and resume all of them.
    pub fn reset_all(&mut self) {
        for slot in &mut self.slots {
            slot.processor.reset();
            slot.suspended = false;
        }
    }

    /// Run every processor that is not suspended, in order.
    pub fn run(&mut self, ctx: &mut TickContext<'_>) {
        let start = Instant::now();
        let mut processor_times = Vec::with_capacity(self.slots.len());
        trace!(
            tick = ctx.tick,
            input = ctx.input.state.bits(),
            value = ctx.input.value,
            "pipeline tick"
        );

        for slot in &mut self.slots {
            if slot.suspended {
                continue;
            }
            let name = slot.processor.kind().name();
            let began = Instant::now();
            slot.processor.run(ctx);
            let elapsed = began.elapsed();
            trace!(processor = name, ?elapsed, "processor ran");
            processor_times.push((name, elapsed));
        }

        self.last_diagnostics = PipelineDiagnostics {
            processor_times,
            total_time: start.elapsed(),
        };
    }

    /// Timings from the last [`run`](Self::run).
    pub fn diagnostics(&self) -> &PipelineDiagnostics {
        &self.last_diagnostics
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("kinds", &self.kinds())
            .field(
                "suspended",
                &self
                    .slots
                    .iter()
                    .filter(|s| s.suspended)
                    .map(|s| s.processor.kind())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processors::testing::Harness;
    use crate::processors::{ActorMover, ActorRender};

    fn run_once(pipeline: &mut Pipeline, h: &mut Harness) {
        let mut ctx = TickContext {
            store: &mut h.store,
            factory: &mut h.factory,
            visuals: &mut h.visuals,
            audio: &mut h.audio,
            rng: h.rng.as_mut(),
            settings: &h.settings,
            tunables: &h.tunables,
            shared: &mut h.shared,
            events: &mut h.events,
            collisions: &mut h.collisions,
            input: h.input,
            tick: h.tick,
            dt: h.settings.dt(),
        };
        pipeline.run(&mut ctx);
    }

    // -- construction --

    #[test]
    fn new_follows_fixed_order() {
        let pipeline = Pipeline::new();
        assert_eq!(pipeline.kinds(), ProcessorKind::ORDER.to_vec());
    }

    #[test]
    #[should_panic(expected = "registered twice")]
    fn duplicate_kind_panics() {
        let processors: Vec<Box<dyn Processor>> = vec![Box::new(ActorMover), Box::new(ActorMover)];
        let _ = Pipeline::with_processors(processors);
    }

    // -- suspension --

    #[test]
    fn suspended_processors_are_skipped() {
        let mut h = Harness::new();
        let mut pipeline = Pipeline::new();
        pipeline.suspend(ProcessorKind::ActorMover);
        pipeline.suspend(ProcessorKind::PlayerFireUpdater);

        run_once(&mut pipeline, &mut h);

        let ran: Vec<&str> = pipeline
            .diagnostics()
            .processor_times
            .iter()
            .map(|(name, _)| *name)
            .collect();
        assert_eq!(ran.len(), ProcessorKind::ORDER.len() - 2);
        assert!(!ran.contains(&"actor_mover"));
        assert!(!ran.contains(&"player_fire_updater"));
        assert!(pipeline.is_suspended(ProcessorKind::ActorMover));

        pipeline.resume(ProcessorKind::ActorMover);
        assert!(!pipeline.is_suspended(ProcessorKind::ActorMover));
    }

    #[test]
    fn reset_all_resumes_everything() {
        let mut pipeline = Pipeline::new();
        for kind in ProcessorKind::ORDER {
            pipeline.suspend(kind);
        }
        pipeline.reset_all();
        assert!(ProcessorKind::ORDER
            .iter()
            .all(|&kind| !pipeline.is_suspended(kind)));
    }

    #[test]
    fn unknown_kind_is_ignored() {
        let processors: Vec<Box<dyn Processor>> = vec![Box::new(ActorRender)];
        let mut pipeline = Pipeline::with_processors(processors);
        pipeline.suspend(ProcessorKind::ActorMover);
        assert!(!pipeline.is_suspended(ProcessorKind::ActorMover));
    }
}
