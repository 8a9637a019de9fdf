//! Events raised by processors and resolved by the scene after the pipeline.
//!
//! Processors only hold the component store for the duration of their own
//! pass, so anything that needs the scene (score, lives, level progression)
//! is queued here and drained once per tick in FIFO order.

use std::collections::VecDeque;

use swarm_ecs::prelude::*;

use crate::effects::Completion;

/// What kind of entity was pruned, captured before its components are gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrunedKind {
    Player,
    /// `eliminated` is true when the alien went down in an explosion rather
    /// than leaving the scene.
    Alien { score: u32, eliminated: bool },
    Boss { score: u32, eliminated: bool },
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PruneNotice {
    pub entity: EntityId,
    pub id: u32,
    pub kind: PrunedKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimEvent {
    EffectFinished {
        entity: EntityId,
        completion: Completion,
    },
    Pruned(PruneNotice),
}

#[derive(Debug, Default)]
pub struct EventQueue {
    events: VecDeque<SimEvent>,
}

impl EventQueue {
    pub fn push(&mut self, event: SimEvent) {
        self.events.push_back(event);
    }

    /// Queue a finished effect. [`Completion::None`] is dropped.
    pub fn effect_finished(&mut self, entity: EntityId, completion: Completion) {
        if completion != Completion::None {
            self.push(SimEvent::EffectFinished { entity, completion });
        }
    }

    pub fn pruned(&mut self, notice: PruneNotice) {
        self.push(SimEvent::Pruned(notice));
    }

    /// Take every queued event, oldest first.
    pub fn drain(&mut self) -> Vec<SimEvent> {
        self.events.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
