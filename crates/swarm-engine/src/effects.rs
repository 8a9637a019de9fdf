//! Visual effects attached to an entity's [`Graphics`](crate::components::Graphics).
//!
//! An effect is a closed variant ([`EffectKind`]) plus run state: a start
//! tick on the entity's private clock, a duration, and `looping`/`suspended`
//! flags. Each render pass calls [`Effect::apply`], which writes into the
//! entity's [`VisualState`] and reports completion exactly once for a
//! run-once effect. What happens on completion is data, a [`Completion`] the
//! render processor turns into a [`SimEvent`](crate::events::SimEvent) for
//! the scene to resolve.

use serde::Serialize;

// ---------------------------------------------------------------------------
// VisualState
// ---------------------------------------------------------------------------

/// Per-entity render modifiers written by effects.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VisualState {
    /// Frames added to the graphics base frame.
    pub frame_offset: u32,
    pub scale: f32,
    /// Radians, clockwise.
    pub angle: f32,
    pub offset_x: f32,
    pub offset_y: f32,
    /// False during the dark half of a blink.
    pub shown: bool,
}

impl Default for VisualState {
    fn default() -> Self {
        Self {
            frame_offset: 0,
            scale: 1.0,
            angle: 0.0,
            offset_x: 0.0,
            offset_y: 0.0,
            shown: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Completion
// ---------------------------------------------------------------------------

/// What the scene does when a run-once effect finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Completion {
    None,
    /// Clear the alien's `is_animating` flag.
    ClearAnimating,
    /// Clear `is_firing` and raise `is_shoot_requested`.
    FireShot,
    /// Mark the entity inactive so it is pruned next tick.
    Deactivate,
    /// End the player's invulnerability.
    ClearInvulnerable,
}

// ---------------------------------------------------------------------------
// Effect
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum EffectKind {
    /// Step through `frame_count` frames, `ticks_per_frame` ticks each.
    Animation { frame_count: u32, ticks_per_frame: u32 },
    /// Toggle visibility every `period` ticks.
    Blink { period: u32 },
    /// Scale from 1 down to 0.
    Shrink,
    /// Sine bob with the given amplitude.
    Shift { dx: f32, dy: f32 },
    /// Spin `turns` full turns.
    Rotate { turns: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Effect {
    pub kind: EffectKind,
    /// Length of one run (or one period when looping), in ticks. Never 0.
    pub duration: u32,
    pub looping: bool,
    pub suspended: bool,
    pub completion: Completion,
    started_at: u64,
}

impl Effect {
    fn new(kind: EffectKind, duration: u32) -> Self {
        Self {
            kind,
            duration: duration.max(1),
            looping: false,
            suspended: false,
            completion: Completion::None,
            started_at: 0,
        }
    }

    pub fn animation(frame_count: u32, ticks_per_frame: u32) -> Self {
        let frame_count = frame_count.max(1);
        let ticks_per_frame = ticks_per_frame.max(1);
        Self::new(
            EffectKind::Animation {
                frame_count,
                ticks_per_frame,
            },
            frame_count * ticks_per_frame,
        )
    }

    pub fn blink(period: u32, duration: u32) -> Self {
        Self::new(
            EffectKind::Blink {
                period: period.max(1),
            },
            duration,
        )
    }

    pub fn shrink(duration: u32) -> Self {
        Self::new(EffectKind::Shrink, duration)
    }

    pub fn shift(dx: f32, dy: f32, period: u32) -> Self {
        Self::new(EffectKind::Shift { dx, dy }, period)
    }

    pub fn rotate(turns: f32, duration: u32) -> Self {
        Self::new(EffectKind::Rotate { turns }, duration)
    }

    pub fn looping(mut self) -> Self {
        self.looping = true;
        self
    }

    /// Start out suspended; the effect does nothing until [`restart`](Self::restart).
    pub fn suspended(mut self) -> Self {
        self.suspended = true;
        self
    }

    pub fn on_finish(mut self, completion: Completion) -> Self {
        self.completion = completion;
        self
    }

    /// Run from the beginning, counting from `local_tick`.
    pub fn restart(&mut self, local_tick: u64) {
        self.started_at = local_tick;
        self.suspended = false;
    }

    pub fn is_running(&self) -> bool {
        !self.suspended
    }

    /// Advance the effect to `local_tick` and write its contribution into
    /// `state`. Returns true on the tick a run-once effect finishes, after
    /// which it is suspended.
    pub fn apply(&mut self, state: &mut VisualState, local_tick: u64) -> bool {
        if self.suspended {
            return false;
        }
        let elapsed = local_tick.saturating_sub(self.started_at);
        let duration = u64::from(self.duration);

        if !self.looping && elapsed >= duration {
            self.settle(state);
            self.suspended = true;
            return true;
        }

        let phase = if self.looping {
            elapsed % duration
        } else {
            elapsed
        };
        let progress = phase as f32 / self.duration as f32;

        match self.kind {
            EffectKind::Animation {
                frame_count,
                ticks_per_frame,
            } => {
                state.frame_offset = (phase / u64::from(ticks_per_frame)) as u32 % frame_count;
            }
            EffectKind::Blink { period } => {
                state.shown = (phase / u64::from(period)) % 2 == 0;
            }
            EffectKind::Shrink => {
                state.scale = 1.0 - progress;
            }
            EffectKind::Shift { dx, dy } => {
                let wave = (progress * std::f32::consts::TAU).sin();
                state.offset_x = dx * wave;
                state.offset_y = dy * wave;
            }
            EffectKind::Rotate { turns } => {
                state.angle = turns * std::f32::consts::TAU * progress;
            }
        }
        false
    }

    /// Final pose of a run-once effect.
    fn settle(&self, state: &mut VisualState) {
        match self.kind {
            EffectKind::Animation { .. } => state.frame_offset = 0,
            EffectKind::Blink { .. } => state.shown = true,
            EffectKind::Shrink => state.scale = 0.0,
            EffectKind::Shift { .. } => {
                state.offset_x = 0.0;
                state.offset_y = 0.0;
            }
            EffectKind::Rotate { .. } => state.angle = 0.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
