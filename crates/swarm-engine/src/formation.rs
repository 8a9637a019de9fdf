//! Formation layout and the state shared by the formation processors.
//!
//! The formation moves as one body with a single group velocity. Each alien
//! keeps an anchor (where it sits in formation) and a slot offset from the
//! formation origin; the origin advances with the group, so a raiding alien
//! always knows the live position it must return to.

use crate::config::{Settings, Tunables};
use crate::consts::{self, visual};
use crate::components::AlienBehavior;

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormationRow {
    pub visual: &'static str,
    pub count: u32,
    pub score: u32,
}

/// Rows from top to bottom.
pub const FORMATION_LAYOUT: &[FormationRow] = &[
    FormationRow { visual: visual::ALIEN_FLAGSHIP, count: 4, score: 50 },
    FormationRow { visual: visual::ALIEN_ESCORT, count: 8, score: 30 },
    FormationRow { visual: visual::ALIEN_SCOUT, count: 10, score: 20 },
    FormationRow { visual: visual::ALIEN_SCOUT, count: 10, score: 10 },
];

/// One alien placement computed by [`layout_formation`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlienSlot {
    pub visual: &'static str,
    pub width: f32,
    /// Center offset from the formation origin.
    pub slot_x: f32,
    pub slot_y: f32,
    pub behavior: AlienBehavior,
}

/// Formation origin plus one slot per alien, rows centered on the widest.
pub fn layout_formation(
    rows: &[FormationRow],
    settings: &Settings,
    tunables: &Tunables,
) -> ((f32, f32), Vec<AlienSlot>) {
    let widest = rows.iter().map(|r| r.count).max().unwrap_or(0).max(1);
    let cell = settings.scene_width * consts::FORMATION_WIDTH_RATIO / widest as f32;
    let width = cell / (1.0 + consts::FORMATION_SPACING);
    let origin = (
        (settings.scene_width - cell * widest as f32) / 2.0,
        settings.scene_height * consts::FORMATION_TOP_RATIO,
    );

    let mut slots = Vec::new();
    for (row_idx, row) in rows.iter().enumerate() {
        let indent = (widest - row.count.min(widest)) as f32 * cell / 2.0;
        for col in 0..row.count.min(widest) {
            slots.push(AlienSlot {
                visual: row.visual,
                width,
                slot_x: indent + col as f32 * cell + cell / 2.0,
                slot_y: row_idx as f32 * cell + cell / 2.0,
                behavior: AlienBehavior {
                    animation_probability: tunables.animation_probability,
                    shoot_probability: tunables.shoot_probability,
                    raid_probability: tunables.raid_probability,
                    raid_shoot_probability: tunables.raid_shoot_probability,
                    score: row.score,
                },
            });
        }
    }
    (origin, slots)
}

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Side/bottom guard state machine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GuardState {
    /// Moving sideways, watching for a wall.
    Scanning,
    /// Moving down after a wall; `resume_dx` is the horizontal velocity the
    /// formation had when it stopped.
    Descending { ticks_left: u32, resume_dx: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormationState {
    /// Group velocity per tick, before the speedup factor.
    pub dx: f32,
    pub dy: f32,
    /// While frozen neither the aliens in formation nor their anchors move.
    pub frozen: bool,
    pub origin_x: f32,
    pub origin_y: f32,
    pub guard: GuardState,
}

impl Default for FormationState {
    fn default() -> Self {
        Self {
            dx: 0.0,
            dy: 0.0,
            frozen: false,
            origin_x: 0.0,
            origin_y: 0.0,
            guard: GuardState::Scanning,
        }
    }
}

impl FormationState {
    /// At rest at `origin`, scanning.
    pub fn at(origin: (f32, f32)) -> Self {
        Self {
            origin_x: origin.0,
            origin_y: origin.1,
            ..Self::default()
        }
    }

    pub fn is_descending(&self) -> bool {
        matches!(self.guard, GuardState::Descending { .. })
    }

    /// Group step this tick with the speedup applied.
    pub fn step(&self, speedup: f32) -> (f32, f32) {
        (self.dx * speedup, self.dy * speedup)
    }
}

/// State shared by the processors across ticks.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SharedState {
    pub formation: FormationState,
    pub ammo: u32,
    /// Where the player stood after the bounds guard ran; `None` while there
    /// is no vulnerable-to-raid player.
    pub player_position: Option<(f32, f32)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_fits_scene_and_centers_rows() {
        let settings = Settings::default();
        let (origin, slots) = layout_formation(FORMATION_LAYOUT, &settings, &Tunables::default());
        let total: u32 = FORMATION_LAYOUT.iter().map(|r| r.count).sum();
        assert_eq!(slots.len(), total as usize);

        for slot in &slots {
            let x = origin.0 + slot.slot_x;
            assert!(x - slot.width / 2.0 >= 0.0);
            assert!(x + slot.width / 2.0 <= settings.scene_width);
        }

        // The four-wide top row sits centered over the ten-wide rows.
        let top: Vec<f32> = slots[..4].iter().map(|s| s.slot_x).collect();
        let wide: Vec<f32> = slots[12..22].iter().map(|s| s.slot_x).collect();
        let mid_top = (top[0] + top[3]) / 2.0;
        let mid_wide = (wide[0] + wide[9]) / 2.0;
        assert!((mid_top - mid_wide).abs() < 1e-3);
    }

    #[test]
    fn rows_carry_their_scores() {
        let (_, slots) = layout_formation(FORMATION_LAYOUT, &Settings::default(), &Tunables::default());
        assert_eq!(slots[0].behavior.score, 50);
        assert_eq!(slots.last().unwrap().behavior.score, 10);
    }

    #[test]
    fn step_applies_speedup() {
        let mut state = FormationState::at((10.0, 20.0));
        state.dx = 0.5;
        assert_eq!(state.step(2.0), (1.0, 0.0));
        assert!(!state.is_descending());
    }
}
