//! Gameplay constants that are not part of the per-run [`Settings`](crate::config::Settings).
//!
//! Speeds are in scene units per second; the factory divides them by the
//! tick rate so every velocity stored in the component table is per tick.

/// Duration of each player-entry caption (Attention, Ready, Go).
pub const ENTRY_PHASE_SECONDS: f64 = 1.0;

/// Invulnerability window after a player is re-placed at the end of an entry.
pub const INVULNERABLE_SECONDS: f64 = 2.0;

// -- projectiles ------------------------------------------------------------

pub const PLAYER_MISSILE_SPEED: f32 = 600.0;
pub const ALIEN_MISSILE_SPEED: f32 = 240.0;
pub const MISSILE_WIDTH: f32 = 6.0;

// -- aliens -----------------------------------------------------------------

pub const RAID_SPEED: f32 = 200.0;
pub const RAID_SECONDS: f64 = 2.5;
pub const ALIEN_HIT_POINTS: u32 = 1;

pub const BOSS_SPEED: f32 = 120.0;
pub const BOSS_HIT_POINTS: u32 = 3;
pub const BOSS_SCORE: u32 = 150;
/// Boss width as a share of the scene width.
pub const BOSS_WIDTH_RATIO: f32 = 0.08;
/// Vertical lane of the boss pass as a share of the scene height.
pub const BOSS_LANE_RATIO: f32 = 0.06;

// -- formation layout -------------------------------------------------------

/// Share of the scene width covered by the widest formation row.
pub const FORMATION_WIDTH_RATIO: f32 = 0.7;
/// Top edge of the formation as a share of the scene height.
pub const FORMATION_TOP_RATIO: f32 = 0.12;
/// Gap between neighbouring aliens relative to the alien width.
pub const FORMATION_SPACING: f32 = 0.35;

// -- player -----------------------------------------------------------------

pub const PLAYER_HIT_POINTS: u32 = 1;
/// Spawn line of the player as a share of the scene height.
pub const PLAYER_Y_RATIO: f32 = 0.9;

// -- effects ----------------------------------------------------------------

pub const ANIMATION_TICKS_PER_FRAME: u32 = 6;
pub const EXPLOSION_TICKS_PER_FRAME: u32 = 4;
pub const BLINK_PERIOD_TICKS: u32 = 6;
pub const SHRINK_TICKS: u32 = 18;
pub const SPIN_OUT_TICKS: u32 = 30;
pub const SPIN_OUT_TURNS: f32 = 2.0;
pub const BOSS_BOB_TICKS: u32 = 40;
pub const BOSS_BOB_AMPLITUDE: f32 = 4.0;
/// Explosion width relative to the width of the entity that blew up.
pub const EXPLOSION_SCALE: f32 = 1.4;

// -- collision --------------------------------------------------------------

/// A sampled alpha strictly above this value counts as opaque.
pub const ALPHA_THRESHOLD: u8 = 127;

// -- depth levels (back to front) ------------------------------------------

pub const Z_MISSILE: f32 = 1.0;
pub const Z_ALIEN: f32 = 2.0;
pub const Z_PLAYER: f32 = 3.0;
pub const Z_EXPLOSION: f32 = 4.0;

// -- resource ids -----------------------------------------------------------

pub mod visual {
    pub const ALIEN_SCOUT: &str = "alien_scout";
    pub const ALIEN_ESCORT: &str = "alien_escort";
    pub const ALIEN_FLAGSHIP: &str = "alien_flagship";
    pub const BOSS: &str = "alien_boss";
    pub const PLAYER: &str = "player";
    pub const PLAYER_MISSILE: &str = "player_missile";
    pub const ALIEN_MISSILE: &str = "alien_missile";
    pub const EXPLOSION: &str = "explosion";
}

pub mod sound {
    pub const PLAYER_SHOT: &str = "player_shot";
    pub const ALIEN_SHOT: &str = "alien_shot";
    pub const EXPLOSION: &str = "explosion";
    pub const BOSS_SIREN: &str = "boss_siren";
}
