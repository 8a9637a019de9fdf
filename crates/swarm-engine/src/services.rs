//! Host-facing service seams: visuals, audio, and randomness.
//!
//! The scene never talks to a window or a sound card directly. Hosts plug in
//! a [`VisualProvider`], an [`AudioProvider`] and a [`RandomSource`]; the
//! headless implementations here ([`SpriteAtlas`], [`AudioLog`],
//! [`PcgRandom`]) record what the simulation asked for, which is what tests,
//! benches, and the headless demo run against.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::Serialize;
use swarm_ecs::prelude::*;

use crate::collision::Quad;

// ---------------------------------------------------------------------------
// Visuals
// ---------------------------------------------------------------------------

/// Resolved visual resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct VisualHandle(pub u32);

/// One textured quad submitted by the render processor.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub entity: EntityId,
    pub visual: VisualHandle,
    pub depth: i32,
    pub quad: Quad,
    pub angle: f32,
}

/// Player-entry captions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Caption {
    Attention,
    Ready,
    Go,
}

pub trait VisualProvider {
    /// Look up a visual by resource id.
    fn resolve(&self, id: &str) -> Option<VisualHandle>;
    /// Size of a single frame in pixels.
    fn natural_size(&self, visual: VisualHandle) -> (u32, u32);
    /// Frames laid out horizontally in the resource. At least 1.
    fn frame_count(&self, visual: VisualHandle) -> u32;
    /// Alpha at texture coordinate `(u, v)` over the whole sheet, nearest
    /// texel, clamped to the edges.
    fn alpha_at(&self, visual: VisualHandle, u: f32, v: f32) -> u8;
    /// Called once at the start of every scene tick.
    fn begin_frame(&mut self) {}
    fn draw(&mut self, call: &DrawCall);
    fn draw_caption(&mut self, caption: Caption);
}

/// A horizontal strip of equally sized frames with an alpha mask.
#[derive(Debug, Clone, PartialEq)]
pub struct Sprite {
    frame_width: u32,
    frame_height: u32,
    frames: u32,
    alpha: Vec<u8>,
}

impl Sprite {
    /// Fully opaque sprite.
    pub fn solid(frame_width: u32, frame_height: u32, frames: u32) -> Self {
        let frames = frames.max(1);
        let len = (frame_width * frames * frame_height) as usize;
        Self {
            frame_width,
            frame_height,
            frames,
            alpha: vec![u8::MAX; len],
        }
    }

    /// Sprite whose frames are opaque inside the inscribed ellipse and
    /// transparent in the corners.
    pub fn ellipse(frame_width: u32, frame_height: u32, frames: u32) -> Self {
        let frames = frames.max(1);
        let sheet_width = frame_width * frames;
        let rx = frame_width as f32 / 2.0;
        let ry = frame_height as f32 / 2.0;
        let mut alpha = Vec::with_capacity((sheet_width * frame_height) as usize);
        for y in 0..frame_height {
            for x in 0..sheet_width {
                let fx = (x % frame_width) as f32 + 0.5 - rx;
                let fy = y as f32 + 0.5 - ry;
                let inside = (fx / rx).powi(2) + (fy / ry).powi(2) <= 1.0;
                alpha.push(if inside { u8::MAX } else { 0 });
            }
        }
        Self {
            frame_width,
            frame_height,
            frames,
            alpha,
        }
    }

    /// Sprite from a row-major alpha mask covering the whole sheet. `None`
    /// if the mask length does not match.
    pub fn from_alpha(frame_width: u32, frame_height: u32, frames: u32, alpha: Vec<u8>) -> Option<Self> {
        let frames = frames.max(1);
        (alpha.len() == (frame_width * frames * frame_height) as usize).then_some(Self {
            frame_width,
            frame_height,
            frames,
            alpha,
        })
    }

    pub fn frame_size(&self) -> (u32, u32) {
        (self.frame_width, self.frame_height)
    }

    pub fn frames(&self) -> u32 {
        self.frames
    }

    pub fn alpha_at(&self, u: f32, v: f32) -> u8 {
        let sheet_width = self.frame_width * self.frames;
        if sheet_width == 0 || self.frame_height == 0 {
            return 0;
        }
        let x = texel(u, sheet_width);
        let y = texel(v, self.frame_height);
        self.alpha[(y * sheet_width + x) as usize]
    }
}

/// Nearest texel index for a normalized coordinate, clamped to `[0, size)`.
fn texel(coord: f32, size: u32) -> u32 {
    let scaled = (coord * size as f32).floor();
    if scaled.is_nan() || scaled < 0.0 {
        0
    } else {
        (scaled as u32).min(size - 1)
    }
}

/// In-memory [`VisualProvider`] that records draw calls instead of drawing.
#[derive(Debug, Default)]
pub struct SpriteAtlas {
    sprites: Vec<(String, Sprite)>,
    draws: Vec<DrawCall>,
    captions: Vec<Caption>,
}

impl SpriteAtlas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atlas with every visual the arcade scene uses.
    pub fn arcade() -> Self {
        use crate::consts::visual;

        let mut atlas = Self::new();
        atlas.insert(visual::ALIEN_SCOUT, Sprite::ellipse(16, 12, 2));
        atlas.insert(visual::ALIEN_ESCORT, Sprite::ellipse(16, 12, 2));
        atlas.insert(visual::ALIEN_FLAGSHIP, Sprite::ellipse(16, 14, 2));
        atlas.insert(visual::BOSS, Sprite::ellipse(32, 14, 2));
        atlas.insert(visual::PLAYER, Sprite::ellipse(16, 12, 1));
        atlas.insert(visual::PLAYER_MISSILE, Sprite::solid(2, 8, 1));
        atlas.insert(visual::ALIEN_MISSILE, Sprite::solid(2, 8, 2));
        atlas.insert(visual::EXPLOSION, Sprite::ellipse(16, 16, 4));
        atlas
    }

    /// Register `sprite` under `id`, replacing a previous one.
    pub fn insert(&mut self, id: &str, sprite: Sprite) -> VisualHandle {
        if let Some(idx) = self.sprites.iter().position(|(name, _)| name == id) {
            self.sprites[idx].1 = sprite;
            return VisualHandle(idx as u32);
        }
        self.sprites.push((id.to_owned(), sprite));
        VisualHandle(self.sprites.len() as u32 - 1)
    }

    pub fn sprite(&self, visual: VisualHandle) -> Option<&Sprite> {
        self.sprites.get(visual.0 as usize).map(|(_, s)| s)
    }

    /// Draw calls since the last [`begin_frame`](VisualProvider::begin_frame).
    pub fn draws(&self) -> &[DrawCall] {
        &self.draws
    }

    pub fn captions(&self) -> &[Caption] {
        &self.captions
    }
}

impl VisualProvider for SpriteAtlas {
    fn resolve(&self, id: &str) -> Option<VisualHandle> {
        self.sprites
            .iter()
            .position(|(name, _)| name == id)
            .map(|idx| VisualHandle(idx as u32))
    }

    fn natural_size(&self, visual: VisualHandle) -> (u32, u32) {
        self.sprite(visual).map_or((0, 0), Sprite::frame_size)
    }

    fn frame_count(&self, visual: VisualHandle) -> u32 {
        self.sprite(visual).map_or(1, Sprite::frames)
    }

    fn alpha_at(&self, visual: VisualHandle, u: f32, v: f32) -> u8 {
        self.sprite(visual).map_or(0, |s| s.alpha_at(u, v))
    }

    fn begin_frame(&mut self) {
        self.draws.clear();
        self.captions.clear();
    }

    fn draw(&mut self, call: &DrawCall) {
        self.draws.push(call.clone());
    }

    fn draw_caption(&mut self, caption: Caption) {
        self.captions.push(caption);
    }
}

// ---------------------------------------------------------------------------
// Audio
// ---------------------------------------------------------------------------

pub trait AudioProvider {
    fn play_once(&mut self, id: &str);
    fn play_looped(&mut self, id: &str);
    fn stop(&mut self, id: &str);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioEvent {
    Once(String),
    Looped(String),
    Stopped(String),
}

/// [`AudioProvider`] that keeps a log of requests.
#[derive(Debug, Default)]
pub struct AudioLog {
    events: Vec<AudioEvent>,
}

impl AudioLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[AudioEvent] {
        &self.events
    }

    /// How many times `id` was played once.
    pub fn played(&self, id: &str) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, AudioEvent::Once(s) if s == id))
            .count()
    }

    /// Whether `id` was started looped and not stopped since.
    pub fn is_looping(&self, id: &str) -> bool {
        self.events
            .iter()
            .rev()
            .find_map(|e| match e {
                AudioEvent::Looped(s) if s == id => Some(true),
                AudioEvent::Stopped(s) if s == id => Some(false),
                _ => None,
            })
            .unwrap_or(false)
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl AudioProvider for AudioLog {
    fn play_once(&mut self, id: &str) {
        self.events.push(AudioEvent::Once(id.to_owned()));
    }

    fn play_looped(&mut self, id: &str) {
        self.events.push(AudioEvent::Looped(id.to_owned()));
    }

    fn stop(&mut self, id: &str) {
        self.events.push(AudioEvent::Stopped(id.to_owned()));
    }
}

// ---------------------------------------------------------------------------
// Randomness
// ---------------------------------------------------------------------------

pub trait RandomSource {
    /// Uniform value in `[0, 1)`.
    fn next_unit(&mut self) -> f64;
}

/// Seeded PCG generator. Same seed, same sequence.
#[derive(Debug, Clone)]
pub struct PcgRandom {
    rng: Pcg32,
}

impl PcgRandom {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
        }
    }
}

impl RandomSource for PcgRandom {
    fn next_unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
