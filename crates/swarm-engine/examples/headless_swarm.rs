//! Headless swarm demo -- plays a seeded game with a scripted pilot.
//!
//! Run with:
//!   cargo run --example headless_swarm -p swarm-engine -- [settings.json]
//!
//! Set `RUST_LOG=swarm_engine=debug` to follow eliminations and prunes.

use anyhow::Context;
use swarm_engine::prelude::*;
use tracing_subscriber::EnvFilter;

const SEED: u64 = 0x5eed;
const MAX_TICKS: u64 = 60 * 60 * 5;

/// Sweep left and right under the formation, firing in short bursts.
///
/// Keys are produced as a raw host mask: bit 0 left, bit 1 right, bit 4 fire.
fn pilot(tick: u64) -> ControlState {
    let mut keys: u8 = if (tick / 150) % 2 == 0 { 0b0_0001 } else { 0b0_0010 };
    if tick % 12 < 2 {
        keys |= 0b1_0000;
    }
    ControlState::from_bits(keys)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = match std::env::args().nth(1) {
        Some(path) => {
            Settings::load(&path).with_context(|| format!("loading settings from {path}"))?
        }
        None => Settings::default(),
    };

    let mut scene = SceneController::new(
        settings,
        SpriteAtlas::arcade(),
        AudioLog::new(),
        PcgRandom::seeded(SEED),
    )
    .context("building the scene")?;
    scene.reset(0);

    let mut tick = 0;
    while tick < MAX_TICKS && scene.render_actual_scene(tick, pilot(tick), 0) {
        if tick % 600 == 0 {
            let diagnostics = scene.diagnostics();
            tracing::info!(
                tick,
                score = scene.current_score(),
                level = scene.level(),
                lives = scene.lives(),
                aliens = scene.outstanding_aliens(),
                tick_time = ?diagnostics.total_time,
                "progress"
            );
        }
        tick += 1;
    }

    println!(
        "ticks: {tick}  score: {}  level: {}  lives: {}  game over: {}",
        scene.current_score(),
        scene.level(),
        scene.lives(),
        scene.game_over()
    );
    println!("state: {}", scene.state_hash());
    Ok(())
}
