//! End-to-end scenarios driven through the scene controller's host API.
//!
//! Every scenario uses the headless sprite atlas, the recording audio log and
//! a seeded random source, so each run is reproducible.

use swarm_engine::consts::{self, sound};
use swarm_engine::formation::FORMATION_LAYOUT;
use swarm_engine::prelude::*;

type Scene = SceneController<SpriteAtlas, AudioLog, PcgRandom>;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct Game {
    scene: Scene,
    tick: u64,
}

impl Game {
    fn new(settings: Settings, seed: u64) -> Self {
        let mut scene = SceneController::new(
            settings,
            SpriteAtlas::arcade(),
            AudioLog::new(),
            PcgRandom::seeded(seed),
        )
        .unwrap();
        scene.reset(0);
        Self { scene, tick: 0 }
    }

    /// A game past the player entry, with the player in play.
    fn active(settings: Settings, seed: u64) -> Self {
        let mut game = Self::new(settings, seed);
        game.finish_entry();
        game
    }

    fn step(&mut self, state: ControlState) -> bool {
        let running = self.scene.render_actual_scene(self.tick, state, 0);
        self.tick += 1;
        running
    }

    fn finish_entry(&mut self) {
        let mut guard = 0;
        while self.scene.phase() != ScenePhase::Active {
            self.step(ControlState::NONE);
            guard += 1;
            assert!(guard < 1_000, "player entry never finished");
        }
    }

    fn step_until(&mut self, what: &str, mut done: impl FnMut(&Scene) -> bool) {
        let mut guard = 0;
        while !done(&self.scene) {
            self.step(ControlState::NONE);
            guard += 1;
            assert!(guard < 1_000, "{what} never happened");
        }
    }
}

fn formation_size() -> u32 {
    FORMATION_LAYOUT.iter().map(|row| row.count).sum()
}

// ---------------------------------------------------------------------------
// Entry
// ---------------------------------------------------------------------------

#[test]
fn entry_takes_three_caption_phases() {
    let mut game = Game::new(Settings::default(), 1);
    let phase_ticks = u64::from(game.scene.settings().ticks_for(consts::ENTRY_PHASE_SECONDS));

    game.finish_entry();

    assert_eq!(game.tick, 3 * phase_ticks + 1);
    assert!(game.scene.player().is_some());
    assert!(!game.scene.formation().frozen);
}

#[test]
fn settings_from_json_drive_the_scene() {
    let settings = Settings::from_json_str(r#"{ "initial_lives": 2, "ammo_capacity": 7 }"#).unwrap();
    let game = Game::new(settings, 1);
    assert_eq!(game.scene.lives(), 2);
    assert_eq!(game.scene.ammo(), 7);
}

// ---------------------------------------------------------------------------
// Firing
// ---------------------------------------------------------------------------

#[test]
fn holding_fire_shoots_once_per_press() {
    let mut game = Game::active(Settings::default(), 2);

    for _ in 0..30 {
        game.step(ControlState::FIRE);
    }
    assert_eq!(game.scene.audio().played(sound::PLAYER_SHOT), 1);

    game.step(ControlState::NONE);
    game.step(ControlState::FIRE | ControlState::LEFT);
    assert_eq!(game.scene.audio().played(sound::PLAYER_SHOT), 2);
}

#[test]
fn single_shot_kills_alien_and_scores() {
    let mut game = Game::active(Settings::default(), 3);
    let player = game.scene.player().unwrap();
    let start = *game.scene.store().get::<Position>(player).unwrap();

    // Bring the lowest alien right above the player.
    let target = game
        .scene
        .store()
        .iter::<AlienStatus>()
        .map(|(e, s)| (e, s.formation_y))
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(e, _)| e)
        .unwrap();
    {
        let position = game.scene.store_mut().get_mut::<Position>(target).unwrap();
        position.x = start.x;
        position.y = start.y - 80.0;
    }
    let worth = game
        .scene
        .store()
        .get::<swarm_engine::components::AlienBehavior>(target)
        .unwrap()
        .score;
    let score_before = game.scene.current_score();
    let outstanding_before = game.scene.outstanding_aliens();

    game.step(ControlState::FIRE);
    game.step_until("the hit", |scene| {
        scene.store().get::<AlienStatus>(target).unwrap().is_dying
    });

    let at = *game.scene.store().get::<Position>(target).unwrap();
    let explosion = game
        .scene
        .store()
        .iter::<Identity>()
        .find(|(_, identity)| identity.tag == "explosion")
        .map(|(e, _)| e)
        .expect("no explosion spawned");
    let boom = game.scene.store().get::<Position>(explosion).unwrap();
    assert!((boom.x - at.x).abs() < 1e-3);
    assert!((boom.y - at.y).abs() < 1e-3);
    assert_eq!(game.scene.current_score(), score_before);

    game.step_until("the prune", |scene| !scene.store().is_alive(target));

    assert_eq!(game.scene.current_score(), score_before + worth);
    assert_eq!(game.scene.outstanding_aliens(), outstanding_before - 1);
}

// ---------------------------------------------------------------------------
// Level progression
// ---------------------------------------------------------------------------

#[test]
fn cleared_swarm_starts_next_level() {
    let mut game = Game::active(Settings::default(), 4);
    let buildup = game.scene.settings().difficulty_buildup;

    for alien in game.scene.store().entities_with::<AlienStatus>() {
        assert!(game.scene.eliminate_entity(alien));
    }
    game.step_until("swarm clear", |scene| scene.phase() == ScenePhase::SwarmCleared);
    assert_eq!(game.scene.level(), 1);
    assert!(game.scene.current_score() > 0);

    game.step(ControlState::NONE);

    assert_eq!(game.scene.level(), 2);
    assert!((game.scene.tunables().level_multiplier - buildup).abs() < 1e-9);
    assert_eq!(game.scene.outstanding_aliens(), formation_size());
    assert_eq!(
        game.scene.store().entities_with::<AlienStatus>().len() as u32,
        formation_size()
    );
    assert!(matches!(game.scene.phase(), ScenePhase::PlayerEntry(_)));
    assert!(game.scene.formation().frozen);
}

// ---------------------------------------------------------------------------
// Game over
// ---------------------------------------------------------------------------

#[test]
fn losing_last_life_ends_the_game() {
    let settings = Settings {
        initial_lives: 1,
        ..Settings::default()
    };
    let mut game = Game::active(settings, 5);
    let player = game.scene.player().unwrap();

    assert!(game.scene.eliminate_entity(player));
    game.step_until("game over", |scene| scene.game_over());

    assert_eq!(game.scene.lives(), 0);
    assert!(!game.step(ControlState::FIRE));
    for _ in 0..300 {
        game.step(ControlState::NONE);
    }
    assert!(game.scene.player().is_none());
    assert!(!game.scene.player_entry_processing(game.tick));
    assert!(game.scene.store().entities_with::<PlayerStatus>().is_empty());
}

#[test]
fn spare_life_brings_a_new_player() {
    let mut game = Game::active(Settings::default(), 6);
    let first = game.scene.player().unwrap();

    assert!(game.scene.eliminate_entity(first));
    game.step_until("the prune", |scene| !scene.store().is_alive(first));
    assert_eq!(game.scene.lives(), 2);
    assert!(matches!(game.scene.phase(), ScenePhase::PlayerEntry(_)));

    game.finish_entry();
    let second = game.scene.player().unwrap();
    assert_ne!(first, second);
}

// ---------------------------------------------------------------------------
// Determinism
// ---------------------------------------------------------------------------

fn scripted_run(seed: u64, ticks: u64) -> String {
    let mut game = Game::new(Settings::default(), seed);
    for t in 0..ticks {
        let mut state = if t % 80 < 40 {
            ControlState::LEFT
        } else {
            ControlState::RIGHT
        };
        if t % 9 == 0 {
            state = state | ControlState::FIRE;
        }
        game.scene.render_actual_scene(t, state, 0);
    }
    game.scene.state_hash()
}

#[test]
fn same_seed_same_state() {
    assert_eq!(scripted_run(7, 900), scripted_run(7, 900));
}

#[test]
fn different_seed_diverges() {
    assert_ne!(scripted_run(7, 900), scripted_run(8, 900));
}
