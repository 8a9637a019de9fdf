use swarm_ecs::prelude::*;
use tracing::warn;

use super::{Processor, ProcessorKind, TickContext};
use crate::collision::entity_quad;
use crate::components::{Geometry, Graphics, PlayerBehavior, PlayerStatus, Position, Velocity};
use crate::consts::sound;
use crate::factory::MissileKind;
use crate::input::ControlState;

fn find_player(store: &ComponentStore) -> Option<EntityId> {
    store.iter::<PlayerBehavior>().map(|(entity, _)| entity).next()
}

fn is_dying(store: &ComponentStore, player: EntityId) -> bool {
    store.get::<PlayerStatus>(player).is_some_and(|s| s.is_dying)
}

// ---------------------------------------------------------------------------
// PlayerSpeedUpdater
// ---------------------------------------------------------------------------

/// Sets the player's velocity from the held directions.
#[derive(Debug, Default)]
pub struct PlayerSpeedUpdater;

impl Processor for PlayerSpeedUpdater {
    fn kind(&self) -> ProcessorKind {
        ProcessorKind::PlayerSpeedUpdater
    }

    fn run(&mut self, ctx: &mut TickContext<'_>) {
        let Some(player) = find_player(ctx.store) else {
            return;
        };
        if is_dying(ctx.store, player) {
            return;
        }

        let step = ctx.settings.per_tick(ctx.settings.player_speed);
        let held = ctx.input.state;
        let mut velocity = Velocity::ZERO;
        if held.contains(ControlState::LEFT) {
            velocity.dx -= step;
        }
        if held.contains(ControlState::RIGHT) {
            velocity.dx += step;
        }
        if held.contains(ControlState::UP) {
            velocity.dy -= step;
        }
        if held.contains(ControlState::DOWN) {
            velocity.dy += step;
        }
        if let Err(err) = ctx.store.insert(player, velocity) {
            warn!(entity = %player, %err, "player velocity not updated");
        }
    }
}

// ---------------------------------------------------------------------------
// PlayerFireUpdater
// ---------------------------------------------------------------------------

/// Reloads ammunition and fires one missile per press of the fire control.
#[derive(Debug, Default)]
pub struct PlayerFireUpdater {
    /// The current press has already been answered.
    commenced: bool,
    reload_ticks: u32,
}

impl PlayerFireUpdater {
    fn reload(&mut self, ctx: &mut TickContext<'_>) {
        if ctx.shared.ammo >= ctx.settings.ammo_capacity {
            self.reload_ticks = 0;
            return;
        }
        self.reload_ticks += 1;
        if self.reload_ticks >= ctx.settings.ticks_for(ctx.settings.reload_time).max(1) {
            ctx.shared.ammo += 1;
            self.reload_ticks = 0;
        }
    }
}

impl Processor for PlayerFireUpdater {
    fn kind(&self) -> ProcessorKind {
        ProcessorKind::PlayerFireUpdater
    }

    fn run(&mut self, ctx: &mut TickContext<'_>) {
        self.reload(ctx);

        let held = ctx.input.state.contains(ControlState::FIRE);
        let Some(player) = find_player(ctx.store) else {
            self.commenced &= held;
            return;
        };
        let Some(status) = ctx.store.get_mut::<PlayerStatus>(player) else {
            return;
        };
        if !held {
            self.commenced = false;
            status.is_shoot_requested = false;
            return;
        }
        if !self.commenced {
            status.is_shoot_requested = true;
        }
        if !status.is_shoot_requested || status.is_dying || ctx.shared.ammo == 0 {
            return;
        }

        let Some((quad, _)) = entity_quad(ctx.store, ctx.visuals, player) else {
            return;
        };
        let x = (quad.bounds.left + quad.bounds.right) / 2.0;
        match ctx
            .factory
            .spawn_missile(ctx.store, ctx.visuals, MissileKind::Player, x, quad.bounds.top)
        {
            Ok(_) => {
                ctx.shared.ammo -= 1;
                ctx.audio.play_once(sound::PLAYER_SHOT);
            }
            Err(err) => warn!(%err, "player shot dropped"),
        }
        self.commenced = true;
        if let Some(status) = ctx.store.get_mut::<PlayerStatus>(player) {
            status.is_shoot_requested = false;
        }
    }

    fn reset(&mut self) {
        self.commenced = false;
        self.reload_ticks = 0;
    }
}

// ---------------------------------------------------------------------------
// PlayerBoundsGuard
// ---------------------------------------------------------------------------

/// Cancels any velocity component that would take the player out of the
/// scene, then records where the player stands.
#[derive(Debug, Default)]
pub struct PlayerBoundsGuard;

impl Processor for PlayerBoundsGuard {
    fn kind(&self) -> ProcessorKind {
        ProcessorKind::PlayerBoundsGuard
    }

    fn run(&mut self, ctx: &mut TickContext<'_>) {
        ctx.shared.player_position = None;
        let Some(player) = find_player(ctx.store) else {
            return;
        };
        let (position, geometry) = match (
            ctx.store.require::<Position>(player),
            ctx.store.require::<Geometry>(player),
        ) {
            (Ok(p), Ok(g)) => (*p, *g),
            (Err(err), _) | (_, Err(err)) => {
                warn!(entity = %player, %err, "player skipped by bounds guard");
                return;
            }
        };
        let (width, height) = (ctx.settings.scene_width, ctx.settings.scene_height);

        if let Some(velocity) = ctx.store.get_mut::<Velocity>(player) {
            let (half_w, half_h) = (geometry.width / 2.0, geometry.height / 2.0);
            let x = position.x + velocity.dx;
            if x - half_w < 0.0 || x + half_w > width {
                velocity.dx = 0.0;
            }
            let y = position.y + velocity.dy;
            if y - half_h < 0.0 || y + half_h > height {
                velocity.dy = 0.0;
            }
        }

        let hidden = ctx.store.get::<Graphics>(player).is_some_and(|g| g.hidden);
        if !hidden && !is_dying(ctx.store, player) {
            ctx.shared.player_position = Some((position.x, position.y));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Identity;
    use crate::input::ControlInput;
    use crate::processors::testing::Harness;

    fn player(h: &mut Harness, x: f32) -> EntityId {
        let y = h.settings.scene_height - 40.0;
        let width = h.settings.player_width;
        h.factory
            .spawn_player(&mut h.store, &h.visuals, x, y, width, 60)
            .unwrap()
    }

    fn hold(h: &mut Harness, state: ControlState) {
        h.input = ControlInput::new(state, 0);
    }

    fn player_missiles(h: &Harness) -> usize {
        h.store
            .iter::<Identity>()
            .filter(|(_, i)| i.tag == "player_missile")
            .count()
    }

    // -- speed ---------------------------------------------------------------

    #[test]
    fn held_directions_set_velocity() {
        let mut h = Harness::new();
        let p = player(&mut h, 300.0);
        hold(&mut h, ControlState::LEFT | ControlState::UP);
        h.run(&mut PlayerSpeedUpdater);

        let v = *h.store.get::<Velocity>(p).unwrap();
        let step = h.settings.player_speed / 60.0;
        assert!((v.dx + step).abs() < 1e-5);
        assert!((v.dy + step).abs() < 1e-5);

        hold(&mut h, ControlState::NONE);
        h.run(&mut PlayerSpeedUpdater);
        assert_eq!(*h.store.get::<Velocity>(p).unwrap(), Velocity::ZERO);
    }

    // -- fire ----------------------------------------------------------------

    #[test]
    fn held_fire_yields_one_shot() {
        let mut h = Harness::new();
        player(&mut h, 300.0);
        let mut fire = PlayerFireUpdater::default();
        hold(&mut h, ControlState::FIRE);
        for _ in 0..50 {
            h.run(&mut fire);
        }
        assert_eq!(player_missiles(&h), 1);

        hold(&mut h, ControlState::NONE);
        h.run(&mut fire);
        hold(&mut h, ControlState::FIRE);
        h.run(&mut fire);
        assert_eq!(player_missiles(&h), 2);
    }

    #[test]
    fn empty_magazine_blocks_until_reload() {
        let mut h = Harness::new();
        player(&mut h, 300.0);
        h.shared.ammo = 0;
        let mut fire = PlayerFireUpdater::default();
        hold(&mut h, ControlState::FIRE);
        h.run(&mut fire);
        assert_eq!(player_missiles(&h), 0);

        let reload = h.settings.ticks_for(h.settings.reload_time);
        for _ in 1..reload {
            h.run(&mut fire);
        }
        assert_eq!(player_missiles(&h), 1);
        assert_eq!(h.shared.ammo, 0);
    }

    #[test]
    fn ammo_reloads_to_capacity() {
        let mut h = Harness::new();
        h.shared.ammo = 0;
        let mut fire = PlayerFireUpdater::default();
        let reload = h.settings.ticks_for(h.settings.reload_time);
        for _ in 0..reload * (h.settings.ammo_capacity + 3) {
            h.run(&mut fire);
        }
        assert_eq!(h.shared.ammo, h.settings.ammo_capacity);
    }

    // -- bounds --------------------------------------------------------------

    #[test]
    fn bounds_cancel_escaping_velocity() {
        let mut h = Harness::new();
        let half = h.settings.player_width / 2.0;
        let p = player(&mut h, half + 1.0);
        h.store.insert(p, Velocity { dx: -3.0, dy: 2.0, dz: 0.0 }).unwrap();
        h.run(&mut PlayerBoundsGuard);

        let v = h.store.get::<Velocity>(p).unwrap();
        assert_eq!(v.dx, 0.0);
        assert_eq!(v.dy, 2.0);
        assert_eq!(h.shared.player_position, Some((half + 1.0, h.settings.scene_height - 40.0)));
    }

    #[test]
    fn hidden_player_is_not_recorded() {
        let mut h = Harness::new();
        let p = player(&mut h, 300.0);
        h.store.get_mut::<Graphics>(p).unwrap().hidden = true;
        h.run(&mut PlayerBoundsGuard);
        assert_eq!(h.shared.player_position, None);
    }
}
