//! Pixel-accurate collision between rendered sprites.
//!
//! Each candidate entity is reduced to the quad it would be drawn with: an
//! axis-aligned box built from position, geometry and the effect modifiers,
//! plus the texture coordinates of the current frame at its four corners.
//! Two entities collide when some pixel inside both boxes is opaque in both
//! sprites. Pixel centers are mapped to texture space by bilinear
//! interpolation between the corner coordinates.

use serde::Serialize;
use swarm_ecs::prelude::*;

use crate::components::{
    is_active, is_dying, AlienBossStatus, AlienStatus, Damage, Geometry, Graphics, Health,
    PlayerStatus, Position,
};
use crate::consts::ALPHA_THRESHOLD;
use crate::services::{VisualHandle, VisualProvider};

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Aabb {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Aabb {
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    /// Overlap of two boxes; `None` unless it has a positive area.
    pub fn intersection(&self, other: &Aabb) -> Option<Aabb> {
        let overlap = Aabb {
            left: self.left.max(other.left),
            top: self.top.max(other.top),
            right: self.right.min(other.right),
            bottom: self.bottom.min(other.bottom),
        };
        (overlap.right > overlap.left && overlap.bottom > overlap.top).then_some(overlap)
    }

    /// Nearest point inside the box.
    pub fn clamp_point(&self, x: f32, y: f32) -> (f32, f32) {
        (x.clamp(self.left, self.right), y.clamp(self.top, self.bottom))
    }
}

/// Screen box plus texture coordinates at its corners, clockwise from the
/// top-left.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Quad {
    pub bounds: Aabb,
    pub uv: [(f32, f32); 4],
}

impl Quad {
    /// Texture coordinate of screen point `(x, y)` by bilinear interpolation.
    pub fn uv_at(&self, x: f32, y: f32) -> (f32, f32) {
        let (w, h) = (self.bounds.width(), self.bounds.height());
        if w <= 0.0 || h <= 0.0 {
            return self.uv[0];
        }
        let s = ((x - self.bounds.left) / w).clamp(0.0, 1.0);
        let t = ((y - self.bounds.top) / h).clamp(0.0, 1.0);
        let top = lerp(self.uv[0], self.uv[1], s);
        let bottom = lerp(self.uv[3], self.uv[2], s);
        lerp(top, bottom, t)
    }
}

fn lerp(a: (f32, f32), b: (f32, f32), t: f32) -> (f32, f32) {
    (a.0 + (b.0 - a.0) * t, a.1 + (b.1 - a.1) * t)
}

/// The quad an entity is drawn with this frame.
pub fn rendered_quad(
    position: &Position,
    geometry: &Geometry,
    graphics: &Graphics,
    frame_count: u32,
) -> Quad {
    let state = &graphics.state;
    let half_w = geometry.width * state.scale / 2.0;
    let half_h = geometry.height * state.scale / 2.0;
    let cx = position.x + state.offset_x;
    let cy = position.y + state.offset_y;

    let frames = frame_count.max(1);
    let frame = (graphics.frame + state.frame_offset) % frames;
    let u0 = frame as f32 / frames as f32;
    let u1 = (frame + 1) as f32 / frames as f32;

    Quad {
        bounds: Aabb {
            left: cx - half_w,
            top: cy - half_h,
            right: cx + half_w,
            bottom: cy + half_h,
        },
        uv: [(u0, 0.0), (u1, 0.0), (u1, 1.0), (u0, 1.0)],
    }
}

/// Rendered quad and visual of an entity, if it has everything needed.
pub fn entity_quad(
    store: &ComponentStore,
    visuals: &dyn VisualProvider,
    entity: EntityId,
) -> Option<(Quad, VisualHandle)> {
    let position = store.get::<Position>(entity)?;
    let geometry = store.get::<Geometry>(entity)?;
    let graphics = store.get::<Graphics>(entity)?;
    let frames = visuals.frame_count(graphics.visual);
    Some((
        rendered_quad(position, geometry, graphics, frames),
        graphics.visual,
    ))
}

// ---------------------------------------------------------------------------
// Pixel test
// ---------------------------------------------------------------------------

/// True when `a` and `b` share at least one pixel that is opaque in both.
///
/// Entities missing position, geometry or graphics never collide.
pub fn are_in_collision(
    store: &ComponentStore,
    visuals: &dyn VisualProvider,
    a: EntityId,
    b: EntityId,
) -> bool {
    let (Some((quad_a, visual_a)), Some((quad_b, visual_b))) = (
        entity_quad(store, visuals, a),
        entity_quad(store, visuals, b),
    ) else {
        return false;
    };
    let Some(overlap) = quad_a.bounds.intersection(&quad_b.bounds) else {
        return false;
    };

    let x0 = overlap.left.floor() as i64;
    let x1 = overlap.right.ceil() as i64;
    let y0 = overlap.top.floor() as i64;
    let y1 = overlap.bottom.ceil() as i64;

    for py in y0..y1 {
        for px in x0..x1 {
            let (cx, cy) = overlap.clamp_point(px as f32 + 0.5, py as f32 + 0.5);
            let (u, v) = quad_a.uv_at(cx, cy);
            if visuals.alpha_at(visual_a, u, v) <= ALPHA_THRESHOLD {
                continue;
            }
            let (u, v) = quad_b.uv_at(cx, cy);
            if visuals.alpha_at(visual_b, u, v) > ALPHA_THRESHOLD {
                return true;
            }
        }
    }
    false
}

// ---------------------------------------------------------------------------
// Candidate sets
// ---------------------------------------------------------------------------

/// A damage source touching a target this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionPair {
    pub source: EntityId,
    pub target: EntityId,
}

fn is_shown(store: &ComponentStore, entity: EntityId) -> bool {
    store.get::<Graphics>(entity).is_some_and(|g| !g.hidden)
}

fn is_targetable(store: &ComponentStore, entity: EntityId) -> bool {
    is_active(store, entity)
        && is_shown(store, entity)
        && store.has::<Health>(entity)
        && !is_dying(store, entity)
}

/// Every source/target pair in contact this tick.
///
/// Sources are active, shown, non-dying entities with [`Damage`]. Alien
/// targets are formation aliens and the boss; the player is a target only
/// while vulnerable. Dying entities take part on neither side. A source that
/// is removed on hit stops after its first contact.
pub fn detect_collisions(store: &ComponentStore, visuals: &dyn VisualProvider) -> Vec<CollisionPair> {
    let alien_targets: Vec<EntityId> = store
        .entities_with::<AlienStatus>()
        .into_iter()
        .chain(store.entities_with::<AlienBossStatus>())
        .filter(|&e| is_targetable(store, e))
        .collect();
    let player_targets: Vec<EntityId> = store
        .iter::<PlayerStatus>()
        .filter(|(_, status)| !status.is_invulnerable)
        .map(|(e, _)| e)
        .filter(|&e| is_targetable(store, e))
        .collect();

    let mut pairs = Vec::new();
    for (source, damage) in store.iter::<Damage>() {
        if !is_active(store, source) || !is_shown(store, source) || is_dying(store, source) {
            continue;
        }
        let aliens: &[EntityId] = if damage.danger_to_aliens {
            &alien_targets
        } else {
            &[]
        };
        let players: &[EntityId] = if damage.danger_to_player {
            &player_targets
        } else {
            &[]
        };

        for &target in aliens.iter().chain(players) {
            if target == source || !are_in_collision(store, visuals, source, target) {
                continue;
            }
            pairs.push(CollisionPair { source, target });
            if damage.remove_on_hit {
                break;
            }
        }
    }
    pairs
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Identity;
    use crate::services::{Sprite, SpriteAtlas};

    struct Scene {
        store: ComponentStore,
        atlas: SpriteAtlas,
        solid: VisualHandle,
        round: VisualHandle,
    }

    fn scene() -> Scene {
        let mut atlas = SpriteAtlas::new();
        let solid = atlas.insert("solid", Sprite::solid(10, 10, 1));
        let round = atlas.insert("round", Sprite::ellipse(10, 10, 1));
        Scene {
            store: ComponentStore::new(),
            atlas,
            solid,
            round,
        }
    }

    fn sprite_at(scene: &mut Scene, visual: VisualHandle, x: f32, y: f32) -> EntityId {
        let store = &mut scene.store;
        let e = store.create();
        store
            .insert(
                e,
                Identity {
                    id: e.index(),
                    tag: "test".into(),
                    active: true,
                    notice_on_pruning: false,
                },
            )
            .unwrap();
        store.insert(e, Position { x, y, z: 0.0 }).unwrap();
        store
            .insert(
                e,
                Geometry {
                    width: 10.0,
                    height: 10.0,
                },
            )
            .unwrap();
        store.insert(e, Graphics::new(visual)).unwrap();
        e
    }

    fn missile(scene: &mut Scene, x: f32, y: f32) -> EntityId {
        let visual = scene.solid;
        let e = sprite_at(scene, visual, x, y);
        scene
            .store
            .insert(
                e,
                Damage {
                    points: 1,
                    danger_to_aliens: true,
                    danger_to_player: false,
                    remove_on_hit: true,
                },
            )
            .unwrap();
        e
    }

    fn alien(scene: &mut Scene, x: f32, y: f32) -> EntityId {
        let visual = scene.solid;
        let e = sprite_at(scene, visual, x, y);
        scene.store.insert(e, AlienStatus::default()).unwrap();
        scene.store.insert(e, Health::full(1)).unwrap();
        e
    }

    // -- geometry ------------------------------------------------------------

    #[test]
    fn quad_selects_frame_column() {
        let pos = Position { x: 5.0, y: 5.0, z: 0.0 };
        let geo = Geometry { width: 10.0, height: 4.0 };
        let mut gfx = Graphics::new(VisualHandle(0));
        gfx.frame = 1;
        gfx.state.frame_offset = 2;
        let quad = rendered_quad(&pos, &geo, &gfx, 4);
        assert_eq!(quad.bounds, Aabb { left: 0.0, top: 3.0, right: 10.0, bottom: 7.0 });
        assert_eq!(quad.uv[0], (0.75, 0.0));
        assert_eq!(quad.uv[2], (1.0, 1.0));
    }

    #[test]
    fn uv_interpolates_between_corners() {
        let quad = Quad {
            bounds: Aabb { left: 0.0, top: 0.0, right: 10.0, bottom: 10.0 },
            uv: [(0.0, 0.0), (0.5, 0.0), (0.5, 1.0), (0.0, 1.0)],
        };
        assert_eq!(quad.uv_at(5.0, 5.0), (0.25, 0.5));
        assert_eq!(quad.uv_at(20.0, -3.0), (0.5, 0.0));
    }

    #[test]
    fn scaled_box_shrinks_around_center() {
        let pos = Position { x: 0.0, y: 0.0, z: 0.0 };
        let geo = Geometry { width: 10.0, height: 10.0 };
        let mut gfx = Graphics::new(VisualHandle(0));
        gfx.state.scale = 0.5;
        let quad = rendered_quad(&pos, &geo, &gfx, 1);
        assert_eq!(quad.bounds.width(), 5.0);
        assert_eq!(quad.bounds.left, -2.5);
    }

    // -- pixel test ----------------------------------------------------------

    #[test]
    fn overlapping_solids_collide() {
        let mut s = scene();
        let solid = s.solid;
        let a = sprite_at(&mut s, solid, 10.0, 10.0);
        let b = sprite_at(&mut s, solid, 18.0, 10.0);
        let c = sprite_at(&mut s, solid, 40.0, 10.0);
        assert!(are_in_collision(&s.store, &s.atlas, a, b));
        assert!(are_in_collision(&s.store, &s.atlas, b, a));
        assert!(!are_in_collision(&s.store, &s.atlas, a, c));
    }

    #[test]
    fn sub_pixel_overlap_collides() {
        let mut s = scene();
        let solid = s.solid;
        let a = sprite_at(&mut s, solid, 10.0, 10.0);
        let side = sprite_at(&mut s, solid, 19.6, 10.0);
        let below = sprite_at(&mut s, solid, 13.0, 19.75);
        let apart = sprite_at(&mut s, solid, 20.0, 10.0);
        assert!(are_in_collision(&s.store, &s.atlas, a, side));
        assert!(are_in_collision(&s.store, &s.atlas, side, a));
        assert!(are_in_collision(&s.store, &s.atlas, a, below));
        assert!(!are_in_collision(&s.store, &s.atlas, a, apart));
    }

    #[test]
    fn transparent_corners_do_not_collide() {
        let mut s = scene();
        let round = s.round;
        let a = sprite_at(&mut s, round, 10.0, 10.0);
        let b = sprite_at(&mut s, round, 19.0, 19.0);
        assert!(!are_in_collision(&s.store, &s.atlas, a, b));

        let c = sprite_at(&mut s, round, 14.0, 10.0);
        assert!(are_in_collision(&s.store, &s.atlas, a, c));
    }

    #[test]
    fn incomplete_entity_never_collides() {
        let mut s = scene();
        let solid = s.solid;
        let a = sprite_at(&mut s, solid, 10.0, 10.0);
        let b = sprite_at(&mut s, solid, 10.0, 10.0);
        s.store.remove::<Geometry>(b).unwrap();
        assert!(!are_in_collision(&s.store, &s.atlas, a, b));
    }

    // -- candidate sets ------------------------------------------------------

    #[test]
    fn missile_hits_alien() {
        let mut s = scene();
        let target = alien(&mut s, 50.0, 50.0);
        let source = missile(&mut s, 52.0, 50.0);
        assert_eq!(
            detect_collisions(&s.store, &s.atlas),
            vec![CollisionPair { source, target }]
        );
    }

    #[test]
    fn dying_alien_is_not_a_target() {
        let mut s = scene();
        let target = alien(&mut s, 50.0, 50.0);
        missile(&mut s, 50.0, 50.0);
        s.store.get_mut::<AlienStatus>(target).unwrap().is_dying = true;
        assert!(detect_collisions(&s.store, &s.atlas).is_empty());
    }

    #[test]
    fn removed_on_hit_source_hits_once() {
        let mut s = scene();
        alien(&mut s, 50.0, 50.0);
        alien(&mut s, 54.0, 50.0);
        missile(&mut s, 52.0, 50.0);
        assert_eq!(detect_collisions(&s.store, &s.atlas).len(), 1);
    }

    #[test]
    fn invulnerable_player_is_skipped() {
        let mut s = scene();
        let solid = s.solid;
        let player = sprite_at(&mut s, solid, 50.0, 50.0);
        s.store
            .insert(player, PlayerStatus { is_invulnerable: true, ..Default::default() })
            .unwrap();
        s.store.insert(player, Health::full(1)).unwrap();
        let shot = sprite_at(&mut s, solid, 50.0, 50.0);
        s.store
            .insert(
                shot,
                Damage {
                    points: 1,
                    danger_to_aliens: false,
                    danger_to_player: true,
                    remove_on_hit: true,
                },
            )
            .unwrap();

        assert!(detect_collisions(&s.store, &s.atlas).is_empty());
        s.store.get_mut::<PlayerStatus>(player).unwrap().is_invulnerable = false;
        assert_eq!(detect_collisions(&s.store, &s.atlas).len(), 1);
    }

    #[test]
    fn hidden_entities_are_ignored() {
        let mut s = scene();
        let target = alien(&mut s, 50.0, 50.0);
        missile(&mut s, 50.0, 50.0);
        s.store.get_mut::<Graphics>(target).unwrap().hidden = true;
        assert!(detect_collisions(&s.store, &s.atlas).is_empty());
    }
}
