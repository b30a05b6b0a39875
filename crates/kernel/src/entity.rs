use glam::Vec2;
use std::f32::consts::{PI, TAU};
use topdown_collide::{Circle, Collidable, Triangle};
use topdown_common::{CellCoord, EntityId, Rect};
use topdown_partition::{CellDelta, MembershipTracker, UniformGrid};

use crate::kind::EntityKind;

/// Everything needed to place a new entity. Derived fields are computed by
/// [`Entity::new`], once.
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnParams {
    pub kind: EntityKind,
    pub width: i32,
    pub height: i32,
    pub position: Vec2,
    pub heading: f32,
    pub speed: f32,
}

impl SpawnParams {
    /// A 32x32, stationary, north-facing entity.
    pub fn new(kind: EntityKind, position: Vec2) -> Self {
        Self {
            kind,
            width: 32,
            height: 32,
            position,
            heading: 0.0,
            speed: 0.0,
        }
    }

    pub fn with_size(mut self, width: i32, height: i32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_heading(mut self, radians: f32) -> Self {
        self.heading = radians;
        self
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }
}

/// Unit vector for a heading. Heading 0 points up (negative y).
pub fn heading_to_direction(heading: f32) -> Vec2 {
    let a = heading - PI / 2.0;
    Vec2::new(a.cos(), a.sin()).normalize_or_zero()
}

/// A movable, axis-aligned bounded object on the world plane.
#[derive(Debug, Clone)]
pub struct Entity {
    id: EntityId,
    kind: EntityKind,
    width: i32,
    height: i32,
    world_size: i32,
    position: Vec2,
    bounds: Rect,
    heading: f32,
    direction: Vec2,
    speed: f32,
    alive: bool,
    collide_distance: i32,
    membership: MembershipTracker,
}

impl Entity {
    /// Build an entity with bounds, direction and collide distance derived from
    /// `params`. The position is clamped into the world. Membership starts
    /// empty until the first [`Entity::recompute_membership`].
    pub fn new(id: EntityId, params: &SpawnParams, world_size: i32) -> Self {
        let mut entity = Self {
            id,
            kind: params.kind,
            width: params.width,
            height: params.height,
            world_size,
            position: Vec2::ZERO,
            bounds: Rect::default(),
            heading: 0.0,
            direction: Vec2::ZERO,
            speed: params.speed,
            alive: true,
            collide_distance: 0,
            membership: MembershipTracker::new(),
        };
        entity.collide_distance = diagonal(params.width, params.height);
        entity.set_heading(params.heading);
        entity.set_position(params.position);
        entity
    }

    /// Stable id assigned at spawn.
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Kind; movement capability is looked up in the [`KindRegistry`](crate::KindRegistry).
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Texture size as `(width, height)`.
    pub fn size(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    /// Centroid in world coordinates.
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Integer rectangle centred on the position.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Rotation origin in texture space.
    pub fn origin(&self) -> Vec2 {
        Vec2::new((self.width / 2) as f32, (self.height / 2) as f32)
    }

    /// Heading in radians, wrapped into `[0, 2π)`. Zero points up.
    pub fn heading(&self) -> f32 {
        self.heading
    }

    /// Unit vector for the current heading.
    pub fn direction(&self) -> Vec2 {
        self.direction
    }

    /// Speed; the entity covers `speed / 10` units per tick.
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Set the speed; takes effect on the next [`Entity::advance`].
    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    /// False once killed through [`Simulation::kill`](crate::Simulation::kill).
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub(crate) fn kill(&mut self) {
        self.alive = false;
    }

    /// Texture diagonal, rounded up.
    pub fn collide_distance(&self) -> i32 {
        self.collide_distance
    }

    /// Cells this entity occupied at its last membership recomputation.
    pub fn cells(&self) -> &[CellCoord] {
        self.membership.current()
    }

    /// Cell holding the centroid; `None` before the first recomputation.
    pub fn center_cell(&self) -> Option<CellCoord> {
        self.membership.current().first().copied()
    }

    /// Tracker holding the current and previous cell lists and signatures.
    pub fn membership(&self) -> &MembershipTracker {
        &self.membership
    }

    /// Move to `p`, clamped into `[0, world_size]` on both axes.
    pub fn set_position(&mut self, p: Vec2) {
        let max = self.world_size as f32;
        self.position = p.clamp(Vec2::ZERO, Vec2::splat(max));
        self.recompute_bounds();
    }

    /// Resize the texture; collide distance and bounds follow.
    pub fn set_size(&mut self, width: i32, height: i32) {
        self.width = width;
        self.height = height;
        self.collide_distance = diagonal(width, height);
        self.recompute_bounds();
    }

    /// Rebuild `bounds` from the current position and size.
    pub fn recompute_bounds(&mut self) {
        self.bounds = Rect::centered(self.position, self.width, self.height);
    }

    /// Set the heading in radians and recompute the direction.
    pub fn set_heading(&mut self, radians: f32) {
        self.heading = radians.rem_euclid(TAU);
        self.direction = heading_to_direction(self.heading);
    }

    /// Advance along `direction`.
    ///
    /// Speeds are tuned for `base_tick_rate`; the `tick_rate / base_tick_rate`
    /// factor keeps on-screen speed steady when the tick rate changes.
    pub fn advance(&mut self, dt: f32, tick_rate: f32, base_tick_rate: f32) {
        let step = self.direction
            * (self.speed / 10.0)
            * (tick_rate / base_tick_rate)
            * base_tick_rate
            * dt;
        self.set_position(self.position + step);
    }

    /// Bounce off the world edge the entity is touching and heading into.
    ///
    /// Returns true if the heading changed.
    pub fn reflect_at_border(&mut self) -> bool {
        let world = self.world_size as f32;
        let half_w = (self.width / 2) as f32;
        let half_h = (self.height / 2) as f32;
        let p = self.position;
        let d = self.direction;
        let mut heading = self.heading;
        let mut changed = false;

        let at_left = p.x - half_w <= 0.0 && d.x < 0.0;
        let at_right = p.x + half_w >= world && d.x > 0.0;
        if at_left || at_right {
            heading = TAU - heading;
            changed = true;
        }
        let at_top = p.y - half_h <= 0.0 && d.y < 0.0;
        let at_bottom = p.y + half_h >= world && d.y > 0.0;
        if at_top || at_bottom {
            heading = PI - heading;
            changed = true;
        }
        if changed {
            self.set_heading(heading);
        }
        changed
    }

    /// Recompute occupied cells against `grid`; the caller applies the delta.
    pub fn recompute_membership(&mut self, grid: &UniformGrid) -> CellDelta {
        self.membership.recompute(&self.bounds, self.position, grid)
    }

    /// Forget membership, returning the cells the grid still lists this entity in.
    pub(crate) fn clear_membership(&mut self) -> Vec<CellCoord> {
        self.membership.clear()
    }
}

fn diagonal(width: i32, height: i32) -> i32 {
    let (w, h) = (width as f32, height as f32);
    (w * w + h * h).sqrt().ceil() as i32
}

impl Collidable for Entity {
    fn bounds(&self) -> Rect {
        self.bounds
    }

    fn bounding_circle(&self) -> Circle {
        Circle {
            center: self.position,
            radius: self.collide_distance as f32 * 0.5,
        }
    }

    /// Isosceles triangle inscribed in the sprite, apex along the heading.
    fn bounding_triangle(&self) -> Triangle {
        let d = self.direction;
        let half_len = self.height as f32 * 0.5;
        let half_width = self.width as f32 * 0.5;
        let apex = self.position + d * half_len;
        let base = self.position - d * half_len;
        let side = d.perp() * half_width;
        Triangle([apex, base + side, base - side])
    }
}
