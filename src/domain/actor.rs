/// The actor being navigated between rooms.
/// Position is the sprite's top-left in physics pixels; collisions use
/// the hitbox inset from it.

use crate::config::NavConfig;

use super::geom::{Facing, Point, Rect};

/// Collision box relative to the actor's position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Hitbox {
    pub offset_x: i32,
    pub offset_y: i32,
    pub width: i32,
    pub height: i32,
}

impl Hitbox {
    pub fn from_config(config: &NavConfig) -> Self {
        Hitbox {
            offset_x: config.actor.hitbox_offset_x,
            offset_y: config.actor.hitbox_offset_y,
            width: config.actor.hitbox_width,
            height: config.actor.hitbox_height,
        }
    }

    /// Distance from the actor's y to the hitbox bottom.
    pub fn foot(&self) -> i32 {
        self.offset_y + self.height
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Actor {
    pub x: i32,
    pub y: i32,
    pub facing: Facing,
    pub hitbox: Hitbox,
}

impl Actor {
    pub fn new(config: &NavConfig) -> Self {
        Actor { x: 0, y: 0, facing: Facing::Right, hitbox: Hitbox::from_config(config) }
    }

    pub fn at(config: &NavConfig, x: i32, y: i32) -> Self {
        Actor { x, y, ..Actor::new(config) }
    }

    pub fn set_position(&mut self, x: i32, y: i32) {
        self.x = x;
        self.y = y;
    }

    /// World-space collision rectangle at the current position.
    pub fn collision_box(&self) -> Rect {
        self.collision_box_at(self.x, self.y)
    }

    /// Collision rectangle the actor would have at (x, y).
    pub fn collision_box_at(&self, x: i32, y: i32) -> Rect {
        Rect::new(
            x + self.hitbox.offset_x,
            y + self.hitbox.offset_y,
            self.hitbox.width,
            self.hitbox.height,
        )
    }

    pub fn center(&self) -> Point {
        self.collision_box().center()
    }

    /// Actor y that puts the hitbox bottom on `surface_y`.
    pub fn y_resting_on(&self, surface_y: i32) -> i32 {
        surface_y - self.hitbox.foot()
    }
}
