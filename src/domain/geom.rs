/// Shared geometry: pixel rectangles, points and compass directions.
///
/// All rectangles are half-open: a rect covers `[x, x+w) × [y, y+h)`.
/// A box whose bottom edge equals a ground row's top therefore rests on
/// that row without overlapping it.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Point { x, y }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    #[serde(alias = "X")]
    pub x: i32,
    #[serde(alias = "Y")]
    pub y: i32,
    #[serde(alias = "Width", alias = "w")]
    pub width: i32,
    #[serde(alias = "Height", alias = "h")]
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Rect { x, y, width, height }
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2, self.y + self.height / 2)
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// AABB overlap. Touching edges do not count.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    /// Smallest rect covering both. An empty operand is ignored.
    pub fn union(&self, other: &Rect) -> Rect {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Rect::new(x, y, self.right().max(other.right()) - x, self.bottom().max(other.bottom()) - y)
    }

    pub fn translated(&self, dx: i32, dy: i32) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.width, self.height)
    }
}

/// Compass direction of a room connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    South,
    East,
    West,
    Up,
    Down,
}

impl Direction {
    pub fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
            Direction::West => Direction::East,
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }

    /// Parse a direction name, case-insensitive. Accepts the compass names
    /// and the screen-edge aliases used by portal names.
    pub fn parse(name: &str) -> Option<Direction> {
        match name.trim().to_ascii_lowercase().as_str() {
            "north" | "n" | "top" => Some(Direction::North),
            "south" | "s" | "bottom" => Some(Direction::South),
            "east" | "e" | "right" => Some(Direction::East),
            "west" | "w" | "left" => Some(Direction::West),
            "up" => Some(Direction::Up),
            "down" => Some(Direction::Down),
            _ => None,
        }
    }

    /// Direction implied by a portal's name: the screen edge it sits on.
    /// `up`/`down` name the top and bottom edges here, not stairs.
    pub fn from_portal_name(name: &str) -> Direction {
        match name.trim().to_ascii_lowercase().as_str() {
            "left" => Direction::West,
            "right" => Direction::East,
            "up" | "top" => Direction::North,
            "down" | "bottom" => Direction::South,
            _ => Direction::East,
        }
    }

    /// Unit step in tile space. Up/Down have no planar offset.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::South => (0, 1),
            Direction::East => (1, 0),
            Direction::West => (-1, 0),
            Direction::Up | Direction::Down => (0, 0),
        }
    }
}

/// Which way an actor looks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Facing {
    Left,
    #[default]
    Right,
}

impl Facing {
    pub fn parse(name: &str) -> Option<Facing> {
        match name.trim().to_ascii_lowercase().as_str() {
            "left" | "west" => Some(Facing::Left),
            "right" | "east" => Some(Facing::Right),
            _ => None,
        }
    }

    /// Facing for an actor arriving through an edge: looking away from it.
    pub fn away_from(edge: Direction) -> Facing {
        match edge {
            Direction::East => Facing::Left,
            _ => Facing::Right,
        }
    }
}

/// Floor division, so negative pixels map to negative tiles.
pub fn tile_of(pixel: i32, unit: i32) -> i32 {
    pixel.div_euclid(unit.max(1))
}
