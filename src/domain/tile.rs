/// Tile grid, per-tile properties and collision codes.
/// Semantics of a single cell are centralized here; whole-grid queries
/// live in `collision`.

use serde::{Deserialize, Serialize};

/// Render-layer sentinel for "no tile".
pub const EMPTY_TILE: i32 = -1;

/// 2D grid of tile indices, `tiles[y][x]`, -1 = empty.
/// Every row has exactly `width` entries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileGrid {
    pub width: usize,
    pub height: usize,
    tiles: Vec<Vec<i32>>,
}

impl TileGrid {
    pub fn new(width: usize, height: usize) -> Self {
        TileGrid { width, height, tiles: vec![vec![EMPTY_TILE; width]; height] }
    }

    /// Build from rows; short rows are padded with empty cells and long
    /// rows truncated so the width invariant holds.
    pub fn from_rows(width: usize, rows: Vec<Vec<i32>>) -> Self {
        let height = rows.len();
        let tiles = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, EMPTY_TILE);
                row
            })
            .collect();
        TileGrid { width, height, tiles }
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    /// Tile index at (x, y); out of range reads as empty.
    pub fn get(&self, x: i32, y: i32) -> i32 {
        if !self.in_bounds(x, y) {
            return EMPTY_TILE;
        }
        self.tiles[y as usize][x as usize]
    }

    pub fn set(&mut self, x: usize, y: usize, index: i32) {
        if x < self.width && y < self.height {
            self.tiles[y][x] = index;
        }
    }

    pub fn rows(&self) -> &[Vec<i32>] {
        &self.tiles
    }
}

/// Which side of a one-way tile is open.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OneWay {
    Up,
    Down,
    Left,
    Right,
}

impl OneWay {
    pub fn parse(name: &str) -> Option<OneWay> {
        match name.trim().to_ascii_lowercase().as_str() {
            "up" => Some(OneWay::Up),
            "down" => Some(OneWay::Down),
            "left" => Some(OneWay::Left),
            "right" => Some(OneWay::Right),
            _ => None,
        }
    }
}

/// Per-tile metadata resolved from a tileset.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TileProperties {
    pub kind: String,
    pub solid: bool,
    pub one_way: Option<OneWay>,
    /// Slope line `y = m·x + b` in tile-local pixels.
    pub slope_m: Option<f64>,
    pub slope_b: Option<f64>,
}

impl TileProperties {
    pub fn solid(kind: &str) -> Self {
        TileProperties { kind: kind.to_string(), solid: true, ..Default::default() }
    }

    /// Does this tile stop an actor? A one-way tile only blocks an actor
    /// landing on it from above.
    pub fn blocks_movement(&self, from_above: bool) -> bool {
        match self.one_way {
            Some(OneWay::Up) => from_above,
            Some(_) => false,
            None => self.solid,
        }
    }
}

/// Collision-layer code of one cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CollisionCode {
    /// 0: defer to the render tile.
    #[default]
    Empty,
    /// 1: always solid.
    Solid,
    /// 2: solid except on a decorative row.
    Platform,
}

impl CollisionCode {
    /// Map a raw layer value; `None` for codes with no meaning.
    pub fn from_raw(raw: u32) -> Option<CollisionCode> {
        match raw {
            0 => Some(CollisionCode::Empty),
            1 => Some(CollisionCode::Solid),
            2 => Some(CollisionCode::Platform),
            _ => None,
        }
    }

    pub fn blocks_movement(self, from_above: bool) -> bool {
        match self {
            CollisionCode::Empty => false,
            CollisionCode::Solid => true,
            CollisionCode::Platform => from_above,
        }
    }
}

/// Parallel grid of collision codes plus the rows where code 2 is passable.
#[derive(Clone, Debug, PartialEq)]
pub struct CollisionLayer {
    pub width: usize,
    pub height: usize,
    codes: Vec<Vec<CollisionCode>>,
    /// Per-layer override of the decorative rows. `None` = use config.
    pub passable_rows: Option<Vec<usize>>,
}

impl CollisionLayer {
    pub fn new(width: usize, height: usize) -> Self {
        CollisionLayer {
            width,
            height,
            codes: vec![vec![CollisionCode::Empty; width]; height],
            passable_rows: None,
        }
    }

    pub fn code(&self, x: i32, y: i32) -> CollisionCode {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return CollisionCode::Empty;
        }
        self.codes[y as usize][x as usize]
    }

    pub fn set(&mut self, x: usize, y: usize, code: CollisionCode) {
        if x < self.width && y < self.height {
            self.codes[y][x] = code;
        }
    }

    pub fn with_passable_rows(mut self, rows: Vec<usize>) -> Self {
        self.passable_rows = Some(rows);
        self
    }
}
