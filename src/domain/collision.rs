/// Collision resolver: single source of truth for "is this cell solid"
/// and "where can an actor stand".
///
/// ## Solidity
///
/// Two layers are consulted per cell, in priority order:
///   1. COLLISION CODE: explicit per-cell code from the collision layer
///        1 = always solid
///        2 = solid, except on a decorative row (passable there)
///        0 = no opinion, fall through
///   2. RENDER TILE: the resolved tileset property `solid`
///
/// Cells outside the grid are never solid.
///
/// ## Floor
///
/// The floor at a column is the first air cell (top to bottom) that has a
/// solid cell directly below it. Its pixel-y is returned; the ground surface
/// an actor rests on is one unit lower.

use crate::config::NavConfig;

use super::geom::{tile_of, Rect};
use super::tile::{CollisionCode, CollisionLayer, OneWay, TileGrid, TileProperties, EMPTY_TILE};

// ══════════════════════════════════════════════════════════════
// Resolver
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct CollisionResolver {
    grid: TileGrid,
    /// Resolved render-tile properties, row-major, one slot per cell.
    cell_props: Vec<Option<TileProperties>>,
    collision: Option<CollisionLayer>,
    decorative_rows: Vec<usize>,
    unit: i32,
}

impl CollisionResolver {
    /// `cell_props` is row-major with `width * height` slots; a shorter
    /// table is padded with `None`.
    pub fn new(
        grid: TileGrid,
        mut cell_props: Vec<Option<TileProperties>>,
        collision: Option<CollisionLayer>,
        config: &NavConfig,
    ) -> Self {
        cell_props.resize(grid.width * grid.height, None);
        let decorative_rows = collision
            .as_ref()
            .and_then(|c| c.passable_rows.clone())
            .unwrap_or_else(|| config.collision.decorative_rows.clone());
        CollisionResolver {
            grid,
            cell_props,
            collision,
            decorative_rows,
            unit: config.physics_unit(),
        }
    }

    /// Build from an ASCII layout, one string per row:
    ///   `#` solid tile, `^` one-way platform tile,
    ///   `X` collision code 1, `=` collision code 2, anything else empty.
    pub fn from_ascii(rows: &[&str], config: &NavConfig) -> Self {
        let height = rows.len();
        let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
        let mut grid = TileGrid::new(width, height);
        let mut props = vec![None; width * height];
        let mut layer = CollisionLayer::new(width, height);
        let mut has_codes = false;

        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                match ch {
                    '#' => {
                        grid.set(x, y, 0);
                        props[y * width + x] = Some(TileProperties::solid("ground"));
                    }
                    '^' => {
                        grid.set(x, y, 1);
                        props[y * width + x] = Some(TileProperties {
                            kind: "platform".into(),
                            one_way: Some(OneWay::Up),
                            ..Default::default()
                        });
                    }
                    'X' => {
                        layer.set(x, y, CollisionCode::Solid);
                        has_codes = true;
                    }
                    '=' => {
                        layer.set(x, y, CollisionCode::Platform);
                        has_codes = true;
                    }
                    _ => {}
                }
            }
        }

        CollisionResolver::new(grid, props, has_codes.then_some(layer), config)
    }

    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    pub fn unit(&self) -> i32 {
        self.unit
    }

    /// Room size in physics pixels.
    pub fn pixel_size(&self) -> (i32, i32) {
        (self.grid.width as i32 * self.unit, self.grid.height as i32 * self.unit)
    }

    pub fn decorative_rows(&self) -> &[usize] {
        &self.decorative_rows
    }

    pub fn is_decorative_row(&self, y: i32) -> bool {
        y >= 0 && self.decorative_rows.contains(&(y as usize))
    }

    /// Resolved properties of the render tile at (x, y), if any.
    pub fn properties_at(&self, x: i32, y: i32) -> Option<&TileProperties> {
        if !self.grid.in_bounds(x, y) || self.grid.get(x, y) == EMPTY_TILE {
            return None;
        }
        self.cell_props[y as usize * self.grid.width + x as usize].as_ref()
    }

    pub fn code_at(&self, x: i32, y: i32) -> CollisionCode {
        self.collision.as_ref().map_or(CollisionCode::Empty, |c| c.code(x, y))
    }

    // ── Solidity ──

    /// Is the cell at (x, y) solid? Out of range is never solid.
    pub fn is_solid(&self, x: i32, y: i32) -> bool {
        if !self.grid.in_bounds(x, y) {
            return false;
        }
        match self.code_at(x, y) {
            CollisionCode::Solid => true,
            CollisionCode::Platform => !self.is_decorative_row(y),
            CollisionCode::Empty => self.properties_at(x, y).map_or(false, |p| p.solid),
        }
    }

    /// `is_solid` addressed by row-major cell index.
    pub fn is_solid_index(&self, index: usize) -> bool {
        let w = self.grid.width;
        if w == 0 || index >= w * self.grid.height {
            return false;
        }
        self.is_solid((index % w) as i32, (index / w) as i32)
    }

    /// Movement query for physics collaborators, aware of one-way tiles.
    /// `from_above` = the actor is descending onto the cell.
    pub fn blocks_movement(&self, x: i32, y: i32, from_above: bool) -> bool {
        if !self.grid.in_bounds(x, y) {
            return false;
        }
        match self.code_at(x, y) {
            CollisionCode::Solid => true,
            CollisionCode::Platform if self.is_decorative_row(y) => false,
            CollisionCode::Platform => CollisionCode::Platform.blocks_movement(from_above),
            CollisionCode::Empty => self
                .properties_at(x, y)
                .map_or(false, |p| p.blocks_movement(from_above)),
        }
    }

    /// True if any cell covered by the half-open `rect` is solid.
    pub fn box_overlaps_solid(&self, rect: &Rect) -> bool {
        if rect.is_empty() || self.grid.width == 0 || self.grid.height == 0 {
            return false;
        }
        let x0 = tile_of(rect.x, self.unit).max(0);
        let y0 = tile_of(rect.y, self.unit).max(0);
        let x1 = tile_of(rect.right() - 1, self.unit).min(self.grid.width as i32 - 1);
        let y1 = tile_of(rect.bottom() - 1, self.unit).min(self.grid.height as i32 - 1);

        (y0..=y1).any(|ty| (x0..=x1).any(|tx| self.is_solid(tx, ty)))
    }

    // ── Floor ──

    /// Column holding pixel `x`, clamped into the grid.
    pub fn column_at(&self, x: i32) -> Option<i32> {
        if self.grid.width == 0 {
            return None;
        }
        Some(tile_of(x, self.unit).clamp(0, self.grid.width as i32 - 1))
    }

    /// Pixel-y of the standable air cell at `x`, or `None` if the column
    /// has no air-above-solid pair.
    pub fn floor_at_x(&self, x: i32) -> Option<i32> {
        let col = self.column_at(x)?;
        let h = self.grid.height as i32;
        (0..h - 1)
            .find(|&row| !self.is_solid(col, row) && self.is_solid(col, row + 1))
            .map(|row| row * self.unit)
    }

    /// Like `floor_at_x`, but falls back to `(height - 2) * unit`.
    pub fn find_floor_at_x(&self, x: i32) -> i32 {
        self.floor_at_x(x).unwrap_or_else(|| self.fallback_floor())
    }

    pub fn fallback_floor(&self) -> i32 {
        (self.grid.height as i32 - 2).max(0) * self.unit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> NavConfig {
        NavConfig::default()
    }

    fn resolver_from(rows: &[&str]) -> CollisionResolver {
        CollisionResolver::from_ascii(rows, &cfg())
    }

    /// 16x10 room with collision code 1 at rows 8-9 of column 5.
    fn pillar_room() -> CollisionResolver {
        let grid = TileGrid::new(16, 10);
        let mut layer = CollisionLayer::new(16, 10);
        layer.set(5, 8, CollisionCode::Solid);
        layer.set(5, 9, CollisionCode::Solid);
        CollisionResolver::new(grid, vec![], Some(layer), &cfg())
    }

    // ── is_solid ──

    #[test]
    fn code_one_is_solid() {
        let r = pillar_room();
        assert!(r.is_solid(5, 8));
        assert!(r.is_solid(5, 9));
        assert!(!r.is_solid(4, 9));
    }

    #[test]
    fn code_two_passable_on_decorative_row_only() {
        let r = resolver_from(&["    ", "====", "====", "    "]);
        assert!(!r.is_solid(0, 1));
        assert!(r.is_solid(0, 2));
    }

    #[test]
    fn layer_passable_rows_override_config() {
        let mut layer = CollisionLayer::new(2, 3).with_passable_rows(vec![2]);
        layer.set(0, 1, CollisionCode::Platform);
        layer.set(0, 2, CollisionCode::Platform);
        let r = CollisionResolver::new(TileGrid::new(2, 3), vec![], Some(layer), &cfg());
        assert!(r.is_solid(0, 1));
        assert!(!r.is_solid(0, 2));
    }

    #[test]
    fn collision_code_wins_over_tile() {
        let mut grid = TileGrid::new(1, 1);
        grid.set(0, 0, 3);
        let mut layer = CollisionLayer::new(1, 1);
        layer.set(0, 0, CollisionCode::Solid);
        let props = vec![Some(TileProperties::default())];
        let r = CollisionResolver::new(grid, props, Some(layer), &cfg());
        assert!(r.is_solid(0, 0));
    }

    #[test]
    fn code_zero_defers_to_tile_property() {
        let r = resolver_from(&["#X", "  "]);
        assert!(r.is_solid(0, 0));
        assert!(r.is_solid(1, 0));
        assert!(!r.is_solid(0, 1));
    }

    #[test]
    fn out_of_range_never_solid() {
        let r = resolver_from(&["##", "##"]);
        assert!(!r.is_solid(-1, 0));
        assert!(!r.is_solid(0, 2));
        assert!(!r.is_solid_index(4));
        assert!(r.is_solid_index(3));
    }

    #[test]
    fn one_way_tile_is_not_solid_but_blocks_landing() {
        let r = resolver_from(&["  ", "^^"]);
        assert!(!r.is_solid(0, 1));
        assert!(r.blocks_movement(0, 1, true));
        assert!(!r.blocks_movement(0, 1, false));
    }

    // ── floor ──

    #[test]
    fn floor_above_pillar() {
        let r = pillar_room();
        assert_eq!(r.find_floor_at_x(5 * 16 + 3), 7 * 16);
    }

    #[test]
    fn empty_column_falls_back() {
        let r = pillar_room();
        assert_eq!(r.floor_at_x(0), None);
        assert_eq!(r.find_floor_at_x(0), 8 * 16);
    }

    #[test]
    fn solid_column_falls_back() {
        let r = resolver_from(&["#", "#", "#", "#"]);
        assert_eq!(r.floor_at_x(0), None);
        assert_eq!(r.find_floor_at_x(0), 2 * 16);
    }

    #[test]
    fn stacked_platforms_pick_topmost() {
        let r = resolver_from(&[" ", " ", "#", " ", "#"]);
        assert_eq!(r.find_floor_at_x(0), 16);
    }

    #[test]
    fn x_is_clamped_into_grid() {
        let r = resolver_from(&["  ", "# ", "  "]);
        assert_eq!(r.find_floor_at_x(-50), 0);
        assert_eq!(r.find_floor_at_x(9999), 16);
    }

    #[test]
    fn tiny_room_fallback_saturates() {
        let r = resolver_from(&[" "]);
        assert_eq!(r.find_floor_at_x(0), 0);
    }

    // ── box overlap ──

    #[test]
    fn resting_box_does_not_overlap_ground() {
        let r = resolver_from(&["  ", "  ", "##"]);
        assert!(!r.box_overlaps_solid(&Rect::new(2, 20, 12, 12)));
        assert!(r.box_overlaps_solid(&Rect::new(2, 21, 12, 12)));
    }

    #[test]
    fn box_outside_grid_is_clear() {
        let r = resolver_from(&["##"]);
        assert!(!r.box_overlaps_solid(&Rect::new(-40, -40, 12, 12)));
        assert!(!r.box_overlaps_solid(&Rect::new(0, 0, 0, 12)));
    }
}
