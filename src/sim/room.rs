/// Rooms: one tile grid plus its zone identity.
///
/// Rooms are built once at load time and never mutated by navigation.
/// Specialized rooms override the lifecycle hooks; everything else comes
/// from the collision resolver they expose.

use std::path::Path;

use crate::config::NavConfig;
use crate::domain::actor::Actor;
use crate::domain::collision::CollisionResolver;
use crate::domain::geom::Rect;
use crate::domain::tile::TileGrid;
use crate::error::Result;
use crate::tiled::LoadedMap;

pub trait Room {
    /// Unique id, `{zone}/{map}`.
    fn zone_id(&self) -> &str;

    fn resolver(&self) -> &CollisionResolver;

    fn display_name(&self) -> &str {
        self.zone_id()
    }

    fn tile_grid(&self) -> &TileGrid {
        self.resolver().grid()
    }

    fn physics_unit(&self) -> i32 {
        self.resolver().unit()
    }

    /// Room size in physics pixels.
    fn pixel_size(&self) -> (i32, i32) {
        self.resolver().pixel_size()
    }

    /// Standable pixel-y at `x`, or the `(height - 2)` row fallback.
    fn find_floor_at_x(&self, x: i32) -> i32 {
        self.resolver().find_floor_at_x(x)
    }

    /// Solidity of the cell at tile coordinates.
    fn is_solid_cell(&self, x: i32, y: i32) -> bool {
        self.resolver().is_solid(x, y)
    }

    fn box_overlaps_solid(&self, rect: &Rect) -> bool {
        self.resolver().box_overlaps_solid(rect)
    }

    // ── Lifecycle hooks ──

    fn on_enter(&mut self, _actor: &Actor) {}

    fn on_exit(&mut self, _actor: &Actor) {}

    /// Per-tick hook for room-specific behaviour.
    fn update(&mut self, _actor: &mut Actor) -> Result<()> {
        Ok(())
    }
}

/// Room id for a map file: `{zone}/{file stem}`.
pub fn room_id_from_path(zone: &str, path: &Path) -> String {
    let stem = path.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default();
    format!("{zone}/{stem}")
}

/// Plain tile room with no behaviour of its own.
#[derive(Clone, Debug)]
pub struct TileRoom {
    zone_id: String,
    display_name: String,
    resolver: CollisionResolver,
}

impl TileRoom {
    pub fn new(zone_id: impl Into<String>, resolver: CollisionResolver) -> Self {
        let zone_id = zone_id.into();
        TileRoom { display_name: zone_id.clone(), zone_id, resolver }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    /// Build from loader output. A map-level `name` property becomes the
    /// display name.
    pub fn from_loaded_map(zone_id: impl Into<String>, map: &LoadedMap, config: &NavConfig) -> Self {
        let resolver = CollisionResolver::new(
            map.render.clone(),
            map.cell_properties(),
            map.collision.clone(),
            config,
        );
        let room = TileRoom::new(zone_id, resolver);
        match map.properties.get("name").filter(|n| !n.is_empty()) {
            Some(name) => room.with_display_name(name.clone()),
            None => room,
        }
    }

    /// Build from an ASCII layout (see `CollisionResolver::from_ascii`).
    pub fn from_rows(zone_id: impl Into<String>, rows: &[&str], config: &NavConfig) -> Self {
        TileRoom::new(zone_id, CollisionResolver::from_ascii(rows, config))
    }
}

impl Room for TileRoom {
    fn zone_id(&self) -> &str {
        &self.zone_id
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }

    fn resolver(&self) -> &CollisionResolver {
        &self.resolver
    }
}
