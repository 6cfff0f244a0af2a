/// Roomnav: tile collision, room transitions and a discovered-room world
/// map for 2D platformers.
///
/// Layers, leaf to root:
///   `domain`  geometry, tiles, collision resolver, actor
///   `tiled`   Tiled map and tileset loader
///   `sim`     rooms, transition manager, world graph, zones, saves
///   `ui`      terminal front-end for the `roomwalk` tool (feature `tui`)

pub mod config;
pub mod domain;
pub mod error;
pub mod sim;
pub mod tiled;
#[cfg(feature = "tui")]
pub mod ui;

pub use config::NavConfig;
pub use domain::actor::{Actor, Hitbox};
pub use domain::collision::CollisionResolver;
pub use domain::geom::{Direction, Facing, Point, Rect};
pub use domain::tile::{CollisionCode, CollisionLayer, TileGrid, TileProperties};
pub use error::{NavError, Result};
pub use sim::event::NavEvent;
pub use sim::room::{room_id_from_path, Room, TileRoom};
pub use sim::transition::{
    Pending, PendingTransition, SpawnMethod, SpawnPlacement, SpawnPoint, TransitionManager,
    TransitionPoint, TransitionType,
};
pub use sim::world_graph::{DiscoveredRoom, WorldGraph, WorldGraphSnapshot};
pub use tiled::{load_map, normalize_gid, LoadedMap, Portal};
