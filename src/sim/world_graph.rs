/// World graph: the rooms the player has discovered, how they connect,
/// and a short trail of recent positions. Feeds the minimap and is the
/// only navigation state that is persisted.
///
/// ## Placement
///
/// Each room gets a rectangle in world-map space on first discovery:
/// the first at the origin, later ones to the right of the current map
/// extent with `padding` between them. Connecting a room that has no
/// connections yet moves it next to its source in the connection
/// direction, provided the new spot is free.
///
/// ## Sharing
///
/// All state sits behind one mutex. The graph is shared as
/// `Arc<WorldGraph>`; every read that returns a collection returns a copy.

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::config::NavConfig;
use crate::domain::geom::{Direction, Point, Rect};
use crate::error::{NavError, Result};

use super::room::Room;

/// Current snapshot schema.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Thumbnail cell values.
pub const THUMB_EMPTY: u8 = 0;
pub const THUMB_TILE: u8 = 1;
pub const THUMB_SOLID: u8 = 2;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DiscoveredRoom {
    pub zone_id: String,
    pub name: String,
    /// Position and size in world-map pixels.
    pub placement: Rect,
    /// Room-local pixel bounds, origin at (0, 0).
    pub bounds: Rect,
    pub explored: bool,
    /// Downsampled grid, `thumbnail[y][x]`, see `THUMB_*`.
    pub thumbnail: Vec<Vec<u8>>,
    #[serde(default)]
    pub connections: BTreeMap<Direction, String>,
}

/// Portable form of the whole graph.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldGraphSnapshot {
    pub version: u32,
    pub rooms: Vec<DiscoveredRoom>,
    #[serde(default)]
    pub current_room: Option<String>,
    #[serde(default)]
    pub trail: Vec<Point>,
}

#[derive(Debug)]
struct GraphState {
    rooms: BTreeMap<String, DiscoveredRoom>,
    current: Option<String>,
    trail: VecDeque<Point>,
}

#[derive(Debug)]
pub struct WorldGraph {
    state: Mutex<GraphState>,
    trail_capacity: usize,
    padding: i32,
    thumbnail_max: usize,
}

impl WorldGraph {
    pub fn new(config: &NavConfig) -> Self {
        WorldGraph {
            state: Mutex::new(GraphState {
                rooms: BTreeMap::new(),
                current: None,
                trail: VecDeque::with_capacity(config.world_map.trail_capacity),
            }),
            trail_capacity: config.world_map.trail_capacity.max(1),
            padding: config.world_map.padding,
            thumbnail_max: config.world_map.thumbnail_max.max(1),
        }
    }

    /// A panic elsewhere must not take the minimap down with it.
    fn state(&self) -> MutexGuard<'_, GraphState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    // ── Discovery ──

    /// Record a room. Idempotent: a known room keeps its placement.
    pub fn discover_room(&self, room: &dyn Room) {
        let mut st = self.state();
        if st.rooms.contains_key(room.zone_id()) {
            return;
        }

        let (w, h) = room.pixel_size();
        let placement = if st.rooms.is_empty() {
            Rect::new(0, 0, w, h)
        } else {
            let extent = extent_of(&st.rooms);
            Rect::new(extent.right() + self.padding, 0, w, h)
        };

        let discovered = DiscoveredRoom {
            zone_id: room.zone_id().to_string(),
            name: room.display_name().to_string(),
            placement,
            bounds: Rect::new(0, 0, w, h),
            explored: false,
            thumbnail: thumbnail_of(room, self.thumbnail_max),
            connections: BTreeMap::new(),
        };
        debug!("discovered room {} at ({}, {})", discovered.zone_id, placement.x, placement.y);
        st.rooms.insert(discovered.zone_id.clone(), discovered);
    }

    /// Record `from --direction--> to` and the reverse edge.
    pub fn connect_rooms(&self, from: &str, direction: Direction, to: &str) -> Result<()> {
        let mut st = self.state();
        let source = st.rooms.get(from).ok_or_else(|| NavError::not_found("room", from))?.placement;
        let target = st.rooms.get(to).ok_or_else(|| NavError::not_found("room", to))?;

        if target.connections.is_empty() && from != to {
            let moved = adjacent_placement(&source, &target.placement, direction, self.padding);
            let blocked = st.rooms.values().any(|r| r.zone_id != to && r.placement.intersects(&moved));
            if !blocked {
                if let Some(t) = st.rooms.get_mut(to) {
                    t.placement = moved;
                }
            }
        }

        if let Some(src) = st.rooms.get_mut(from) {
            src.connections.insert(direction, to.to_string());
        }
        if let Some(dst) = st.rooms.get_mut(to) {
            dst.connections.insert(direction.opposite(), from.to_string());
        }
        debug!("connected {from} -{direction:?}-> {to}");
        Ok(())
    }

    // ── Current room & trail ──

    /// Mark `id` current and explored.
    pub fn set_current_room(&self, id: &str) -> Result<()> {
        let mut st = self.state();
        let room = st.rooms.get_mut(id).ok_or_else(|| NavError::not_found("room", id))?;
        room.explored = true;
        st.current = Some(id.to_string());
        Ok(())
    }

    pub fn current_room(&self) -> Option<String> {
        self.state().current.clone()
    }

    /// Append to the trail, dropping the oldest entry when full.
    pub fn add_player_position(&self, x: i32, y: i32) {
        let mut st = self.state();
        if st.trail.len() >= self.trail_capacity {
            st.trail.pop_front();
        }
        st.trail.push_back(Point::new(x, y));
    }

    pub fn player_trail(&self) -> Vec<Point> {
        self.state().trail.iter().copied().collect()
    }

    pub fn trail_capacity(&self) -> usize {
        self.trail_capacity
    }

    // ── Queries ──

    /// All discovered rooms, sorted by id.
    pub fn discovered_rooms(&self) -> Vec<DiscoveredRoom> {
        self.state().rooms.values().cloned().collect()
    }

    pub fn room(&self, id: &str) -> Option<DiscoveredRoom> {
        self.state().rooms.get(id).cloned()
    }

    pub fn room_connections(&self, id: &str) -> BTreeMap<Direction, String> {
        self.state().rooms.get(id).map(|r| r.connections.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.state().rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state().rooms.is_empty()
    }

    /// Rectangle covering every placement; zero rect when empty.
    pub fn map_bounds(&self) -> Rect {
        extent_of(&self.state().rooms)
    }

    // ── Persistence ──

    pub fn snapshot(&self) -> WorldGraphSnapshot {
        let st = self.state();
        WorldGraphSnapshot {
            version: SNAPSHOT_VERSION,
            rooms: st.rooms.values().cloned().collect(),
            current_room: st.current.clone(),
            trail: st.trail.iter().copied().collect(),
        }
    }

    /// Replace the whole graph with `snapshot`. On error nothing changes.
    pub fn restore(&self, snapshot: WorldGraphSnapshot) -> Result<()> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(NavError::invalid(
                "world graph",
                format!("unsupported snapshot version {}", snapshot.version),
            ));
        }
        let rooms: BTreeMap<String, DiscoveredRoom> =
            snapshot.rooms.into_iter().map(|r| (r.zone_id.clone(), r)).collect();
        if let Some(current) = &snapshot.current_room {
            if !rooms.contains_key(current) {
                return Err(NavError::invalid(
                    "world graph",
                    format!("current room {current} is not in the snapshot"),
                ));
            }
        }
        let skip = snapshot.trail.len().saturating_sub(self.trail_capacity);

        let mut st = self.state();
        st.rooms = rooms;
        st.current = snapshot.current_room;
        st.trail = snapshot.trail.into_iter().skip(skip).collect();
        info!("restored world graph with {} rooms", st.rooms.len());
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.snapshot())
            .map_err(|e| NavError::invalid("world graph", e.to_string()))
    }

    pub fn from_json(text: &str, config: &NavConfig) -> Result<Self> {
        let graph = WorldGraph::new(config);
        graph.restore_json(text)?;
        Ok(graph)
    }

    /// Parse and `restore` in place.
    pub fn restore_json(&self, text: &str) -> Result<()> {
        let snapshot: WorldGraphSnapshot =
            serde_json::from_str(text).map_err(|e| NavError::invalid("world graph", e.to_string()))?;
        self.restore(snapshot)
    }
}

fn extent_of(rooms: &BTreeMap<String, DiscoveredRoom>) -> Rect {
    rooms.values().map(|r| r.placement).reduce(|acc, p| acc.union(&p)).unwrap_or_default()
}

/// Spot for `target` next to `source` in `direction`. Up/Down have no
/// planar meaning, so those rooms sit diagonally offset.
fn adjacent_placement(source: &Rect, target: &Rect, direction: Direction, padding: i32) -> Rect {
    let (x, y) = match direction {
        Direction::East => (source.right() + padding, source.y),
        Direction::West => (source.x - padding - target.width, source.y),
        Direction::North => (source.x, source.y - padding - target.height),
        Direction::South => (source.x, source.bottom() + padding),
        Direction::Up => (source.x + padding, source.y - padding - target.height),
        Direction::Down => (source.x + padding, source.bottom() + padding),
    };
    Rect::new(x, y, target.width, target.height)
}

/// Nearest-neighbour downsample of the room to at most `max × max`.
fn thumbnail_of(room: &dyn Room, max: usize) -> Vec<Vec<u8>> {
    let grid = room.tile_grid();
    let (w, h) = (grid.width, grid.height);
    let tw = w.min(max);
    let th = h.min(max);
    (0..th)
        .map(|ty| {
            let y = (ty * h / th) as i32;
            (0..tw)
                .map(|tx| {
                    let x = (tx * w / tw) as i32;
                    if room.is_solid_cell(x, y) {
                        THUMB_SOLID
                    } else if grid.get(x, y) >= 0 {
                        THUMB_TILE
                    } else {
                        THUMB_EMPTY
                    }
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::room::TileRoom;

    fn cfg() -> NavConfig {
        NavConfig::default()
    }

    fn room(id: &str, width: usize, height: usize) -> TileRoom {
        let row = " ".repeat(width);
        let floor = "#".repeat(width);
        let mut rows: Vec<&str> = vec![row.as_str(); height - 1];
        rows.push(floor.as_str());
        TileRoom::from_rows(id, &rows, &cfg())
    }

    #[test]
    fn first_room_at_origin_next_to_the_right() {
        let g = WorldGraph::new(&cfg());
        g.discover_room(&room("z/a", 10, 5));
        g.discover_room(&room("z/b", 4, 4));
        assert_eq!(g.room("z/a").unwrap().placement, Rect::new(0, 0, 160, 80));
        assert_eq!(g.room("z/b").unwrap().placement, Rect::new(160 + 64, 0, 64, 64));
        assert!(!g.room("z/a").unwrap().explored);
    }

    #[test]
    fn double_discovery_is_stable() {
        let g = WorldGraph::new(&cfg());
        let a = room("z/a", 10, 5);
        g.discover_room(&a);
        g.discover_room(&room("z/b", 4, 4));
        let before = g.room("z/a").unwrap();
        g.discover_room(&a);
        assert_eq!(g.len(), 2);
        assert_eq!(g.room("z/a").unwrap(), before);
    }

    #[test]
    fn connect_records_reverse_edge() {
        let g = WorldGraph::new(&cfg());
        g.discover_room(&room("main", 16, 10));
        g.discover_room(&room("forest_right", 16, 10));
        g.connect_rooms("main", Direction::East, "forest_right").unwrap();
        assert_eq!(g.room_connections("main").get(&Direction::East).map(String::as_str), Some("forest_right"));
        assert_eq!(g.room_connections("forest_right").get(&Direction::West).map(String::as_str), Some("main"));
    }

    #[test]
    fn connect_unknown_room_is_not_found() {
        let g = WorldGraph::new(&cfg());
        g.discover_room(&room("a", 4, 4));
        assert!(g.connect_rooms("a", Direction::North, "ghost").unwrap_err().is_not_found());
        assert!(g.connect_rooms("ghost", Direction::North, "a").unwrap_err().is_not_found());
        assert!(g.room_connections("a").is_empty());
    }

    #[test]
    fn connect_moves_fresh_target_beside_source() {
        let g = WorldGraph::new(&cfg());
        g.discover_room(&room("a", 4, 4));
        g.discover_room(&room("b", 4, 4));
        g.connect_rooms("a", Direction::West, "b").unwrap();
        assert_eq!(g.room("b").unwrap().placement, Rect::new(-64 - 64, 0, 64, 64));
        g.connect_rooms("a", Direction::North, "b").unwrap();
        // already connected: stays put
        assert_eq!(g.room("b").unwrap().placement, Rect::new(-128, 0, 64, 64));
    }

    #[test]
    fn connect_keeps_placement_when_spot_taken() {
        let g = WorldGraph::new(&cfg());
        g.discover_room(&room("a", 4, 4));
        g.discover_room(&room("b", 4, 4));
        g.discover_room(&room("c", 4, 4));
        let c_before = g.room("c").unwrap().placement;
        // b already sits east of a, so c cannot move there
        g.connect_rooms("a", Direction::East, "c").unwrap();
        assert_eq!(g.room("c").unwrap().placement, c_before);
    }

    #[test]
    fn current_room_marks_explored() {
        let g = WorldGraph::new(&cfg());
        g.discover_room(&room("a", 4, 4));
        g.set_current_room("a").unwrap();
        assert_eq!(g.current_room().as_deref(), Some("a"));
        assert!(g.room("a").unwrap().explored);
        assert!(g.set_current_room("nope").is_err());
        assert_eq!(g.current_room().as_deref(), Some("a"));
    }

    #[test]
    fn trail_drops_oldest() {
        let g = WorldGraph::new(&cfg());
        for i in 0..105 {
            g.add_player_position(i, 0);
        }
        let trail = g.player_trail();
        assert_eq!(trail.len(), 100);
        assert_eq!(trail[0], Point::new(5, 0));
        assert_eq!(trail[99], Point::new(104, 0));
    }

    #[test]
    fn bounds_cover_all_placements() {
        let g = WorldGraph::new(&cfg());
        assert_eq!(g.map_bounds(), Rect::default());
        g.discover_room(&room("a", 4, 4));
        g.discover_room(&room("b", 4, 2));
        assert_eq!(g.map_bounds(), Rect::new(0, 0, 64 + 64 + 64, 64));
    }

    #[test]
    fn thumbnail_is_capped_and_quantized() {
        let g = WorldGraph::new(&cfg());
        g.discover_room(&room("big", 64, 40));
        let thumb = g.room("big").unwrap().thumbnail;
        assert_eq!(thumb.len(), 32);
        assert!(thumb.iter().all(|r| r.len() == 32));
        assert_eq!(thumb[0][0], THUMB_EMPTY);
        assert_eq!(thumb[31][0], THUMB_EMPTY);

        g.discover_room(&room("small", 3, 3));
        let thumb = g.room("small").unwrap().thumbnail;
        assert_eq!(thumb, vec![vec![0, 0, 0], vec![0, 0, 0], vec![2, 2, 2]]);
    }

    #[test]
    fn snapshot_round_trip() {
        let g = WorldGraph::new(&cfg());
        g.discover_room(&room("main", 16, 10));
        g.discover_room(&room("forest_right", 16, 10));
        g.connect_rooms("main", Direction::East, "forest_right").unwrap();
        g.set_current_room("forest_right").unwrap();
        g.add_player_position(10, 20);
        g.add_player_position(30, 40);

        let json = g.to_json().unwrap();
        let back = WorldGraph::from_json(&json, &cfg()).unwrap();
        assert_eq!(back.discovered_rooms(), g.discovered_rooms());
        assert_eq!(back.current_room(), g.current_room());
        assert_eq!(back.player_trail(), g.player_trail());
        assert_eq!(back.room_connections("forest_right"), g.room_connections("forest_right"));
        assert_eq!(back.map_bounds(), g.map_bounds());
        assert!(json.contains("\"East\""));
    }

    #[test]
    fn unsupported_version_is_rejected() {
        let g = WorldGraph::new(&cfg());
        g.discover_room(&room("a", 4, 4));
        let err = g.restore_json(r#"{"version": 9, "rooms": []}"#).unwrap_err();
        assert!(matches!(err, NavError::InvalidFormat { .. }));
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn restore_trims_long_trail() {
        let g = WorldGraph::new(&cfg());
        let snap = WorldGraphSnapshot {
            version: SNAPSHOT_VERSION,
            rooms: vec![],
            current_room: None,
            trail: (0..150).map(|i| Point::new(i, i)).collect(),
        };
        g.restore(snap).unwrap();
        let trail = g.player_trail();
        assert_eq!(trail.len(), 100);
        assert_eq!(trail[0], Point::new(50, 50));
    }
}
