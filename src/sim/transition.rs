/// Transition manager: owns every room, its triggers and spawn points,
/// and moves the actor between rooms.
///
/// ## Per-tick protocol
///
///   1. `check_transitions(actor_box, action)`: the first enabled trigger
///      overlapping the actor (registration order) queues a transition.
///   2. `process_pending_transition(actor)`: consumes the queue, runs the
///      exit hook, switches room, places the actor and runs the enter hook.
///
/// The queue holds one transition; a later trigger overwrites an
/// unprocessed one.
///
/// ## Safe spawn
///
/// Candidates are tried in a fixed order and the first whose hitbox
/// overlaps no solid cell wins:
///   1. floor at the spawn x (`find_floor_at_x`, fallback included),
///      hitbox bottom on that floor line
///   2. the same at each probe offset (tile widths, clamped to the room)
///   3. the requested spot itself, then tile-aligned cells walking
///      right, left, up, down up to `search_radius` tiles, kept inside
///      the room
/// If all fail the actor goes to the requested spot anyway and a
/// `SpawnFallback` event is emitted.

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, info, warn};
use serde::{Deserialize, Deserializer, Serialize};

use crate::config::NavConfig;
use crate::domain::actor::Actor;
use crate::domain::geom::{tile_of, Direction, Facing, Point, Rect};
use crate::error::{NavError, Result};

use super::event::NavEvent;
use super::room::{Room, TileRoom};
use super::world_graph::WorldGraph;

// ══════════════════════════════════════════════════════════════
// Public types
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransitionType {
    /// Walk off an edge.
    #[default]
    Walk,
    Door,
    Teleport,
    /// Vertical movement between levels.
    Stairs,
}

/// A trigger area in a room leading to a spawn point in another.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransitionPoint {
    #[serde(rename = "type", default)]
    pub kind: TransitionType,
    /// Room-local physics pixels.
    #[serde(rename = "trigger_bounds")]
    pub trigger: Rect,
    #[serde(rename = "target_room_id")]
    pub target_room: String,
    #[serde(rename = "target_spawn_id", default)]
    pub target_spawn: String,
    pub direction: Direction,
    #[serde(rename = "is_enabled", default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(default)]
    pub requires_action: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl TransitionPoint {
    pub fn new(
        kind: TransitionType,
        trigger: Rect,
        target_room: impl Into<String>,
        target_spawn: impl Into<String>,
        direction: Direction,
    ) -> Self {
        TransitionPoint {
            kind,
            trigger,
            target_room: target_room.into(),
            target_spawn: target_spawn.into(),
            direction,
            enabled: true,
            requires_action: false,
        }
    }

    pub fn requiring_action(mut self) -> Self {
        self.requires_action = true;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpawnPoint {
    pub id: String,
    pub x: i32,
    pub y: i32,
    #[serde(rename = "facing_id", default, deserialize_with = "facing_from_name")]
    pub facing: Facing,
}

impl SpawnPoint {
    pub fn new(id: impl Into<String>, x: i32, y: i32, facing: Facing) -> Self {
        SpawnPoint { id: id.into(), x, y, facing }
    }
}

/// Facing names in data files are free-form ("left", "East", ...).
fn facing_from_name<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Facing, D::Error> {
    let name = String::deserialize(d)?;
    Ok(Facing::parse(&name).unwrap_or_default())
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingTransition {
    pub target_room: String,
    pub target_spawn: String,
    pub kind: TransitionType,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Pending {
    #[default]
    Idle,
    Queued(PendingTransition),
}

/// How a spawn position was found.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpawnMethod {
    Floor,
    /// Floor found after shifting `dx` pixels.
    Probe { dx: i32 },
    Cardinal,
    /// Nothing fit; the requested position was used.
    Unresolved,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpawnPlacement {
    pub x: i32,
    pub y: i32,
    pub method: SpawnMethod,
}

// ══════════════════════════════════════════════════════════════
// Manager
// ══════════════════════════════════════════════════════════════

pub struct TransitionManager {
    config: NavConfig,
    rooms: HashMap<String, Box<dyn Room>>,
    transitions: HashMap<String, Vec<TransitionPoint>>,
    spawns: HashMap<String, Vec<SpawnPoint>>,
    pending: Pending,
    current: Option<String>,
    graph: Arc<WorldGraph>,
    events: Vec<NavEvent>,
}

impl TransitionManager {
    pub fn new(config: &NavConfig, graph: Arc<WorldGraph>) -> Self {
        TransitionManager {
            config: config.clone(),
            rooms: HashMap::new(),
            transitions: HashMap::new(),
            spawns: HashMap::new(),
            pending: Pending::Idle,
            current: None,
            graph,
            events: vec![],
        }
    }

    pub fn graph(&self) -> &Arc<WorldGraph> {
        &self.graph
    }

    pub fn config(&self) -> &NavConfig {
        &self.config
    }

    // ── Registration ──

    /// Add a room and report it to the world graph. Re-registering an id
    /// replaces the room but keeps its triggers and spawn points.
    pub fn register_room<R: Room + 'static>(&mut self, room: R) {
        let id = room.zone_id().to_string();
        self.graph.discover_room(&room);
        if self.rooms.insert(id.clone(), Box::new(room)).is_some() {
            warn!("room {id} registered twice, replacing");
        }
        self.transitions.entry(id.clone()).or_default();
        self.spawns.entry(id.clone()).or_default();
        debug!("registered room {id}");
    }

    /// Register an empty walled-floor room under the configured fallback id,
    /// with the fallback spawn at its centre, unless one is already loaded.
    /// Returns whether a room was added.
    pub fn ensure_fallback_room(&mut self) -> bool {
        let id = self.config.general.fallback_room.clone();
        if self.rooms.contains_key(&id) {
            return false;
        }
        let mut rows = vec!["                    "; 10];
        rows.extend(["####################"; 2]);
        let room = TileRoom::from_rows(id.as_str(), &rows, &self.config).with_display_name("Safety");
        let x = room.pixel_size().0 / 2;
        self.register_room(room);
        let spawn = SpawnPoint::new(self.config.general.fallback_spawn.clone(), x, 0, Facing::Right);
        if let Some(list) = self.spawns.get_mut(&id) {
            list.push(spawn);
        }
        info!("registered built-in fallback room {id}");
        true
    }

    pub fn add_transition_point(&mut self, room_id: &str, point: TransitionPoint) -> Result<()> {
        let list = self
            .transitions
            .get_mut(room_id)
            .ok_or_else(|| NavError::not_found("room", room_id))?;
        debug!("added {:?} transition {room_id} -> {}", point.kind, point.target_room);
        if let Err(e) = self.graph.connect_rooms(room_id, point.direction, &point.target_room) {
            info!("world graph: could not connect {room_id} -> {}: {e}", point.target_room);
        }
        list.push(point);
        Ok(())
    }

    pub fn add_spawn_point(&mut self, room_id: &str, spawn: SpawnPoint) -> Result<()> {
        let list = self
            .spawns
            .get_mut(room_id)
            .ok_or_else(|| NavError::not_found("room", room_id))?;
        debug!("added spawn {} to {room_id} at ({}, {})", spawn.id, spawn.x, spawn.y);
        list.push(spawn);
        Ok(())
    }

    /// Enable or disable every trigger in `room_id` leading to `target`.
    /// Returns how many triggers matched.
    pub fn enable_transition(&mut self, room_id: &str, target: &str, enabled: bool) -> Result<usize> {
        let list = self
            .transitions
            .get_mut(room_id)
            .ok_or_else(|| NavError::not_found("room", room_id))?;
        let mut n = 0;
        for tp in list.iter_mut().filter(|t| t.target_room == target) {
            tp.enabled = enabled;
            n += 1;
        }
        Ok(n)
    }

    // ── Queries ──

    pub fn set_current_room(&mut self, room_id: &str) -> Result<()> {
        if !self.rooms.contains_key(room_id) {
            return Err(NavError::not_found("room", room_id));
        }
        self.current = Some(room_id.to_string());
        self.mark_current_in_graph(room_id);
        Ok(())
    }

    pub fn current_room_id(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn current_room(&self) -> Option<&dyn Room> {
        self.current.as_deref().and_then(|id| self.room(id))
    }

    pub fn room(&self, id: &str) -> Option<&dyn Room> {
        self.rooms.get(id).map(|r| r.as_ref())
    }

    pub fn room_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.rooms.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn transition_points(&self, room_id: &str) -> &[TransitionPoint] {
        self.transitions.get(room_id).map_or(&[], Vec::as_slice)
    }

    pub fn spawn_points(&self, room_id: &str) -> &[SpawnPoint] {
        self.spawns.get(room_id).map_or(&[], Vec::as_slice)
    }

    pub fn has_pending_transition(&self) -> bool {
        matches!(self.pending, Pending::Queued(_))
    }

    pub fn pending(&self) -> &Pending {
        &self.pending
    }

    pub fn drain_events(&mut self) -> Vec<NavEvent> {
        std::mem::take(&mut self.events)
    }

    // ── Per tick ──

    /// Queue the first enabled trigger the actor box overlaps.
    /// No match leaves everything untouched.
    pub fn check_transitions(&mut self, actor_box: &Rect, action_pressed: bool) -> bool {
        let Some(current) = self.current.as_deref() else {
            return false;
        };
        let hit = self.transitions.get(current).and_then(|list| {
            list.iter().find(|t| {
                t.enabled && t.trigger.intersects(actor_box) && (!t.requires_action || action_pressed)
            })
        });
        let Some(tp) = hit else {
            return false;
        };

        info!("triggered {:?} transition {current} -> {}", tp.kind, tp.target_room);
        self.events.push(NavEvent::TransitionQueued {
            from: current.to_string(),
            to: tp.target_room.clone(),
            kind: tp.kind,
        });
        self.pending = Pending::Queued(PendingTransition {
            target_room: tp.target_room.clone(),
            target_spawn: tp.target_spawn.clone(),
            kind: tp.kind,
        });
        true
    }

    /// Run the queued transition, if any. The queue is consumed even when
    /// the target turns out to be unknown; the manager then stays put.
    pub fn process_pending_transition(&mut self, actor: &mut Actor) -> Result<Option<&dyn Room>> {
        let Pending::Queued(next) = std::mem::take(&mut self.pending) else {
            return Ok(None);
        };
        if !self.rooms.contains_key(&next.target_room) {
            warn!("transition target {} is not registered", next.target_room);
            return Err(NavError::not_found("room", next.target_room));
        }

        if let Some(old) = self.current.as_deref().and_then(|id| self.rooms.get_mut(id)) {
            old.on_exit(actor);
        }
        self.current = Some(next.target_room.clone());
        self.mark_current_in_graph(&next.target_room);

        let placement = self.place_actor(actor, &next.target_room, &next.target_spawn);

        if let Some(room) = self.rooms.get_mut(&next.target_room) {
            room.on_enter(actor);
        }
        info!("entered {} at ({}, {}) via {:?}", next.target_room, placement.x, placement.y, placement.method);
        self.events.push(NavEvent::RoomEntered {
            room: next.target_room.clone(),
            spawn: next.target_spawn,
            at: Point::new(placement.x, placement.y),
        });
        Ok(self.room(&next.target_room))
    }

    /// Run the current room's per-tick hook.
    pub fn update_current_room(&mut self, actor: &mut Actor) -> Result<()> {
        match self.current.as_deref().and_then(|id| self.rooms.get_mut(id)) {
            Some(room) => room.update(actor),
            None => Ok(()),
        }
    }

    /// Send an actor that fell below the current room to the fallback
    /// room. Returns whether a rescue happened. A missing fallback room is
    /// an error and leaves the manager untouched.
    pub fn rescue_if_out_of_bounds(&mut self, actor: &mut Actor) -> Result<bool> {
        let Some(room) = self.current_room() else {
            return Ok(false);
        };
        let (_, height) = room.pixel_size();
        if actor.y <= height + room.physics_unit() {
            return Ok(false);
        }

        let from = room.zone_id().to_string();
        let to = self.config.general.fallback_room.clone();
        if !self.rooms.contains_key(&to) {
            return Err(NavError::not_found("fallback room", to));
        }
        warn!("actor out of bounds in {from} (y = {}), rescuing to {to}", actor.y);
        self.pending = Pending::Queued(PendingTransition {
            target_room: to.clone(),
            target_spawn: self.config.general.fallback_spawn.clone(),
            kind: TransitionType::Teleport,
        });
        self.process_pending_transition(actor)?;
        self.events.push(NavEvent::EmergencyRescue { from, to });
        Ok(true)
    }

    /// Append the actor's centre, in world-map space, to the graph trail.
    pub fn record_actor_position(&self, actor: &Actor) {
        let c = actor.center();
        let offset = self
            .current
            .as_deref()
            .and_then(|id| self.graph.room(id))
            .map_or(Point::default(), |r| Point::new(r.placement.x, r.placement.y));
        self.graph.add_player_position(offset.x + c.x, offset.y + c.y);
    }

    // ── Spawning ──

    /// Put `actor` at `spawn_id` in `room_id`: the named spawn, else the
    /// room's first spawn, else the room centre. Does not change rooms.
    pub fn spawn_actor_in_room(&mut self, actor: &mut Actor, room_id: &str, spawn_id: &str) -> Result<SpawnPlacement> {
        if !self.rooms.contains_key(room_id) {
            return Err(NavError::not_found("room", room_id));
        }
        Ok(self.place_actor(actor, room_id, spawn_id))
    }

    /// `room_id` must be registered.
    fn place_actor(&mut self, actor: &mut Actor, room_id: &str, spawn_id: &str) -> SpawnPlacement {
        let Some(room) = self.rooms.get(room_id) else {
            return SpawnPlacement { x: actor.x, y: actor.y, method: SpawnMethod::Unresolved };
        };
        let spawns = self.spawn_points(room_id);

        let (x, y, facing) = match spawns.iter().find(|s| s.id == spawn_id).or_else(|| {
            let first = spawns.first();
            if let Some(s) = first {
                debug!("spawn {spawn_id} not in {room_id}, using {}", s.id);
            }
            first
        }) {
            Some(s) => (s.x, s.y, Some(s.facing)),
            None => {
                let grid = room.tile_grid();
                let u = room.physics_unit();
                debug!("{room_id} has no spawn points, using its centre");
                ((grid.width as i32 / 2) * u, (grid.height as i32 / 2) * u, None)
            }
        };

        let placement = find_safe_spawn(room.as_ref(), actor, x, y, &self.config);
        actor.set_position(placement.x, placement.y);
        if let Some(f) = facing {
            actor.facing = f;
        }
        if placement.method == SpawnMethod::Unresolved {
            warn!("no collision-free spawn near ({x}, {y}) in {room_id}");
            self.events.push(NavEvent::SpawnFallback {
                room: room_id.to_string(),
                at: Point::new(placement.x, placement.y),
            });
        }
        placement
    }

    fn mark_current_in_graph(&self, room_id: &str) {
        if let Err(e) = self.graph.set_current_room(room_id) {
            info!("world graph: {e}");
        }
    }
}

/// Collision-safe position for `actor` near (`x`, `y`) in `room`.
pub fn find_safe_spawn(room: &dyn Room, actor: &Actor, x: i32, y: i32, config: &NavConfig) -> SpawnPlacement {
    let u = room.physics_unit();
    let (width_px, height_px) = room.pixel_size();
    let max_x = (width_px - 1).max(0);

    let fits = |px: i32, py: i32| !room.box_overlaps_solid(&actor.collision_box_at(px, py));
    let fits_inside = |px: i32, py: i32| {
        let b = actor.collision_box_at(px, py);
        b.x >= 0 && b.y >= 0 && b.right() <= width_px && b.bottom() <= height_px && fits(px, py)
    };
    // Hitbox bottom on the floor line; columns without one use the fallback.
    let resting_y = |px: i32| actor.y_resting_on(room.find_floor_at_x(px));

    let ry = resting_y(x);
    if fits(x, ry) {
        return SpawnPlacement { x, y: ry, method: SpawnMethod::Floor };
    }

    for &k in &config.spawn.probe_offsets {
        let px = (x + k * u).clamp(0, max_x);
        let ry = resting_y(px);
        if fits(px, ry) {
            return SpawnPlacement { x: px, y: ry, method: SpawnMethod::Probe { dx: px - x } };
        }
    }

    if fits_inside(x, y) {
        return SpawnPlacement { x, y, method: SpawnMethod::Cardinal };
    }
    let (tx, ty) = (tile_of(x, u), tile_of(y, u));
    for r in 1..=config.spawn.search_radius {
        for dir in [Direction::East, Direction::West, Direction::North, Direction::South] {
            let (dx, dy) = dir.delta();
            let (px, py) = ((tx + dx * r) * u, (ty + dy * r) * u);
            if fits_inside(px, py) {
                return SpawnPlacement { x: px, y: py, method: SpawnMethod::Cardinal };
            }
        }
    }

    SpawnPlacement { x, y, method: SpawnMethod::Unresolved }
}
