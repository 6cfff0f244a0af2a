/// Zone loading: every `.tmj` map in a zone directory becomes a room.
///
/// Portals turn into both halves of a connection:
///   - a spawn point named after the portal, just inside the room
///   - a transition to `{toZone}/{toRoom}` arriving at spawn `toPortal`
///
/// Rooms are registered before any transition is added, so the world
/// graph can connect rooms regardless of file order. An optional
/// `transitions.json` in the zone directory adds hand-written points.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::Deserialize;

use crate::config::NavConfig;
use crate::domain::geom::{Direction, Facing};
use crate::error::{NavError, Result};
use crate::tiled::{load_map, LoadedMap, Portal};

use super::room::{room_id_from_path, TileRoom};
use super::transition::{SpawnPoint, TransitionManager, TransitionPoint, TransitionType};

pub const MAP_EXTENSION: &str = "tmj";
pub const TRANSITIONS_FILE: &str = "transitions.json";

/// What a zone load registered.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ZoneSummary {
    pub zone: String,
    /// Room ids, sorted.
    pub rooms: Vec<String>,
    pub transitions: usize,
    pub spawns: usize,
}

impl ZoneSummary {
    /// Configured start room if it belongs to this zone, else the first.
    /// `start_room` may be a full id or just the map name.
    pub fn start_room(&self, config: &NavConfig) -> Option<&str> {
        let wanted = config.general.start_room.as_str();
        if !wanted.is_empty() {
            let full = if wanted.contains('/') { wanted.to_string() } else { format!("{}/{wanted}", self.zone) };
            if let Some(id) = self.rooms.iter().find(|r| **r == full) {
                return Some(id);
            }
        }
        self.rooms.first().map(String::as_str)
    }
}

/// Sorted `.tmj` files directly inside `dir`.
pub fn scan_maps(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| NavError::io(dir, e))?;
    let mut maps: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| {
            p.is_file()
                && p.extension().map_or(false, |x| x.eq_ignore_ascii_case(MAP_EXTENSION))
        })
        .collect();
    maps.sort();
    Ok(maps)
}

/// Load `zones_dir/zone` into `manager`. Any map failing to load aborts
/// the zone.
pub fn load_zone(manager: &mut TransitionManager, zones_dir: &Path, zone: &str, config: &NavConfig) -> Result<ZoneSummary> {
    let dir = zones_dir.join(zone);
    let paths = scan_maps(&dir)?;

    let maps = paths
        .iter()
        .map(|p| -> Result<(String, LoadedMap)> { Ok((room_id_from_path(zone, p), load_map(p)?)) })
        .collect::<Result<Vec<_>>>()?;

    // The overlay is read and checked up front so a bad one registers nothing.
    let overlay_path = dir.join(TRANSITIONS_FILE);
    let overlay = if overlay_path.is_file() {
        let file = read_transitions(&overlay_path)?;
        if let Some(unknown) = file
            .rooms
            .keys()
            .find(|id| manager.room(id).is_none() && !maps.iter().any(|(m, _)| m == *id))
        {
            return Err(NavError::not_found("room", unknown.as_str()));
        }
        Some(file)
    } else {
        None
    };

    let mut summary = ZoneSummary { zone: zone.to_string(), ..Default::default() };
    for (id, map) in &maps {
        manager.register_room(TileRoom::from_loaded_map(id.as_str(), map, config));
        summary.rooms.push(id.clone());
    }

    for (id, map) in &maps {
        for portal in &map.portals {
            manager.add_spawn_point(id, portal_spawn(map, portal, config))?;
            summary.spawns += 1;

            let Some(to_room) = portal.to_room.as_deref() else {
                debug!("{id}: portal '{}' has no target room", portal.name);
                continue;
            };
            let target = format!("{}/{to_room}", portal.target_zone(zone));
            let point = TransitionPoint::new(
                TransitionType::Door,
                map.portal_rect(portal, config),
                target,
                portal.to_portal.clone().unwrap_or_default(),
                portal.direction(),
            );
            manager.add_transition_point(id, point)?;
            summary.transitions += 1;
        }
    }

    if let Some(file) = overlay {
        let (spawns, transitions) = apply_entries(manager, file, &overlay_path.display().to_string())?;
        summary.spawns += spawns;
        summary.transitions += transitions;
    }

    summary.rooms.sort();
    info!(
        "zone {zone}: {} rooms, {} transitions, {} spawns",
        summary.rooms.len(),
        summary.transitions,
        summary.spawns
    );
    Ok(summary)
}

/// Arrival point for a portal: just past the trigger on the room side,
/// facing into the room.
fn portal_spawn(map: &LoadedMap, portal: &Portal, config: &NavConfig) -> SpawnPoint {
    let u = config.physics_unit();
    let rect = map.portal_rect(portal, config);
    let dir = portal.direction();
    let x = match dir {
        Direction::West => rect.right(),
        Direction::East => rect.x - u,
        _ => rect.center().x - u / 2,
    };
    SpawnPoint::new(portal.name.clone(), x, rect.bottom() - u, Facing::away_from(dir))
}

// ── transitions.json overlay ──

#[derive(Deserialize, Debug)]
struct TransitionFile {
    #[serde(default)]
    rooms: BTreeMap<String, RoomEntries>,
}

#[derive(Deserialize, Debug)]
struct RoomEntries {
    #[serde(default)]
    spawn_points: Vec<SpawnPoint>,
    #[serde(default)]
    transitions: Vec<TransitionPoint>,
}

/// Apply a transitions file. Returns (spawns, transitions) added.
pub fn load_transitions_file(manager: &mut TransitionManager, path: &Path) -> Result<(usize, usize)> {
    let file = read_transitions(path)?;
    apply_entries(manager, file, &path.display().to_string())
}

/// Every referenced room must already be registered.
pub fn apply_transitions_json(manager: &mut TransitionManager, text: &str, source_name: &str) -> Result<(usize, usize)> {
    let file = parse_transitions(text, source_name)?;
    apply_entries(manager, file, source_name)
}

fn read_transitions(path: &Path) -> Result<TransitionFile> {
    let text = std::fs::read_to_string(path).map_err(|e| NavError::io(path, e))?;
    parse_transitions(&text, &path.display().to_string())
}

fn parse_transitions(text: &str, source_name: &str) -> Result<TransitionFile> {
    serde_json::from_str(text).map_err(|e| NavError::invalid(source_name, e.to_string()))
}

fn apply_entries(manager: &mut TransitionManager, file: TransitionFile, source_name: &str) -> Result<(usize, usize)> {
    let (mut spawns, mut transitions) = (0, 0);
    for (room_id, entries) in file.rooms {
        for sp in entries.spawn_points {
            manager.add_spawn_point(&room_id, sp)?;
            spawns += 1;
        }
        for tp in entries.transitions {
            manager.add_transition_point(&room_id, tp)?;
            transitions += 1;
        }
    }
    debug!("{source_name}: {spawns} spawns, {transitions} transitions");
    Ok((spawns, transitions))
}
