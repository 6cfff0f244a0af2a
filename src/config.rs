/// External configuration loader.
///
/// Reads `roomnav.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.
///
/// Every unit-dependent computation in the crate (floor finding, spawn
/// probing, world-map placement) takes its constants from a `NavConfig`
/// value passed in explicitly, never from process-wide state.

use serde::Deserialize;
use std::path::PathBuf;

use crate::error::{NavError, Result};

pub const CONFIG_FILE: &str = "roomnav.toml";

// ── Public Config Struct ──

#[derive(Clone, Debug, PartialEq)]
pub struct NavConfig {
    pub units: UnitsConfig,
    pub collision: CollisionConfig,
    pub actor: ActorConfig,
    pub spawn: SpawnConfig,
    pub world_map: WorldMapConfig,
    pub general: GeneralConfig,
}

#[derive(Clone, Debug, PartialEq)]
pub struct UnitsConfig {
    pub tile_size: u32,   // map pixels per tile
    pub tile_scale: f64,  // physics unit = tile_size * tile_scale
}

#[derive(Clone, Debug, PartialEq)]
pub struct CollisionConfig {
    /// Rows where collision code 2 is passable, unless the layer says otherwise.
    pub decorative_rows: Vec<usize>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ActorConfig {
    pub hitbox_offset_x: i32,
    pub hitbox_offset_y: i32,
    pub hitbox_width: i32,
    pub hitbox_height: i32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SpawnConfig {
    /// Horizontal probe offsets, in tiles, tried in order.
    pub probe_offsets: Vec<i32>,
    /// Max tiles walked in each cardinal direction by the last-resort search.
    pub search_radius: i32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct WorldMapConfig {
    pub trail_capacity: usize,
    pub padding: i32,
    pub thumbnail_max: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GeneralConfig {
    pub zones_dir: PathBuf,
    pub start_zone: String,
    pub start_room: String,
    pub fallback_room: String,
    pub fallback_spawn: String,
    pub tick_rate_ms: u64,
}

impl NavConfig {
    /// Size of one grid cell in physics pixels.
    pub fn physics_unit(&self) -> i32 {
        let u = (self.units.tile_size as f64 * self.units.tile_scale).round() as i32;
        u.max(1)
    }
}

impl Default for NavConfig {
    fn default() -> Self {
        NavConfig::from_toml(TomlConfig::default(), &[])
    }
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    units: TomlUnits,
    #[serde(default)]
    collision: TomlCollision,
    #[serde(default)]
    actor: TomlActor,
    #[serde(default)]
    spawn: TomlSpawn,
    #[serde(default)]
    world_map: TomlWorldMap,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlUnits {
    #[serde(default = "default_tile_size")]
    tile_size: u32,
    #[serde(default = "default_tile_scale")]
    tile_scale: f64,
}

#[derive(Deserialize, Debug)]
struct TomlCollision {
    #[serde(default = "default_decorative_rows")]
    decorative_rows: Vec<usize>,
}

#[derive(Deserialize, Debug)]
struct TomlActor {
    #[serde(default = "default_hitbox_offset_x")]
    hitbox_offset_x: i32,
    #[serde(default = "default_hitbox_offset_y")]
    hitbox_offset_y: i32,
    #[serde(default = "default_hitbox_width")]
    hitbox_width: i32,
    #[serde(default = "default_hitbox_height")]
    hitbox_height: i32,
}

#[derive(Deserialize, Debug)]
struct TomlSpawn {
    #[serde(default = "default_probe_offsets")]
    probe_offsets: Vec<i32>,
    #[serde(default = "default_search_radius")]
    search_radius: i32,
}

#[derive(Deserialize, Debug)]
struct TomlWorldMap {
    #[serde(default = "default_trail_capacity")]
    trail_capacity: usize,
    #[serde(default = "default_padding")]
    padding: i32,
    #[serde(default = "default_thumbnail_max")]
    thumbnail_max: usize,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_zones_dir")]
    zones_dir: String,
    #[serde(default = "default_start_zone")]
    start_zone: String,
    #[serde(default)]
    start_room: String,
    #[serde(default = "default_fallback_room")]
    fallback_room: String,
    #[serde(default = "default_fallback_spawn")]
    fallback_spawn: String,
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
}

// ── Defaults ──

fn default_tile_size() -> u32 { 16 }
fn default_tile_scale() -> f64 { 1.0 }
fn default_decorative_rows() -> Vec<usize> { vec![1] }
fn default_hitbox_offset_x() -> i32 { 2 }
fn default_hitbox_offset_y() -> i32 { 4 }
fn default_hitbox_width() -> i32 { 12 }
fn default_hitbox_height() -> i32 { 12 }
fn default_probe_offsets() -> Vec<i32> { vec![0, 1, -1, 2, -2] }
fn default_search_radius() -> i32 { 3 }
fn default_trail_capacity() -> usize { 100 }
fn default_padding() -> i32 { 64 }
fn default_thumbnail_max() -> usize { 32 }
fn default_zones_dir() -> String { "data/zones".into() }
fn default_start_zone() -> String { "forest".into() }
fn default_fallback_room() -> String { "safety".into() }
fn default_fallback_spawn() -> String { "entry".into() }
fn default_tick_rate() -> u64 { 50 }

impl Default for TomlUnits {
    fn default() -> Self {
        TomlUnits {
            tile_size: default_tile_size(),
            tile_scale: default_tile_scale(),
        }
    }
}

impl Default for TomlCollision {
    fn default() -> Self {
        TomlCollision { decorative_rows: default_decorative_rows() }
    }
}

impl Default for TomlActor {
    fn default() -> Self {
        TomlActor {
            hitbox_offset_x: default_hitbox_offset_x(),
            hitbox_offset_y: default_hitbox_offset_y(),
            hitbox_width: default_hitbox_width(),
            hitbox_height: default_hitbox_height(),
        }
    }
}

impl Default for TomlSpawn {
    fn default() -> Self {
        TomlSpawn {
            probe_offsets: default_probe_offsets(),
            search_radius: default_search_radius(),
        }
    }
}

impl Default for TomlWorldMap {
    fn default() -> Self {
        TomlWorldMap {
            trail_capacity: default_trail_capacity(),
            padding: default_padding(),
            thumbnail_max: default_thumbnail_max(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            zones_dir: default_zones_dir(),
            start_zone: default_start_zone(),
            start_room: String::new(),
            fallback_room: default_fallback_room(),
            fallback_spawn: default_fallback_spawn(),
            tick_rate_ms: default_tick_rate(),
        }
    }
}

// ── Loading ──

impl NavConfig {
    /// Load config from `roomnav.toml`.
    /// Search order: (1) exe directory, (2) current working directory,
    /// (3) XDG data home. Missing file or missing keys fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);
        NavConfig::from_toml(toml_cfg, &search_dirs)
    }

    /// Strict parse of a TOML document. Missing keys still take defaults,
    /// but syntax or type errors are reported.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let cfg = toml::from_str::<TomlConfig>(text)
            .map_err(|e| NavError::invalid(CONFIG_FILE, e.to_string()))?;
        Ok(NavConfig::from_toml(cfg, &[]))
    }

    fn from_toml(toml_cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        // Resolve zones directory against the search dirs
        let zones_dir_str = &toml_cfg.general.zones_dir;
        let zones_dir = if PathBuf::from(zones_dir_str).is_absolute() {
            PathBuf::from(zones_dir_str)
        } else {
            search_dirs.iter()
                .map(|d| d.join(zones_dir_str))
                .find(|p| p.is_dir())
                .unwrap_or_else(|| PathBuf::from(zones_dir_str))
        };

        let tile_scale = if toml_cfg.units.tile_scale > 0.0 {
            toml_cfg.units.tile_scale
        } else {
            log::warn!("tile_scale must be positive, using {}", default_tile_scale());
            default_tile_scale()
        };

        NavConfig {
            units: UnitsConfig {
                tile_size: toml_cfg.units.tile_size.max(1),
                tile_scale,
            },
            collision: CollisionConfig {
                decorative_rows: toml_cfg.collision.decorative_rows,
            },
            actor: ActorConfig {
                hitbox_offset_x: toml_cfg.actor.hitbox_offset_x,
                hitbox_offset_y: toml_cfg.actor.hitbox_offset_y,
                hitbox_width: toml_cfg.actor.hitbox_width.max(1),
                hitbox_height: toml_cfg.actor.hitbox_height.max(1),
            },
            spawn: SpawnConfig {
                probe_offsets: toml_cfg.spawn.probe_offsets,
                search_radius: toml_cfg.spawn.search_radius.max(0),
            },
            world_map: WorldMapConfig {
                trail_capacity: toml_cfg.world_map.trail_capacity.max(1),
                padding: toml_cfg.world_map.padding.max(0),
                thumbnail_max: toml_cfg.world_map.thumbnail_max.max(1),
            },
            general: GeneralConfig {
                zones_dir,
                start_zone: toml_cfg.general.start_zone,
                start_room: toml_cfg.general.start_room,
                fallback_room: toml_cfg.general.fallback_room,
                fallback_spawn: toml_cfg.general.fallback_spawn,
                tick_rate_ms: toml_cfg.general.tick_rate_ms.max(1),
            },
        }
    }
}

/// Candidate directories to search: exe dir + CWD + XDG data home (deduplicated).
pub(crate) fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    // 3. XDG data home (~/.local/share/roomnav)
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/roomnav");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for the config file in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join(CONFIG_FILE);
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => {
                        log::info!("loaded config from {}", path.display());
                        return cfg;
                    }
                    Err(e) => {
                        log::warn!("{} parse error: {e}; using default settings", path.display());
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    log::warn!("could not read {}: {e}", path.display());
                }
            }
        }
    }
    TomlConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_sixteen_pixel_tiles() {
        let cfg = NavConfig::default();
        assert_eq!(cfg.physics_unit(), 16);
        assert_eq!(cfg.collision.decorative_rows, vec![1]);
        assert_eq!(cfg.spawn.probe_offsets, vec![0, 1, -1, 2, -2]);
        assert_eq!(cfg.world_map.trail_capacity, 100);
        assert_eq!(cfg.general.fallback_room, "safety");
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let cfg = NavConfig::from_toml_str("[units]\ntile_scale = 2.0\n").unwrap();
        assert_eq!(cfg.physics_unit(), 32);
        assert_eq!(cfg.units.tile_size, 16);
        assert_eq!(cfg.actor.hitbox_width, 12);
    }

    #[test]
    fn decorative_rows_can_be_cleared() {
        let cfg = NavConfig::from_toml_str("[collision]\ndecorative_rows = []\n").unwrap();
        assert!(cfg.collision.decorative_rows.is_empty());
    }

    #[test]
    fn malformed_file_is_invalid_format() {
        let err = NavConfig::from_toml_str("[units\n").unwrap_err();
        assert!(matches!(err, NavError::InvalidFormat { .. }));
    }

    #[test]
    fn non_positive_scale_falls_back() {
        let cfg = NavConfig::from_toml_str("[units]\ntile_scale = 0.0\n").unwrap();
        assert_eq!(cfg.physics_unit(), 16);
    }
}
