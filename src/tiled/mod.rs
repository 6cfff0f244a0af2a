/// External map loader: Tiled JSON maps plus their tilesets.
///
/// A map names up to three layers:
///   `render`     tile layer of global ids (gids), drawn and used for
///                tile-property solidity
///   `collision`  tile layer of collision codes (0 / 1 / 2)
///   `portals`    object layer; objects typed `portal` become transitions
///
/// Every tileset owns the contiguous gid range
/// `[firstgid, firstgid + tilecount)`. Ranges are sorted and must not
/// overlap, so a gid resolves to at most one tileset.
///
/// Any failure (missing file, malformed JSON/XML, unknown encoding, bad
/// layer size) aborts loading of that map and is returned to the caller.

mod tmj;
mod tsx;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::config::NavConfig;
use crate::domain::geom::{Direction, Rect};
use crate::domain::tile::{CollisionCode, CollisionLayer, OneWay, TileGrid, TileProperties, EMPTY_TILE};
use crate::error::{NavError, Result};

use tmj::{property_text, LayerData, TmjLayer, TmjMap, TmjObject, TmjTileset};

/// Tiled stores horizontal/vertical/diagonal flip flags in the top 3 bits.
pub const GID_MASK: u32 = 0x1FFF_FFFF;

/// Strip the flip flags from a gid.
pub fn normalize_gid(gid: u32) -> u32 {
    gid & GID_MASK
}

static DEFAULT_PROPERTIES: TileProperties = TileProperties {
    kind: String::new(),
    solid: false,
    one_way: None,
    slope_m: None,
    slope_b: None,
};

// ══════════════════════════════════════════════════════════════
// Tilesets
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct Tileset {
    pub name: String,
    pub first_gid: u32,
    pub tile_width: u32,
    pub tile_height: u32,
    pub tile_count: u32,
    /// Exclusive end of the gid range, fixed once all tilesets are sorted.
    end_gid: u32,
    tiles: HashMap<u32, TileProperties>,
}

impl Tileset {
    pub fn contains(&self, gid: u32) -> bool {
        gid >= self.first_gid && gid < self.end_gid
    }

    /// Explicit properties of a local tile id, if the tileset lists any.
    pub fn properties(&self, local_id: u32) -> Option<&TileProperties> {
        self.tiles.get(&local_id)
    }

    fn new(name: String, first_gid: u32, tile_width: u32, tile_height: u32, tile_count: u32) -> Self {
        Tileset {
            name,
            first_gid,
            tile_width,
            tile_height,
            tile_count,
            end_gid: u32::MAX,
            tiles: HashMap::new(),
        }
    }
}

/// Fold one `name = value` tileset property into `props`.
fn apply_tile_property(props: &mut TileProperties, name: &str, value: &str) {
    match name {
        "kind" => props.kind = value.to_string(),
        "solid" => props.solid = value.trim().eq_ignore_ascii_case("true"),
        "one_way" => props.one_way = OneWay::parse(value),
        "slopeM" => props.slope_m = value.trim().parse().ok(),
        "slopeB" => props.slope_b = value.trim().parse().ok(),
        _ => {}
    }
}

fn tileset_from_tsx(text: &str, first_gid: u32, source_name: &str) -> Result<Tileset> {
    let tsx = tsx::parse(text).map_err(|e| NavError::invalid(source_name, e.to_string()))?;
    let mut ts = Tileset::new(tsx.name.clone(), first_gid, tsx.tile_width, tsx.tile_height, tsx.tile_count);
    for tile in &tsx.tiles {
        let mut props = TileProperties::default();
        for (name, value) in tile.property_pairs() {
            apply_tile_property(&mut props, name, value);
        }
        ts.tiles.insert(tile.id, props);
    }
    Ok(ts)
}

fn tileset_from_json(body: &TmjTileset, first_gid: u32) -> Tileset {
    let mut ts = Tileset::new(body.name.clone(), first_gid, body.tile_width, body.tile_height, body.tile_count);
    for tile in &body.tiles {
        let mut props = TileProperties::default();
        for p in &tile.properties {
            if let Some(value) = p.text() {
                apply_tile_property(&mut props, &p.name, &value);
            }
        }
        ts.tiles.insert(tile.id, props);
    }
    ts
}

/// Read one tileset entry of a map, external or embedded.
fn load_tileset(map_path: &Path, entry: &tmj::TmjTilesetRef) -> Result<Tileset> {
    let Some(source) = &entry.source else {
        return Ok(tileset_from_json(&entry.embedded, entry.first_gid));
    };

    let path = resolve_relative(map_path, source);
    let text = std::fs::read_to_string(&path).map_err(|e| NavError::io(&path, e))?;
    let source_name = path.display().to_string();
    let is_json = path
        .extension()
        .map_or(false, |e| e.eq_ignore_ascii_case("tsj") || e.eq_ignore_ascii_case("json"));

    if is_json {
        let body: TmjTileset =
            serde_json::from_str(&text).map_err(|e| NavError::invalid(&source_name, e.to_string()))?;
        Ok(tileset_from_json(&body, entry.first_gid))
    } else {
        tileset_from_tsx(&text, entry.first_gid, &source_name)
    }
}

/// Sort by first gid, close each range and reject overlaps.
fn finalize_tilesets(mut tilesets: Vec<Tileset>, source_name: &str) -> Result<Vec<Tileset>> {
    tilesets.sort_by_key(|t| t.first_gid);
    let next_firsts: Vec<u32> = tilesets.iter().skip(1).map(|t| t.first_gid).collect();
    for (i, ts) in tilesets.iter_mut().enumerate() {
        let next = next_firsts.get(i).copied();
        ts.end_gid = if ts.tile_count > 0 {
            ts.first_gid.saturating_add(ts.tile_count)
        } else {
            next.unwrap_or(u32::MAX)
        };
        if let Some(next) = next {
            if ts.end_gid > next {
                return Err(NavError::invalid(
                    source_name,
                    format!("tileset '{}' gid range overlaps firstgid {next}", ts.name),
                ));
            }
        }
    }
    Ok(tilesets)
}

// ══════════════════════════════════════════════════════════════
// Portals
// ══════════════════════════════════════════════════════════════

/// A `portal` object from the map's object layer, in map pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct Portal {
    pub name: String,
    pub rect: Rect,
    pub to_zone: Option<String>,
    pub to_room: Option<String>,
    pub to_portal: Option<String>,
    /// Explicit `direction` property, if set.
    pub direction: Option<Direction>,
}

impl Portal {
    /// Explicit direction, else the edge implied by the portal's name.
    pub fn direction(&self) -> Direction {
        self.direction.unwrap_or_else(|| Direction::from_portal_name(&self.name))
    }

    /// Target zone, defaulting to the zone that owns the map.
    pub fn target_zone<'a>(&'a self, own_zone: &'a str) -> &'a str {
        self.to_zone.as_deref().filter(|z| !z.is_empty()).unwrap_or(own_zone)
    }

    fn from_object(obj: &TmjObject) -> Option<Portal> {
        if !obj.kind.eq_ignore_ascii_case("portal") {
            return None;
        }
        let text = |name: &str| property_text(&obj.properties, name).filter(|s| !s.is_empty());
        let direction = text("direction").and_then(|d| {
            let parsed = Direction::parse(&d);
            if parsed.is_none() {
                warn!("portal '{}' has unknown direction '{d}'", obj.name);
            }
            parsed
        });
        Some(Portal {
            name: obj.name.clone(),
            rect: Rect::new(
                obj.x.round() as i32,
                obj.y.round() as i32,
                obj.width.round() as i32,
                obj.height.round() as i32,
            ),
            to_zone: text("toZone"),
            to_room: text("toRoom"),
            to_portal: text("toPortal"),
            direction,
        })
    }
}

// ══════════════════════════════════════════════════════════════
// Loaded map
// ══════════════════════════════════════════════════════════════

/// Properties of a resolved gid.
#[derive(Clone, Copy, Debug)]
pub struct ResolvedTile<'a> {
    pub tileset: &'a Tileset,
    pub local_id: u32,
    pub properties: &'a TileProperties,
}

#[derive(Clone, Debug)]
pub struct LoadedMap {
    /// File stem of the map, e.g. `r01` for `r01.tmj`.
    pub name: String,
    pub path: PathBuf,
    pub width: usize,
    pub height: usize,
    pub tile_width: u32,
    pub tile_height: u32,
    pub tilesets: Vec<Tileset>,
    /// Render layer as tileset-local ids, -1 = empty.
    pub render: TileGrid,
    /// Normalized render gids, row-major; 0 = empty.
    pub render_gids: Vec<u32>,
    pub collision: Option<CollisionLayer>,
    pub portals: Vec<Portal>,
    /// Map-level custom properties, as text.
    pub properties: HashMap<String, String>,
}

impl LoadedMap {
    /// Resolve a (possibly flip-flagged) gid to its tileset and properties.
    /// Tiles the tileset lists no properties for resolve to defaults.
    pub fn resolve(&self, gid: u32) -> Option<ResolvedTile<'_>> {
        let gid = normalize_gid(gid);
        if gid == 0 {
            return None;
        }
        let tileset = self.tilesets.iter().find(|t| t.contains(gid))?;
        let local_id = gid - tileset.first_gid;
        Some(ResolvedTile {
            tileset,
            local_id,
            properties: tileset.properties(local_id).unwrap_or(&DEFAULT_PROPERTIES),
        })
    }

    /// Resolved render-tile properties per cell, row-major.
    pub fn cell_properties(&self) -> Vec<Option<TileProperties>> {
        self.render_gids
            .iter()
            .map(|&gid| self.resolve(gid).map(|r| r.properties.clone()))
            .collect()
    }

    /// Factor from map pixels to physics pixels.
    pub fn pixel_scale(&self, config: &NavConfig) -> f64 {
        config.physics_unit() as f64 / self.tile_width.max(1) as f64
    }

    /// Portal trigger rectangle in physics pixels.
    pub fn portal_rect(&self, portal: &Portal, config: &NavConfig) -> Rect {
        let s = self.pixel_scale(config);
        let scale = |v: i32| (v as f64 * s).round() as i32;
        Rect::new(scale(portal.rect.x), scale(portal.rect.y), scale(portal.rect.width), scale(portal.rect.height))
    }
}

/// Load a `.tmj` map and every tileset it references.
pub fn load_map(path: impl AsRef<Path>) -> Result<LoadedMap> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| NavError::io(path, e))?;
    parse_map(&text, path)
}

/// Parse map JSON; tileset references resolve relative to `path`.
pub fn parse_map(text: &str, path: &Path) -> Result<LoadedMap> {
    let source_name = path.display().to_string();
    let map: TmjMap =
        serde_json::from_str(text).map_err(|e| NavError::invalid(&source_name, e.to_string()))?;

    let tilesets = map
        .tilesets
        .iter()
        .map(|entry| load_tileset(path, entry))
        .collect::<Result<Vec<_>>>()?;
    let tilesets = finalize_tilesets(tilesets, &source_name)?;

    for ts in &tilesets {
        if ts.tile_width != 0 && (ts.tile_width != map.tile_width || ts.tile_height != map.tile_height) {
            warn!(
                "{source_name}: tileset '{}' is {}x{}, map tiles are {}x{}",
                ts.name, ts.tile_width, ts.tile_height, map.tile_width, map.tile_height
            );
        }
    }

    let mut loaded = LoadedMap {
        name: path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default(),
        path: path.to_path_buf(),
        width: map.width,
        height: map.height,
        tile_width: map.tile_width,
        tile_height: map.tile_height,
        tilesets,
        render: TileGrid::new(map.width, map.height),
        render_gids: vec![0; map.width * map.height],
        collision: None,
        portals: vec![],
        properties: map
            .properties
            .iter()
            .filter_map(|p| p.text().map(|v| (p.name.clone(), v)))
            .collect(),
    };

    let mut saw_render = false;
    for layer in &map.layers {
        match layer.name.as_str() {
            "render" => {
                let gids = layer_gids(layer, &map, &source_name)?;
                fill_render(&mut loaded, gids, &source_name);
                saw_render = true;
            }
            "collision" => {
                let codes = layer_gids(layer, &map, &source_name)?;
                loaded.collision = Some(collision_layer(layer, codes, &map, &source_name));
            }
            "portals" => {
                loaded.portals = layer.objects.iter().filter_map(Portal::from_object).collect();
            }
            other => debug!("{source_name}: ignoring layer '{other}'"),
        }
    }
    if !saw_render {
        warn!("{source_name}: no render layer");
    }

    debug!(
        "loaded map {} ({}x{}, {} tilesets, {} portals)",
        loaded.name,
        loaded.width,
        loaded.height,
        loaded.tilesets.len(),
        loaded.portals.len()
    );
    Ok(loaded)
}

/// Raw values of a tile layer, validated against the map size.
fn layer_gids<'a>(layer: &'a TmjLayer, map: &TmjMap, source_name: &str) -> Result<&'a [u32]> {
    if let Some(enc) = layer.encoding.as_deref().filter(|e| *e != "csv") {
        return Err(NavError::invalid(
            source_name,
            format!("layer '{}' uses unsupported encoding '{enc}'", layer.name),
        ));
    }
    if let Some(comp) = layer.compression.as_deref().filter(|c| !c.is_empty()) {
        return Err(NavError::invalid(
            source_name,
            format!("layer '{}' uses unsupported compression '{comp}'", layer.name),
        ));
    }
    let gids = match &layer.data {
        Some(LayerData::Gids(v)) => v.as_slice(),
        Some(LayerData::Encoded(_)) => {
            return Err(NavError::invalid(source_name, format!("layer '{}' data is encoded", layer.name)))
        }
        None => {
            return Err(NavError::invalid(source_name, format!("layer '{}' has no tile data", layer.name)))
        }
    };
    let expected = map.width * map.height;
    if gids.len() != expected {
        return Err(NavError::invalid(
            source_name,
            format!("layer '{}' has {} cells, expected {expected}", layer.name, gids.len()),
        ));
    }
    Ok(gids)
}

fn fill_render(loaded: &mut LoadedMap, gids: &[u32], source_name: &str) {
    let width = loaded.width;
    let mut unmapped = 0usize;
    let mut mapped = 0usize;
    let mut cells = Vec::with_capacity(gids.len());
    let mut normalized = Vec::with_capacity(gids.len());
    for &raw in gids {
        let gid = normalize_gid(raw);
        let local = match loaded.resolve(gid) {
            Some(r) => {
                mapped += 1;
                r.local_id as i32
            }
            None if gid == 0 => EMPTY_TILE,
            None => {
                unmapped += 1;
                EMPTY_TILE
            }
        };
        cells.push(local);
        normalized.push(gid);
    }
    loaded.render_gids = normalized;

    let rows = if width == 0 { vec![] } else { cells.chunks(width).map(<[i32]>::to_vec).collect() };
    loaded.render = TileGrid::from_rows(width, rows);
    if unmapped > 0 {
        warn!("{source_name}: {unmapped} render cells reference no tileset");
    }
    debug!("{source_name}: {mapped} render cells mapped, {unmapped} unmapped");
}

fn collision_layer(layer: &TmjLayer, codes: &[u32], map: &TmjMap, source_name: &str) -> CollisionLayer {
    let mut out = CollisionLayer::new(map.width, map.height);
    let mut unknown = 0usize;
    for (i, &raw) in codes.iter().enumerate() {
        let code = CollisionCode::from_raw(raw).unwrap_or_else(|| {
            unknown += 1;
            CollisionCode::Empty
        });
        if map.width > 0 {
            out.set(i % map.width, i / map.width, code);
        }
    }
    if unknown > 0 {
        warn!("{source_name}: {unknown} collision cells have unknown codes, treated as empty");
    }
    match property_text(&layer.properties, "passableRows") {
        Some(rows) => out.with_passable_rows(parse_rows(&rows, source_name)),
        None => out,
    }
}

/// Parse a comma-separated row list; bad entries are skipped with a warning.
fn parse_rows(text: &str, source_name: &str) -> Vec<usize> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| match s.parse() {
            Ok(row) => Some(row),
            Err(_) => {
                warn!("{source_name}: bad passableRows entry '{s}'");
                None
            }
        })
        .collect()
}

fn resolve_relative(base: &Path, rel: &str) -> PathBuf {
    let rel = Path::new(rel);
    if rel.is_absolute() {
        return rel.to_path_buf();
    }
    base.parent().unwrap_or_else(|| Path::new(".")).join(rel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const TSX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<tileset name="ground" tilewidth="16" tileheight="16" tilecount="4" columns="2">
 <tile id="0"><properties><property name="kind" value="grass"/><property name="solid" value="True"/></properties></tile>
 <tile id="2"><properties><property name="one_way" value="up"/></properties></tile>
 <tile id="3"><properties><property name="slopeM" value="0.5"/><property name="slopeB" value="4"/></properties></tile>
</tileset>"#;

    fn write_map(dir: &Path, name: &str, body: &str) -> PathBuf {
        fs::write(dir.join("ground.tsx"), TSX).unwrap();
        let path = dir.join(name);
        fs::write(&path, body).unwrap();
        path
    }

    const MAP: &str = r#"{
      "width": 3, "height": 2, "tilewidth": 16, "tileheight": 16,
      "tilesets": [
        {"firstgid": 5, "name": "deco", "tilecount": 2,
         "tiles": [{"id": 1, "properties": [{"name": "solid", "type": "bool", "value": true}]}]},
        {"firstgid": 1, "source": "ground.tsx"}
      ],
      "layers": [
        {"name": "render", "type": "tilelayer", "data": [0, 0, 6, 1, 2147483649, 9]},
        {"name": "collision", "type": "tilelayer", "data": [0, 2, 0, 1, 0, 7],
         "properties": [{"name": "passableRows", "type": "string", "value": "0"}]},
        {"name": "portals", "type": "objectgroup", "objects": [
          {"name": "right", "type": "portal", "x": 32, "y": 0, "width": 16, "height": 32,
           "properties": [{"name": "toRoom", "type": "string", "value": "r02"},
                          {"name": "toPortal", "type": "string", "value": "left"}]},
          {"name": "sign", "type": "decoration", "x": 0, "y": 0, "width": 8, "height": 8}
        ]}
      ]
    }"#;

    #[test]
    fn normalize_strips_flip_bits() {
        assert_eq!(normalize_gid(0x8000_0001), 1);
        assert_eq!(normalize_gid(0xE000_0005), 5);
        assert_eq!(normalize_gid(5), 5);
    }

    #[test]
    fn loads_tilesets_sorted_and_resolves() {
        let dir = tempfile::tempdir().unwrap();
        let map = load_map(write_map(dir.path(), "r01.tmj", MAP)).unwrap();
        assert_eq!(map.name, "r01");
        assert_eq!(map.tilesets[0].first_gid, 1);
        assert_eq!(map.tilesets[1].first_gid, 5);

        let grass = map.resolve(1).unwrap();
        assert_eq!(grass.tileset.name, "ground");
        assert_eq!(grass.properties.kind, "grass");
        assert!(grass.properties.solid);

        let deco = map.resolve(6).unwrap();
        assert_eq!(deco.tileset.name, "deco");
        assert_eq!(deco.local_id, 1);
        assert!(deco.properties.solid);

        assert!(map.resolve(0).is_none());
        assert!(map.resolve(9).is_none());
    }

    #[test]
    fn flipped_gid_resolves_like_plain() {
        let dir = tempfile::tempdir().unwrap();
        let map = load_map(write_map(dir.path(), "r01.tmj", MAP)).unwrap();
        let plain = map.resolve(1).unwrap();
        let flipped = map.resolve(1 | 0x8000_0000).unwrap();
        assert_eq!(plain.local_id, flipped.local_id);
        assert_eq!(plain.properties, flipped.properties);
    }

    #[test]
    fn tile_properties_are_parsed() {
        let dir = tempfile::tempdir().unwrap();
        let map = load_map(write_map(dir.path(), "r01.tmj", MAP)).unwrap();
        assert_eq!(map.resolve(3).unwrap().properties.one_way, Some(OneWay::Up));
        let slope = map.resolve(4).unwrap().properties;
        assert_eq!(slope.slope_m, Some(0.5));
        assert_eq!(slope.slope_b, Some(4.0));
        // listed tileset range but no properties
        assert_eq!(map.resolve(2).unwrap().properties, &TileProperties::default());
    }

    #[test]
    fn render_layer_holds_local_ids() {
        let dir = tempfile::tempdir().unwrap();
        let map = load_map(write_map(dir.path(), "r01.tmj", MAP)).unwrap();
        assert_eq!(map.render.rows()[0], vec![-1, -1, 1]);
        assert_eq!(map.render.rows()[1], vec![0, 0, -1]);
        assert_eq!(map.render_gids, vec![0, 0, 6, 1, 1, 9]);
        let props = map.cell_properties();
        assert!(props[0].is_none());
        assert!(props[3].as_ref().unwrap().solid);
        assert!(props[5].is_none());
    }

    #[test]
    fn collision_layer_and_passable_rows() {
        let dir = tempfile::tempdir().unwrap();
        let map = load_map(write_map(dir.path(), "r01.tmj", MAP)).unwrap();
        let c = map.collision.as_ref().unwrap();
        assert_eq!(c.code(1, 0), CollisionCode::Platform);
        assert_eq!(c.code(0, 1), CollisionCode::Solid);
        assert_eq!(c.code(2, 1), CollisionCode::Empty);
        assert_eq!(c.passable_rows, Some(vec![0]));
    }

    #[test]
    fn portals_extracted_with_targets() {
        let dir = tempfile::tempdir().unwrap();
        let map = load_map(write_map(dir.path(), "r01.tmj", MAP)).unwrap();
        assert_eq!(map.portals.len(), 1);
        let p = &map.portals[0];
        assert_eq!(p.name, "right");
        assert_eq!(p.rect, Rect::new(32, 0, 16, 32));
        assert_eq!(p.to_room.as_deref(), Some("r02"));
        assert_eq!(p.to_portal.as_deref(), Some("left"));
        assert_eq!(p.target_zone("forest"), "forest");
        assert_eq!(p.direction(), Direction::East);
    }

    #[test]
    fn portal_rect_scales_to_physics_unit() {
        let dir = tempfile::tempdir().unwrap();
        let map = load_map(write_map(dir.path(), "r01.tmj", MAP)).unwrap();
        let cfg = NavConfig::from_toml_str("[units]\ntile_scale = 2.0\n").unwrap();
        assert_eq!(map.portal_rect(&map.portals[0], &cfg), Rect::new(64, 0, 32, 64));
    }

    #[test]
    fn wrong_data_length_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let body = r#"{"width":2,"height":2,"tilewidth":16,"tileheight":16,
            "layers":[{"name":"render","data":[0,0,0]}]}"#;
        let err = load_map(write_map(dir.path(), "bad.tmj", body)).unwrap_err();
        assert!(matches!(err, NavError::InvalidFormat { .. }));
    }

    #[test]
    fn base64_layer_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let body = r#"{"width":1,"height":1,"tilewidth":16,"tileheight":16,
            "layers":[{"name":"render","encoding":"base64","data":"AQAAAA=="}]}"#;
        let err = load_map(write_map(dir.path(), "b64.tmj", body)).unwrap_err();
        assert!(matches!(err, NavError::InvalidFormat { .. }));
    }

    #[test]
    fn missing_tileset_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lonely.tmj");
        fs::write(
            &path,
            r#"{"width":1,"height":1,"tilewidth":16,"tileheight":16,
                "tilesets":[{"firstgid":1,"source":"nowhere.tsx"}],"layers":[]}"#,
        )
        .unwrap();
        assert!(matches!(load_map(&path).unwrap_err(), NavError::Io { .. }));
    }

    #[test]
    fn overlapping_tilesets_are_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let body = r#"{"width":1,"height":1,"tilewidth":16,"tileheight":16,
            "tilesets":[{"firstgid":1,"source":"ground.tsx"},{"firstgid":3,"name":"x","tilecount":2}],
            "layers":[]}"#;
        let err = load_map(write_map(dir.path(), "overlap.tmj", body)).unwrap_err();
        assert!(matches!(err, NavError::InvalidFormat { .. }));
    }

    #[test]
    fn malformed_json_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_map(write_map(dir.path(), "junk.tmj", "{ not json")).unwrap_err();
        assert!(matches!(err, NavError::InvalidFormat { .. }));
    }

    #[test]
    fn missing_map_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(load_map(dir.path().join("nope.tmj")).unwrap_err(), NavError::Io { .. }));
    }
}
