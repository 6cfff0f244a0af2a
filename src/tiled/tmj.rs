/// Serde schema for Tiled JSON maps (`.tmj`) and JSON tilesets.
/// Only the fields navigation needs are modelled; everything else in the
/// file is ignored.

use serde::Deserialize;
use serde_json::Value;

#[derive(Deserialize, Debug)]
pub(crate) struct TmjMap {
    pub width: usize,
    pub height: usize,
    #[serde(rename = "tilewidth")]
    pub tile_width: u32,
    #[serde(rename = "tileheight")]
    pub tile_height: u32,
    #[serde(default)]
    pub layers: Vec<TmjLayer>,
    #[serde(default)]
    pub tilesets: Vec<TmjTilesetRef>,
    #[serde(default)]
    pub properties: Vec<TmjProperty>,
}

/// Tileset entry in a map: either a reference to an external file or an
/// embedded tileset (JSON fields inline).
#[derive(Deserialize, Debug)]
pub(crate) struct TmjTilesetRef {
    #[serde(rename = "firstgid")]
    pub first_gid: u32,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(flatten)]
    pub embedded: TmjTileset,
}

/// JSON tileset body, embedded in a map or stored as `.tsj`.
#[derive(Deserialize, Debug, Default)]
pub(crate) struct TmjTileset {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "tilewidth")]
    pub tile_width: u32,
    #[serde(default, rename = "tileheight")]
    pub tile_height: u32,
    #[serde(default, rename = "tilecount")]
    pub tile_count: u32,
    #[serde(default)]
    pub tiles: Vec<TmjTile>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct TmjTile {
    pub id: u32,
    #[serde(default)]
    pub properties: Vec<TmjProperty>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct TmjLayer {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub encoding: Option<String>,
    #[serde(default)]
    pub compression: Option<String>,
    #[serde(default)]
    pub data: Option<LayerData>,
    #[serde(default)]
    pub objects: Vec<TmjObject>,
    #[serde(default)]
    pub properties: Vec<TmjProperty>,
}

/// Tile layer payload. CSV-style maps store an array; base64 maps store
/// a string, which is rejected downstream.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub(crate) enum LayerData {
    Gids(Vec<u32>),
    Encoded(String),
}

#[derive(Deserialize, Debug)]
pub(crate) struct TmjObject {
    #[serde(default)]
    pub name: String,
    /// `type` before Tiled 1.9, `class` after.
    #[serde(default, rename = "type", alias = "class")]
    pub kind: String,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    #[serde(default)]
    pub properties: Vec<TmjProperty>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct TmjProperty {
    pub name: String,
    #[serde(default)]
    pub value: Value,
}

impl TmjProperty {
    /// Value rendered as text, the way TSX stores every property.
    pub fn text(&self) -> Option<String> {
        match &self.value {
            Value::String(s) => Some(s.clone()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// First property named `name`, as text.
pub(crate) fn property_text(props: &[TmjProperty], name: &str) -> Option<String> {
    props.iter().find(|p| p.name == name).and_then(TmjProperty::text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layer_data_accepts_array_or_string() {
        let l: TmjLayer = serde_json::from_str(r#"{"name":"render","data":[1,2,3]}"#).unwrap();
        assert!(matches!(l.data, Some(LayerData::Gids(ref v)) if v.len() == 3));
        let l: TmjLayer =
            serde_json::from_str(r#"{"name":"render","encoding":"base64","data":"AAAA"}"#).unwrap();
        assert!(matches!(l.data, Some(LayerData::Encoded(_))));
    }

    #[test]
    fn object_class_aliases_type() {
        let o: TmjObject = serde_json::from_str(r#"{"name":"left","class":"portal"}"#).unwrap();
        assert_eq!(o.kind, "portal");
    }

    #[test]
    fn property_text_renders_scalars() {
        let props: Vec<TmjProperty> = serde_json::from_str(
            r#"[{"name":"a","value":true},{"name":"b","value":3},{"name":"c","value":"x"}]"#,
        )
        .unwrap();
        assert_eq!(property_text(&props, "a").as_deref(), Some("true"));
        assert_eq!(property_text(&props, "b").as_deref(), Some("3"));
        assert_eq!(property_text(&props, "c").as_deref(), Some("x"));
        assert_eq!(property_text(&props, "d"), None);
    }
}
