/// Serde schema for external Tiled XML tilesets (`.tsx`), read with
/// quick-xml. Attributes are `@`-prefixed field names.

use serde::Deserialize;

#[derive(Deserialize, Debug)]
#[serde(rename = "tileset")]
pub(crate) struct TsxTileset {
    #[serde(rename = "@name", default)]
    pub name: String,
    #[serde(rename = "@tilewidth", default)]
    pub tile_width: u32,
    #[serde(rename = "@tileheight", default)]
    pub tile_height: u32,
    #[serde(rename = "@tilecount", default)]
    pub tile_count: u32,
    #[serde(rename = "tile", default)]
    pub tiles: Vec<TsxTile>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct TsxTile {
    #[serde(rename = "@id")]
    pub id: u32,
    #[serde(default)]
    pub properties: Option<TsxProperties>,
}

#[derive(Deserialize, Debug, Default)]
pub(crate) struct TsxProperties {
    #[serde(rename = "property", default)]
    pub items: Vec<TsxProperty>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct TsxProperty {
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "@value", default)]
    pub value: String,
}

pub(crate) fn parse(text: &str) -> Result<TsxTileset, quick_xml::DeError> {
    quick_xml::de::from_str(text)
}

impl TsxTile {
    pub fn property_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties
            .iter()
            .flat_map(|p| p.items.iter())
            .map(|p| (p.name.as_str(), p.value.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tiles_and_properties() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<tileset version="1.10" name="forest" tilewidth="16" tileheight="16" tilecount="4" columns="2">
 <image source="forest.png" width="32" height="32"/>
 <tile id="1">
  <properties>
   <property name="kind" value="ground"/>
   <property name="solid" type="bool" value="true"/>
  </properties>
 </tile>
 <tile id="3"/>
</tileset>"#;
        let ts = parse(xml).unwrap();
        assert_eq!(ts.name, "forest");
        assert_eq!(ts.tile_count, 4);
        assert_eq!(ts.tiles.len(), 2);
        let pairs: Vec<_> = ts.tiles[0].property_pairs().collect();
        assert_eq!(pairs, vec![("kind", "ground"), ("solid", "true")]);
        assert_eq!(ts.tiles[1].property_pairs().count(), 0);
    }
}
