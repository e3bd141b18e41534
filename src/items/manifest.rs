//! Item manifests
//!
//! A manifest is an exported snapshot of the asset registry: the items with
//! their extracted properties plus the type hierarchy used for recursive
//! type filters.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use super::{Item, ItemIndex};
use crate::config::loader::read_document;
use crate::error::ResScanError;

/// Serialized registry snapshot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemManifest {
    /// Child type to parent type
    #[serde(default)]
    pub type_hierarchy: HashMap<String, String>,

    /// Indexed items
    #[serde(default)]
    pub items: Vec<Item>,
}

impl ItemManifest {
    /// Load a manifest from a `.json`, `.toml`, `.yaml` or `.yml` file
    pub fn load_from_file(path: &Path) -> Result<Self, ResScanError> {
        Ok(read_document(path)?)
    }

    /// Turn the manifest into a queryable index
    pub fn into_index(self) -> ItemIndex {
        let mut index = ItemIndex::from_items(self.items);
        index.set_type_hierarchy(self.type_hierarchy);
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::{Indexer, PropertyValue};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_load_json_manifest() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("items.json");
        fs::write(
            &path,
            r#"{
                "type_hierarchy": { "Texture2D": "Texture" },
                "items": [
                    { "package_name": "/Game/UI/T_Icon", "type": "Texture2D",
                      "properties": { "LODGroup": "TEXTUREGROUP_UI", "MaxTextureSize": 512 } },
                    { "package_name": "/Game/Maps/Lobby", "type": "World", "contains_map": true }
                ]
            }"#,
        )
        .unwrap();

        let index = ItemManifest::load_from_file(&path).unwrap().into_index();
        assert_eq!(index.len(), 2);

        let icon = index.get("/Game/UI/T_Icon").unwrap();
        assert_eq!(
            icon.property("MaxTextureSize"),
            Some(&PropertyValue::Float(512.0))
        );
        let textures = index.query_items(&["Texture".to_string()], &["/Game".to_string()], true);
        assert_eq!(textures.len(), 1);
    }

    #[test]
    fn test_load_toml_manifest() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("items.toml");
        fs::write(
            &path,
            r#"
[[items]]
package_name = "/Game/Characters/SK_Hero"
type = "SkeletalMesh"

[items.annotations]
last_editor = "alice"
"#,
        )
        .unwrap();

        let index = ItemManifest::load_from_file(&path).unwrap().into_index();
        let hero = index.get("/Game/Characters/SK_Hero").unwrap();
        assert_eq!(hero.annotations.last_editor.as_deref(), Some("alice"));
    }
}
