//! Items module - Scannable content records and the indexers that supply them
//!
//! The scan engine never discovers content on its own. It asks an
//! [`Indexer`] for items and treats every [`Item`] as an immutable snapshot.

pub mod filesystem;
pub mod identity;
pub mod manifest;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use tracing::debug;

use crate::error::ScanError;
use crate::vcs::FileStatus;

/// A scalar property value extracted from an item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    /// Boolean property
    Bool(bool),
    /// Floating point property, compared numerically
    Float(f64),
    /// Any other property, exported as text
    Text(String),
}

impl PropertyValue {
    /// Whether the value is floating-point typed
    pub fn is_float(&self) -> bool {
        matches!(self, PropertyValue::Float(_))
    }

    /// Numeric view of the value, if it has one
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Float(v) => Some(*v),
            PropertyValue::Text(s) => s.trim().parse().ok(),
            PropertyValue::Bool(_) => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Bool(true) => write!(f, "True"),
            PropertyValue::Bool(false) => write!(f, "False"),
            PropertyValue::Float(v) => write!(f, "{}", v),
            PropertyValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Version-control derived annotations of an item
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VcsAnnotations {
    /// Working-copy status at snapshot time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<FileStatus>,

    /// Last known editor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_editor: Option<String>,
}

/// One scannable content unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Long package name, the item identity (`/Game/Dir/Name`)
    pub package_name: String,

    /// Type tag (asset class)
    #[serde(rename = "type")]
    pub item_type: String,

    /// Named property values
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, PropertyValue>,

    /// Whether the content is a map (stored with the map extension)
    #[serde(default)]
    pub contains_map: bool,

    /// VCS annotations
    #[serde(default)]
    pub annotations: VcsAnnotations,
}

impl Item {
    /// Create an item with no properties
    pub fn new(package_name: impl Into<String>, item_type: impl Into<String>) -> Self {
        Self {
            package_name: package_name.into(),
            item_type: item_type.into(),
            properties: BTreeMap::new(),
            contains_map: false,
            annotations: VcsAnnotations::default(),
        }
    }

    /// Set a property
    pub fn with_property(mut self, name: impl Into<String>, value: PropertyValue) -> Self {
        self.properties.insert(name.into(), value);
        self
    }

    /// Mark the item as a map
    pub fn with_map(mut self, contains_map: bool) -> Self {
        self.contains_map = contains_map;
        self
    }

    /// Set the last known editor
    pub fn with_last_editor(mut self, editor: impl Into<String>) -> Self {
        self.annotations.last_editor = Some(editor.into());
        self
    }

    /// Asset name (last identity segment)
    pub fn asset_name(&self) -> &str {
        identity::asset_name(&self.package_name)
    }

    /// Package path (parent of the identity)
    pub fn package_path(&self) -> &str {
        identity::package_path(&self.package_name)
    }

    /// Object path (`/Game/Dir/Name.Name`)
    pub fn object_path(&self) -> String {
        identity::object_path(&self.package_name)
    }

    /// Look up a property value
    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }
}

/// Supplies the universe of known items
pub trait Indexer: Send + Sync {
    /// Items under any of `scopes` whose type matches `types`
    ///
    /// An empty `types` list accepts every type. An empty `scopes` list
    /// yields nothing.
    fn query_items(&self, types: &[String], scopes: &[String], recursive_types: bool) -> Vec<Item>;

    /// Resolve identities (package names or object paths) to items
    ///
    /// Identities that do not resolve are dropped.
    fn resolve_by_identity(&self, identities: &[String]) -> Vec<Item>;

    /// Whether `item_type` satisfies `wanted`
    fn type_matches(&self, item_type: &str, wanted: &str, recursive_types: bool) -> bool {
        let _ = recursive_types;
        item_type == wanted
    }
}

/// In-memory item index
#[derive(Debug, Clone, Default)]
pub struct ItemIndex {
    items: Vec<Item>,
    by_name: HashMap<String, usize>,
    type_parents: HashMap<String, String>,
}

impl ItemIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from items; later duplicates replace earlier ones
    pub fn from_items(items: impl IntoIterator<Item = Item>) -> Self {
        let mut index = Self::new();
        for item in items {
            index.insert(item);
        }
        index
    }

    /// Insert or replace an item
    pub fn insert(&mut self, item: Item) {
        match self.by_name.get(&item.package_name) {
            Some(&pos) => self.items[pos] = item,
            None => {
                self.by_name
                    .insert(item.package_name.clone(), self.items.len());
                self.items.push(item);
            }
        }
    }

    /// Declare `child` as a subtype of `parent`
    pub fn with_type_parent(mut self, child: impl Into<String>, parent: impl Into<String>) -> Self {
        self.type_parents.insert(child.into(), parent.into());
        self
    }

    /// Replace the whole type hierarchy
    pub fn set_type_hierarchy(&mut self, hierarchy: HashMap<String, String>) {
        self.type_parents = hierarchy;
    }

    /// All indexed items in insertion order
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Number of indexed items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the index is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get an item by package name
    pub fn get(&self, package_name: &str) -> Option<&Item> {
        self.by_name.get(package_name).map(|&pos| &self.items[pos])
    }

    fn is_child_of(&self, item_type: &str, parent: &str) -> bool {
        let mut current = item_type;
        // The hop limit guards against cycles in hand-written hierarchies.
        for _ in 0..=self.type_parents.len() {
            if current == parent {
                return true;
            }
            match self.type_parents.get(current) {
                Some(next) => current = next,
                None => return false,
            }
        }
        false
    }
}

impl Indexer for ItemIndex {
    fn query_items(&self, types: &[String], scopes: &[String], recursive_types: bool) -> Vec<Item> {
        if scopes.is_empty() {
            return Vec::new();
        }
        self.items
            .iter()
            .filter(|item| {
                scopes
                    .iter()
                    .any(|scope| identity::scope_contains(scope, item.package_path()))
            })
            .filter(|item| {
                types.is_empty()
                    || types
                        .iter()
                        .any(|t| self.type_matches(&item.item_type, t, recursive_types))
            })
            .cloned()
            .collect()
    }

    fn resolve_by_identity(&self, identities: &[String]) -> Vec<Item> {
        let mut resolved: Vec<Item> = Vec::new();
        for reference in identities {
            let name = identity::package_name_of(reference);
            match self.get(name) {
                Some(item) => {
                    if !resolved.iter().any(|r| r.package_name == item.package_name) {
                        resolved.push(item.clone());
                    }
                }
                None => {
                    let err = ScanError::ItemUnresolvable {
                        identity: reference.clone(),
                    };
                    debug!(error = %err, "Dropping unresolvable reference");
                }
            }
        }
        resolved
    }

    fn type_matches(&self, item_type: &str, wanted: &str, recursive_types: bool) -> bool {
        if item_type == wanted {
            return true;
        }
        recursive_types && self.is_child_of(item_type, wanted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_index() -> ItemIndex {
        ItemIndex::from_items(vec![
            Item::new("/Game/Characters/SK_Hero", "SkeletalMesh"),
            Item::new("/Game/Characters/T_Hero_D", "Texture2D"),
            Item::new("/Game/Props/SM_Crate", "StaticMesh"),
            Item::new("/Game/Maps/Lobby", "World").with_map(true),
        ])
        .with_type_parent("Texture2D", "Texture")
        .with_type_parent("Texture", "Object")
    }

    #[test]
    fn test_query_by_scope_and_type() {
        let index = sample_index();
        let all = index.query_items(&[], &["/Game/Characters".to_string()], false);
        assert_eq!(all.len(), 2);

        let textures = index.query_items(
            &["Texture".to_string()],
            &["/Game".to_string()],
            true,
        );
        assert_eq!(textures.len(), 1);
        assert_eq!(textures[0].asset_name(), "T_Hero_D");

        let strict = index.query_items(
            &["Texture".to_string()],
            &["/Game".to_string()],
            false,
        );
        assert!(strict.is_empty());
    }

    #[test]
    fn test_query_without_scopes_is_empty() {
        let index = sample_index();
        assert!(index.query_items(&[], &[], true).is_empty());
    }

    #[test]
    fn test_resolve_by_identity_accepts_object_paths() {
        let index = sample_index();
        let resolved = index.resolve_by_identity(&[
            "/Game/Maps/Lobby.Lobby".to_string(),
            "/Game/Maps/Lobby".to_string(),
            "/Game/Missing/Thing".to_string(),
        ]);
        assert_eq!(resolved.len(), 1);
        assert!(resolved[0].contains_map);
    }

    #[test]
    fn test_type_hierarchy_cycle_terminates() {
        let index = ItemIndex::new()
            .with_type_parent("A", "B")
            .with_type_parent("B", "A");
        assert!(!index.type_matches("A", "C", true));
    }

    #[test]
    fn test_property_value_parsing() {
        let value: PropertyValue = serde_json::from_str("1").unwrap();
        assert_eq!(value, PropertyValue::Float(1.0));
        let value: PropertyValue = serde_json::from_str("\"TC_Default\"").unwrap();
        assert_eq!(value.to_string(), "TC_Default");
        let value: PropertyValue = serde_json::from_str("true").unwrap();
        assert_eq!(value.to_string(), "True");
    }
}
