//! Content directory indexing
//!
//! Builds items straight from the files of a content directory when no
//! registry manifest is available. Only identity, type and the map flag can
//! be known this way; properties stay empty.

use ignore::WalkBuilder;
use tracing::debug;

use super::identity::{ContentMount, MAP_EXTENSION};
use super::{Item, ItemIndex};

/// Type assigned to map files
pub const MAP_TYPE: &str = "World";

/// Type assigned to every other content file
pub const ASSET_TYPE: &str = "Object";

/// Walk the mount's content directory and index every content file
pub fn scan_content_dir(mount: &ContentMount) -> ItemIndex {
    let root = mount.content_dir();
    let mut index = ItemIndex::new();

    let walker = WalkBuilder::new(root)
        .hidden(false)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true)
        .ignore(true)
        .parents(true)
        .build();

    for entry in walker.flatten() {
        let path = entry.path();

        if path == root || !path.is_file() {
            continue;
        }

        // Skip .git directory
        if path.components().any(|c| c.as_os_str() == ".git") {
            continue;
        }

        let Some(identity) = mount.file_to_identity(path) else {
            continue;
        };

        let contains_map = path
            .to_str()
            .map(|p| p.ends_with(MAP_EXTENSION))
            .unwrap_or(false);
        let item_type = if contains_map { MAP_TYPE } else { ASSET_TYPE };

        index.insert(Item::new(identity, item_type).with_map(contains_map));
    }

    debug!(
        content_dir = %root.display(),
        items = index.len(),
        "Indexed content directory"
    );

    index
}
