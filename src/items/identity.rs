//! Item identity helpers
//!
//! Items are identified by a long package name such as
//! `/Game/Characters/SK_Hero`. The object path appends the asset name
//! (`/Game/Characters/SK_Hero.SK_Hero`) and the package path is the parent
//! directory (`/Game/Characters`).

use std::path::{Path, PathBuf};

/// Extension of regular content files
pub const ASSET_EXTENSION: &str = ".uasset";

/// Extension of map content files
pub const MAP_EXTENSION: &str = ".umap";

/// Default mount point of the project content directory
pub const DEFAULT_MOUNT: &str = "/Game";

const INVALID_PACKAGE_CHARS: &[char] = &[
    '\\', ':', '*', '?', '"', '<', '>', '|', '\'', ' ', ',', '.', '&', '!', '~', '\n', '\r',
    '\t', '@', '#',
];

/// Whether a file looks like a content file (asset or map)
pub fn is_content_file(path: &str) -> bool {
    path.ends_with(ASSET_EXTENSION) || path.ends_with(MAP_EXTENSION)
}

/// Last segment of a package name (`SK_Hero` for `/Game/Characters/SK_Hero`)
pub fn asset_name(package_name: &str) -> &str {
    match package_name.rfind('/') {
        Some(idx) => &package_name[idx + 1..],
        None => package_name,
    }
}

/// Parent directory of a package name (`/Game/Characters`)
pub fn package_path(package_name: &str) -> &str {
    match package_name.rfind('/') {
        Some(idx) => &package_name[..idx],
        None => "",
    }
}

/// Object path of a package name (`/Game/Characters/SK_Hero.SK_Hero`)
pub fn object_path(package_name: &str) -> String {
    format!("{}.{}", package_name, asset_name(package_name))
}

/// Strip the `.AssetName` suffix of an object path, if any
pub fn package_name_of(reference: &str) -> &str {
    let last_segment_start = reference.rfind('/').map(|idx| idx + 1).unwrap_or(0);
    match reference[last_segment_start..].find('.') {
        Some(dot) => &reference[..last_segment_start + dot],
        None => reference,
    }
}

/// Validate a long package name
///
/// A valid name starts with `/`, has at least a mount and an asset segment,
/// contains no empty segment and none of the characters the content
/// pipeline rejects.
pub fn is_valid_package_name(name: &str) -> bool {
    if !name.starts_with('/') || name.ends_with('/') {
        return false;
    }
    if name.contains(INVALID_PACKAGE_CHARS) {
        return false;
    }
    let segments: Vec<&str> = name[1..].split('/').collect();
    segments.len() >= 2 && segments.iter().all(|s| !s.is_empty())
}

/// Whether `package_path` lies inside `scope` (prefix match)
pub fn scope_contains(scope: &str, package_path: &str) -> bool {
    let scope = scope.trim_end_matches('/');
    !scope.is_empty() && package_path.starts_with(scope)
}

/// Maps between content files on disk and item identities
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentMount {
    mount: String,
    content_dir: PathBuf,
}

impl ContentMount {
    /// Create a mapping for `mount` (e.g. `/Game`) backed by `content_dir`
    pub fn new(mount: impl Into<String>, content_dir: impl Into<PathBuf>) -> Self {
        let mount = mount.into();
        Self {
            mount: mount.trim_end_matches('/').to_string(),
            content_dir: content_dir.into(),
        }
    }

    /// Mount point without trailing slash
    pub fn mount(&self) -> &str {
        &self.mount
    }

    /// Directory on disk holding the mounted content
    pub fn content_dir(&self) -> &Path {
        &self.content_dir
    }

    /// Convert a path relative to the content directory into an identity
    ///
    /// Returns `None` for non-content files and invalid identities.
    pub fn relative_file_to_identity(&self, relative: &str) -> Option<String> {
        let relative = relative.replace('\\', "/");
        let relative = relative.trim_start_matches('/');
        if !is_content_file(relative) {
            return None;
        }
        let stem = match relative.rfind('.') {
            Some(idx) => &relative[..idx],
            None => relative,
        };
        let identity = format!("{}/{}", self.mount, stem);
        is_valid_package_name(&identity).then_some(identity)
    }

    /// Convert an absolute (or repository-joined) file into an identity
    pub fn file_to_identity(&self, file: &Path) -> Option<String> {
        let relative = file.strip_prefix(&self.content_dir).ok()?;
        let relative = relative.to_str()?;
        self.relative_file_to_identity(relative)
    }

    /// Convert an identity back to its content file
    ///
    /// Returns `None` when the identity is not under this mount.
    pub fn identity_to_file(&self, identity: &str, contains_map: bool) -> Option<PathBuf> {
        let rest = identity.strip_prefix(&self.mount)?.strip_prefix('/')?;
        if rest.is_empty() {
            return None;
        }
        let extension = if contains_map {
            MAP_EXTENSION
        } else {
            ASSET_EXTENSION
        };
        let mut file = self.content_dir.clone();
        for segment in rest.split('/') {
            file.push(segment);
        }
        let file_name = format!("{}{}", asset_name(identity), extension);
        file.set_file_name(file_name);
        Some(file)
    }
}

impl Default for ContentMount {
    fn default() -> Self {
        Self::new(DEFAULT_MOUNT, PathBuf::from("Content"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_parts() {
        let name = "/Game/Characters/SK_Hero";
        assert_eq!(asset_name(name), "SK_Hero");
        assert_eq!(package_path(name), "/Game/Characters");
        assert_eq!(object_path(name), "/Game/Characters/SK_Hero.SK_Hero");
        assert_eq!(package_name_of("/Game/Characters/SK_Hero.SK_Hero"), name);
        assert_eq!(package_name_of(name), name);
    }

    #[test]
    fn test_package_name_validation() {
        assert!(is_valid_package_name("/Game/Maps/Lobby"));
        assert!(!is_valid_package_name("Game/Maps/Lobby"));
        assert!(!is_valid_package_name("/Game"));
        assert!(!is_valid_package_name("/Game//Lobby"));
        assert!(!is_valid_package_name("/Game/My Map"));
        assert!(!is_valid_package_name("/Game/Maps/Lobby.Lobby"));
    }

    #[test]
    fn test_scope_contains() {
        assert!(scope_contains("/Game/Characters", "/Game/Characters/Heroes"));
        assert!(scope_contains("/Game/Characters/", "/Game/Characters"));
        assert!(!scope_contains("/Game/Props", "/Game/Characters"));
        assert!(!scope_contains("", "/Game/Characters"));
    }

    #[test]
    fn test_relative_file_to_identity() {
        let mount = ContentMount::new("/Game", "/project/Content");
        assert_eq!(
            mount.relative_file_to_identity("Characters/SK_Hero.uasset"),
            Some("/Game/Characters/SK_Hero".to_string())
        );
        assert_eq!(
            mount.relative_file_to_identity("Maps/Lobby.umap"),
            Some("/Game/Maps/Lobby".to_string())
        );
        assert_eq!(mount.relative_file_to_identity("Config/Default.ini"), None);
        assert_eq!(mount.relative_file_to_identity("Bad Name.uasset"), None);
    }

    #[test]
    fn test_identity_to_file_round_trip() {
        let mount = ContentMount::new("/Game/", "/project/Content");
        let file = mount
            .identity_to_file("/Game/Maps/Lobby", true)
            .unwrap();
        assert_eq!(file, PathBuf::from("/project/Content/Maps/Lobby.umap"));
        assert_eq!(
            mount.file_to_identity(&file),
            Some("/Game/Maps/Lobby".to_string())
        );
        assert_eq!(mount.identity_to_file("/Engine/Basic", false), None);
    }
}
