//! Path placeholders
//!
//! Filter and repository fields may start with tokens such as
//! `[PROJECT_CONTENT_DIR]`. They are substituted from a table built for the
//! project being scanned before any path reaches the VCS collaborator.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

pub const ENGINE_DIR_MARK: &str = "[ENGINE_DIR]";
pub const ENGINE_CONTENT_DIR_MARK: &str = "[ENGINE_CONTENT_DIR]";
pub const PROJECT_DIR_MARK: &str = "[PROJECT_DIR]";
pub const PROJECT_CONTENT_DIR_MARK: &str = "[PROJECT_CONTENT_DIR]";
pub const PROJECT_SAVED_DIR_MARK: &str = "[PROJECT_SAVED_DIR]";
pub const PROJECT_CONFIG_DIR_MARK: &str = "[PROJECT_CONFIG_DIR]";

lazy_static! {
    static ref LEADING_MARK: Regex = Regex::new(r"^\[([A-Za-z_]+)\]").unwrap();
}

/// Substitution table for path placeholders
#[derive(Debug, Clone)]
pub struct PathMarks {
    base_dir: PathBuf,
    marks: BTreeMap<String, PathBuf>,
}

impl PathMarks {
    /// Build the table for a project directory and optional engine directory
    pub fn for_project(project_dir: impl Into<PathBuf>, engine_dir: Option<PathBuf>) -> Self {
        let project_dir = absolutize(&project_dir.into());
        let mut marks = BTreeMap::new();

        marks.insert(PROJECT_DIR_MARK.to_string(), project_dir.clone());
        marks.insert(
            PROJECT_CONTENT_DIR_MARK.to_string(),
            project_dir.join("Content"),
        );
        marks.insert(
            PROJECT_SAVED_DIR_MARK.to_string(),
            project_dir.join("Saved"),
        );
        marks.insert(
            PROJECT_CONFIG_DIR_MARK.to_string(),
            project_dir.join("Config"),
        );
        if let Some(engine_dir) = engine_dir {
            let engine_dir = absolutize(&engine_dir);
            marks.insert(
                ENGINE_CONTENT_DIR_MARK.to_string(),
                engine_dir.join("Content"),
            );
            marks.insert(ENGINE_DIR_MARK.to_string(), engine_dir);
        }

        Self {
            base_dir: project_dir,
            marks,
        }
    }

    /// Directory relative paths are resolved against
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Directory a mark stands for, if known
    pub fn get(&self, mark: &str) -> Option<&Path> {
        self.marks.get(mark).map(PathBuf::as_path)
    }

    /// Resolve a leading placeholder and return a normalized absolute path
    ///
    /// Unknown placeholders are left in place.
    pub fn resolve(&self, src: &str) -> PathBuf {
        let src = src.replace('\\', "/");
        let resolved = match LEADING_MARK.find(&src) {
            Some(found) => match self.lookup_ignore_case(found.as_str()) {
                Some(dir) => {
                    let rest = src[found.end()..].trim_start_matches('/');
                    if rest.is_empty() {
                        dir.to_path_buf()
                    } else {
                        dir.join(rest)
                    }
                }
                None => PathBuf::from(&src),
            },
            None => PathBuf::from(&src),
        };

        let full = if resolved.is_absolute() {
            resolved
        } else {
            self.base_dir.join(resolved)
        };
        normalize(&full)
    }

    fn lookup_ignore_case(&self, mark: &str) -> Option<&Path> {
        self.marks
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(mark))
            .map(|(_, dir)| dir.as_path())
    }
}

impl Default for PathMarks {
    fn default() -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::for_project(cwd, None)
    }
}

fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize(path)
    } else {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        normalize(&cwd.join(path))
    }
}

/// Collapse `.` and `..` components without touching the file system
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
