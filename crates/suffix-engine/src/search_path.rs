use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Ordered, duplicate-free list of directories searched for a file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchPath {
    dirs: Vec<PathBuf>,
}

impl SearchPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_dirs<I, P>(dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut path = Self::new();
        for dir in dirs {
            path.add_dir(dir);
        }
        path
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }

    pub fn add_dir(&mut self, dir: impl Into<PathBuf>) {
        let dir = dir.into();
        if !self.dirs.contains(&dir) {
            self.dirs.push(dir);
        }
    }

    /// Appends every directory of `other` not already present, keeping order.
    pub fn add_all(&mut self, other: &SearchPath) {
        for dir in &other.dirs {
            self.add_dir(dir.clone());
        }
    }

    pub fn clear(&mut self) {
        self.dirs.clear();
    }

    /// Renders the path as compiler flags, e.g. `-I/usr/include -Iinclude`.
    pub fn to_flags(&self, flag: &str) -> String {
        self.dirs
            .iter()
            .map(|dir| format!("{flag}{}", dir.display()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Filesystem existence check used by the candidate search.
///
/// Returns the path under which `name` was found, or `None`.
pub trait FileLookup: Send + Sync {
    fn find_file(&self, name: &str, path: &SearchPath) -> Option<String>;
}

impl<F> FileLookup for F
where
    F: Fn(&str, &SearchPath) -> Option<String> + Send + Sync,
{
    fn find_file(&self, name: &str, path: &SearchPath) -> Option<String> {
        self(name, path)
    }
}

/// Looks files up on disk. Relative names and directories are resolved
/// against `dot`, which is also searched before any path directory.
#[derive(Clone, Debug)]
pub struct DiskLookup {
    dot: PathBuf,
}

impl DiskLookup {
    pub fn new(dot: impl Into<PathBuf>) -> Self {
        Self { dot: dot.into() }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.dot.join(path)
        }
    }
}

impl Default for DiskLookup {
    fn default() -> Self {
        Self::new(".")
    }
}

impl FileLookup for DiskLookup {
    fn find_file(&self, name: &str, path: &SearchPath) -> Option<String> {
        let file = Path::new(name);
        if file.is_absolute() {
            return file.exists().then(|| name.to_string());
        }
        if self.resolve(file).exists() {
            return Some(name.to_string());
        }

        path.dirs()
            .iter()
            .find(|dir| self.resolve(dir).join(file).exists())
            .map(|dir| dir.join(file).to_string_lossy().into_owned())
    }
}
