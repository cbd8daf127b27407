//! Filesystem access used by the merger.
//!
//! [`InstallFs`] is the seam between the merge policy and the disk so the
//! policy can be exercised against [`MemoryFs`] in unit tests.

use std::fs;
use std::io;
use std::path::Path;

/// A directory listing entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntryInfo {
    /// File name within the listed directory.
    pub name: String,
    /// Entry is a directory.
    pub is_dir: bool,
}

/// Operations the merger performs on the filesystem.
pub trait InstallFs {
    /// List a directory, sorted by name.
    fn list_dir(&self, path: &Path) -> io::Result<Vec<DirEntryInfo>>;

    /// Check whether anything exists at `path`.
    fn exists(&self, path: &Path) -> bool;

    /// Check whether `path` is a directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// Move a file or directory; fails with `AlreadyExists` if `to` exists.
    fn move_entry(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Move a file over `to`, replacing whatever is there.
    fn replace_file(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Delete a file or a whole directory tree.
    fn remove(&self, path: &Path) -> io::Result<()>;
}

/// The real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdFs;

impl InstallFs for StdFs {
    fn list_dir(&self, path: &Path) -> io::Result<Vec<DirEntryInfo>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            entries.push(DirEntryInfo {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_dir: entry.file_type()?.is_dir(),
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn exists(&self, path: &Path) -> bool {
        fs::symlink_metadata(path).is_ok()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn move_entry(&self, from: &Path, to: &Path) -> io::Result<()> {
        if self.exists(to) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} already exists", to.display()),
            ));
        }

        match fs::rename(from, to) {
            Ok(()) => Ok(()),
            // rename cannot cross filesystems; fall back to copy + delete
            Err(_) if from.is_dir() => {
                copy_dir_all(from, to)?;
                fs::remove_dir_all(from)
            }
            Err(_) => {
                fs::copy(from, to)?;
                fs::remove_file(from)
            }
        }
    }

    fn replace_file(&self, from: &Path, to: &Path) -> io::Result<()> {
        if self.exists(to) {
            self.remove(to)?;
        }
        self.move_entry(from, to)
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        if fs::symlink_metadata(path)?.is_dir() {
            fs::remove_dir_all(path)
        } else {
            fs::remove_file(path)
        }
    }
}

fn copy_dir_all(from: &Path, to: &Path) -> io::Result<()> {
    fs::create_dir_all(to)?;
    for entry in fs::read_dir(from)? {
        let entry = entry?;
        let target = to.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_all(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), target)?;
        }
    }
    Ok(())
}

#[cfg(test)]
pub(crate) use memory::MemoryFs;

#[cfg(test)]
mod memory {
    use super::{DirEntryInfo, InstallFs};
    use std::cell::RefCell;
    use std::collections::{BTreeMap, HashSet};
    use std::io;
    use std::path::{Path, PathBuf};

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Node {
        Dir,
        File(String),
    }

    /// In-memory tree for merge policy tests.
    #[derive(Debug, Default)]
    pub(crate) struct MemoryFs {
        nodes: RefCell<BTreeMap<PathBuf, Node>>,
        failing: RefCell<HashSet<PathBuf>>,
    }

    impl MemoryFs {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        /// Add a directory and its ancestors.
        pub(crate) fn dir(self, path: &str) -> Self {
            self.insert_dir(Path::new(path));
            self
        }

        /// Add a file, creating its ancestors.
        pub(crate) fn file(self, path: &str, content: &str) -> Self {
            let path = PathBuf::from(path);
            if let Some(parent) = path.parent() {
                self.insert_dir(parent);
            }
            self.nodes
                .borrow_mut()
                .insert(path, Node::File(content.to_string()));
            self
        }

        /// Make every mutation touching `path` fail.
        pub(crate) fn fail_on(self, path: &str) -> Self {
            self.failing.borrow_mut().insert(PathBuf::from(path));
            self
        }

        pub(crate) fn read(&self, path: &str) -> Option<String> {
            match self.nodes.borrow().get(Path::new(path)) {
                Some(Node::File(content)) => Some(content.clone()),
                _ => None,
            }
        }

        pub(crate) fn contains(&self, path: &str) -> bool {
            self.nodes.borrow().contains_key(Path::new(path))
        }

        fn insert_dir(&self, path: &Path) {
            let mut nodes = self.nodes.borrow_mut();
            for ancestor in path.ancestors() {
                if ancestor.as_os_str().is_empty() {
                    continue;
                }
                nodes.entry(ancestor.to_path_buf()).or_insert(Node::Dir);
            }
        }

        fn check(&self, path: &Path) -> io::Result<()> {
            if self.failing.borrow().contains(path) {
                return Err(io::Error::new(
                    io::ErrorKind::PermissionDenied,
                    format!("{} is locked", path.display()),
                ));
            }
            Ok(())
        }

        fn subtree(&self, root: &Path) -> Vec<PathBuf> {
            self.nodes
                .borrow()
                .keys()
                .filter(|p| p.starts_with(root))
                .cloned()
                .collect()
        }
    }

    impl InstallFs for MemoryFs {
        fn list_dir(&self, path: &Path) -> io::Result<Vec<DirEntryInfo>> {
            if !self.is_dir(path) {
                return Err(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("{} is not a directory", path.display()),
                ));
            }

            let nodes = self.nodes.borrow();
            Ok(nodes
                .iter()
                .filter(|(p, _)| p.parent() == Some(path))
                .map(|(p, node)| DirEntryInfo {
                    name: p
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default(),
                    is_dir: *node == Node::Dir,
                })
                .collect())
        }

        fn exists(&self, path: &Path) -> bool {
            self.nodes.borrow().contains_key(path)
        }

        fn is_dir(&self, path: &Path) -> bool {
            matches!(self.nodes.borrow().get(path), Some(Node::Dir))
        }

        fn move_entry(&self, from: &Path, to: &Path) -> io::Result<()> {
            self.check(from)?;
            self.check(to)?;
            if self.exists(to) {
                return Err(io::Error::new(io::ErrorKind::AlreadyExists, "target exists"));
            }
            if !self.exists(from) {
                return Err(io::Error::new(io::ErrorKind::NotFound, "source missing"));
            }
            if !to.parent().is_some_and(|p| self.is_dir(p)) {
                return Err(io::Error::new(io::ErrorKind::NotFound, "no parent directory"));
            }

            let moved = self.subtree(from);
            let mut nodes = self.nodes.borrow_mut();
            for old in moved {
                if let Some(node) = nodes.remove(&old) {
                    let suffix = old.strip_prefix(from).unwrap_or(Path::new(""));
                    nodes.insert(to.join(suffix), node);
                }
            }
            Ok(())
        }

        fn replace_file(&self, from: &Path, to: &Path) -> io::Result<()> {
            if self.exists(to) {
                self.remove(to)?;
            }
            self.move_entry(from, to)
        }

        fn remove(&self, path: &Path) -> io::Result<()> {
            self.check(path)?;
            if !self.exists(path) {
                return Err(io::Error::new(io::ErrorKind::NotFound, "missing"));
            }
            let doomed = self.subtree(path);
            let mut nodes = self.nodes.borrow_mut();
            for p in doomed {
                nodes.remove(&p);
            }
            Ok(())
        }
    }
}
