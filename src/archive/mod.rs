//! Archive extraction.
//!
//! A downloaded `.zip` is unpacked into a working directory next to it (the
//! archive path with its extension stripped). Every extracted entry is
//! classified against the installation root so the merger knows which
//! subtrees belong to components that are already installed.
//!
//! The expander only reads the installation root; it never writes to it.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};
use zip::ZipArchive;

use crate::download::copy_chunks;
use crate::error::{Result, UpdaterError};

/// Extension marking a downloaded artifact as an archive.
pub const ARCHIVE_EXTENSION: &str = ".zip";

/// Extension of single-file installable components.
pub const PACKAGED_UNIT_EXTENSION: &str = ".jar";

/// Check whether a file name denotes an archive.
pub fn is_archive(name: &str) -> bool {
    name.ends_with(ARCHIVE_EXTENSION)
}

/// Check whether a file name denotes a packaged unit.
pub fn is_packaged_unit(name: &str) -> bool {
    name.ends_with(PACKAGED_UNIT_EXTENSION)
}

/// One entry written during extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedEntry {
    /// Path relative to the working directory.
    pub relative_path: PathBuf,
    /// Directory entry rather than file content.
    pub is_directory: bool,
    /// The entry sits under (or is) a component already in the installation root.
    pub belongs_to_installed_component: bool,
}

/// Result of unpacking one archive.
#[derive(Debug, Clone)]
pub struct Expansion {
    /// Directory the archive was unpacked into.
    pub working_dir: PathBuf,
    /// Entries in archive order.
    pub entries: Vec<ExtractedEntry>,
}

impl Expansion {
    /// Whether the top-level entry `name` was classified as belonging to an
    /// installed component.
    pub fn top_level_belongs(&self, name: &str) -> bool {
        self.entries.iter().any(|e| {
            e.belongs_to_installed_component
                && top_level_name(&e.relative_path).as_deref() == Some(name)
        })
    }

    /// Top-level entries that replace an installed packaged unit.
    pub fn packaged_units(&self) -> impl Iterator<Item = &ExtractedEntry> {
        self.entries.iter().filter(|e| {
            !e.is_directory
                && e.belongs_to_installed_component
                && e.relative_path.components().count() == 1
        })
    }
}

/// First component of a relative entry path.
fn top_level_name(relative_path: &Path) -> Option<String> {
    match relative_path.components().next() {
        Some(Component::Normal(name)) => Some(name.to_string_lossy().into_owned()),
        _ => None,
    }
}

/// Working directory used for an archive: its path without the extension.
pub fn working_dir_for(archive_path: &Path) -> PathBuf {
    archive_path.with_extension("")
}

/// Unpacks downloaded archives.
pub struct ArchiveExpander {
    installation_root: PathBuf,
}

impl ArchiveExpander {
    /// Create an expander that classifies against `installation_root`.
    pub fn new(installation_root: impl Into<PathBuf>) -> Self {
        Self {
            installation_root: installation_root.into(),
        }
    }

    /// Extract every entry of `archive_path` into its working directory.
    ///
    /// Anything already in the working directory is removed first. The
    /// archive is deleted after a complete extraction; a failed delete is
    /// only logged. A failed extraction removes the partial working
    /// directory and keeps the archive.
    ///
    /// # Errors
    ///
    /// Returns `ExtractFailed` for unreadable or malformed archives, entries
    /// that would land outside the working directory, and write failures.
    pub fn expand(&self, archive_path: &Path) -> Result<Expansion> {
        let working_dir = working_dir_for(archive_path);
        let entries = match self.extract_all(archive_path, &working_dir) {
            Ok(entries) => entries,
            Err(e) => {
                if working_dir.exists() {
                    if let Err(clean) = fs::remove_dir_all(&working_dir) {
                        warn!(
                            "The updater could not delete file at: {} ({})",
                            working_dir.display(),
                            clean
                        );
                    }
                }
                return Err(e);
            }
        };

        if let Err(e) = fs::remove_file(archive_path) {
            warn!(
                "The updater could not delete file at: {} ({})",
                archive_path.display(),
                e
            );
        }

        debug!(
            "Extracted {} entries into {}",
            entries.len(),
            working_dir.display()
        );

        Ok(Expansion {
            working_dir,
            entries,
        })
    }

    fn extract_all(
        &self,
        archive_path: &Path,
        working_dir: &Path,
    ) -> Result<Vec<ExtractedEntry>> {
        let fail = |message: String| UpdaterError::ExtractFailed {
            archive: archive_path.to_path_buf(),
            message,
        };

        let file = File::open(archive_path).map_err(|e| fail(e.to_string()))?;
        let mut archive =
            ZipArchive::new(BufReader::new(file)).map_err(|e| fail(e.to_string()))?;

        // only this archive's entries may reach the merger
        if working_dir.exists() {
            fs::remove_dir_all(working_dir).map_err(|e| {
                fail(format!("clearing stale {}: {}", working_dir.display(), e))
            })?;
        }
        fs::create_dir_all(working_dir)
            .map_err(|e| fail(format!("creating {}: {}", working_dir.display(), e)))?;

        let mut entries = Vec::with_capacity(archive.len());

        for index in 0..archive.len() {
            let mut entry = archive.by_index(index).map_err(|e| fail(e.to_string()))?;

            let relative = entry.enclosed_name().ok_or_else(|| {
                fail(format!(
                    "entry '{}' escapes the working directory",
                    entry.name()
                ))
            })?;
            let target = working_dir.join(&relative);

            if entry.is_dir() {
                fs::create_dir_all(&target)
                    .map_err(|e| fail(format!("creating {}: {}", target.display(), e)))?;
                entries.push(self.classify(relative, true));
                continue;
            }

            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)
                    .map_err(|e| fail(format!("creating {}: {}", parent.display(), e)))?;
            }

            let out = File::create(&target)
                .map_err(|e| fail(format!("writing {}: {}", target.display(), e)))?;
            let mut writer = BufWriter::new(out);
            copy_chunks(&mut entry, &mut writer, None, |_, _| {})
                .and_then(|_| writer.flush())
                .map_err(|e| fail(format!("writing {}: {}", target.display(), e)))?;

            entries.push(self.classify(relative, false));
        }

        Ok(entries)
    }

    /// Decide whether an entry belongs to an installed component.
    ///
    /// Nested entries inherit the answer of their top-level directory. A
    /// top-level file belongs only if it is a packaged unit whose name
    /// already exists in the installation root.
    pub fn classify(&self, relative_path: PathBuf, is_directory: bool) -> ExtractedEntry {
        let top = top_level_name(&relative_path);
        let is_top_level = relative_path.components().count() == 1;

        let belongs = match top {
            Some(name) if is_top_level && !is_directory => {
                is_packaged_unit(&name) && self.installation_root.join(&name).is_file()
            }
            Some(name) => self.installation_root.join(&name).is_dir(),
            None => false,
        };

        ExtractedEntry {
            relative_path,
            is_directory,
            belongs_to_installed_component: belongs,
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::fs::File;
    use std::io::Write;
    use std::path::Path;
    use zip::write::SimpleFileOptions;
    use zip::{CompressionMethod, ZipWriter};

    /// Write a zip at `path`; `None` content makes a directory entry.
    pub(crate) fn write_zip(path: &Path, entries: &[(&str, Option<&str>)]) {
        let file = File::create(path).unwrap();
        let mut zip = ZipWriter::new(file);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

        for (name, content) in entries {
            match content {
                Some(body) => {
                    zip.start_file(*name, options).unwrap();
                    zip.write_all(body.as_bytes()).unwrap();
                }
                None => zip.add_directory(*name, options).unwrap(),
            }
        }

        zip.finish().unwrap();
    }
}
