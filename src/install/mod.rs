//! Merging extracted archives into the installation root.
//!
//! The merge is conservative: it only adds new files to component
//! directories that are already installed, or replaces a same-named
//! top-level packaged unit. It never creates a new top-level component.
//! Which top-level entries qualify is taken from the [`Expansion`]'s
//! classification. Everything else in the working directory is deleted,
//! and finally the working directory itself.
//!
//! Per-entry failures are logged and counted; only an unreadable working
//! directory fails the merge.

pub mod fs;
pub mod plan;

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::archive::Expansion;
use crate::error::{Result, UpdaterError};

pub use fs::{DirEntryInfo, InstallFs, StdFs};
pub use plan::{child_action, top_level_action, ChildAction, EntryKind, MergeAction};

/// What a merge did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// New entries moved into installed component directories.
    pub adopted: Vec<PathBuf>,
    /// Packaged units written over their installed counterparts.
    pub replaced: Vec<PathBuf>,
    /// New entries thrown away because an installed entry had the same name.
    pub discarded: Vec<PathBuf>,
    /// Top-level entries deleted as not installable.
    pub dropped: Vec<PathBuf>,
    /// Number of per-entry operations that failed.
    pub failures: usize,
}

/// Reconciles a working directory against the installation root.
pub struct InstallMerger<F = StdFs> {
    fs: F,
}

impl InstallMerger<StdFs> {
    /// Create a merger on the real filesystem.
    pub fn new() -> Self {
        Self { fs: StdFs }
    }
}

impl Default for InstallMerger<StdFs> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: InstallFs> InstallMerger<F> {
    /// Create a merger on a custom filesystem.
    pub fn with_fs(fs: F) -> Self {
        Self { fs }
    }

    /// Merge every top-level entry of the expansion's working directory into
    /// `installation_root`.
    ///
    /// # Errors
    ///
    /// Returns `MergeFailed` if the working directory cannot be listed.
    pub fn merge(&self, expansion: &Expansion, installation_root: &Path) -> Result<MergeReport> {
        let working_dir = expansion.working_dir.as_path();
        let entries = self
            .fs
            .list_dir(working_dir)
            .map_err(|source| UpdaterError::MergeFailed {
                path: working_dir.to_path_buf(),
                source,
            })?;

        let mut report = MergeReport::default();

        for entry in entries {
            let source = working_dir.join(&entry.name);
            let installed = installation_root.join(&entry.name);

            let action = top_level_action(
                EntryKind::from_is_dir(entry.is_dir),
                expansion.top_level_belongs(&entry.name),
            );
            debug!("{}: {:?}", entry.name, action);

            match action {
                MergeAction::MergeInto => self.merge_directory(&source, &installed, &mut report),
                MergeAction::Replace => match self.fs.replace_file(&source, &installed) {
                    Ok(()) => report.replaced.push(installed),
                    Err(e) => self.record_failure("create", &installed, e, &mut report),
                },
                MergeAction::Drop => match self.fs.remove(&source) {
                    Ok(()) => report.dropped.push(source),
                    Err(e) => self.record_failure("delete", &source, e, &mut report),
                },
            }
        }

        if let Err(e) = self.fs.remove(working_dir) {
            self.record_failure("delete", working_dir, e, &mut report);
        }

        Ok(report)
    }

    fn merge_directory(&self, source: &Path, installed: &Path, report: &mut MergeReport) {
        let children = match self.fs.list_dir(source) {
            Ok(children) => children,
            Err(e) => {
                warn!("The updater could not access files at: {} ({})", source.display(), e);
                report.failures += 1;
                Vec::new()
            }
        };

        for child in children {
            let from = source.join(&child.name);
            let to = installed.join(&child.name);

            match child_action(self.fs.exists(&to)) {
                ChildAction::Adopt => match self.fs.move_entry(&from, &to) {
                    Ok(()) => report.adopted.push(to),
                    Err(e) => self.record_failure("create", &to, e, report),
                },
                ChildAction::Discard => match self.fs.remove(&from) {
                    Ok(()) => report.discarded.push(from),
                    Err(e) => self.record_failure("delete", &from, e, report),
                },
            }
        }

        if let Err(e) = self.fs.remove(source) {
            self.record_failure("delete", source, e, report);
        }
    }

    fn record_failure(
        &self,
        verb: &str,
        path: &Path,
        error: std::io::Error,
        report: &mut MergeReport,
    ) {
        warn!(
            "The updater could not {} file at: {} ({})",
            verb,
            path.display(),
            error
        );
        report.failures += 1;
    }
}
