//! Merge decision table.
//!
//! The second column is the archive expander's classification of the entry
//! (`belongs_to_installed_component`); the merger does not re-derive it.
//!
//! | top-level entry | belongs to installed component | action      |
//! |-----------------|--------------------------------|-------------|
//! | directory       | yes                            | `MergeInto` |
//! | file            | yes                            | `Replace`   |
//! | anything        | no                             | `Drop`      |
//!
//! Children of a merged directory are adopted when the installed directory
//! has nothing of the same name and discarded otherwise. Existing files are
//! never overwritten by a directory merge.

/// Kind of an extracted entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

impl EntryKind {
    pub fn from_is_dir(is_dir: bool) -> Self {
        if is_dir {
            Self::Directory
        } else {
            Self::File
        }
    }
}

/// Action for a top-level entry of the working directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeAction {
    /// Walk the children into the installed directory of the same name.
    MergeInto,
    /// Move over the installed packaged unit of the same name.
    Replace,
    /// Not installable; delete it.
    Drop,
}

/// Action for a direct child of a merged directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildAction {
    /// Move into the installed directory.
    Adopt,
    /// An installed entry already has this name; delete the new one.
    Discard,
}

/// Decide what happens to a top-level entry.
pub fn top_level_action(kind: EntryKind, belongs_to_installed_component: bool) -> MergeAction {
    match (kind, belongs_to_installed_component) {
        (EntryKind::Directory, true) => MergeAction::MergeInto,
        (EntryKind::File, true) => MergeAction::Replace,
        (_, false) => MergeAction::Drop,
    }
}

/// Decide what happens to a child of a merged directory.
pub fn child_action(installed_exists: bool) -> ChildAction {
    if installed_exists {
        ChildAction::Discard
    } else {
        ChildAction::Adopt
    }
}
