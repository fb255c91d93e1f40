//! Locating a folder by name.
//!
//! [`FolderLocator`] walks a directory tree looking for the first directory
//! whose child listing contains a folder with the requested name. The walk is
//! pre-order: a directory's own children are checked before any of them is
//! descended into, and siblings are visited in name order so repeated runs
//! agree.
//!
//! Directories that cannot be listed (permissions, races with deletion) are
//! skipped instead of aborting the search. Symlinked directories can match
//! but are never descended into.
//!
//! # Example
//!
//! ```no_run
//! use gifmaker::{FolderLocator, SearchRoot};
//!
//! let locator = FolderLocator::new(SearchRoot::Home.resolve()?);
//! match locator.locate("Screen Recordings") {
//!     Some(folder) => println!("found {}", folder.display()),
//!     None => println!("not found"),
//! }
//! # Ok::<(), gifmaker::GifMakerError>(())
//! ```

use std::{
    ffi::OsStr,
    fs,
    io::{Error as IoError, ErrorKind},
    path::{Path, PathBuf},
};

use crate::error::GifMakerError;

/// Where a folder search starts.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SearchRoot {
    /// The filesystem root (`/` on Unix).
    #[default]
    FilesystemRoot,
    /// The current user's home directory.
    Home,
    /// An explicit directory.
    Path(PathBuf),
}

impl SearchRoot {
    /// Resolve to a concrete directory.
    ///
    /// # Errors
    ///
    /// Returns an I/O error of kind [`ErrorKind::NotFound`] when the home
    /// directory cannot be determined.
    pub fn resolve(&self) -> Result<PathBuf, GifMakerError> {
        match self {
            SearchRoot::FilesystemRoot => Ok(filesystem_root()),
            SearchRoot::Home => dirs::home_dir().ok_or_else(|| {
                GifMakerError::IoError(IoError::new(
                    ErrorKind::NotFound,
                    "could not determine the home directory",
                ))
            }),
            SearchRoot::Path(path) => Ok(path.clone()),
        }
    }
}

#[cfg(windows)]
fn filesystem_root() -> PathBuf {
    PathBuf::from("C:\\")
}

#[cfg(not(windows))]
fn filesystem_root() -> PathBuf {
    PathBuf::from("/")
}

/// Depth-first folder search rooted at a fixed directory.
#[derive(Debug, Clone)]
pub struct FolderLocator {
    root: PathBuf,
}

impl FolderLocator {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    /// The directory the search starts from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Find the first directory named `name` (exact, case-sensitive) anywhere
    /// below the root. The root itself never matches.
    pub fn locate(&self, name: &str) -> Option<PathBuf> {
        log::debug!("Searching for '{name}' under {}", self.root.display());
        let target = OsStr::new(name);
        let mut pending = vec![self.root.clone()];
        let mut skipped = 0_usize;
        let mut found = None;

        while let Some(directory) = pending.pop() {
            let children = match list_children(&directory) {
                Ok(children) => children,
                Err(error) => {
                    log::debug!("Skipping {}: {error}", directory.display());
                    skipped += 1;
                    continue;
                }
            };

            if let Some(child) = children
                .iter()
                .find(|child| child.name == target && child.path.is_dir())
            {
                found = Some(child.path.clone());
                break;
            }

            // Reversed so the first child in name order is popped first.
            pending.extend(
                children
                    .into_iter()
                    .rev()
                    .filter(|child| child.is_real_directory)
                    .map(|child| child.path),
            );
        }

        if skipped > 0 {
            log::warn!(
                "Skipped {skipped} unreadable director{} while searching {}",
                if skipped == 1 { "y" } else { "ies" },
                self.root.display(),
            );
        }
        found
    }

    /// Like [`locate`](FolderLocator::locate), but reports a miss as
    /// [`GifMakerError::FolderNotFound`].
    pub fn require(&self, name: &str) -> Result<PathBuf, GifMakerError> {
        self.locate(name)
            .ok_or_else(|| GifMakerError::FolderNotFound {
                name: name.to_string(),
                root: self.root.clone(),
            })
    }
}

/// Search `root` for a directory named `name`.
pub fn find_folder<P: AsRef<Path>>(root: P, name: &str) -> Option<PathBuf> {
    FolderLocator::new(root.as_ref()).locate(name)
}

struct Child {
    name: std::ffi::OsString,
    path: PathBuf,
    /// A directory that is not a symlink, safe to descend into.
    is_real_directory: bool,
}

fn list_children(directory: &Path) -> Result<Vec<Child>, IoError> {
    let mut children = Vec::new();
    for entry in fs::read_dir(directory)? {
        let Ok(entry) = entry else {
            continue;
        };
        let is_real_directory = entry
            .file_type()
            .map(|file_type| file_type.is_dir())
            .unwrap_or(false);
        children.push(Child {
            name: entry.file_name(),
            path: entry.path(),
            is_real_directory,
        });
    }
    children.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(children)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_root_resolves_to_itself() {
        let root = SearchRoot::Path(PathBuf::from("/tmp/somewhere"));
        assert_eq!(root.resolve().unwrap(), PathBuf::from("/tmp/somewhere"));
    }

    #[test]
    fn default_root_is_filesystem_root() {
        assert_eq!(SearchRoot::default(), SearchRoot::FilesystemRoot);
        assert!(SearchRoot::default().resolve().unwrap().has_root());
    }

    #[test]
    fn require_reports_missing_folder() {
        let directory = tempfile::tempdir().unwrap();
        let error = FolderLocator::new(directory.path())
            .require("missing")
            .unwrap_err();
        assert!(error.to_string().contains("'missing'"));
    }
}
