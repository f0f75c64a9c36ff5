//! Filesystem ref store.
//!
//! Layout under the repository directory:
//!
//! ```text
//! HEAD                  "ref: refs/heads/<branch>\n" or "<hex>\n"
//! refs/heads/<branch>   "<hex>\n", or empty for a branch with no commits
//! ```
//!
//! Writes go to a sibling `.lock` file that is renamed into place.

use std::fs;
use std::path::{Path, PathBuf};

use logicgit_types::ContentHash;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{RefError, Result};
use crate::names::validate_branch_name;
use crate::traits::RefStore;
use crate::types::Head;

const SYMBOLIC_PREFIX: &str = "ref: refs/heads/";

/// Ref store backed by plain files, git style.
#[derive(Clone, Debug)]
pub struct FsRefStore {
    root: PathBuf,
}

impl FsRefStore {
    /// Open refs rooted at an existing repository directory.
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create `refs/heads/`, an empty default branch, and a HEAD pointing
    /// at it. Existing HEAD and branches are left untouched.
    pub fn init(root: impl Into<PathBuf>, default_branch: &str) -> Result<Self> {
        validate_branch_name(default_branch)?;
        let store = Self::open(root);
        fs::create_dir_all(store.heads_dir())?;
        if !store.head_path().exists() {
            store.set_head(default_branch)?;
            if !store.branch_exists(default_branch)? {
                store.write_branch(default_branch, None)?;
            }
        }
        Ok(store)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn heads_dir(&self) -> PathBuf {
        self.root.join("refs").join("heads")
    }

    fn head_path(&self) -> PathBuf {
        self.root.join("HEAD")
    }

    fn branch_path(&self, name: &str) -> PathBuf {
        name.split('/')
            .fold(self.heads_dir(), |path, component| path.join(component))
    }

    fn write_atomic(path: &Path, contents: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut lock = path.as_os_str().to_owned();
        lock.push(".lock");
        let lock = PathBuf::from(lock);
        fs::write(&lock, contents)?;
        fs::rename(&lock, path)?;
        Ok(())
    }
}

fn parse_hash(name: &str, text: &str) -> Result<ContentHash> {
    ContentHash::from_hex(text).map_err(|e| RefError::Corrupt {
        name: name.to_string(),
        reason: e.to_string(),
    })
}

impl RefStore for FsRefStore {
    fn branch_exists(&self, name: &str) -> Result<bool> {
        validate_branch_name(name)?;
        Ok(self.branch_path(name).is_file())
    }

    fn read_branch(&self, name: &str) -> Result<Option<ContentHash>> {
        validate_branch_name(name)?;
        let text = match fs::read_to_string(self.branch_path(name)) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RefError::NotFound {
                    name: name.to_string(),
                })
            }
            Err(e) => return Err(e.into()),
        };
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }
        parse_hash(name, text).map(Some)
    }

    fn write_branch(&self, name: &str, tip: Option<ContentHash>) -> Result<()> {
        validate_branch_name(name)?;
        let contents = tip.map(|h| format!("{}\n", h.to_hex())).unwrap_or_default();
        Self::write_atomic(&self.branch_path(name), &contents)
    }

    fn list_branches(&self) -> Result<Vec<(String, Option<ContentHash>)>> {
        let heads = self.heads_dir();
        let mut branches = Vec::new();
        for entry in WalkDir::new(&heads).min_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|e| RefError::Io(e.into()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&heads) else {
                continue;
            };
            let name = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            if name.ends_with(".lock") {
                continue;
            }
            let tip = self.read_branch(&name)?;
            branches.push((name, tip));
        }
        branches.sort_by(|(a, _), (b, _)| a.cmp(b));
        Ok(branches)
    }

    fn head(&self) -> Result<Head> {
        let text = match fs::read_to_string(self.head_path()) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RefError::NotFound {
                    name: "HEAD".into(),
                })
            }
            Err(e) => return Err(e.into()),
        };
        let text = text.trim();
        match text.strip_prefix(SYMBOLIC_PREFIX) {
            Some(branch) => Ok(Head::Symbolic(branch.to_string())),
            None => parse_hash("HEAD", text).map(Head::Detached),
        }
    }

    fn set_head(&self, branch: &str) -> Result<()> {
        validate_branch_name(branch)?;
        Self::write_atomic(&self.head_path(), &format!("{SYMBOLIC_PREFIX}{branch}\n"))?;
        debug!(branch = %branch, "HEAD set");
        Ok(())
    }

    fn set_head_detached(&self, commit: ContentHash) -> Result<()> {
        Self::write_atomic(&self.head_path(), &format!("{}\n", commit.to_hex()))
    }
}
