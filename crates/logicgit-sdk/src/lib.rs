//! High-level SDK for logicgit.
//!
//! [`Repository`] is the entry point: it owns the object store, index, and
//! ref store for one repository and exposes the execute/commit write path
//! alongside log, show, diff, branch, and export reads.
//!
//! ```no_run
//! use std::path::Path;
//! use logicgit_sdk::Repository;
//!
//! let mut repo = Repository::init(".")?;
//! let outcomes = repo.execute_files(Path::new("loan.yaml"), Path::new("applicants.csv"), None)?;
//! for entry in repo.log(None, None)? {
//!     println!("{} {}", entry.commit_hash.short_hex(), entry.commit.message);
//! }
//! # Ok::<(), logicgit_sdk::RepoError>(())
//! ```

pub mod config;
pub mod error;
pub mod export;
pub mod history;
pub mod loader;
pub mod repository;

pub use config::RepoConfig;
pub use error::{CommitStage, RepoError, RepoResult};
pub use export::{ExportDocument, EXPORT_VERSION};
pub use history::{CommitOutcome, ExecutionDetail, LogEntry};
pub use repository::{DiskRepository, MemoryRepository, Repository, META_DIR};

pub use logicgit_diff::{DiffReport, StateChange, StateDiff};
pub use logicgit_engine::{Execution, Rule, RuleSet};
pub use logicgit_refs::BranchInfo;
pub use logicgit_types::{Commit, ContentHash, Record};
