//! Reference management for logicgit.
//!
//! Branches are named, mutable pointers to the tip commit of a line of
//! history. A freshly created branch may be empty (no commits yet). HEAD
//! either names the current branch or is detached at a commit hash.
//!
//! # Modules
//!
//! - [`error`] — Error types for ref operations
//! - [`types`] — [`Head`] and [`BranchInfo`]
//! - [`traits`] — The [`RefStore`] trait and its derived operations
//! - [`names`] — Branch name validation
//! - [`memory`] — In-memory [`InMemoryRefStore`] for tests
//! - [`fs`] — [`FsRefStore`], the `.logicgit/HEAD` + `refs/heads/*` layout

pub mod error;
pub mod fs;
pub mod memory;
pub mod names;
pub mod traits;
pub mod types;

pub use error::{RefError, Result};
pub use fs::FsRefStore;
pub use memory::InMemoryRefStore;
pub use names::validate_branch_name;
pub use traits::RefStore;
pub use types::{BranchInfo, Head};
