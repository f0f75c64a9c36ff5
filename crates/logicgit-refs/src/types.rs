use logicgit_types::ContentHash;

/// The state of HEAD: either symbolic (naming a branch) or detached.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Head {
    /// HEAD points to a branch by name.
    Symbolic(String),
    /// HEAD points directly at a commit.
    Detached(ContentHash),
}

impl Head {
    /// The branch HEAD names, if it is symbolic.
    pub fn branch(&self) -> Option<&str> {
        match self {
            Head::Symbolic(name) => Some(name),
            Head::Detached(_) => None,
        }
    }
}

/// Summary information about a branch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BranchInfo {
    pub name: String,
    /// Tip commit, or `None` for a branch with no commits yet.
    pub tip: Option<ContentHash>,
    /// Whether HEAD currently names this branch.
    pub is_current: bool,
}
