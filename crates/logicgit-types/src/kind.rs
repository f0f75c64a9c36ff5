use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// The kind of a hashed payload.
///
/// The kind is part of the hash header, so identical bytes stored under two
/// different kinds produce two different hashes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    /// Opaque payload with no further structure.
    Blob,
    /// A commit wrapping one execution.
    Commit,
    /// A rule set (hashed for `rulesHash`).
    Rules,
    /// A record state: an execution input or a final state.
    State,
    /// The content-only identity of an execution.
    Execution,
}

impl ObjectKind {
    /// The lowercase tag used in hash headers and persisted rows.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blob => "blob",
            Self::Commit => "commit",
            Self::Rules => "rules",
            Self::State => "state",
            Self::Execution => "execution",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectKind {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "blob" => Ok(Self::Blob),
            "commit" => Ok(Self::Commit),
            "rules" => Ok(Self::Rules),
            "state" => Ok(Self::State),
            "execution" => Ok(Self::Execution),
            other => Err(TypeError::UnknownKind(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_and_parse_agree() {
        for kind in [
            ObjectKind::Blob,
            ObjectKind::Commit,
            ObjectKind::Rules,
            ObjectKind::State,
            ObjectKind::Execution,
        ] {
            assert_eq!(kind.to_string().parse::<ObjectKind>().unwrap(), kind);
        }
    }

    #[test]
    fn unknown_kind_is_rejected() {
        assert_eq!(
            "tree".parse::<ObjectKind>(),
            Err(TypeError::UnknownKind("tree".into()))
        );
    }
}
