//! Filesystem blob area: loose objects under `objects/<2 hex>/<62 hex>`.
//!
//! On-disk format, one file per object:
//! ```text
//! <kind> <length>\0<canonical content>
//! ```

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use logicgit_crypto::ContentHasher;
use logicgit_types::{ContentHash, ObjectKind};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::object::StoredObject;
use crate::traits::ObjectTarget;

/// Loose-object directory, the filesystem half of the dual-write store.
#[derive(Debug, Clone)]
pub struct FsBlobArea {
    root: PathBuf,
}

impl FsBlobArea {
    /// Open (or create) the blob area rooted at `root`.
    pub fn open(root: impl AsRef<Path>) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the loose file for `hash`.
    pub fn object_path(&self, hash: &ContentHash) -> PathBuf {
        let hex = hash.to_hex();
        self.root.join(&hex[..2]).join(&hex[2..])
    }

    fn encode(object: &StoredObject) -> Vec<u8> {
        let mut buf = ContentHasher::header(object.kind, object.content.len()).into_bytes();
        buf.extend_from_slice(object.content.as_bytes());
        buf
    }

    fn decode(hash: ContentHash, raw: &[u8]) -> StoreResult<StoredObject> {
        let corrupt = |reason: &str| StoreError::CorruptObject {
            hash,
            reason: reason.to_string(),
        };
        let nul = raw
            .iter()
            .position(|b| *b == 0)
            .ok_or_else(|| corrupt("missing header terminator"))?;
        let header = std::str::from_utf8(&raw[..nul]).map_err(|_| corrupt("header is not UTF-8"))?;
        let (kind, len) = header
            .split_once(' ')
            .ok_or_else(|| corrupt("malformed header"))?;
        let kind: ObjectKind = kind.parse().map_err(|_| corrupt("unknown object kind"))?;
        let len: usize = len.parse().map_err(|_| corrupt("malformed length"))?;
        let body = &raw[nul + 1..];
        if body.len() != len {
            return Err(corrupt("length does not match header"));
        }
        let content = String::from_utf8(body.to_vec()).map_err(|_| corrupt("content is not UTF-8"))?;
        let object = StoredObject::new(kind, content);
        object.verify().map_err(|_| corrupt("content does not match its hash"))?;
        if object.hash != hash {
            return Err(corrupt("object stored under the wrong path"));
        }
        Ok(object)
    }
}

impl ObjectTarget for FsBlobArea {
    fn target_name(&self) -> &'static str {
        "blobs"
    }

    fn contains(&self, hash: &ContentHash) -> StoreResult<bool> {
        Ok(self.object_path(hash).is_file())
    }

    fn write(&self, object: &StoredObject) -> StoreResult<()> {
        let path = self.object_path(&object.hash);
        if path.is_file() {
            return Ok(());
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        // Write to a sibling temp file and rename so readers never see a torn object.
        let tmp = path.with_extension("tmp");
        let written = fs::File::create(&tmp).and_then(|mut file| {
            file.write_all(&Self::encode(object))?;
            file.sync_all()?;
            drop(file);
            fs::rename(&tmp, &path)
        });
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        debug!(hash = %object.hash.short_hex(), kind = %object.kind, size = object.size, "wrote loose object");
        Ok(())
    }

    fn read(&self, hash: &ContentHash) -> StoreResult<Option<StoredObject>> {
        match fs::read(self.object_path(hash)) {
            Ok(raw) => Self::decode(*hash, &raw).map(Some),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn remove(&self, hash: &ContentHash) -> StoreResult<bool> {
        match fs::remove_file(self.object_path(hash)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
