//! SQLite implementation of the index.
//!
//! Hashes are stored as lowercase hex text, timestamps as RFC 3339 text,
//! and record states as canonical JSON text. The connection sits behind
//! an `Arc<Mutex<_>>` so the same database can serve as both the
//! object-store target and the execution index.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use logicgit_store::{ObjectTarget, StoreResult, StoredObject};
use logicgit_types::{ContentHash, ObjectKind};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::{IndexError, IndexResult};
use crate::migration;
use crate::record::{AuditRecord, ExecutionBundle, ExecutionRecord, SnapshotKind, SnapshotRecord};
use crate::traits::{validate_prefix, ExecutionIndex};

const EXECUTION_COLUMNS: &str = "seq, execution_hash, commit_hash, parent_hash, rules_source, \
     rules_hash, input_hash, output_hash, applied_rules, duration_us, branch, message, author, timestamp";

/// SQLite-backed index. Cloning shares the underlying connection.
#[derive(Clone)]
pub struct SqliteIndex {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteIndex {
    /// Open (or create) the database at `path` and run migrations.
    pub fn open(path: impl AsRef<Path>) -> IndexResult<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory database.
    pub fn open_memory() -> IndexResult<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> IndexResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| IndexError::Poisoned(e.to_string()))
    }

    fn read_object(&self, hash: &ContentHash) -> IndexResult<Option<StoredObject>> {
        let conn = self.lock()?;
        let object = conn
            .query_row(
                "SELECT kind, content, size FROM objects WHERE hash = ?1",
                [hash.to_hex()],
                |row| {
                    let kind: String = row.get(0)?;
                    let kind: ObjectKind = kind.parse().map_err(|e| conversion(0, e))?;
                    let size: i64 = row.get(2)?;
                    Ok(StoredObject {
                        hash: *hash,
                        kind,
                        content: row.get(1)?,
                        size: size as u64,
                    })
                },
            )
            .optional()?;
        Ok(object)
    }

    fn write_object(&self, object: &StoredObject) -> IndexResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR IGNORE INTO objects (hash, kind, content, size, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                object.hash.to_hex(),
                object.kind.as_str(),
                object.content,
                object.size as i64,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn contains_object(&self, hash: &ContentHash) -> IndexResult<bool> {
        let conn = self.lock()?;
        let exists = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM objects WHERE hash = ?1)",
            [hash.to_hex()],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    fn remove_object(&self, hash: &ContentHash) -> IndexResult<bool> {
        let conn = self.lock()?;
        let removed = conn.execute("DELETE FROM objects WHERE hash = ?1", [hash.to_hex()])?;
        Ok(removed > 0)
    }
}

impl std::fmt::Debug for SqliteIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteIndex").finish_non_exhaustive()
    }
}

impl ExecutionIndex for SqliteIndex {
    fn record(&self, bundle: &ExecutionBundle) -> IndexResult<()> {
        let exec = &bundle.execution;
        let applied = to_json(&exec.applied_rules)?;
        let audit_rows = bundle
            .audit
            .iter()
            .map(|entry| {
                Ok((
                    entry,
                    to_json(&entry.changes)?,
                    to_json(&entry.state_before)?,
                    to_json(&entry.state_after)?,
                ))
            })
            .collect::<IndexResult<Vec<_>>>()?;
        let snapshot_state = to_json(&bundle.snapshot.state)?;

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT OR IGNORE INTO executions (execution_hash, commit_hash, parent_hash, rules_source,
                rules_hash, input_hash, output_hash, applied_rules, duration_us, branch, message,
                author, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                exec.execution_hash.to_hex(),
                exec.commit_hash.to_hex(),
                exec.parent_hash.map(|h| h.to_hex()),
                exec.rules_source,
                exec.rules_hash.to_hex(),
                exec.input_hash.to_hex(),
                exec.output_hash.to_hex(),
                applied,
                exec.duration_us as i64,
                exec.branch,
                exec.message,
                exec.author,
                exec.timestamp.to_rfc3339(),
            ],
        )?;

        // Audit rows and snapshots belong to the execution, not the commit.
        for (entry, changes, before, after) in &audit_rows {
            tx.execute(
                "INSERT OR IGNORE INTO audit_trail (execution_hash, position, rule_name,
                    condition_text, changes, state_before, state_after, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    entry.execution_hash.to_hex(),
                    entry.position,
                    entry.rule_name,
                    entry.condition_text,
                    changes,
                    before,
                    after,
                    entry.timestamp.to_rfc3339(),
                ],
            )?;
        }

        let snapshot = &bundle.snapshot;
        tx.execute(
            "INSERT OR IGNORE INTO state_snapshots (execution_hash, snapshot_kind, state, state_hash, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                snapshot.execution_hash.to_hex(),
                snapshot.kind.as_str(),
                snapshot_state,
                snapshot.state_hash.to_hex(),
                snapshot.timestamp.to_rfc3339(),
            ],
        )?;

        tx.commit()?;
        debug!(
            commit = %exec.commit_hash.short_hex(),
            execution = %exec.execution_hash.short_hex(),
            audit_entries = bundle.audit.len(),
            "indexed execution"
        );
        Ok(())
    }

    fn execution_for_commit(&self, commit: &ContentHash) -> IndexResult<Option<ExecutionRecord>> {
        let conn = self.lock()?;
        let record = conn
            .query_row(
                &format!("SELECT {EXECUTION_COLUMNS} FROM executions WHERE commit_hash = ?1"),
                [commit.to_hex()],
                row_to_execution,
            )
            .optional()?;
        Ok(record)
    }

    fn find_by_prefix(&self, prefix: &str) -> IndexResult<Vec<ExecutionRecord>> {
        let pattern = format!("{}%", validate_prefix(prefix)?);
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {EXECUTION_COLUMNS} FROM executions
             WHERE execution_hash LIKE ?1 OR commit_hash LIKE ?1
             ORDER BY seq DESC"
        ))?;
        let records = stmt
            .query_map([pattern], row_to_execution)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    fn audit_trail(&self, execution: &ContentHash) -> IndexResult<Vec<AuditRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT execution_hash, position, rule_name, condition_text, changes,
                    state_before, state_after, timestamp
             FROM audit_trail WHERE execution_hash = ?1 ORDER BY position",
        )?;
        let entries = stmt
            .query_map([execution.to_hex()], |row| {
                Ok(AuditRecord {
                    execution_hash: hash_at(row, 0)?,
                    position: row.get(1)?,
                    rule_name: row.get(2)?,
                    condition_text: row.get(3)?,
                    changes: json_at(row, 4)?,
                    state_before: json_at(row, 5)?,
                    state_after: json_at(row, 6)?,
                    timestamp: time_at(row, 7)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    fn snapshot(&self, execution: &ContentHash, kind: SnapshotKind) -> IndexResult<Option<SnapshotRecord>> {
        let conn = self.lock()?;
        let snapshot = conn
            .query_row(
                "SELECT execution_hash, state, state_hash, timestamp
                 FROM state_snapshots WHERE execution_hash = ?1 AND snapshot_kind = ?2",
                params![execution.to_hex(), kind.as_str()],
                |row| {
                    Ok(SnapshotRecord {
                        execution_hash: hash_at(row, 0)?,
                        kind,
                        state: json_at(row, 1)?,
                        state_hash: hash_at(row, 2)?,
                        timestamp: time_at(row, 3)?,
                    })
                },
            )
            .optional()?;
        Ok(snapshot)
    }

    fn execution_count(&self) -> IndexResult<u64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM executions", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

impl ObjectTarget for SqliteIndex {
    fn target_name(&self) -> &'static str {
        "index"
    }

    fn contains(&self, hash: &ContentHash) -> StoreResult<bool> {
        Ok(self.contains_object(hash)?)
    }

    fn write(&self, object: &StoredObject) -> StoreResult<()> {
        Ok(self.write_object(object)?)
    }

    fn read(&self, hash: &ContentHash) -> StoreResult<Option<StoredObject>> {
        Ok(self.read_object(hash)?)
    }

    fn remove(&self, hash: &ContentHash) -> StoreResult<bool> {
        Ok(self.remove_object(hash)?)
    }
}

fn row_to_execution(row: &Row<'_>) -> rusqlite::Result<ExecutionRecord> {
    let seq: i64 = row.get(0)?;
    let parent: Option<String> = row.get(3)?;
    let parent_hash = parent
        .map(|text| text.parse::<ContentHash>().map_err(|e| conversion(3, e)))
        .transpose()?;
    let duration: i64 = row.get(9)?;

    Ok(ExecutionRecord {
        seq: seq as u64,
        execution_hash: hash_at(row, 1)?,
        commit_hash: hash_at(row, 2)?,
        parent_hash,
        rules_source: row.get(4)?,
        rules_hash: hash_at(row, 5)?,
        input_hash: hash_at(row, 6)?,
        output_hash: hash_at(row, 7)?,
        applied_rules: json_at(row, 8)?,
        duration_us: duration as u64,
        branch: row.get(10)?,
        message: row.get(11)?,
        author: row.get(12)?,
        timestamp: time_at(row, 13)?,
    })
}

fn conversion<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn hash_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<ContentHash> {
    let text: String = row.get(idx)?;
    text.parse().map_err(|e| conversion(idx, e))
}

fn json_at<T: DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let text: String = row.get(idx)?;
    serde_json::from_str(&text).map_err(|e| conversion(idx, e))
}

fn time_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| conversion(idx, e))
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> IndexResult<String> {
    serde_json::to_string(value).map_err(|e| IndexError::Serialization(e.to_string()))
}
