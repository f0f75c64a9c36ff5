//! Versioned schema migrations for the SQLite index.
//!
//! Each version is one SQL batch that moves the schema from N-1 to N.

use chrono::Utc;
use rusqlite::Connection;

use crate::error::{IndexError, IndexResult};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Initialize or migrate the database schema. Idempotent.
pub fn migrate(conn: &mut Connection) -> IndexResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL
        )",
        [],
    )?;

    let current: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;

    if current < CURRENT_VERSION {
        let tx = conn.transaction()?;
        for version in (current + 1)..=CURRENT_VERSION {
            apply_migration(&tx, version)?;
            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![version, Utc::now().to_rfc3339()],
            )?;
        }
        tx.commit()?;
        tracing::debug!(from = current, to = CURRENT_VERSION, "index schema migrated");
    }

    Ok(())
}

fn apply_migration(conn: &Connection, version: u32) -> IndexResult<()> {
    match version {
        1 => apply_v1(conn),
        _ => Err(IndexError::Migration(format!(
            "unknown migration version: {version}"
        ))),
    }
}

/// v1: objects, executions, audit trail, state snapshots.
fn apply_v1(conn: &Connection) -> IndexResult<()> {
    conn.execute_batch(
        r#"
        -- Index half of the dual-write object store
        CREATE TABLE objects (
            hash TEXT PRIMARY KEY,            -- 64 hex chars
            kind TEXT NOT NULL,
            content TEXT NOT NULL,            -- canonical JSON
            size INTEGER NOT NULL,
            created_at TEXT NOT NULL
        );

        -- One row per commit
        CREATE TABLE executions (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            execution_hash TEXT NOT NULL,
            commit_hash TEXT NOT NULL UNIQUE,
            parent_hash TEXT,                 -- NULL for a root commit
            rules_source TEXT NOT NULL,
            rules_hash TEXT NOT NULL,
            input_hash TEXT NOT NULL,
            output_hash TEXT NOT NULL,
            applied_rules TEXT NOT NULL,      -- JSON array of rule names
            duration_us INTEGER NOT NULL,
            branch TEXT NOT NULL,
            message TEXT NOT NULL,
            author TEXT NOT NULL,
            timestamp TEXT NOT NULL           -- RFC 3339
        );

        -- One row per fired rule, keyed by execution hash
        CREATE TABLE audit_trail (
            execution_hash TEXT NOT NULL,
            position INTEGER NOT NULL,
            rule_name TEXT NOT NULL,
            condition_text TEXT NOT NULL,
            changes TEXT NOT NULL,
            state_before TEXT NOT NULL,
            state_after TEXT NOT NULL,
            timestamp TEXT NOT NULL,
            PRIMARY KEY (execution_hash, position)
        );

        CREATE TABLE state_snapshots (
            execution_hash TEXT NOT NULL,
            snapshot_kind TEXT NOT NULL,
            state TEXT NOT NULL,
            state_hash TEXT NOT NULL,
            timestamp TEXT NOT NULL,
            PRIMARY KEY (execution_hash, snapshot_kind)
        );

        CREATE INDEX idx_executions_hash ON executions(execution_hash);
        CREATE INDEX idx_executions_branch ON executions(branch);
        "#,
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migration_creates_tables() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        for table in ["objects", "executions", "audit_trail", "state_snapshots", "schema_migrations"] {
            assert!(tables.contains(&table.to_string()), "missing {table}");
        }
    }

    #[test]
    fn migration_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();
        migrate(&mut conn).unwrap();

        let version: u32 = conn
            .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, CURRENT_VERSION);
    }
}
