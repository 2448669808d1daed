use crate::records::Record;
use anyhow::Context;
use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::Path;
use uuid::Uuid;

pub const DB_FILE: &str = "rosterd.sqlite3";

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)
        .with_context(|| format!("failed to create workspace {}", workspace.to_string_lossy()))?;
    let db_path = workspace.join(DB_FILE);
    let conn = Connection::open(&db_path)
        .with_context(|| format!("failed to open {}", db_path.to_string_lossy()))?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS datasets(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            records_json TEXT NOT NULL,
            record_count INTEGER NOT NULL,
            content_hash TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_datasets_updated ON datasets(updated_at)",
        [],
    )?;

    Ok(conn)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetInfo {
    pub id: String,
    pub name: String,
    pub record_count: i64,
    pub content_hash: String,
    pub updated_at: String,
}

/// SHA-256 hex digest of the records' JSON text.
pub fn content_hash(records: &[Record]) -> anyhow::Result<String> {
    let bytes = serde_json::to_vec(records)?;
    let digest = Sha256::digest(&bytes);
    Ok(digest.iter().map(|b| format!("{b:02x}")).collect())
}

/// Inserts or replaces the dataset called `name`. An existing dataset keeps
/// its id.
pub fn dataset_upsert(
    conn: &Connection,
    name: &str,
    records: &[Record],
) -> anyhow::Result<DatasetInfo> {
    let records_json = serde_json::to_string(records)?;
    let hash = content_hash(records)?;
    let updated_at = chrono::Utc::now().to_rfc3339();
    let new_id = Uuid::new_v4().to_string();

    conn.execute(
        "INSERT INTO datasets(id, name, records_json, record_count, content_hash, updated_at)
         VALUES(?, ?, ?, ?, ?, ?)
         ON CONFLICT(name) DO UPDATE SET
           records_json = excluded.records_json,
           record_count = excluded.record_count,
           content_hash = excluded.content_hash,
           updated_at = excluded.updated_at",
        (
            &new_id,
            name,
            &records_json,
            records.len() as i64,
            &hash,
            &updated_at,
        ),
    )
    .with_context(|| format!("failed to store dataset {name}"))?;

    dataset_info(conn, name)?.with_context(|| format!("dataset {name} missing after write"))
}

pub fn dataset_info(conn: &Connection, name: &str) -> anyhow::Result<Option<DatasetInfo>> {
    let info = conn
        .query_row(
            "SELECT id, name, record_count, content_hash, updated_at
             FROM datasets WHERE name = ?",
            [name],
            |r| {
                Ok(DatasetInfo {
                    id: r.get(0)?,
                    name: r.get(1)?,
                    record_count: r.get(2)?,
                    content_hash: r.get(3)?,
                    updated_at: r.get(4)?,
                })
            },
        )
        .optional()?;
    Ok(info)
}

pub fn dataset_list(conn: &Connection) -> anyhow::Result<Vec<DatasetInfo>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, record_count, content_hash, updated_at
         FROM datasets ORDER BY name",
    )?;
    let rows = stmt
        .query_map([], |r| {
            Ok(DatasetInfo {
                id: r.get(0)?,
                name: r.get(1)?,
                record_count: r.get(2)?,
                content_hash: r.get(3)?,
                updated_at: r.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn dataset_load(conn: &Connection, name: &str) -> anyhow::Result<Option<Vec<Record>>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT records_json FROM datasets WHERE name = ?",
            [name],
            |r| r.get(0),
        )
        .optional()?;
    let Some(raw) = raw else {
        return Ok(None);
    };
    let records: Vec<Record> = serde_json::from_str(&raw)
        .with_context(|| format!("dataset {name} holds malformed records"))?;
    Ok(Some(records))
}

pub fn dataset_delete(conn: &Connection, name: &str) -> anyhow::Result<bool> {
    let n = conn.execute("DELETE FROM datasets WHERE name = ?", [name])?;
    Ok(n > 0)
}
