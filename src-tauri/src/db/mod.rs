mod schema;

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{Duration, SubsecRound, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::utils::hash::fingerprint;
use crate::utils::text::{format_timestamp, parse_timestamp};

pub const DEFAULT_CAPACITY: usize = 100;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("sqlite error: {0}")]
    Sql(#[from] rusqlite::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("database lock poisoned")]
    LockPoisoned,
    #[error("history database is corrupted: {0}")]
    Corrupted(String),
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Clip {
    pub id: i64,
    pub content: String,
    pub fingerprint: String,
    pub created_at: String,
    pub pinned: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Empty or whitespace-only content.
    Skipped,
    Inserted { clip: Clip, evicted: Vec<Clip> },
    /// Content was already stored; only its timestamp moved.
    Touched(Clip),
}

impl RecordOutcome {
    pub fn clip(&self) -> Option<&Clip> {
        match self {
            RecordOutcome::Skipped => None,
            RecordOutcome::Inserted { clip, .. } | RecordOutcome::Touched(clip) => Some(clip),
        }
    }
}

/// Deduplicated, size-bounded clipboard history backed by SQLite.
///
/// All access goes through a single connection guarded by a mutex, so
/// mutations never interleave and readers always see committed state.
pub struct Database {
    conn: Mutex<Connection>,
    capacity: usize,
}

const CLIP_COLUMNS: &str = "id, content, fingerprint, created_at, pinned";

impl Database {
    fn conn(&self) -> Result<MutexGuard<'_, Connection>, DbError> {
        self.conn.lock().map_err(|_| DbError::LockPoisoned)
    }

    pub fn new(path: &Path, capacity: usize) -> Result<Self, DbError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut conn = Connection::open(path)?;
        Self::initialize(&mut conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            capacity: capacity.max(1),
        })
    }

    #[cfg(test)]
    pub fn new_in_memory(capacity: usize) -> Result<Self, DbError> {
        let mut conn = Connection::open_in_memory()?;
        Self::initialize(&mut conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            capacity: capacity.max(1),
        })
    }

    fn initialize(conn: &mut Connection) -> Result<(), DbError> {
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
            ",
        )?;

        ensure_clips_schema(conn)?;
        conn.execute_batch(schema::CREATE_INDEX_CREATED_AT)?;
        conn.execute_batch(schema::CREATE_INDEX_PINNED)?;

        verify_integrity(conn)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Stores `content`, or refreshes the timestamp of the entry that already
    /// holds it. Inserts are followed by capacity eviction in the same
    /// transaction; touches never evict.
    pub fn record(&self, content: &str) -> Result<RecordOutcome, DbError> {
        if content.trim().is_empty() {
            return Ok(RecordOutcome::Skipped);
        }

        let fingerprint = fingerprint(content);
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let stamp = next_stamp(&tx)?;

        let existing: Option<i64> = tx
            .query_row(
                "SELECT id FROM clips WHERE fingerprint = ?1",
                params![fingerprint],
                |row| row.get(0),
            )
            .optional()?;

        let outcome = match existing {
            Some(id) => {
                tx.execute(
                    "UPDATE clips SET created_at = ?1 WHERE id = ?2",
                    params![stamp, id],
                )?;
                RecordOutcome::Touched(get_clip_internal(&tx, id)?)
            }
            None => {
                tx.execute(
                    "INSERT INTO clips (content, fingerprint, created_at, pinned) VALUES (?1, ?2, ?3, 0)",
                    params![content, fingerprint, stamp],
                )?;
                let clip = get_clip_internal(&tx, tx.last_insert_rowid())?;
                let evicted = evict_overflow(&tx, self.capacity)?;
                RecordOutcome::Inserted { clip, evicted }
            }
        };

        tx.commit()?;
        Ok(outcome)
    }

    pub fn list(&self, limit: usize, pinned_first: bool) -> Result<Vec<Clip>, DbError> {
        let order = if pinned_first {
            "pinned DESC, created_at DESC, id DESC"
        } else {
            "created_at DESC, id DESC"
        };
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {CLIP_COLUMNS} FROM clips ORDER BY {order} LIMIT ?1"
        ))?;
        let rows = stmt.query_map(params![to_sql_count(limit)], clip_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }

    pub fn count(&self) -> Result<usize, DbError> {
        let conn = self.conn()?;
        let total: i64 = conn.query_row("SELECT COUNT(*) FROM clips", [], |row| row.get(0))?;
        Ok(total as usize)
    }

    pub fn pinned_count(&self) -> Result<usize, DbError> {
        let conn = self.conn()?;
        let total: i64 =
            conn.query_row("SELECT COUNT(*) FROM clips WHERE pinned = 1", [], |row| {
                row.get(0)
            })?;
        Ok(total as usize)
    }

    pub fn get_clip(&self, id: i64) -> Result<Option<Clip>, DbError> {
        let conn = self.conn()?;
        get_clip_internal(&conn, id)
            .optional()
            .map_err(DbError::from)
    }

    /// Flips the pin flag. `None` means no entry has this id.
    pub fn toggle_pin(&self, id: i64) -> Result<Option<bool>, DbError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let current: Option<i64> = tx
            .query_row("SELECT pinned FROM clips WHERE id = ?1", params![id], |row| {
                row.get(0)
            })
            .optional()?;
        let Some(current) = current else {
            return Ok(None);
        };

        let pinned = current == 0;
        tx.execute(
            "UPDATE clips SET pinned = ?1 WHERE id = ?2",
            params![if pinned { 1 } else { 0 }, id],
        )?;
        tx.commit()?;
        Ok(Some(pinned))
    }

    pub fn delete(&self, id: i64) -> Result<Option<Clip>, DbError> {
        let conn = self.conn()?;
        let clip = get_clip_internal(&conn, id).optional()?;
        if clip.is_none() {
            return Ok(None);
        }
        conn.execute("DELETE FROM clips WHERE id = ?1", params![id])?;
        Ok(clip)
    }

    pub fn clear_unpinned(&self) -> Result<usize, DbError> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM clips WHERE pinned = 0", [])?;
        Ok(deleted)
    }
}

fn clip_from_row(row: &Row<'_>) -> Result<Clip, rusqlite::Error> {
    Ok(Clip {
        id: row.get(0)?,
        content: row.get(1)?,
        fingerprint: row.get(2)?,
        created_at: row.get(3)?,
        pinned: row.get::<_, i64>(4)? == 1,
    })
}

fn get_clip_internal(conn: &Connection, id: i64) -> Result<Clip, rusqlite::Error> {
    conn.query_row(
        &format!("SELECT {CLIP_COLUMNS} FROM clips WHERE id = ?1"),
        params![id],
        clip_from_row,
    )
}

fn to_sql_count(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Strictly increasing stamp: never at or before the newest stored one, so
/// entries touched within the same clock tick still order deterministically.
fn next_stamp(conn: &Connection) -> Result<String, DbError> {
    let now = Utc::now().trunc_subsecs(6);
    let newest: Option<String> =
        conn.query_row("SELECT MAX(created_at) FROM clips", [], |row| row.get(0))?;

    let stamp = match newest.as_deref().and_then(parse_timestamp) {
        Some(newest) if newest >= now => newest + Duration::microseconds(1),
        _ => now,
    };
    Ok(format_timestamp(stamp))
}

/// Deletes the oldest unpinned entries until the table fits `capacity`, or
/// until only pinned entries remain.
fn evict_overflow(conn: &Connection, capacity: usize) -> Result<Vec<Clip>, DbError> {
    let total: i64 = conn.query_row("SELECT COUNT(*) FROM clips", [], |row| row.get(0))?;
    let overflow = total - to_sql_count(capacity);
    if overflow <= 0 {
        return Ok(Vec::new());
    }

    let victims = {
        let mut stmt = conn.prepare(&format!(
            "
            SELECT {CLIP_COLUMNS}
            FROM clips
            WHERE pinned = 0
            ORDER BY created_at ASC, id ASC
            LIMIT ?1
            "
        ))?;
        let rows = stmt.query_map(params![overflow], clip_from_row)?;
        rows.collect::<Result<Vec<_>, _>>()?
    };

    for clip in &victims {
        conn.execute("DELETE FROM clips WHERE id = ?1", params![clip.id])?;
    }
    Ok(victims)
}

fn table_columns(conn: &Connection, table: &str) -> Result<HashSet<String>, DbError> {
    let mut columns = HashSet::new();
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(1))?;
    for row in rows {
        columns.insert(row?);
    }
    Ok(columns)
}

fn ensure_clips_schema(conn: &mut Connection) -> Result<(), DbError> {
    let columns = table_columns(conn, "clips")?;
    if columns.is_empty() {
        conn.execute_batch(schema::CREATE_CLIPS_TABLE)?;
        return Ok(());
    }

    if columns.contains("fingerprint") {
        return Ok(());
    }

    if columns.contains("content_hash") {
        return migrate_legacy_clips(conn);
    }

    Err(DbError::Corrupted(
        "clips table has neither fingerprint nor content_hash column".to_string(),
    ))
}

/// Older ClipFlow databases keyed rows by an MD5 `content_hash` and stored
/// naive local timestamps. Rebuild the table with SHA-256 fingerprints and
/// UTC stamps, keeping ids and pin flags.
fn migrate_legacy_clips(conn: &mut Connection) -> Result<(), DbError> {
    let tx = conn.transaction()?;

    let legacy = {
        let mut stmt = tx.prepare("SELECT id, content, created_at, pinned FROM clips ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, Option<i64>>(3)?,
            ))
        })?;
        rows.collect::<Result<Vec<_>, _>>()?
    };

    tx.execute_batch("DROP TABLE IF EXISTS clips_migrated;")?;
    tx.execute_batch(schema::CREATE_CLIPS_TABLE_MIGRATION)?;

    let fallback_stamp = format_timestamp(Utc::now().trunc_subsecs(6));
    let mut seen = HashSet::new();
    let mut migrated = 0usize;
    for (id, content, created_at, pinned) in legacy {
        if content.trim().is_empty() {
            warn!("dropping empty legacy clip {id} during migration");
            continue;
        }

        let fingerprint = fingerprint(&content);
        if !seen.insert(fingerprint.clone()) {
            return Err(DbError::Corrupted(format!(
                "legacy clip {id} duplicates the content of an earlier clip"
            )));
        }

        let stamp = created_at
            .as_deref()
            .and_then(parse_timestamp)
            .map(format_timestamp)
            .unwrap_or_else(|| fallback_stamp.clone());

        tx.execute(
            "INSERT INTO clips_migrated (id, content, fingerprint, created_at, pinned) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id, content, fingerprint, stamp, if pinned.unwrap_or(0) != 0 { 1 } else { 0 }],
        )?;
        migrated += 1;
    }

    tx.execute_batch("DROP TABLE clips;")?;
    tx.execute_batch("ALTER TABLE clips_migrated RENAME TO clips;")?;
    tx.commit()?;

    info!("migrated {migrated} clips from legacy schema");
    Ok(())
}

/// The whole store rests on fingerprints being unique; a database that lost
/// that guarantee is refused rather than repaired.
fn verify_integrity(conn: &Connection) -> Result<(), DbError> {
    let mut has_unique_index = false;
    {
        let mut stmt = conn.prepare("PRAGMA index_list(clips)")?;
        let indexes = stmt
            .query_map([], |row| Ok((row.get::<_, String>(1)?, row.get::<_, i64>(2)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        for (name, unique) in indexes {
            if unique != 1 {
                continue;
            }
            let mut info = conn.prepare(&format!("PRAGMA index_info(\"{name}\")"))?;
            let columns = info
                .query_map([], |row| row.get::<_, String>(2))?
                .collect::<Result<Vec<_>, _>>()?;
            if columns == ["fingerprint"] {
                has_unique_index = true;
                break;
            }
        }
    }

    if !has_unique_index {
        return Err(DbError::Corrupted(
            "fingerprint column is not protected by a unique index".to_string(),
        ));
    }

    let duplicate: Option<String> = conn
        .query_row(
            "SELECT fingerprint FROM clips GROUP BY fingerprint HAVING COUNT(*) > 1 LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()?;
    if let Some(fingerprint) = duplicate {
        return Err(DbError::Corrupted(format!(
            "fingerprint {fingerprint} is stored more than once"
        )));
    }

    Ok(())
}
