//! SQLite-backed embedding cache (`.index.db`).

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::IndexError;

/// Default index file name inside the searched directory.
pub const DEFAULT_INDEX_FILE: &str = ".index.db";

/// One cached embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    /// Path relative to the indexed directory
    pub path: String,
    /// File modification time (ms since epoch) when the embedding was made
    pub mtime: f64,
    /// Embedding mode the vector was produced with
    pub mode: String,
    pub embedding: Vec<f64>,
}

/// Persistent map from image path to `(mtime, mode, embedding)`.
///
/// Opened and dropped within a single command; SQLite provides the only
/// locking.
pub struct EmbeddingCache {
    conn: Connection,
    path: PathBuf,
}

impl EmbeddingCache {
    /// Open (or create) `<directory>/.index.db`.
    pub fn open(directory: &Path) -> Result<Self, IndexError> {
        Self::open_at(&directory.join(DEFAULT_INDEX_FILE))
    }

    /// Open (or create) the index at an explicit file path.
    pub fn open_at(path: &Path) -> Result<Self, IndexError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous  = NORMAL;",
        )?;
        Self::init_schema(&conn)?;
        tracing::debug!("Opened embedding index at {:?}", path);
        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    fn init_schema(conn: &Connection) -> Result<(), IndexError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS embeddings (
                path       TEXT PRIMARY KEY,
                mtime      REAL NOT NULL,
                mode       TEXT NOT NULL DEFAULT '',
                embedding  TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Look up the entry for `path`.
    pub fn get(&self, path: &str) -> Result<Option<IndexEntry>, IndexError> {
        let row = self
            .conn
            .query_row(
                "SELECT path, mtime, mode, embedding FROM embeddings WHERE path = ?1",
                params![path],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, f64>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;
        row.map(decode_entry).transpose()
    }

    /// Insert or replace the entry for `path`.
    pub fn upsert(
        &self,
        path: &str,
        mtime: f64,
        mode: &str,
        embedding: &[f64],
    ) -> Result<(), IndexError> {
        let encoded = serde_json::to_string(embedding).map_err(|e| IndexError::Encoding {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        self.conn.execute(
            "INSERT INTO embeddings (path, mtime, mode, embedding)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(path) DO UPDATE SET
                mtime = excluded.mtime,
                mode = excluded.mode,
                embedding = excluded.embedding",
            params![path, mtime, mode, encoded],
        )?;
        Ok(())
    }

    /// Delete the entry for `path`. Returns whether one existed.
    pub fn remove(&self, path: &str) -> Result<bool, IndexError> {
        let n = self
            .conn
            .execute("DELETE FROM embeddings WHERE path = ?1", params![path])?;
        Ok(n > 0)
    }

    /// Delete every entry whose path is not in `current`.
    ///
    /// Renames show up as a delete here plus an insert during refresh.
    /// Returns the number of removed entries.
    pub fn reconcile(&mut self, current: &HashSet<String>) -> Result<usize, IndexError> {
        let tx = self.conn.transaction()?;
        let stale: Vec<String> = {
            let mut stmt = tx.prepare("SELECT path FROM embeddings")?;
            let paths = stmt.query_map([], |row| row.get::<_, String>(0))?;
            let mut stale = Vec::new();
            for path in paths {
                let path = path?;
                if !current.contains(&path) {
                    stale.push(path);
                }
            }
            stale
        };
        for path in &stale {
            tx.execute("DELETE FROM embeddings WHERE path = ?1", params![path])?;
        }
        tx.commit()?;

        if !stale.is_empty() {
            tracing::debug!("Removed {} stale index entries", stale.len());
        }
        Ok(stale.len())
    }

    /// All entries, in storage order.
    pub fn all_entries(&self) -> Result<Vec<IndexEntry>, IndexError> {
        let mut stmt = self
            .conn
            .prepare("SELECT path, mtime, mode, embedding FROM embeddings ORDER BY rowid")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, f64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(decode_entry(row?)?);
        }
        Ok(entries)
    }

    /// Number of stored entries.
    pub fn len(&self) -> Result<usize, IndexError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM embeddings", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> Result<bool, IndexError> {
        Ok(self.len()? == 0)
    }
}

fn decode_entry(
    (path, mtime, mode, embedding): (String, f64, String, String),
) -> Result<IndexEntry, IndexError> {
    let embedding: Vec<f64> =
        serde_json::from_str(&embedding).map_err(|e| IndexError::Encoding {
            path: path.clone(),
            message: e.to_string(),
        })?;
    Ok(IndexEntry {
        path,
        mtime,
        mode,
        embedding,
    })
}
