//! Verdict store: durable `(hash, url, is_safe)` records keyed by URL digest.
//!
//! Reads never fail outward. A backend fault becomes `Lookup::Unavailable`
//! and a rejected duplicate insert becomes `InsertOutcome::Conflict`, so the
//! engine can treat both as ordinary states.

use std::path::{Path, PathBuf};
use std::time::Duration;

use parking_lot::Mutex;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use thiserror::Error;
use tracing::{debug, warn};

use crate::hasher::{self, UrlDigest};
use crate::verdict::UrlRecord;

/// Backend failures. Only surfaced by listing operations; lookups and
/// inserts fold them into `Unavailable`.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to connect to verdict store at {path}: {source}")]
    Connect {
        path: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("failed to initialize schema: {0}")]
    Schema(#[source] rusqlite::Error),

    #[error("query failed: {0}")]
    Query(#[from] rusqlite::Error),
}

/// Outcome of a keyed read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
    /// Backend could not be reached. Callers treat it as a miss.
    Unavailable,
}

impl<T> Lookup<T> {
    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(v) => Some(v),
            _ => None,
        }
    }
}

impl<T> From<Result<Option<T>, StoreError>> for Lookup<T> {
    fn from(r: Result<Option<T>, StoreError>) -> Self {
        match r {
            Ok(Some(v)) => Lookup::Found(v),
            Ok(None) => Lookup::NotFound,
            Err(e) => {
                warn!(error = %e, "verdict store read degraded to miss");
                Lookup::Unavailable
            }
        }
    }
}

/// Outcome of an insert attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// A row with the same digest already exists (repeat or lost race).
    Conflict,
    /// Not stored: backend could not be reached.
    Unavailable,
}

pub trait VerdictStore: Send + Sync {
    /// Exact match on the stored URL.
    fn find_by_url(&self, url: &str) -> Lookup<UrlRecord>;

    fn find_by_hash(&self, digest: &UrlDigest) -> Lookup<UrlRecord>;

    /// Digest is computed from `url`. Uniqueness on the digest is the only
    /// guard against two racing writers.
    fn insert(&self, url: &str, is_safe: bool) -> InsertOutcome;

    /// Every record, no ordering guarantee.
    fn list_all(&self) -> Result<Vec<UrlRecord>, StoreError>;

    /// Records with `is_safe = false`.
    fn list_unsafe(&self) -> Result<Vec<UrlRecord>, StoreError>;
}

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS urls (
        hash         TEXT PRIMARY KEY,
        original_url TEXT NOT NULL,
        is_safe      INTEGER NOT NULL,
        created_at   INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_urls_original_url ON urls(original_url);
"#;

const SELECT_COLUMNS: &str = "SELECT hash, original_url, is_safe, created_at FROM urls";

/// SQLite-backed store.
///
/// The connection is opened lazily. A file connection is dropped after a
/// failed query (other than a unique violation) and reopened on the next call.
pub struct SqliteStore {
    target: Target,
    conn: Mutex<Option<Connection>>,
}

enum Target {
    File(PathBuf),
    Memory,
}

impl Target {
    fn describe(&self) -> String {
        match self {
            Target::File(p) => p.display().to_string(),
            Target::Memory => ":memory:".to_string(),
        }
    }
}

impl SqliteStore {
    /// Does not touch the filesystem; the first operation connects.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            target: Target::File(path.as_ref().to_path_buf()),
            conn: Mutex::new(None),
        }
    }

    /// Private in-memory database (tests, ephemeral runs).
    pub fn in_memory() -> Result<Self, StoreError> {
        let store = Self {
            target: Target::Memory,
            conn: Mutex::new(None),
        };
        // Connect now: an in-memory database lives and dies with its connection.
        {
            let mut guard = store.conn.lock();
            *guard = Some(store.connect()?);
        }
        Ok(store)
    }

    /// Connect eagerly and report the error. Startup uses this for a health line.
    pub fn ping(&self) -> Result<(), StoreError> {
        self.with_conn(|_| Ok(()))
    }

    fn connect(&self) -> Result<Connection, StoreError> {
        let conn = match &self.target {
            Target::File(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    if let Err(e) = std::fs::create_dir_all(parent) {
                        debug!(error = %e, dir = %parent.display(), "could not create store directory");
                    }
                }
                let conn = Connection::open(path).map_err(|source| StoreError::Connect {
                    path: self.target.describe(),
                    source,
                })?;
                conn.busy_timeout(Duration::from_secs(5))
                    .map_err(StoreError::Schema)?;
                conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")
                    .map_err(StoreError::Schema)?;
                conn
            }
            Target::Memory => {
                Connection::open_in_memory().map_err(|source| StoreError::Connect {
                    path: self.target.describe(),
                    source,
                })?
            }
        };
        conn.execute_batch(SCHEMA).map_err(StoreError::Schema)?;
        debug!(store = %self.target.describe(), "verdict store connected");
        Ok(conn)
    }

    fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut guard = self.conn.lock();
        let conn = match guard.take() {
            Some(c) => c,
            None => self.connect()?,
        };
        let out = f(&conn);
        let keep = match (&out, &self.target) {
            (Err(StoreError::Query(e)), Target::File(_)) => is_unique_violation(e),
            _ => true,
        };
        if keep {
            *guard = Some(conn);
        }
        out
    }

    fn query_one(&self, sql: &str, key: &str) -> Result<Option<UrlRecord>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare_cached(sql)?;
            let rec = stmt.query_row(params![key], row_to_record).optional()?;
            Ok(rec)
        })
    }

    fn query_many(&self, sql: &str) -> Result<Vec<UrlRecord>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare_cached(sql)?;
            let rows = stmt.query_map([], row_to_record)?;
            let mut out = Vec::new();
            for r in rows {
                out.push(r?);
            }
            Ok(out)
        })
    }
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<UrlRecord> {
    Ok(UrlRecord {
        hash: row.get(0)?,
        original_url: row.get(1)?,
        is_safe: row.get::<_, i64>(2)? != 0,
        created_at: row.get(3)?,
    })
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _) if err.code == ErrorCode::ConstraintViolation
    )
}

impl VerdictStore for SqliteStore {
    fn find_by_url(&self, url: &str) -> Lookup<UrlRecord> {
        self.query_one(&format!("{SELECT_COLUMNS} WHERE original_url = ?1 LIMIT 1"), url)
            .into()
    }

    fn find_by_hash(&self, digest: &UrlDigest) -> Lookup<UrlRecord> {
        self.query_one(&format!("{SELECT_COLUMNS} WHERE hash = ?1"), &digest.to_hex())
            .into()
    }

    fn insert(&self, url: &str, is_safe: bool) -> InsertOutcome {
        let hash = hasher::digest(url).to_hex();
        let now = chrono::Utc::now().timestamp();
        let res = self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO urls (hash, original_url, is_safe, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![hash, url, is_safe as i64, now],
            )
            .map_err(StoreError::from)
        });
        match res {
            Ok(_) => InsertOutcome::Inserted,
            Err(StoreError::Query(e)) if is_unique_violation(&e) => {
                debug!(%hash, "insert rejected by unique hash");
                InsertOutcome::Conflict
            }
            Err(e) => {
                warn!(error = %e, "verdict not stored");
                InsertOutcome::Unavailable
            }
        }
    }

    fn list_all(&self) -> Result<Vec<UrlRecord>, StoreError> {
        self.query_many(SELECT_COLUMNS)
    }

    fn list_unsafe(&self) -> Result<Vec<UrlRecord>, StoreError> {
        self.query_many(&format!("{SELECT_COLUMNS} WHERE is_safe = 0"))
    }
}
