//! SQLite-backed quad store
//!
//! One database file per store. The connection is guarded by a mutex so the
//! store can be shared between reader threads.

use super::schema::{
    META_SCHEMA_VERSION, QUAD_COLUMNS, SCHEMA_CREATE_INDEXES, SCHEMA_CREATE_METADATA,
    SCHEMA_CREATE_QUADS, STORE_SCHEMA_VERSION,
};
use super::{BackendKind, QuadStore, StoreError, StoreStats};
use crate::quad::Quad;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const SELECT_OBJECTS: &str = "SELECT object FROM quads WHERE subject = ?1 AND predicate = ?2";
const SELECT_SUBJECTS: &str = "SELECT subject FROM quads WHERE object = ?1 AND predicate = ?2";
const INSERT_QUAD: &str =
    "INSERT INTO quads (subject, predicate, object, label) VALUES (?1, ?2, ?3, ?4)";

/// Quad store persisted in a single SQLite database
pub struct SqliteQuadStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl SqliteQuadStore {
    /// Open the store at `path`, creating the database if it does not exist.
    ///
    /// Reopening an existing database never discards its contents. A database
    /// recorded with a different schema version is rejected.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let existed = path.exists();

        if !existed {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).map_err(|e| StoreError::init(path, e))?;
                }
            }
        }

        let conn = Connection::open(path).map_err(|e| StoreError::init(path, e))?;
        Self::configure_connection(&conn).map_err(|e| StoreError::init(path, e))?;
        Self::create_schema(&conn).map_err(|e| StoreError::init(path, e))?;

        let store = Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        };
        store.check_schema_version(path)?;

        if existed {
            info!(path = %path.display(), "opened quad store");
        } else {
            info!(path = %path.display(), "created quad store");
        }

        Ok(store)
    }

    /// Create a store backed by an in-memory SQLite database (for testing)
    pub fn in_memory() -> Result<Self, StoreError> {
        let location = Path::new(":memory:");
        let conn = Connection::open_in_memory().map_err(|e| StoreError::init(location, e))?;
        Self::create_schema(&conn).map_err(|e| StoreError::init(location, e))?;

        let store = Self {
            conn: Mutex::new(conn),
            path: None,
        };
        store.check_schema_version(location)?;
        Ok(store)
    }

    /// Configure connection with settings suited to a read-mostly store
    fn configure_connection(conn: &Connection) -> SqliteResult<()> {
        // WAL lets readers proceed while the bootstrap build writes
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "temp_store", "MEMORY")?;
        conn.pragma_update(None, "cache_size", -32000)?; // 32MB cache
        Ok(())
    }

    fn create_schema(conn: &Connection) -> SqliteResult<()> {
        conn.execute(SCHEMA_CREATE_QUADS, [])?;
        conn.execute(SCHEMA_CREATE_METADATA, [])?;
        conn.execute_batch(SCHEMA_CREATE_INDEXES)?;
        Ok(())
    }

    /// Record the schema version on first open, reject a different one afterwards.
    fn check_schema_version(&self, location: &Path) -> Result<(), StoreError> {
        match self.metadata(META_SCHEMA_VERSION)? {
            Some(version) if version == STORE_SCHEMA_VERSION => Ok(()),
            Some(found) => Err(StoreError::SchemaVersionMismatch {
                location: location.to_path_buf(),
                expected: STORE_SCHEMA_VERSION.to_string(),
                found,
            }),
            None => self
                .set_metadata(META_SCHEMA_VERSION, STORE_SCHEMA_VERSION)
                .map_err(|e| StoreError::init(location, e)),
        }
    }

    fn collect_column(
        &self,
        sql: &str,
        nodes: &HashSet<String>,
        predicate: &str,
        operation: &'static str,
    ) -> Result<HashSet<String>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached(sql)
            .map_err(|e| StoreError::read(operation, e))?;

        let mut result = HashSet::new();
        for node in nodes {
            let rows = stmt
                .query_map(params![node, predicate], |row| row.get::<_, String>(0))
                .map_err(|e| StoreError::read(operation, e))?;
            for value in rows {
                result.insert(value.map_err(|e| StoreError::read(operation, e))?);
            }
        }

        debug!(
            operation,
            predicate,
            input = nodes.len(),
            output = result.len(),
            "traversed"
        );
        Ok(result)
    }

    fn row_to_quad(row: &rusqlite::Row<'_>) -> SqliteResult<Quad> {
        Ok(Quad {
            subject: row.get(0)?,
            predicate: row.get(1)?,
            object: row.get(2)?,
            label: row.get(3)?,
        })
    }
}

impl QuadStore for SqliteQuadStore {
    fn backend(&self) -> BackendKind {
        BackendKind::Sqlite
    }

    fn location(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn add_quad(&self, quad: &Quad) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        conn.execute(
            INSERT_QUAD,
            params![quad.subject, quad.predicate, quad.object, quad.label],
        )
        .map_err(|e| StoreError::write("add_quad", e))?;
        Ok(())
    }

    fn add_quads(&self, quads: &[Quad]) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| StoreError::write("add_quads", e))?;

        {
            let mut stmt = tx
                .prepare_cached(INSERT_QUAD)
                .map_err(|e| StoreError::write("add_quads", e))?;

            for quad in quads {
                stmt.execute(params![quad.subject, quad.predicate, quad.object, quad.label])
                    .map_err(|e| StoreError::write("add_quads", e))?;
            }
        }

        tx.commit().map_err(|e| StoreError::write("add_quads", e))?;
        Ok(())
    }

    fn stats(&self) -> Result<StoreStats, StoreError> {
        let conn = self.conn.lock();
        let quad_count: i64 = conn
            .query_row("SELECT COUNT(*) FROM quads", [], |row| row.get(0))
            .map_err(|e| StoreError::read("stats", e))?;
        let node_count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM (SELECT subject FROM quads UNION SELECT object FROM quads)",
                [],
                |row| row.get(0),
            )
            .map_err(|e| StoreError::read("stats", e))?;

        Ok(StoreStats {
            node_count: node_count as u64,
            quad_count: quad_count as u64,
        })
    }

    fn traverse_out(
        &self,
        nodes: &HashSet<String>,
        predicate: &str,
    ) -> Result<HashSet<String>, StoreError> {
        self.collect_column(SELECT_OBJECTS, nodes, predicate, "traverse_out")
    }

    fn traverse_in(
        &self,
        nodes: &HashSet<String>,
        predicate: &str,
    ) -> Result<HashSet<String>, StoreError> {
        self.collect_column(SELECT_SUBJECTS, nodes, predicate, "traverse_in")
    }

    fn quads_with_subject(&self, subject: &str) -> Result<Vec<Quad>, StoreError> {
        let conn = self.conn.lock();
        let sql = format!(
            "SELECT {} FROM quads WHERE subject = ?1 ORDER BY id",
            QUAD_COLUMNS
        );
        let mut stmt = conn
            .prepare_cached(&sql)
            .map_err(|e| StoreError::read("quads_with_subject", e))?;

        let quads = stmt
            .query_map([subject], Self::row_to_quad)
            .map_err(|e| StoreError::read("quads_with_subject", e))?
            .collect::<SqliteResult<Vec<_>>>()
            .map_err(|e| StoreError::read("quads_with_subject", e))?;

        Ok(quads)
    }

    fn metadata(&self, key: &str) -> Result<Option<String>, StoreError> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT value FROM store_metadata WHERE key = ?1",
            [key],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| StoreError::read("metadata", e))
    }

    fn set_metadata(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT OR REPLACE INTO store_metadata (key, value) VALUES (?1, ?2)",
            params![key, value],
        )
        .map_err(|e| StoreError::write("set_metadata", e))?;
        Ok(())
    }

    fn reset(&self) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| StoreError::write("reset", e))?;
        tx.execute("DELETE FROM quads", [])
            .map_err(|e| StoreError::write("reset", e))?;
        tx.execute(
            "DELETE FROM store_metadata WHERE key != ?1",
            [META_SCHEMA_VERSION],
        )
        .map_err(|e| StoreError::write("reset", e))?;
        tx.commit().map_err(|e| StoreError::write("reset", e))?;
        Ok(())
    }
}
