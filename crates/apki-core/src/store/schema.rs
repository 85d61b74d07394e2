//! SQLite Schema Definitions for Quad Storage
//!
//! A store is a single SQLite database holding an append-only `quads` table
//! and a small `store_metadata` key/value table.

/// Schema version for quad store databases
pub const STORE_SCHEMA_VERSION: &str = "1.0";

/// Metadata key holding the schema version
pub const META_SCHEMA_VERSION: &str = "schema_version";

/// SQL to create the quads table
///
/// No uniqueness constraint: appending the same quad twice stores two rows.
pub const SCHEMA_CREATE_QUADS: &str = r#"
CREATE TABLE IF NOT EXISTS quads (
    -- Insertion order
    id INTEGER PRIMARY KEY AUTOINCREMENT,

    subject TEXT NOT NULL,
    predicate TEXT NOT NULL,
    object TEXT NOT NULL,

    -- Raw source string (provenance only)
    label TEXT NOT NULL
)
"#;

/// SQL to create indexes for traversal in both directions
pub const SCHEMA_CREATE_INDEXES: &str = r#"
-- Outgoing traversal: subject + predicate -> object
CREATE INDEX IF NOT EXISTS idx_quads_subject_predicate ON quads(subject, predicate);

-- Incoming traversal: object + predicate -> subject
CREATE INDEX IF NOT EXISTS idx_quads_object_predicate ON quads(object, predicate);
"#;

/// SQL to create the metadata table
pub const SCHEMA_CREATE_METADATA: &str = r#"
CREATE TABLE IF NOT EXISTS store_metadata (
    key TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL
)
"#;

/// Column names for quad queries (in order for row mapping)
pub const QUAD_COLUMNS: &str = "subject, predicate, object, label";
