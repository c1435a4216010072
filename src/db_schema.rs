use rusqlite::{Connection, Result as SqlResult};

// Tag sets are stored as a JSON-typed text column; GPS splits into two
// nullable numeric columns and camera into two nullable text columns.
pub const IMAGES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS images (
    id TEXT PRIMARY KEY NOT NULL,
    url TEXT NOT NULL,
    blob_path TEXT,
    width INTEGER,
    height INTEGER,
    bytes INTEGER,
    mime_type TEXT,
    placeholder TEXT,
    store TEXT NOT NULL,
    date TEXT NOT NULL,
    week INTEGER NOT NULL,
    tags TEXT NOT NULL DEFAULT '[]',
    notes TEXT NOT NULL DEFAULT '',
    uploaded_at TEXT NOT NULL,
    sort_key INTEGER,
    gps_latitude DOUBLE PRECISION,
    gps_longitude DOUBLE PRECISION,
    camera_make TEXT,
    camera_model TEXT
)
"#;

pub const STORES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS stores (
    id TEXT PRIMARY KEY NOT NULL,
    name TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL
)
"#;

pub const SCHEMA_SQL: &[&str] = &[
    IMAGES_TABLE,
    STORES_TABLE,
    "CREATE INDEX IF NOT EXISTS idx_images_sort_key ON images(sort_key);",
    "CREATE INDEX IF NOT EXISTS idx_images_store ON images(store);",
    "CREATE INDEX IF NOT EXISTS idx_images_week ON images(week);",
];

// Every statement is CREATE ... IF NOT EXISTS, so re-running is harmless.
pub fn initialize_schema(conn: &Connection) -> SqlResult<()> {
    for statement in SCHEMA_SQL {
        conn.execute(statement, [])?;
    }
    Ok(())
}
