pub const SCHEMA: &str = r#"
-- One JSON album record per row, keyed by album id
CREATE TABLE IF NOT EXISTS albums (
    id TEXT PRIMARY KEY,
    record TEXT NOT NULL,
    stored_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);
"#;
