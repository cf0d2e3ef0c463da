pub const CREATE_CLIPS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS clips (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  content TEXT NOT NULL CHECK (length(content) > 0),
  fingerprint TEXT NOT NULL UNIQUE,
  created_at TEXT NOT NULL,
  pinned INTEGER NOT NULL DEFAULT 0 CHECK (pinned IN (0, 1))
);
"#;

pub const CREATE_CLIPS_TABLE_MIGRATION: &str = r#"
CREATE TABLE clips_migrated (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  content TEXT NOT NULL CHECK (length(content) > 0),
  fingerprint TEXT NOT NULL UNIQUE,
  created_at TEXT NOT NULL,
  pinned INTEGER NOT NULL DEFAULT 0 CHECK (pinned IN (0, 1))
);
"#;

pub const CREATE_INDEX_CREATED_AT: &str =
    "CREATE INDEX IF NOT EXISTS idx_clips_created_at ON clips(created_at DESC);";
pub const CREATE_INDEX_PINNED: &str =
    "CREATE INDEX IF NOT EXISTS idx_clips_pinned ON clips(pinned, created_at DESC);";
