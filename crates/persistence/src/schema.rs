//! Database schema definitions

/// SQL to create all tables
/// NOTE: timestamps are Unix milliseconds (UTC)
pub const CREATE_TABLES: &str = r#"
-- Players on the board
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    total_points INTEGER NOT NULL DEFAULT 0,
    profile_image TEXT NOT NULL DEFAULT '',
    created_at INTEGER DEFAULT (CAST(strftime('%s', 'now') AS INTEGER) * 1000)
);

-- One row per claim
CREATE TABLE IF NOT EXISTS claim_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
    points INTEGER NOT NULL,
    claimed_at INTEGER NOT NULL
);

-- ========== INDEXES ==========

CREATE INDEX IF NOT EXISTS idx_users_points ON users(total_points DESC);
CREATE INDEX IF NOT EXISTS idx_claims_claimed_at ON claim_history(claimed_at DESC);
CREATE INDEX IF NOT EXISTS idx_claims_user ON claim_history(user_id)
"#;
