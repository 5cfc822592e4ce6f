//! SQL migration definitions for the articles database.
//!
//! Migrations are applied in order on schema initialization. Each migration
//! has a version number and a batch of SQL statements.

/// A database migration with a version and SQL statements.
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![Migration {
        version: 1,
        description: "Initial schema: articles, predictions",
        sql: r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version    INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- One row per acquired article observation
CREATE TABLE IF NOT EXISTS articles (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    date              TEXT,
    title             TEXT,
    claps             INTEGER,
    responses         INTEGER,
    author_name       TEXT,
    followers         TEXT,
    reading_time_mins INTEGER,
    tag               TEXT,
    created_at        TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_articles_tag ON articles(tag);

-- Classifier outputs, one row per scored article
CREATE TABLE IF NOT EXISTS predictions (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    article_id  INTEGER NOT NULL REFERENCES articles(id),
    prediction  INTEGER NOT NULL,
    probability REAL NOT NULL,
    created_at  TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_predictions_article ON predictions(article_id);

INSERT INTO schema_migrations (version) VALUES (1);
"#,
    }]
}
