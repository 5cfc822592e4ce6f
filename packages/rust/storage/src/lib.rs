//! libSQL storage layer for acquired articles and predictions.
//!
//! The [`Storage`] struct wraps a local libSQL database. Connecting and
//! schema initialization are split: the orchestrator treats a failed
//! [`Storage::init_schema`] as non-fatal (the schema may already exist),
//! while a database that cannot even be opened is.
//!
//! Counts cross this boundary as integers: [`bulk_load_csv`] normalizes the
//! raw clap/response/reading-time strings while copying a per-target CSV in,
//! so text never reaches the `articles` relation.
//!
//! [`bulk_load_csv`]: Storage::bulk_load_csv

mod migrations;

use std::path::Path;

use libsql::{Connection, Database, params};

use storypulse_shared::{ArticleRow, Result, StorypulseError, csv, parse_count};

/// Primary storage handle wrapping a libSQL database.
pub struct Storage {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
}

impl Storage {
    /// Open or create a database at `path`. Does not touch the schema;
    /// call [`Storage::init_schema`] for that.
    pub async fn connect(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StorypulseError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| StorypulseError::Storage(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| StorypulseError::Storage(e.to_string()))?;

        Ok(Self { db, conn })
    }

    /// Apply pending schema migrations. Idempotent.
    pub async fn init_schema(&self) -> Result<()> {
        let current_version = self.schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn.execute_batch(migration.sql).await.map_err(|e| {
                    StorypulseError::Storage(format!(
                        "migration v{} failed: {e}",
                        migration.version
                    ))
                })?;
            }
        }
        Ok(())
    }

    /// Current schema version, or 0 if no migrations have been applied.
    pub async fn schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    // -----------------------------------------------------------------------
    // Article operations
    // -----------------------------------------------------------------------

    /// Bulk-load one crawl target's raw CSV into `articles` under `tag`.
    ///
    /// Clap, response, and reading-time values are normalized to
    /// non-negative integers here; malformed rows (wrong column count) are
    /// skipped with a warning. Returns the number of rows inserted.
    pub async fn bulk_load_csv(&self, csv_path: &Path, tag: &str) -> Result<usize> {
        let content =
            std::fs::read_to_string(csv_path).map_err(|e| StorypulseError::io(csv_path, e))?;

        let mut inserted = 0usize;
        for line in content.lines().skip(1) {
            if line.is_empty() {
                continue;
            }
            let fields = csv::split_line(line);
            if fields.len() != 7 {
                tracing::warn!(
                    file = %csv_path.display(),
                    columns = fields.len(),
                    "skipping malformed raw row"
                );
                continue;
            }

            self.conn
                .execute(
                    "INSERT INTO articles
                       (date, title, claps, responses, author_name, followers, reading_time_mins, tag)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    params![
                        fields[0].as_str(),
                        fields[1].as_str(),
                        parse_count(&fields[2]),
                        parse_count(&fields[3]),
                        fields[4].as_str(),
                        fields[5].as_str(),
                        parse_count(&fields[6]),
                        tag,
                    ],
                )
                .await
                .map_err(|e| StorypulseError::Storage(e.to_string()))?;
            inserted += 1;
        }

        tracing::info!(file = %csv_path.display(), tag, inserted, "bulk-loaded raw file");
        Ok(inserted)
    }

    /// Load the full current contents of the store.
    pub async fn load_articles(&self) -> Result<Vec<ArticleRow>> {
        let mut rows = self
            .conn
            .query(
                "SELECT date, title, claps, responses, author_name, followers, reading_time_mins
                 FROM articles ORDER BY id",
                params![],
            )
            .await
            .map_err(|e| StorypulseError::Storage(e.to_string()))?;

        let mut articles = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            articles.push(row_to_article(&row)?);
        }
        Ok(articles)
    }

    /// Number of article rows currently stored.
    pub async fn count_articles(&self) -> Result<i64> {
        self.scalar("SELECT COUNT(*) FROM articles").await
    }

    // -----------------------------------------------------------------------
    // Prediction operations
    // -----------------------------------------------------------------------

    /// Record a classifier output for one article.
    pub async fn insert_prediction(
        &self,
        article_id: i64,
        prediction: bool,
        probability: f64,
    ) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO predictions (article_id, prediction, probability)
                 VALUES (?1, ?2, ?3)",
                params![article_id, prediction as i64, probability],
            )
            .await
            .map_err(|e| StorypulseError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Number of prediction rows currently stored.
    pub async fn count_predictions(&self) -> Result<i64> {
        self.scalar("SELECT COUNT(*) FROM predictions").await
    }

    async fn scalar(&self, sql: &str) -> Result<i64> {
        let mut rows = self
            .conn
            .query(sql, params![])
            .await
            .map_err(|e| StorypulseError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => row
                .get::<i64>(0)
                .map_err(|e| StorypulseError::Storage(e.to_string())),
            Ok(None) => Ok(0),
            Err(e) => Err(StorypulseError::Storage(e.to_string())),
        }
    }
}

/// Convert a database row to an [`ArticleRow`].
fn row_to_article(row: &libsql::Row) -> Result<ArticleRow> {
    Ok(ArticleRow {
        date: row
            .get::<String>(0)
            .map_err(|e| StorypulseError::Storage(e.to_string()))?,
        title: row
            .get::<String>(1)
            .map_err(|e| StorypulseError::Storage(e.to_string()))?,
        claps: row
            .get::<i64>(2)
            .map_err(|e| StorypulseError::Storage(e.to_string()))?,
        responses: row
            .get::<i64>(3)
            .map_err(|e| StorypulseError::Storage(e.to_string()))?,
        author_name: row
            .get::<String>(4)
            .map_err(|e| StorypulseError::Storage(e.to_string()))?,
        followers: row
            .get::<String>(5)
            .map_err(|e| StorypulseError::Storage(e.to_string()))?,
        reading_time_mins: row
            .get::<i64>(6)
            .map_err(|e| StorypulseError::Storage(e.to_string()))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    /// Create a temp file storage for testing.
    async fn test_storage(dir: &Path) -> Storage {
        let storage = Storage::connect(&dir.join("test.db")).await.expect("open");
        storage.init_schema().await.expect("migrate");
        storage
    }

    #[tokio::test]
    async fn connect_and_migrate() {
        let dir = tempfile::tempdir().unwrap();
        let storage = test_storage(dir.path()).await;
        assert_eq!(storage.schema_version().await, 1);
    }

    #[tokio::test]
    async fn idempotent_migration() {
        let dir = tempfile::tempdir().unwrap();
        let s1 = test_storage(dir.path()).await;
        drop(s1);
        let s2 = Storage::connect(&dir.path().join("test.db")).await.unwrap();
        s2.init_schema().await.expect("second init");
        assert_eq!(s2.schema_version().await, 1);
    }

    fn write_raw_csv(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("business_2024.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "date,title,claps,responses,author_name,followers,reading_time_mins").unwrap();
        writeln!(f, "03/01/2024,Plain story,1.2K,4,jdoe,N/A,6").unwrap();
        writeln!(f, "03/02/2024,\"Commas, included\",1234,abc,other,N/A,3").unwrap();
        path
    }

    #[tokio::test]
    async fn bulk_load_normalizes_counts() {
        let dir = tempfile::tempdir().unwrap();
        let storage = test_storage(dir.path()).await;
        let csv = write_raw_csv(dir.path());

        let inserted = storage.bulk_load_csv(&csv, "business").await.expect("load");
        assert_eq!(inserted, 2);

        let articles = storage.load_articles().await.expect("load articles");
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].claps, 1200);
        assert_eq!(articles[0].title, "Plain story");
        assert_eq!(articles[1].claps, 1234);
        assert_eq!(articles[1].responses, 0); // "abc" resolves to zero
        assert_eq!(articles[1].title, "Commas, included");
    }

    #[tokio::test]
    async fn bulk_load_skips_malformed_rows() {
        let dir = tempfile::tempdir().unwrap();
        let storage = test_storage(dir.path()).await;

        let path = dir.path().join("bad.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "date,title,claps,responses,author_name,followers,reading_time_mins").unwrap();
        writeln!(f, "not,enough,columns").unwrap();
        writeln!(f, "03/05/2024,Fine,10,2,ok,N/A,4").unwrap();

        let inserted = storage.bulk_load_csv(&path, "ai").await.unwrap();
        assert_eq!(inserted, 1);
        assert_eq!(storage.count_articles().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn empty_store_loads_zero_rows() {
        let dir = tempfile::tempdir().unwrap();
        let storage = test_storage(dir.path()).await;
        assert!(storage.load_articles().await.unwrap().is_empty());
        assert_eq!(storage.count_articles().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn prediction_insert_and_count() {
        let dir = tempfile::tempdir().unwrap();
        let storage = test_storage(dir.path()).await;
        let csv = write_raw_csv(dir.path());
        storage.bulk_load_csv(&csv, "business").await.unwrap();

        storage.insert_prediction(1, true, 0.87).await.expect("insert");
        assert_eq!(storage.count_predictions().await.unwrap(), 1);
    }
}
