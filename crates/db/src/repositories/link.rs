use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row};

use trivia_core::domain::link::{LinkKind, LinkRecord};

use super::{InsertOutcome, LinkRepository, RepositoryError};
use crate::DbPool;

pub struct SqlLinkRepository {
    pool: DbPool,
}

impl SqlLinkRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl LinkRepository for SqlLinkRepository {
    async fn exists(&self, url: &str) -> Result<bool, RepositoryError> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM link_record WHERE url = ?")
            .bind(url)
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }

    async fn insert(&self, record: &LinkRecord) -> Result<InsertOutcome, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO link_record (url, captured_at, submitter, title, kind)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(url) DO NOTHING",
        )
        .bind(&record.url)
        .bind(record.captured_at.to_rfc3339())
        .bind(&record.submitter)
        .bind(record.title.as_deref())
        .bind(record.kind.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            Ok(InsertOutcome::AlreadyPresent)
        } else {
            Ok(InsertOutcome::Inserted)
        }
    }

    async fn find(&self, url: &str) -> Result<Option<LinkRecord>, RepositoryError> {
        let row = sqlx::query(
            "SELECT url, captured_at, submitter, title, kind
             FROM link_record
             WHERE url = ?",
        )
        .bind(url)
        .fetch_optional(&self.pool)
        .await?;

        row.map(link_from_row).transpose()
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM link_record").fetch_one(&self.pool).await?;
        u64::try_from(count)
            .map_err(|_| RepositoryError::Decode(format!("negative link count: {count}")))
    }

    async fn list_recent(&self, limit: u32) -> Result<Vec<LinkRecord>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT url, captured_at, submitter, title, kind
             FROM link_record
             ORDER BY captured_at DESC, url ASC
             LIMIT ?",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(link_from_row).collect()
    }
}

fn link_from_row(row: SqliteRow) -> Result<LinkRecord, RepositoryError> {
    let kind_raw: String = row.try_get("kind")?;
    let kind = kind_raw
        .parse::<LinkKind>()
        .map_err(|_| RepositoryError::Decode(format!("unknown link kind `{kind_raw}`")))?;

    Ok(LinkRecord {
        url: row.try_get("url")?,
        captured_at: parse_timestamp("captured_at", row.try_get("captured_at")?)?,
        submitter: row.try_get("submitter")?,
        title: row.try_get("title")?,
        kind,
    })
}

fn parse_timestamp(column: &str, value: String) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(&value).map(|timestamp| timestamp.with_timezone(&Utc)).map_err(
        |error| {
            RepositoryError::Decode(format!("invalid timestamp in `{column}`: `{value}` ({error})"))
        },
    )
}
