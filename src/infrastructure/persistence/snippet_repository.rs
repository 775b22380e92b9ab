use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::domain::entities::{Snippet, SnippetId};
use crate::domain::repositories::{LATEST_SNIPPETS_LIMIT, RepositoryError, SnippetRepository};

/// `PostgreSQL` implementation of `SnippetRepository`
#[derive(Clone)]
pub struct PostgresSnippetRepository {
    pool: PgPool,
}

impl PostgresSnippetRepository {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SnippetRepository for PostgresSnippetRepository {
    async fn insert(
        &self,
        title: &str,
        content: &str,
        expires_days: u32,
    ) -> Result<SnippetId, RepositoryError> {
        let days = i32::try_from(expires_days).map_err(|_| RepositoryError::Internal {
            message: format!("expiry of {expires_days} days is out of range"),
        })?;

        let row = sqlx::query(
            r"
            INSERT INTO snippets (title, content, created, expires)
            VALUES ($1, $2, NOW(), NOW() + make_interval(days => $3))
            RETURNING id
            ",
        )
        .bind(title)
        .bind(content)
        .bind(days)
        .fetch_one(&self.pool)
        .await?;

        Ok(SnippetId::new(row.try_get("id")?))
    }

    async fn get(&self, id: SnippetId) -> Result<Snippet, RepositoryError> {
        let row = sqlx::query(
            r"
            SELECT id, title, content, created, expires
            FROM snippets
            WHERE expires > NOW() AND id = $1
            ",
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(map_row_to_snippet(&row)?),
            None => Err(RepositoryError::NotFound),
        }
    }

    async fn latest(&self) -> Result<Vec<Snippet>, RepositoryError> {
        let rows = sqlx::query(
            r"
            SELECT id, title, content, created, expires
            FROM snippets
            WHERE expires > NOW()
            ORDER BY created DESC
            LIMIT $1
            ",
        )
        .bind(LATEST_SNIPPETS_LIMIT as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(|row| map_row_to_snippet(row).map_err(RepositoryError::from)).collect()
    }
}

fn map_row_to_snippet(row: &PgRow) -> Result<Snippet, sqlx::Error> {
    Ok(Snippet {
        id: SnippetId::new(row.try_get("id")?),
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        created: row.try_get("created")?,
        expires: row.try_get("expires")?,
    })
}
