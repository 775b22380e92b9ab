use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::debug;

use crate::domain::entities::{User, UserId};
use crate::domain::repositories::{RepositoryError, UserRepository};
use crate::infrastructure::security::password::{hash_password, verify_password};

const EMAIL_CONSTRAINT: &str = "users_uc_email";

/// `PostgreSQL` implementation of `UserRepository`
#[derive(Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn insert(&self, name: &str, email: &str, password: &str) -> Result<(), RepositoryError> {
        let hashed = hash_password(password).await?;

        let result = sqlx::query(
            r"
            INSERT INTO users (name, email, hashed_password, created)
            VALUES ($1, $2, $3, NOW())
            ",
        )
        .bind(name)
        .bind(email)
        .bind(hashed)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err))
                if db_err.is_unique_violation() && db_err.constraint() == Some(EMAIL_CONSTRAINT) =>
            {
                debug!("Rejected registration for an email already on file");
                Err(RepositoryError::DuplicateEmail)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<UserId, RepositoryError> {
        let row = sqlx::query("SELECT id, hashed_password FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Err(RepositoryError::InvalidCredentials);
        };

        let hashed: String = row.try_get("hashed_password")?;
        if !verify_password(password, &hashed).await? {
            return Err(RepositoryError::InvalidCredentials);
        }

        Ok(UserId::new(row.try_get("id")?))
    }

    async fn get(&self, id: UserId) -> Result<User, RepositoryError> {
        let row = sqlx::query("SELECT id, name, email, created FROM users WHERE id = $1")
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Err(RepositoryError::NotFound);
        };

        Ok(User {
            id: UserId::new(row.try_get("id")?),
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            created: row.try_get("created")?,
        })
    }

    async fn update_password(&self, id: UserId, new_password: &str) -> Result<(), RepositoryError> {
        let hashed = hash_password(new_password).await?;

        let result = sqlx::query("UPDATE users SET hashed_password = $1 WHERE id = $2")
            .bind(hashed)
            .bind(id.as_i64())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
