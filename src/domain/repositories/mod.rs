use crate::domain::entities::{Snippet, SnippetId, User, UserId};
use async_trait::async_trait;
use thiserror::Error;

/// Maximum number of snippets returned by [`SnippetRepository::latest`]
pub const LATEST_SNIPPETS_LIMIT: usize = 10;

/// Outcomes a record store may report besides success
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("no matching record found")]
    NotFound,

    #[error("email address is already registered")]
    DuplicateEmail,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("internal store error: {message}")]
    Internal { message: String },
}

/// Repository trait for snippet persistence
#[async_trait]
pub trait SnippetRepository: Send + Sync {
    /// Store a new snippet visible for `expires_days` days and return its id
    async fn insert(
        &self,
        title: &str,
        content: &str,
        expires_days: u32,
    ) -> Result<SnippetId, RepositoryError>;

    /// Fetch a non-expired snippet by id
    async fn get(&self, id: SnippetId) -> Result<Snippet, RepositoryError>;

    /// The most recently created non-expired snippets, newest first
    async fn latest(&self) -> Result<Vec<Snippet>, RepositoryError>;
}

/// Repository trait for user accounts
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Register a user, hashing `password`
    async fn insert(&self, name: &str, email: &str, password: &str)
    -> Result<(), RepositoryError>;

    /// Check credentials. Unknown email and wrong password are indistinguishable.
    async fn authenticate(&self, email: &str, password: &str) -> Result<UserId, RepositoryError>;

    /// Fetch a user by id
    async fn get(&self, id: UserId) -> Result<User, RepositoryError>;

    /// Replace the stored password hash
    async fn update_password(&self, id: UserId, new_password: &str)
    -> Result<(), RepositoryError>;
}
