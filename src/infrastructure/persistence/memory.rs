//! Process-local record stores used when no database is configured.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::{Arc, PoisonError, RwLock};

use crate::domain::entities::{Snippet, SnippetId, User, UserId};
use crate::domain::repositories::{
    LATEST_SNIPPETS_LIMIT, RepositoryError, SnippetRepository, UserRepository,
};
use crate::infrastructure::security::password::{hash_password, verify_password};

/// In-memory `SnippetRepository`
#[derive(Debug, Clone, Default)]
pub struct InMemorySnippetRepository {
    snippets: Arc<RwLock<Vec<Snippet>>>,
}

impl InMemorySnippetRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a fully formed snippet, keeping its id and timestamps
    pub fn seed(&self, snippet: Snippet) {
        self.snippets.write().unwrap_or_else(PoisonError::into_inner).push(snippet);
    }
}

#[async_trait]
impl SnippetRepository for InMemorySnippetRepository {
    async fn insert(
        &self,
        title: &str,
        content: &str,
        expires_days: u32,
    ) -> Result<SnippetId, RepositoryError> {
        let mut snippets = self.snippets.write().unwrap_or_else(PoisonError::into_inner);
        let next = snippets.iter().map(|s| s.id.as_i64()).max().unwrap_or(0) + 1;
        let created = Utc::now();

        let snippet = Snippet {
            id: SnippetId::new(next),
            title: title.to_string(),
            content: content.to_string(),
            created,
            expires: created + Duration::days(i64::from(expires_days)),
        };
        snippets.push(snippet);

        Ok(SnippetId::new(next))
    }

    async fn get(&self, id: SnippetId) -> Result<Snippet, RepositoryError> {
        let snippets = self.snippets.read().unwrap_or_else(PoisonError::into_inner);
        let now = Utc::now();
        snippets
            .iter()
            .find(|s| s.id == id && !s.is_expired_at(now))
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn latest(&self) -> Result<Vec<Snippet>, RepositoryError> {
        let snippets = self.snippets.read().unwrap_or_else(PoisonError::into_inner);
        let now = Utc::now();

        let mut live: Vec<Snippet> =
            snippets.iter().filter(|s| !s.is_expired_at(now)).cloned().collect();
        live.sort_by(|a, b| b.created.cmp(&a.created));
        live.truncate(LATEST_SNIPPETS_LIMIT);

        Ok(live)
    }
}

#[derive(Debug, Clone)]
struct StoredUser {
    user: User,
    hashed_password: String,
}

/// In-memory `UserRepository` with real password hashing
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<Vec<StoredUser>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user and return the assigned id
    pub async fn create(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<UserId, RepositoryError> {
        if self.email_taken(email) {
            return Err(RepositoryError::DuplicateEmail);
        }
        let hashed_password = hash_password(password).await?;

        // Another signup may have claimed the address while hashing.
        let mut users = self.users.write().unwrap_or_else(PoisonError::into_inner);
        if users.iter().any(|stored| stored.user.email == email) {
            return Err(RepositoryError::DuplicateEmail);
        }

        let id = UserId::new(users.iter().map(|s| s.user.id.as_i64()).max().unwrap_or(0) + 1);
        users.push(StoredUser {
            user: User {
                id,
                name: name.to_string(),
                email: email.to_string(),
                created: Utc::now(),
            },
            hashed_password,
        });

        Ok(id)
    }

    /// Forget a user, as if the account had been deleted elsewhere
    pub fn delete(&self, id: UserId) -> bool {
        let mut users = self.users.write().unwrap_or_else(PoisonError::into_inner);
        let before = users.len();
        users.retain(|stored| stored.user.id != id);
        users.len() != before
    }

    fn email_taken(&self, email: &str) -> bool {
        let users = self.users.read().unwrap_or_else(PoisonError::into_inner);
        users.iter().any(|stored| stored.user.email == email)
    }

    fn stored_hash(&self, email: &str) -> Option<(UserId, String)> {
        let users = self.users.read().unwrap_or_else(PoisonError::into_inner);
        users
            .iter()
            .find(|stored| stored.user.email == email)
            .map(|stored| (stored.user.id, stored.hashed_password.clone()))
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn insert(&self, name: &str, email: &str, password: &str) -> Result<(), RepositoryError> {
        self.create(name, email, password).await.map(|_| ())
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<UserId, RepositoryError> {
        let Some((id, hashed)) = self.stored_hash(email) else {
            return Err(RepositoryError::InvalidCredentials);
        };

        if verify_password(password, &hashed).await? {
            Ok(id)
        } else {
            Err(RepositoryError::InvalidCredentials)
        }
    }

    async fn get(&self, id: UserId) -> Result<User, RepositoryError> {
        let users = self.users.read().unwrap_or_else(PoisonError::into_inner);
        users
            .iter()
            .find(|stored| stored.user.id == id)
            .map(|stored| stored.user.clone())
            .ok_or(RepositoryError::NotFound)
    }

    async fn update_password(&self, id: UserId, new_password: &str) -> Result<(), RepositoryError> {
        let hashed_password = hash_password(new_password).await?;

        let mut users = self.users.write().unwrap_or_else(PoisonError::into_inner);
        let stored = users
            .iter_mut()
            .find(|stored| stored.user.id == id)
            .ok_or(RepositoryError::NotFound)?;
        stored.hashed_password = hashed_password;

        Ok(())
    }
}
