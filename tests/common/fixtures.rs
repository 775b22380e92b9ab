use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use snippetbox::domain::entities::{Snippet, SnippetId, User, UserId};
use snippetbox::domain::repositories::{RepositoryError, SnippetRepository, UserRepository};
use snippetbox::infrastructure::persistence::{InMemorySnippetRepository, InMemoryUserRepository};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Snippet store that records how often it was written to
#[derive(Debug, Default)]
pub struct CountingSnippetRepository {
    pub inner: InMemorySnippetRepository,
    inserts: AtomicUsize,
}

impl CountingSnippetRepository {
    pub fn insert_calls(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SnippetRepository for CountingSnippetRepository {
    async fn insert(
        &self,
        title: &str,
        content: &str,
        expires_days: u32,
    ) -> Result<SnippetId, RepositoryError> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        self.inner.insert(title, content, expires_days).await
    }

    async fn get(&self, id: SnippetId) -> Result<Snippet, RepositoryError> {
        self.inner.get(id).await
    }

    async fn latest(&self) -> Result<Vec<Snippet>, RepositoryError> {
        self.inner.latest().await
    }
}

/// User store that records inserts, lookups and credential checks
#[derive(Debug, Default)]
pub struct CountingUserRepository {
    pub inner: InMemoryUserRepository,
    inserts: AtomicUsize,
    gets: AtomicUsize,
    authentications: AtomicUsize,
}

impl CountingUserRepository {
    pub fn insert_calls(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }

    pub fn get_calls(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn authenticate_calls(&self) -> usize {
        self.authentications.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UserRepository for CountingUserRepository {
    async fn insert(&self, name: &str, email: &str, password: &str) -> Result<(), RepositoryError> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        self.inner.insert(name, email, password).await
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<UserId, RepositoryError> {
        self.authentications.fetch_add(1, Ordering::SeqCst);
        self.inner.authenticate(email, password).await
    }

    async fn get(&self, id: UserId) -> Result<User, RepositoryError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get(id).await
    }

    async fn update_password(&self, id: UserId, new_password: &str) -> Result<(), RepositoryError> {
        self.inner.update_password(id, new_password).await
    }
}

/// A snippet created `age` ago that expires at `expires`
pub fn snippet(id: i64, title: &str, age: Duration, expires: DateTime<Utc>) -> Snippet {
    Snippet {
        id: SnippetId::new(id),
        title: title.to_string(),
        content: format!("{title}\n\nfirst line\nsecond line"),
        created: Utc::now() - age,
        expires,
    }
}
