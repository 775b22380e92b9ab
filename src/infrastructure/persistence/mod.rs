pub mod connection;
pub mod memory;
pub mod snippet_repository;
pub mod user_repository;

pub use connection::Database;
pub use memory::{InMemorySnippetRepository, InMemoryUserRepository};
pub use snippet_repository::PostgresSnippetRepository;
pub use user_repository::PostgresUserRepository;
