#![allow(dead_code)]

pub mod fixtures;
pub mod test_app;

pub use fixtures::{CountingSnippetRepository, CountingUserRepository, snippet};
pub use test_app::{TestApp, TestClient, TestResponse};
