use async_trait::async_trait;
use thiserror::Error;

use trivia_core::domain::link::LinkRecord;

pub mod link;
pub mod memory;

pub use link::SqlLinkRepository;
pub use memory::InMemoryLinkRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Result of an insert-if-absent against the archive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    AlreadyPresent,
}

impl InsertOutcome {
    pub fn is_inserted(self) -> bool {
        matches!(self, Self::Inserted)
    }
}

/// Durable set of archived links keyed by URL.
///
/// `insert` must be atomic: when two callers race on the same URL exactly
/// one of them observes [`InsertOutcome::Inserted`].
#[async_trait]
pub trait LinkRepository: Send + Sync {
    async fn exists(&self, url: &str) -> Result<bool, RepositoryError>;
    async fn insert(&self, record: &LinkRecord) -> Result<InsertOutcome, RepositoryError>;
    async fn find(&self, url: &str) -> Result<Option<LinkRecord>, RepositoryError>;
    async fn count(&self) -> Result<u64, RepositoryError>;
    async fn list_recent(&self, limit: u32) -> Result<Vec<LinkRecord>, RepositoryError>;
}
