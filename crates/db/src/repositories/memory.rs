use std::collections::HashMap;

use tokio::sync::RwLock;

use trivia_core::domain::link::LinkRecord;

use super::{InsertOutcome, LinkRepository, RepositoryError};

#[derive(Default)]
pub struct InMemoryLinkRepository {
    links: RwLock<HashMap<String, LinkRecord>>,
}

impl InMemoryLinkRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl LinkRepository for InMemoryLinkRepository {
    async fn exists(&self, url: &str) -> Result<bool, RepositoryError> {
        let links = self.links.read().await;
        Ok(links.contains_key(url))
    }

    async fn insert(&self, record: &LinkRecord) -> Result<InsertOutcome, RepositoryError> {
        let mut links = self.links.write().await;
        if links.contains_key(&record.url) {
            return Ok(InsertOutcome::AlreadyPresent);
        }
        links.insert(record.url.clone(), record.clone());
        Ok(InsertOutcome::Inserted)
    }

    async fn find(&self, url: &str) -> Result<Option<LinkRecord>, RepositoryError> {
        let links = self.links.read().await;
        Ok(links.get(url).cloned())
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        let links = self.links.read().await;
        Ok(links.len() as u64)
    }

    async fn list_recent(&self, limit: u32) -> Result<Vec<LinkRecord>, RepositoryError> {
        let links = self.links.read().await;
        let mut records: Vec<LinkRecord> = links.values().cloned().collect();
        records.sort_by(|left, right| {
            right.captured_at.cmp(&left.captured_at).then_with(|| left.url.cmp(&right.url))
        });
        records.truncate(limit as usize);
        Ok(records)
    }
}
