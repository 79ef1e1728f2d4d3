//! Per-resource data access.
//!
//! A `Repository` binds one resource schema to an injected gateway and
//! applies the resource's retry policy. Views and controllers only ever see
//! a repository, so tests swap the backend by handing in a different
//! gateway.

use std::sync::Arc;

use tracing::{debug, info};

use crate::gateway::{Gateway, Op, Result};
use crate::model::{Page, Record, RecordId, SearchQuery};
use crate::resources::ResourceSpec;

/// Data access for one resource.
#[derive(Clone)]
pub struct Repository {
    spec: Arc<ResourceSpec>,
    gateway: Arc<dyn Gateway>,
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("resource", &self.spec.name)
            .finish_non_exhaustive()
    }
}

impl Repository {
    pub fn new(spec: ResourceSpec, gateway: Arc<dyn Gateway>) -> Self {
        Self {
            spec: Arc::new(spec),
            gateway,
        }
    }

    pub fn spec(&self) -> &ResourceSpec {
        &self.spec
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub async fn list(&self) -> Result<Vec<Record>> {
        let items = self
            .spec
            .retry
            .run(Op::List, || self.gateway.list(&self.spec))
            .await?;
        debug!(resource = %self.spec.name, count = items.len(), "listed records");
        Ok(items)
    }

    pub async fn search(&self, query: &SearchQuery) -> Result<Page<Record>> {
        let page = self
            .spec
            .retry
            .run(Op::Search, || self.gateway.search(&self.spec, query))
            .await?;
        debug!(
            resource = %self.spec.name,
            keyword = %query.keyword,
            page = query.page,
            returned = page.content.len(),
            total = page.total_elements,
            "searched records"
        );
        Ok(page)
    }

    pub async fn find(&self, id: RecordId) -> Result<Record> {
        self.spec
            .retry
            .run(Op::Find, || self.gateway.find(&self.spec, id))
            .await
    }

    /// Writes are never retried: a timed-out create may already have landed.
    pub async fn create(&self, record: &Record) -> Result<Record> {
        let created = self.gateway.create(&self.spec, record).await?;
        info!(resource = %self.spec.name, id = ?created.id, "created record");
        Ok(created)
    }

    pub async fn update(&self, record: &Record) -> Result<Record> {
        let updated = self.gateway.update(&self.spec, record).await?;
        info!(resource = %self.spec.name, id = ?updated.id, "updated record");
        Ok(updated)
    }

    pub async fn delete(&self, id: RecordId) -> Result<()> {
        self.gateway.delete(&self.spec, id).await?;
        info!(resource = %self.spec.name, id, "deleted record");
        Ok(())
    }

    pub async fn clear(&self) -> Result<()> {
        self.gateway.clear(&self.spec).await?;
        info!(resource = %self.spec.name, "cleared all records");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{MemoryGateway, RetryPolicy};
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_reads_follow_retry_policy() {
        let gw = Arc::new(MemoryGateway::new());
        gw.fail_next_network(Op::List);
        gw.fail_next_network(Op::List);
        let spec = ResourceSpec::new("avatar-templates", "Avatar templates")
            .with_retry(RetryPolicy::new(3, Duration::from_secs(1)));
        let repo = Repository::new(spec, gw.clone());

        assert!(repo.list().await.is_ok());
        assert_eq!(gw.calls_of(Op::List).len(), 3);
    }

    #[tokio::test]
    async fn test_without_retry_first_failure_is_final() {
        let gw = Arc::new(MemoryGateway::new());
        gw.fail_next_network(Op::List);
        let repo = Repository::new(ResourceSpec::new("tags", "Tags"), gw.clone());

        let err = repo.list().await.unwrap_err();
        assert_eq!(err.to_string(), "failed to load tags");
        assert_eq!(gw.calls_of(Op::List).len(), 1);
    }

    #[tokio::test]
    async fn test_writes_are_not_retried() {
        let gw = Arc::new(MemoryGateway::new());
        gw.fail_next_network(Op::Create);
        let spec = ResourceSpec::new("avatar-templates", "Avatar templates")
            .with_retry(RetryPolicy::new(3, Duration::from_millis(1)));
        let repo = Repository::new(spec, gw.clone());

        assert!(repo.create(&Record::new().with("name", "a")).await.is_err());
        assert_eq!(gw.calls_of(Op::Create).len(), 1);
    }
}
