//! Remote gateway
//!
//! The only way the admin client talks to the backend. `Gateway` is the
//! object-safe seam: `HttpGateway` speaks REST over reqwest, `MemoryGateway`
//! keeps records in memory so controllers and views can be exercised
//! without a server.

mod error;
pub mod http;
pub mod memory;

pub use error::{BackendError, DuplicateKey, GatewayError};
pub use http::HttpGateway;
pub use memory::{Call, MemoryGateway};

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::model::{Page, Record, RecordId, SearchQuery};
use crate::resources::ResourceSpec;

/// Result type for gateway operations
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Gateway operation, used for logging, retry decisions and call recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    List,
    Search,
    Find,
    Create,
    Update,
    Delete,
    Clear,
}

impl Op {
    pub fn as_str(&self) -> &'static str {
        match self {
            Op::List => "list",
            Op::Search => "search",
            Op::Find => "find",
            Op::Create => "create",
            Op::Update => "update",
            Op::Delete => "delete",
            Op::Clear => "clear",
        }
    }

    /// User-facing phrase for "failed to ..." messages.
    pub fn action(&self, spec: &ResourceSpec) -> String {
        let verb = match self {
            Op::List | Op::Find => "load",
            Op::Search => "search",
            Op::Create => "create",
            Op::Update => "update",
            Op::Delete => "delete",
            Op::Clear => "clear",
        };
        format!("{} {}", verb, spec.label.to_lowercase())
    }
}

/// Backend access for every resource.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Fetch every record of the resource.
    async fn list(&self, spec: &ResourceSpec) -> Result<Vec<Record>>;

    /// Fetch one page of a server-side keyword search.
    async fn search(&self, spec: &ResourceSpec, query: &SearchQuery) -> Result<Page<Record>>;

    /// Fetch a single record.
    async fn find(&self, spec: &ResourceSpec, id: RecordId) -> Result<Record>;

    /// Create a record; returns the backend's authoritative copy.
    async fn create(&self, spec: &ResourceSpec, record: &Record) -> Result<Record>;

    /// Update a record; returns the backend's authoritative copy.
    async fn update(&self, spec: &ResourceSpec, record: &Record) -> Result<Record>;

    /// Delete one record.
    async fn delete(&self, spec: &ResourceSpec, id: RecordId) -> Result<()>;

    /// Delete every record of the resource.
    async fn clear(&self, spec: &ResourceSpec) -> Result<()>;
}

/// Linear backoff retry: attempt `n` waits `base_delay * n` before the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

impl RetryPolicy {
    pub fn new(attempts: u32, base_delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            base_delay,
        }
    }

    /// Single attempt, no retry.
    pub fn none() -> Self {
        Self {
            attempts: 1,
            base_delay: Duration::ZERO,
        }
    }

    /// Delay after the given (1-based) failed attempt.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }

    /// Run `call` until it succeeds, fails permanently, or attempts run out.
    pub async fn run<T, F, Fut>(&self, op: Op, mut call: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 1;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.attempts => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        op = op.as_str(),
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "gateway call failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
