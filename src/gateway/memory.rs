//! In-memory gateway.
//!
//! Stores records per resource, assigns ids, implements keyword search and
//! paging the way the backend does, and records every call so callers can
//! assert exactly which requests were made. Failures can be queued per
//! operation.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use super::{Gateway, GatewayError, Op, Result};
use crate::model::{display_value, Page, Record, RecordId, SearchQuery};
use crate::resources::ResourceSpec;

/// A recorded gateway call.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub op: Op,
    pub resource: String,
    pub id: Option<RecordId>,
    pub query: Option<SearchQuery>,
    pub body: Option<Record>,
}

impl Call {
    fn new(op: Op, spec: &ResourceSpec) -> Self {
        Self {
            op,
            resource: spec.name.clone(),
            id: None,
            query: None,
            body: None,
        }
    }
}

#[derive(Debug, Clone)]
enum Failure {
    Status(u16, String),
    Network,
}

#[derive(Debug, Default)]
struct Store {
    records: HashMap<String, Vec<Record>>,
    next_id: RecordId,
}

impl Store {
    fn assign_id(&mut self) -> RecordId {
        self.next_id += 1;
        self.next_id
    }
}

/// Gateway keeping everything in process memory.
#[derive(Debug, Default)]
pub struct MemoryGateway {
    store: RwLock<Store>,
    calls: RwLock<Vec<Call>>,
    failures: RwLock<HashMap<Op, VecDeque<Failure>>>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a resource with records; records without an id get one.
    pub fn with_records(self, resource: &str, records: Vec<Record>) -> Self {
        {
            let mut store = self.store.write();
            let mut seeded = Vec::with_capacity(records.len());
            for mut record in records {
                match record.persisted_id() {
                    Some(id) => store.next_id = store.next_id.max(id),
                    None => record.id = Some(store.assign_id()),
                }
                seeded.push(record);
            }
            store
                .records
                .entry(resource.to_string())
                .or_default()
                .extend(seeded);
        }
        self
    }

    /// Make the next `op` call fail with the given HTTP status and body.
    pub fn fail_next(&self, op: Op, status: u16, body: impl Into<String>) {
        self.failures
            .write()
            .entry(op)
            .or_default()
            .push_back(Failure::Status(status, body.into()));
    }

    /// Make the next `op` call fail as if the backend were unreachable.
    pub fn fail_next_network(&self, op: Op) {
        self.failures
            .write()
            .entry(op)
            .or_default()
            .push_back(Failure::Network);
    }

    /// Every call made so far, oldest first.
    pub fn calls(&self) -> Vec<Call> {
        self.calls.read().clone()
    }

    /// Calls of one operation.
    pub fn calls_of(&self, op: Op) -> Vec<Call> {
        self.calls.read().iter().filter(|c| c.op == op).cloned().collect()
    }

    pub fn clear_calls(&self) {
        self.calls.write().clear();
    }

    /// Snapshot of a resource's stored records.
    pub fn records(&self, resource: &str) -> Vec<Record> {
        self.store
            .read()
            .records
            .get(resource)
            .cloned()
            .unwrap_or_default()
    }

    fn begin(&self, call: Call, spec: &ResourceSpec) -> Result<()> {
        let op = call.op;
        self.calls.write().push(call);
        let failure = self
            .failures
            .write()
            .get_mut(&op)
            .and_then(|queue| queue.pop_front());
        match failure {
            None => Ok(()),
            Some(Failure::Network) => Err(GatewayError::network(op.action(spec))),
            Some(Failure::Status(status, body)) => Err(GatewayError::from_response(status, &body)),
        }
    }
}

fn matches_keyword(record: &Record, keyword: &str) -> bool {
    if keyword.is_empty() {
        return true;
    }
    let needle = keyword.to_lowercase();
    record
        .fields
        .values()
        .any(|v| display_value(v).to_lowercase().contains(&needle))
}

#[async_trait]
impl Gateway for MemoryGateway {
    async fn list(&self, spec: &ResourceSpec) -> Result<Vec<Record>> {
        self.begin(Call::new(Op::List, spec), spec)?;
        Ok(self.records(&spec.name))
    }

    async fn search(&self, spec: &ResourceSpec, query: &SearchQuery) -> Result<Page<Record>> {
        let mut call = Call::new(Op::Search, spec);
        call.query = Some(query.clone());
        self.begin(call, spec)?;

        let matching: Vec<Record> = self
            .records(&spec.name)
            .into_iter()
            .filter(|r| matches_keyword(r, &query.keyword))
            .collect();
        let total = matching.len() as u64;
        let start = (query.page * query.size) as usize;
        let content = matching
            .into_iter()
            .skip(start)
            .take(query.size as usize)
            .collect();
        Ok(Page::new(content, total, query.page, query.size))
    }

    async fn find(&self, spec: &ResourceSpec, id: RecordId) -> Result<Record> {
        let mut call = Call::new(Op::Find, spec);
        call.id = Some(id);
        self.begin(call, spec)?;
        self.records(&spec.name)
            .into_iter()
            .find(|r| r.persisted_id() == Some(id))
            .ok_or_else(|| GatewayError::NotFound {
                resource: spec.name.clone(),
                id,
            })
    }

    async fn create(&self, spec: &ResourceSpec, record: &Record) -> Result<Record> {
        let mut call = Call::new(Op::Create, spec);
        call.body = Some(record.clone());
        self.begin(call, spec)?;

        let mut store = self.store.write();
        let mut created = record.clone();
        created.id = Some(store.assign_id());
        created.created_at.get_or_insert_with(Utc::now);
        store
            .records
            .entry(spec.name.clone())
            .or_default()
            .push(created.clone());
        Ok(created)
    }

    async fn update(&self, spec: &ResourceSpec, record: &Record) -> Result<Record> {
        let mut call = Call::new(Op::Update, spec);
        call.id = record.persisted_id();
        call.body = Some(record.clone());
        self.begin(call, spec)?;

        let id = record.persisted_id().ok_or_else(|| {
            GatewayError::InvalidRequest(format!("cannot update {} without an id", spec.name))
        })?;
        let mut store = self.store.write();
        let slot = store
            .records
            .get_mut(&spec.name)
            .and_then(|rows| rows.iter_mut().find(|r| r.persisted_id() == Some(id)))
            .ok_or_else(|| GatewayError::NotFound {
                resource: spec.name.clone(),
                id,
            })?;
        let mut updated = record.clone();
        updated.created_at = slot.created_at.or(updated.created_at);
        updated.updated_at = Some(Utc::now());
        *slot = updated.clone();
        Ok(updated)
    }

    async fn delete(&self, spec: &ResourceSpec, id: RecordId) -> Result<()> {
        let mut call = Call::new(Op::Delete, spec);
        call.id = Some(id);
        self.begin(call, spec)?;

        let mut store = self.store.write();
        let rows = store.records.entry(spec.name.clone()).or_default();
        let before = rows.len();
        rows.retain(|r| r.persisted_id() != Some(id));
        if rows.len() == before {
            return Err(GatewayError::NotFound {
                resource: spec.name.clone(),
                id,
            });
        }
        Ok(())
    }

    async fn clear(&self, spec: &ResourceSpec) -> Result<()> {
        self.begin(Call::new(Op::Clear, spec), spec)?;
        self.store.write().records.remove(&spec.name);
        Ok(())
    }
}
