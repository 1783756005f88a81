//! In-memory stand-ins for the database backed collaborators.
use crate::*;
use async_trait::async_trait;
use confique::Config as _;
use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};
use tokio::sync::Notify;

/// Configuration built from defaults only, whatever the environment says.
pub fn settings() -> Config {
    Config::builder()
        .load()
        .expect("defaults should satisfy every required field")
}

pub struct StaticSchemaSource {
    snapshot: SchemaSnapshot,
}

impl StaticSchemaSource {
    pub fn new(snapshot: SchemaSnapshot) -> Self {
        Self { snapshot }
    }
}

#[async_trait]
impl SchemaSource for StaticSchemaSource {
    async fn fetch_catalog(&self) -> Result<SchemaSnapshot> {
        Ok(self.snapshot.clone())
    }
}

#[derive(Default)]
pub struct FailingSchemaSource {
    calls: AtomicUsize,
}

impl FailingSchemaSource {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SchemaSource for FailingSchemaSource {
    async fn fetch_catalog(&self) -> Result<SchemaSnapshot> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(Error::Connection("connection refused".to_string()))
    }
}

/// Lets a test hold a type check in flight.
#[derive(Default)]
pub struct Gate {
    /// Signalled when a call starts waiting.
    pub entered: Notify,
    /// Lets one waiting call continue.
    pub release: Notify,
}

/// Authority answering from a fixed table of statement text to errors.
#[derive(Default)]
pub struct StaticAuthority {
    errors: HashMap<String, Vec<TypeError>>,
    gate: Option<Arc<Gate>>,
    calls: AtomicUsize,
}

impl StaticAuthority {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_errors(mut self, sql: &str, errors: Vec<TypeError>) -> Self {
        self.errors.insert(sql.to_string(), errors);
        self
    }

    pub fn gated(mut self) -> (Self, Arc<Gate>) {
        let gate = Arc::new(Gate::default());
        self.gate = Some(Arc::clone(&gate));
        (self, gate)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DatabaseAuthority for StaticAuthority {
    async fn validate(&self, sql: &str) -> Result<Vec<TypeError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        Ok(self.errors.get(sql).cloned().unwrap_or_default())
    }
}

#[derive(Default)]
pub struct FailingAuthority {
    calls: AtomicUsize,
}

impl FailingAuthority {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DatabaseAuthority for FailingAuthority {
    async fn validate(&self, _sql: &str) -> Result<Vec<TypeError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(Error::Connection("connection reset".to_string()))
    }
}
