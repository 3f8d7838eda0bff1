//! kindlens host: answers view intents with catalog, schema and instance data.
//!
//! The host owns every external collaborator (the catalog/schema provider and
//! the document opener). The view only ever talks to it through protocol
//! messages, see [`kindlens_core::protocol`].

#![forbid(unsafe_code)]

use std::collections::HashMap;

use kindlens_core::CatalogEntry;
use kindlens_schema::CrdDocument;
use serde::{Deserialize, Serialize};
use serde_json::Value;

mod config;
mod dispatch;
mod cluster;
mod opener;

pub use config::HostConfig;
pub use dispatch::{EventSink, Host};
pub use cluster::KubeCatalog;
pub use opener::{DocumentOpener, EditorOpener};

/// Host errors, serializable so they can be reported to the view verbatim.
#[derive(Debug, thiserror::Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum HostError {
    #[error("not_found: {0}")]
    NotFound(String),
    #[error("validation: {0}")]
    Validation(String),
    #[error("internal: {0}")]
    Internal(String),
}

pub type HostResult<T> = Result<T, HostError>;

/// Catalog and schema source. Implementations may hit the network; the view never does.
#[async_trait::async_trait]
pub trait CatalogProvider: Send + Sync {
    async fn list_entries(&self) -> HostResult<Vec<CatalogEntry>>;

    /// Resolve a catalog key (`group/version/Kind`) into its CRD document.
    async fn get_schema(&self, key: &str) -> HostResult<CrdDocument>;

    async fn list_namespaces(&self) -> HostResult<Vec<String>>;

    async fn list_instances(&self, doc: &CrdDocument, namespace: Option<&str>) -> HostResult<Vec<Value>>;

    async fn get_instance(&self, doc: &CrdDocument, name: &str, namespace: Option<&str>) -> HostResult<Value>;
}

// ----------------- Mock implementation -----------------

/// In-memory provider for tests and demos. CRDs are raw JSON objects; instances
/// are keyed by catalog key.
#[derive(Default, Clone)]
pub struct MockCatalog {
    pub crds: Vec<Value>,
    pub namespaces: Vec<String>,
    pub objects: HashMap<String, Vec<Value>>,
}

impl MockCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_crd(mut self, crd: Value) -> Self {
        self.crds.push(crd);
        self
    }

    pub fn with_namespaces(mut self, namespaces: &[&str]) -> Self {
        self.namespaces = namespaces.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_objects(mut self, key: &str, objects: Vec<Value>) -> Self {
        self.objects.insert(key.to_string(), objects);
        self
    }

    fn docs(&self) -> Vec<CrdDocument> {
        self.crds.iter().filter_map(|c| CrdDocument::from_crd(c, None).ok()).collect()
    }
}

fn in_namespace(obj: &Value, namespace: Option<&str>) -> bool {
    match namespace {
        Some(ns) => obj.pointer("/metadata/namespace").and_then(|v| v.as_str()) == Some(ns),
        None => true,
    }
}

#[async_trait::async_trait]
impl CatalogProvider for MockCatalog {
    async fn list_entries(&self) -> HostResult<Vec<CatalogEntry>> {
        Ok(self.docs().iter().map(|d| d.catalog_entry()).collect())
    }

    async fn get_schema(&self, key: &str) -> HostResult<CrdDocument> {
        self.docs()
            .into_iter()
            .find(|d| d.display_key() == key)
            .ok_or_else(|| HostError::NotFound(format!("no CRD for {}", key)))
    }

    async fn list_namespaces(&self) -> HostResult<Vec<String>> {
        Ok(self.namespaces.clone())
    }

    async fn list_instances(&self, doc: &CrdDocument, namespace: Option<&str>) -> HostResult<Vec<Value>> {
        let all = self.objects.get(&doc.display_key()).cloned().unwrap_or_default();
        Ok(all.into_iter().filter(|o| in_namespace(o, namespace)).collect())
    }

    async fn get_instance(&self, doc: &CrdDocument, name: &str, namespace: Option<&str>) -> HostResult<Value> {
        self.objects
            .get(&doc.display_key())
            .into_iter()
            .flatten()
            .find(|o| {
                o.pointer("/metadata/name").and_then(|v| v.as_str()) == Some(name) && in_namespace(o, namespace)
            })
            .cloned()
            .ok_or_else(|| HostError::NotFound(format!("{} {} not found", doc.kind, name)))
    }
}
