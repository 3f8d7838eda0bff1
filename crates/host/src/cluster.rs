use std::time::Instant;

use kindlens_core::CatalogEntry;
use kindlens_kubehub::ObjectTarget;
use kindlens_schema::{parse_resource_key, CrdDocument};
use serde_json::Value;
use tracing::{info, warn};

use crate::{CatalogProvider, HostError, HostResult};

/// Provider backed by the cluster from the ambient kubeconfig.
#[derive(Default)]
pub struct KubeCatalog;

impl KubeCatalog {
    pub fn new() -> Self {
        Self
    }

    fn map_err(e: anyhow::Error) -> HostError {
        HostError::Internal(format!("{:#}", e))
    }

    fn target(doc: &CrdDocument) -> ObjectTarget {
        ObjectTarget {
            group: doc.group.clone(),
            version: doc.served_version.clone(),
            kind: doc.kind.clone(),
            plural: doc.plural.clone(),
            namespaced: doc.namespaced,
        }
    }
}

#[async_trait::async_trait]
impl CatalogProvider for KubeCatalog {
    async fn list_entries(&self) -> HostResult<Vec<CatalogEntry>> {
        let crds = kindlens_kubehub::list_crds().await.map_err(Self::map_err)?;
        let mut entries = Vec::with_capacity(crds.len());
        for crd in &crds {
            match CrdDocument::from_crd(crd, None) {
                Ok(doc) => entries.push(doc.catalog_entry()),
                Err(e) => {
                    let name = crd.pointer("/metadata/name").and_then(|s| s.as_str()).unwrap_or("?");
                    warn!(crd = %name, error = %e, "host: skipping unreadable CRD");
                }
            }
        }
        entries.sort_by(|a, b| a.display_key.cmp(&b.display_key));
        Ok(entries)
    }

    async fn get_schema(&self, key: &str) -> HostResult<CrdDocument> {
        let t0 = Instant::now();
        let (group, version, kind) =
            parse_resource_key(key).map_err(|e| HostError::Validation(e.to_string()))?;
        if group.is_empty() {
            return Err(HostError::NotFound(format!("{} is a built-in kind without a CRD", key)));
        }
        let crd = kindlens_kubehub::find_crd(group, kind)
            .await
            .map_err(Self::map_err)?
            .ok_or_else(|| HostError::NotFound(format!("CRD not found for {}", key)))?;
        let doc = CrdDocument::from_crd(&crd, Some(version)).map_err(|e| HostError::Internal(e.to_string()))?;
        info!(key = %key, version = %doc.served_version, took_ms = %t0.elapsed().as_millis(), "host: schema resolved");
        Ok(doc)
    }

    async fn list_namespaces(&self) -> HostResult<Vec<String>> {
        kindlens_kubehub::list_namespaces().await.map_err(Self::map_err)
    }

    async fn list_instances(&self, doc: &CrdDocument, namespace: Option<&str>) -> HostResult<Vec<Value>> {
        kindlens_kubehub::list_objects(&Self::target(doc), namespace)
            .await
            .map_err(Self::map_err)
    }

    async fn get_instance(&self, doc: &CrdDocument, name: &str, namespace: Option<&str>) -> HostResult<Value> {
        if doc.namespaced && namespace.is_none() {
            return Err(HostError::Validation("namespace required for namespaced kind".into()));
        }
        kindlens_kubehub::get_object(&Self::target(doc), name, namespace)
            .await
            .map_err(Self::map_err)
    }
}
