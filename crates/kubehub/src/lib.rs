//! kindlens kubehub: thin kube-rs wiring for CRDs, namespaces and custom objects.

#![forbid(unsafe_code)]

use std::sync::OnceLock;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use k8s_openapi::api::core::v1::Namespace;
use kube::{
    api::{Api, ListParams},
    core::{ApiResource, DynamicObject, GroupVersionKind},
    Client, ResourceExt,
};
use tracing::{debug, info};

static CLIENT: OnceLock<Client> = OnceLock::new();

/// Shared client built from the ambient kubeconfig / in-cluster config.
pub async fn get_kube_client() -> Result<Client> {
    if let Some(c) = CLIENT.get() {
        return Ok(c.clone());
    }
    let client = Client::try_default().await.context("building kube client")?;
    // a concurrent initialiser may have won; either client is fine
    let _ = CLIENT.set(client.clone());
    Ok(client)
}

/// Addressing information for one custom kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectTarget {
    pub group: String,
    pub version: String,
    pub kind: String,
    pub plural: String,
    pub namespaced: bool,
}

impl ObjectTarget {
    fn api_resource(&self) -> ApiResource {
        let gvk = GroupVersionKind::gvk(&self.group, &self.version, &self.kind);
        if self.plural.is_empty() {
            ApiResource::from_gvk(&gvk)
        } else {
            ApiResource::from_gvk_with_plural(&gvk, &self.plural)
        }
    }

    fn api(&self, client: Client, namespace: Option<&str>) -> Api<DynamicObject> {
        let ar = self.api_resource();
        match (self.namespaced, namespace) {
            (true, Some(ns)) => Api::namespaced_with(client, ns, &ar),
            _ => Api::all_with(client, &ar),
        }
    }
}

fn strip_managed_fields(v: &mut serde_json::Value) {
    if let Some(meta) = v.get_mut("metadata").and_then(|m| m.as_object_mut()) {
        meta.remove("managedFields");
    }
}

/// CRDs are read untyped: the typed k8s-openapi model keeps schema properties
/// in a `BTreeMap`, which loses the server's declaration order.
fn crd_resource() -> ApiResource {
    let gvk = GroupVersionKind::gvk("apiextensions.k8s.io", "v1", "CustomResourceDefinition");
    ApiResource::from_gvk_with_plural(&gvk, "customresourcedefinitions")
}

fn crd_to_raw(obj: &DynamicObject) -> Result<serde_json::Value> {
    let mut raw = serde_json::to_value(obj).context("serializing CustomResourceDefinition")?;
    strip_managed_fields(&mut raw);
    Ok(raw)
}

/// All CRDs as raw JSON, ordered by name.
pub async fn list_crds() -> Result<Vec<serde_json::Value>> {
    let t0 = Instant::now();
    let client = get_kube_client().await?;
    let api: Api<DynamicObject> = Api::all_with(client, &crd_resource());
    let crds = api.list(&ListParams::default()).await.context("listing CustomResourceDefinitions")?;
    let mut out = Vec::with_capacity(crds.items.len());
    for crd in crds.iter() {
        out.push(crd_to_raw(crd)?);
    }
    out.sort_by(|a, b| {
        let name = |v: &serde_json::Value| v.pointer("/metadata/name").and_then(|s| s.as_str()).unwrap_or("").to_string();
        name(a).cmp(&name(b))
    });
    info!(count = out.len(), took_ms = %t0.elapsed().as_millis(), "kubehub: crds listed");
    Ok(out)
}

/// Find the CRD serving `group` + `kind`, robust across discovery quirks.
pub async fn find_crd(group: &str, kind: &str) -> Result<Option<serde_json::Value>> {
    for v in list_crds().await? {
        let g = v.pointer("/spec/group").and_then(|s| s.as_str()).unwrap_or("");
        let k = v.pointer("/spec/names/kind").and_then(|s| s.as_str()).unwrap_or("");
        if g == group && k == kind {
            return Ok(Some(v));
        }
    }
    debug!(group = %group, kind = %kind, "kubehub: crd not found");
    Ok(None)
}

pub async fn list_namespaces() -> Result<Vec<String>> {
    let client = get_kube_client().await?;
    let api: Api<Namespace> = Api::all(client);
    let list = api.list(&ListParams::default()).await.context("listing namespaces")?;
    let mut names: Vec<String> = list.into_iter().map(|ns| ns.name_any()).collect();
    names.sort();
    Ok(names)
}

/// List custom objects of one kind, optionally restricted to a namespace.
pub async fn list_objects(target: &ObjectTarget, namespace: Option<&str>) -> Result<Vec<serde_json::Value>> {
    let t0 = Instant::now();
    let client = get_kube_client().await?;
    let api = target.api(client, namespace);
    let list = api
        .list(&ListParams::default())
        .await
        .with_context(|| format!("listing {}/{}", target.group, target.plural))?;
    let mut out = Vec::with_capacity(list.items.len());
    for obj in list {
        let mut raw = serde_json::to_value(&obj).context("serializing DynamicObject")?;
        strip_managed_fields(&mut raw);
        out.push(raw);
    }
    info!(kind = %target.kind, ns = ?namespace, items = out.len(), took_ms = %t0.elapsed().as_millis(), "kubehub: objects listed");
    Ok(out)
}

pub async fn get_object(target: &ObjectTarget, name: &str, namespace: Option<&str>) -> Result<serde_json::Value> {
    if target.namespaced && namespace.is_none() {
        return Err(anyhow!("namespace required for namespaced kind {}", target.kind));
    }
    let client = get_kube_client().await?;
    let obj = target
        .api(client, namespace)
        .get(name)
        .await
        .with_context(|| format!("getting {} {}", target.kind, name))?;
    let mut raw = serde_json::to_value(&obj).context("serializing DynamicObject")?;
    strip_managed_fields(&mut raw);
    Ok(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn managed_fields_are_stripped() {
        let mut v = serde_json::json!({"metadata": {"name": "a", "managedFields": [{}]}});
        strip_managed_fields(&mut v);
        assert_eq!(v, serde_json::json!({"metadata": {"name": "a"}}));
    }

    #[test]
    fn api_resource_uses_plural() {
        let t = ObjectTarget {
            group: "example.com".into(),
            version: "v1".into(),
            kind: "Widget".into(),
            plural: "widgetz".into(),
            namespaced: true,
        };
        let ar = t.api_resource();
        assert_eq!(ar.plural, "widgetz");
        assert_eq!(ar.api_version, "example.com/v1");
    }

    #[test]
    fn crd_resource_addresses_apiextensions() {
        let ar = crd_resource();
        assert_eq!(ar.api_version, "apiextensions.k8s.io/v1");
        assert_eq!(ar.plural, "customresourcedefinitions");
    }

    #[test]
    fn crd_schema_keeps_server_property_order() {
        let wire = serde_json::json!({
            "apiVersion": "apiextensions.k8s.io/v1",
            "kind": "CustomResourceDefinition",
            "metadata": {"name": "widgets.example.com", "managedFields": [{}]},
            "spec": {
                "group": "example.com",
                "names": {"kind": "Widget", "plural": "widgets"},
                "scope": "Namespaced",
                "versions": [{"name": "v1", "served": true, "storage": true, "schema": {"openAPIV3Schema": {
                    "type": "object",
                    "properties": {"spec": {"type": "object", "properties": {
                        "zeta": {"type": "string"}, "alpha": {"type": "integer"}, "mid": {"type": "boolean"}
                    }}}
                }}}]
            }
        });
        let obj: DynamicObject = serde_json::from_value(wire).unwrap();
        let raw = crd_to_raw(&obj).unwrap();
        assert!(raw.pointer("/metadata/managedFields").is_none());

        let doc = kindlens_schema::CrdDocument::from_crd(&raw, None).unwrap();
        let tree = kindlens_schema::build_tree(doc.schema.as_ref().unwrap());
        let names: Vec<&str> = tree[0].children.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }
}
