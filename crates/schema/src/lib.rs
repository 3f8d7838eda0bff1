//! kindlens schema engine: read CRD documents, build schema trees, project instances into rows.

#![forbid(unsafe_code)]

use kindlens_core::CatalogEntry;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

mod project;
pub mod tree;

pub use project::InstanceProjector;
pub use tree::{build_tree, SchemaSource, TreeBuilder, DEFAULT_MAX_DEPTH};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("CRD is missing {0}")]
    MissingField(&'static str),
    #[error("invalid resource key: {0} (expect group/version/Kind)")]
    InvalidKey(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrinterCol {
    pub name: String,
    pub json_path: String,
}

/// The parts of a CustomResourceDefinition the browser cares about, resolved
/// for a single served version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrdDocument {
    pub group: String,
    pub kind: String,
    pub plural: String,
    pub served_version: String,
    pub namespaced: bool,
    pub description: Option<String>,
    /// `openAPIV3Schema` of the served version, when the CRD publishes one.
    pub schema: Option<Value>,
    pub printer_cols: Vec<PrinterCol>,
}

/// Split `group/version/Kind` (or `version/Kind` for the core group).
pub fn parse_resource_key(key: &str) -> Result<(&str, &str, &str), SchemaError> {
    let parts: Vec<_> = key.split('/').collect();
    match parts.as_slice() {
        [version, kind] if !version.is_empty() && !kind.is_empty() => Ok(("", *version, *kind)),
        [group, version, kind] if !version.is_empty() && !kind.is_empty() => Ok((*group, *version, *kind)),
        _ => Err(SchemaError::InvalidKey(key.to_string())),
    }
}

/// Accept only simple paths like `.spec.foo.bar[0]`; returns the path without the leading dot.
fn normalize_json_path(jp: &str) -> Option<String> {
    if jp.contains('?') || jp.contains('*') {
        return None;
    }
    let s = jp.strip_prefix('.').unwrap_or(jp);
    if s.is_empty() {
        return None;
    }
    for seg in s.split('.') {
        let (key, index) = match seg.find('[') {
            Some(open) => {
                let inner = seg[open + 1..].strip_suffix(']')?;
                (&seg[..open], Some(inner))
            }
            None => (seg, None),
        };
        if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
            return None;
        }
        if let Some(idx) = index {
            if idx.is_empty() || !idx.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
        }
    }
    Some(s.to_string())
}

fn str_at<'a>(v: &'a Value, ptr: &str) -> Option<&'a str> {
    v.pointer(ptr).and_then(|s| s.as_str())
}

fn printer_cols_from(cols: Option<&Value>) -> Vec<PrinterCol> {
    let mut out = Vec::new();
    for c in cols.and_then(|c| c.as_array()).into_iter().flatten() {
        let name = c.get("name").and_then(|s| s.as_str()).unwrap_or("");
        let raw = c.get("jsonPath").and_then(|s| s.as_str()).unwrap_or("");
        if name.is_empty() {
            continue;
        }
        match normalize_json_path(raw) {
            Some(jp) => out.push(PrinterCol { name: name.to_string(), json_path: jp }),
            None => tracing::debug!(column = %name, path = %raw, "skipping unsupported printer column path"),
        }
    }
    out
}

impl CrdDocument {
    /// Read a CRD object (as JSON). `requested` picks a version when it is served;
    /// otherwise the storage version wins, then the first served one.
    pub fn from_crd(crd: &Value, requested: Option<&str>) -> Result<Self, SchemaError> {
        let spec = crd.get("spec").ok_or(SchemaError::MissingField("spec"))?;
        let group = str_at(spec, "/group").ok_or(SchemaError::MissingField("spec.group"))?;
        let kind = str_at(spec, "/names/kind").ok_or(SchemaError::MissingField("spec.names.kind"))?;
        let plural = str_at(spec, "/names/plural").unwrap_or_default();
        let namespaced = str_at(spec, "/scope").map(|s| s == "Namespaced").unwrap_or(true);
        let versions = spec.get("versions").and_then(|v| v.as_array()).cloned().unwrap_or_default();

        let flag = |ver: &Value, key: &str| ver.get(key).and_then(|b| b.as_bool()).unwrap_or(false);
        let name_of = |ver: &Value| ver.get("name").and_then(|s| s.as_str()).map(str::to_string);
        let chosen = requested
            .and_then(|r| versions.iter().find(|v| flag(*v, "served") && name_of(*v).as_deref() == Some(r)))
            .or_else(|| versions.iter().find(|v| flag(*v, "storage")))
            .or_else(|| versions.iter().find(|v| flag(*v, "served")))
            .or_else(|| versions.first());
        let served_version = chosen
            .and_then(name_of)
            .or_else(|| str_at(spec, "/version").map(str::to_string))
            .ok_or(SchemaError::MissingField("spec.versions"))?;

        let schema = chosen
            .and_then(|v| v.pointer("/schema/openAPIV3Schema"))
            .or_else(|| spec.pointer("/validation/openAPIV3Schema"))
            .cloned();
        let description = schema
            .as_ref()
            .and_then(|s| s.get("description"))
            .and_then(|d| d.as_str())
            .map(str::to_string);

        // v1beta1 CRDs keep printer columns at the top level of the spec
        let mut printer_cols = printer_cols_from(chosen.and_then(|v| v.get("additionalPrinterColumns")));
        if printer_cols.is_empty() {
            printer_cols = printer_cols_from(spec.get("additionalPrinterColumns"));
        }

        Ok(Self {
            group: group.to_string(),
            kind: kind.to_string(),
            plural: plural.to_string(),
            served_version,
            namespaced,
            description,
            schema,
            printer_cols,
        })
    }

    pub fn display_key(&self) -> String {
        if self.group.is_empty() {
            format!("{}/{}", self.served_version, self.kind)
        } else {
            format!("{}/{}/{}", self.group, self.served_version, self.kind)
        }
    }

    pub fn catalog_entry(&self) -> CatalogEntry {
        CatalogEntry { display_key: self.display_key(), kind: self.kind.clone(), description: self.description.clone() }
    }

    pub fn projector(&self) -> InstanceProjector {
        InstanceProjector::new(self.namespaced, self.printer_cols.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_json_path_accepts_simple_paths() {
        assert_eq!(normalize_json_path(".spec.foo"), Some("spec.foo".to_string()));
        assert_eq!(normalize_json_path("spec.dnsNames[0]"), Some("spec.dnsNames[0]".to_string()));
        assert!(normalize_json_path("").is_none());
        assert!(normalize_json_path("spec.*").is_none());
        assert!(normalize_json_path("spec.foo[0][1]").is_none());
        assert!(normalize_json_path(".status.conditions[?(@.type==\"Ready\")].status").is_none());
        assert!(normalize_json_path("spec..foo").is_none());
    }

    #[test]
    fn resource_keys() {
        assert_eq!(parse_resource_key("example.com/v1/Widget").unwrap(), ("example.com", "v1", "Widget"));
        assert_eq!(parse_resource_key("v1/Pod").unwrap(), ("", "v1", "Pod"));
        assert!(parse_resource_key("Widget").is_err());
        assert!(parse_resource_key("a/b/c/d").is_err());
    }
}
