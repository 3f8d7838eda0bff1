//! Schema tree model: a pure depth-first transformation from a schema document
//! into [`SchemaNode`]s.
//!
//! The builder works over the [`SchemaSource`] capability trait rather than a
//! concrete JSON shape. Sources must iterate properties in declaration order,
//! which is why CRDs are fed in as raw `serde_json::Value`.

use kindlens_core::SchemaNode;
use serde_json::Value;

/// Sections promoted to top-level tree nodes when the document declares them.
pub const SECTIONS: [&str; 2] = ["spec", "status"];

/// Name of the synthetic section wrapping documents without spec/status.
pub const WHOLE_SCHEMA: &str = "schema";

pub const DEFAULT_MAX_DEPTH: usize = 32;

/// What the tree builder needs to know about one schema node.
pub trait SchemaSource {
    /// Property map in iteration order, empty when the node declares none.
    fn properties(&self) -> Vec<(&str, &Self)>;
    /// Whether the node carries a property map at all (an empty map still counts).
    fn has_properties(&self) -> bool;
    /// Single item schema of an array node.
    fn item_schema(&self) -> Option<&Self>;
    fn declared_type(&self) -> Option<&str>;
    fn description(&self) -> Option<&str>;
    fn required_fields(&self) -> Vec<&str>;
}

impl SchemaSource for Value {
    fn properties(&self) -> Vec<(&str, &Self)> {
        match self.get("properties").and_then(|p| p.as_object()) {
            Some(map) => map.iter().map(|(k, v)| (k.as_str(), v)).collect(),
            None => Vec::new(),
        }
    }

    fn has_properties(&self) -> bool {
        self.get("properties").map(|p| p.is_object()).unwrap_or(false)
    }

    fn item_schema(&self) -> Option<&Self> {
        self.get("items").filter(|i| i.is_object())
    }

    fn declared_type(&self) -> Option<&str> {
        self.get("type").and_then(|t| t.as_str())
    }

    fn description(&self) -> Option<&str> {
        self.get("description").and_then(|d| d.as_str())
    }

    fn required_fields(&self) -> Vec<&str> {
        self.get("required")
            .and_then(|r| r.as_array())
            .map(|arr| arr.iter().filter_map(|s| s.as_str()).collect())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TreeBuilder {
    max_depth: usize,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self { max_depth: DEFAULT_MAX_DEPTH }
    }
}

/// Build the tree with the default depth bound.
pub fn build_tree<S: SchemaSource>(doc: &S) -> Vec<SchemaNode> {
    TreeBuilder::default().build(doc)
}

impl TreeBuilder {
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth: max_depth.max(1) }
    }

    /// Top-level sections (`spec`, `status`) in declaration order, or a single
    /// `schema` node wrapping the whole document.
    pub fn build<S: SchemaSource>(&self, doc: &S) -> Vec<SchemaNode> {
        let required = doc.required_fields();
        let sections: Vec<SchemaNode> = doc
            .properties()
            .into_iter()
            .filter(|(name, _)| SECTIONS.contains(name))
            .map(|(name, s)| self.node(name, s, required.contains(&name), 0))
            .collect();
        if sections.is_empty() {
            return vec![self.node(WHOLE_SCHEMA, doc, false, 0)];
        }
        sections
    }

    fn node<S: SchemaSource>(&self, name: &str, s: &S, required: bool, depth: usize) -> SchemaNode {
        if depth >= self.max_depth {
            tracing::debug!(node = %name, depth, "schema depth bound reached; rendering opaque leaf");
            return SchemaNode { name: name.to_string(), required, unrenderable: true, ..Default::default() };
        }
        let node_type = match s.declared_type() {
            Some(t) => t.to_string(),
            None if s.has_properties() => "object".to_string(),
            None => String::new(),
        };
        SchemaNode {
            name: name.to_string(),
            node_type,
            description: s.description().map(str::to_string),
            required,
            children: self.children(s, depth),
            unrenderable: false,
        }
    }

    fn children<S: SchemaSource>(&self, s: &S, depth: usize) -> Vec<SchemaNode> {
        let owner = if s.has_properties() {
            s
        } else if let Some(item) = object_items(s) {
            // array of objects: the item's properties hang directly off this node
            item
        } else {
            return Vec::new();
        };
        let required = owner.required_fields();
        owner
            .properties()
            .into_iter()
            .map(|(name, child)| self.node(name, child, required.contains(&name), depth + 1))
            .collect()
    }
}

fn object_items<S: SchemaSource>(s: &S) -> Option<&S> {
    if s.declared_type() != Some("array") {
        return None;
    }
    let item = s.item_schema()?;
    let is_object = item.declared_type() == Some("object") || (item.declared_type().is_none() && item.has_properties());
    is_object.then_some(item)
}
