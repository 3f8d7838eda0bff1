//! kindlens core types shared by the schema engine, the host and the view.

#![forbid(unsafe_code)]

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

pub mod columns;
pub mod protocol;

/// A selectable resource type exposed to the user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    /// Value sent back to the host to request details (`group/version/Kind`).
    pub display_key: String,
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Scalar-or-null table cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum Cell {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Cell {
    /// Lift a JSON value into a cell. Composite values are kept as compact JSON text.
    pub fn from_json(v: &serde_json::Value) -> Self {
        use serde_json::Value;
        match v {
            Value::Null => Cell::Null,
            Value::Bool(b) => Cell::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Cell::Int(i),
                None => n.as_f64().map(Cell::Float).unwrap_or(Cell::Null),
            },
            Value::String(s) => Cell::Text(s.clone()),
            other => Cell::Text(other.to_string()),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Int(i) => Some(*i as f64),
            Cell::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    /// Sort order: numeric when both sides are numbers, lexicographic on the
    /// rendered text otherwise. Null renders as the empty string.
    pub fn sort_cmp(&self, other: &Cell) -> Ordering {
        match (self.as_number(), other.as_number()) {
            (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
            _ => self.to_string().cmp(&other.to_string()),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => Ok(()),
            Cell::Bool(b) => write!(f, "{}", b),
            Cell::Int(i) => write!(f, "{}", i),
            Cell::Float(x) => write!(f, "{}", x),
            Cell::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<i64> for Cell {
    fn from(i: i64) -> Self {
        Cell::Int(i)
    }
}

/// One result row, positionally aligned to the current column list.
pub type ResultRow = Vec<Cell>;

/// A node of the rendered schema tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SchemaNode {
    /// Property key, or a section name (`spec`, `status`, `schema`) at the top level.
    pub name: String,
    /// Declared type, `object` when only properties are present, empty when unknown.
    pub node_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SchemaNode>,
    /// Set when traversal gave up on this node (depth bound exceeded).
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub unrenderable: bool,
}

impl SchemaNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Depth-first search by name, mostly useful in tests and the CLI.
    pub fn find(&self, name: &str) -> Option<&SchemaNode> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_compare_numerically() {
        assert_eq!(Cell::Int(9).sort_cmp(&Cell::Int(10)), Ordering::Less);
        assert_eq!(Cell::Float(2.5).sort_cmp(&Cell::Int(2)), Ordering::Greater);
    }

    #[test]
    fn mixed_values_compare_as_text() {
        // "10" < "9" lexicographically once one side is not numeric
        assert_eq!(Cell::Int(10).sort_cmp(&Cell::from("9")), Ordering::Less);
        assert_eq!(Cell::Null.sort_cmp(&Cell::from("a")), Ordering::Less);
        assert_eq!(Cell::Null.sort_cmp(&Cell::from("")), Ordering::Equal);
    }

    #[test]
    fn cells_deserialize_from_plain_json() {
        let row: ResultRow = serde_json::from_str(r#"["a", 1, 1.5, true, null]"#).unwrap();
        assert_eq!(
            row,
            vec![Cell::from("a"), Cell::Int(1), Cell::Float(1.5), Cell::Bool(true), Cell::Null]
        );
        assert_eq!(serde_json::to_string(&row).unwrap(), r#"["a",1,1.5,true,null]"#);
    }

    #[test]
    fn composite_json_becomes_text() {
        let c = Cell::from_json(&serde_json::json!(["x", "y"]));
        assert_eq!(c, Cell::Text("[\"x\",\"y\"]".into()));
        assert_eq!(Cell::Null.to_string(), "");
    }
}
