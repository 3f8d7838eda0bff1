use chrono::{DateTime, Utc};
use kindlens_core::columns::{age_from_rfc3339, instance_columns, ColumnKind, ColumnSpec};
use kindlens_core::{Cell, ResultRow};
use serde_json::Value;

use crate::PrinterCol;

/// Turns raw custom objects into table rows following the CRD's printer columns.
#[derive(Debug, Clone)]
pub struct InstanceProjector {
    columns: Vec<ColumnSpec>,
    printer: Vec<PrinterCol>,
}

impl InstanceProjector {
    pub fn new(namespaced: bool, printer: Vec<PrinterCol>) -> Self {
        let labels: Vec<String> = printer.iter().map(|p| p.name.clone()).collect();
        Self { columns: instance_columns(namespaced, &labels), printer }
    }

    pub fn column_labels(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.label.clone()).collect()
    }

    pub fn project(&self, raw: &Value, now: DateTime<Utc>) -> ResultRow {
        self.columns
            .iter()
            .map(|col| match &col.kind {
                ColumnKind::Namespace => text_at(raw, "/metadata/namespace"),
                ColumnKind::Name => text_at(raw, "/metadata/name"),
                ColumnKind::Age => raw
                    .pointer("/metadata/creationTimestamp")
                    .and_then(|v| v.as_str())
                    .and_then(|ts| age_from_rfc3339(ts, now))
                    .map(Cell::Text)
                    .unwrap_or(Cell::Null),
                ColumnKind::Printer(i) => self
                    .printer
                    .get(*i)
                    .and_then(|p| extract_path(raw, &p.json_path))
                    .map(Cell::from_json)
                    .unwrap_or(Cell::Null),
            })
            .collect()
    }
}

fn text_at(raw: &Value, ptr: &str) -> Cell {
    raw.pointer(ptr).map(Cell::from_json).unwrap_or(Cell::Null)
}

/// Follow a normalised printer path: dot fields and an optional `[index]` per
/// segment, e.g. `spec.dnsNames[0]`.
fn extract_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut cur = root;
    for seg in path.split('.') {
        let (key, idx) = match seg.find('[') {
            Some(open) => {
                let idx: usize = seg[open + 1..].strip_suffix(']')?.parse().ok()?;
                (&seg[..open], Some(idx))
            }
            None => (seg, None),
        };
        cur = cur.as_object()?.get(key)?;
        if let Some(i) = idx {
            cur = cur.as_array()?.get(i)?;
        }
    }
    Some(cur)
}
