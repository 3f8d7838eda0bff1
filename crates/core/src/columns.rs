//! Column sets for custom resource instance tables.
//!
//! Instance tables follow the `kubectl get` layout: Namespace (namespaced kinds
//! only), Name, one column per printer column of the CRD, then Age.

#![forbid(unsafe_code)]

use chrono::{DateTime, Utc};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ColumnKind {
    Namespace,
    Name,
    Age,
    /// Index into the CRD's printer columns.
    Printer(usize),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnSpec {
    pub kind: ColumnKind,
    pub label: String,
}

pub const NAMESPACE_LABEL: &str = "Namespace";
pub const NAME_LABEL: &str = "Name";
pub const AGE_LABEL: &str = "Age";

fn col(kind: ColumnKind, label: &str) -> ColumnSpec {
    ColumnSpec { kind, label: label.to_string() }
}

/// Full column set for a custom kind. Printer columns that would shadow the
/// fixed Name/Namespace/Age columns are skipped.
pub fn instance_columns(namespaced: bool, printer_labels: &[String]) -> Vec<ColumnSpec> {
    let mut cols = Vec::with_capacity(printer_labels.len() + 3);
    if namespaced {
        cols.push(col(ColumnKind::Namespace, NAMESPACE_LABEL));
    }
    cols.push(col(ColumnKind::Name, NAME_LABEL));
    for (i, label) in printer_labels.iter().enumerate() {
        let reserved = [NAMESPACE_LABEL, NAME_LABEL, AGE_LABEL]
            .iter()
            .any(|r| r.eq_ignore_ascii_case(label));
        if reserved {
            continue;
        }
        cols.push(col(ColumnKind::Printer(i), label));
    }
    cols.push(col(ColumnKind::Age, AGE_LABEL));
    cols
}

/// Compact age like `3d4h`, `5h2m`, `7m` or `12s`; `-` for unknown timestamps.
pub fn render_age(creation_ts: i64, now_ts: i64) -> String {
    if creation_ts <= 0 {
        return "-".to_string();
    }
    let mut secs = (now_ts - creation_ts).max(0) as u64;
    let days = secs / 86_400;
    secs %= 86_400;
    let hours = secs / 3600;
    secs %= 3600;
    let mins = secs / 60;
    secs %= 60;
    if days > 0 {
        format!("{}d{}h", days, hours)
    } else if hours > 0 {
        format!("{}h{}m", hours, mins)
    } else if mins > 0 {
        format!("{}m", mins)
    } else {
        format!("{}s", secs)
    }
}

/// Age of an RFC 3339 `creationTimestamp`, relative to `now`.
pub fn age_from_rfc3339(ts: &str, now: DateTime<Utc>) -> Option<String> {
    let created = DateTime::parse_from_rfc3339(ts).ok()?;
    Some(render_age(created.timestamp(), now.timestamp()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespaced_layout() {
        let cols = instance_columns(true, &["Ready".to_string(), "Age".to_string()]);
        let labels: Vec<&str> = cols.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["Namespace", "Name", "Ready", "Age"]);
        assert_eq!(cols[2].kind, ColumnKind::Printer(0));
    }

    #[test]
    fn cluster_scoped_layout() {
        let cols = instance_columns(false, &[]);
        let labels: Vec<&str> = cols.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["Name", "Age"]);
    }

    #[test]
    fn ages() {
        assert_eq!(render_age(0, 100), "-");
        assert_eq!(render_age(100, 112), "12s");
        assert_eq!(render_age(100, 100 + 7 * 60 + 5), "7m");
        assert_eq!(render_age(100, 100 + 5 * 3600 + 120), "5h2m");
        assert_eq!(render_age(100, 100 + 3 * 86_400 + 4 * 3600), "3d4h");
    }

    #[test]
    fn rfc3339_age() {
        let now = DateTime::parse_from_rfc3339("2024-01-02T00:00:00Z").unwrap().with_timezone(&Utc);
        assert_eq!(age_from_rfc3339("2024-01-01T00:00:00Z", now).as_deref(), Some("1d0h"));
        assert_eq!(age_from_rfc3339("yesterday", now), None);
    }
}
