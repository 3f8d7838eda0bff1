//! Table renderer: turns a [`TableState`] into header, filter and body rows that a
//! front-end paints as-is. Shape changes rebuild everything; data refreshes,
//! sorts and filter edits only rebuild the body (and sort indicators).

use kindlens_core::columns::{NAMESPACE_LABEL, NAME_LABEL};
use kindlens_core::protocol::Intent;
use kindlens_core::ResultRow;

use crate::table::{Ingest, TableState};

pub const ACTIONS_LABEL: &str = "Actions";
pub const OPEN_YAML: &str = "Open YAML";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortIndicator {
    Ascending,
    Descending,
}

impl SortIndicator {
    pub fn glyph(self) -> &'static str {
        match self {
            SortIndicator::Ascending => "↑",
            SortIndicator::Descending => "↓",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderCell {
    pub index: usize,
    pub label: String,
    pub sort: Option<SortIndicator>,
}

impl HeaderCell {
    pub fn text(&self) -> String {
        match self.sort {
            Some(ind) => format!("{} {}", self.label, ind.glyph()),
            None => self.label.clone(),
        }
    }
}

/// One row-scoped operation. Carries the intent it emits, built from the row's
/// identifying cells, so it stays valid across sorting and filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowAction {
    pub label: &'static str,
    pub intent: Intent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyRow {
    /// Index into the model's canonical rows.
    pub source: usize,
    pub cells: Vec<String>,
    pub actions: Vec<RowAction>,
}

#[derive(Debug, Default)]
pub struct TableView {
    state: TableState,
    header: Vec<HeaderCell>,
    /// Filter input text, one per column, positionally aligned with `header`.
    filter_inputs: Vec<String>,
    body: Vec<BodyRow>,
    header_builds: u64,
    body_builds: u64,
}

impl TableView {
    pub fn new() -> Self {
        Self { state: TableState::new(), ..Default::default() }
    }

    pub fn state(&self) -> &TableState {
        &self.state
    }

    pub fn header(&self) -> &[HeaderCell] {
        &self.header
    }

    pub fn filter_inputs(&self) -> &[String] {
        &self.filter_inputs
    }

    pub fn body(&self) -> &[BodyRow] {
        &self.body
    }

    pub fn has_actions(&self) -> bool {
        self.state.column_index(NAME_LABEL).is_some()
    }

    /// How many times header/filter rows and the body were built, in that order.
    pub fn build_counts(&self) -> (u64, u64) {
        (self.header_builds, self.body_builds)
    }

    pub fn ingest(&mut self, columns: Vec<String>, rows: Vec<ResultRow>) -> Ingest {
        let ingest = self.state.set_columns_and_rows(columns, rows);
        match ingest {
            Ingest::ShapeChange => self.rebuild(),
            Ingest::Refresh => self.refresh(),
        }
        ingest
    }

    pub fn clear(&mut self) {
        self.state.clear();
        self.rebuild();
    }

    pub fn click_header(&mut self, col: usize) {
        self.state.sort_by(col);
        self.refresh();
    }

    pub fn edit_filter(&mut self, col: usize, text: &str) {
        if col >= self.filter_inputs.len() {
            return;
        }
        self.filter_inputs[col] = text.to_string();
        self.state.set_filter(col, text);
        self.refresh();
    }

    pub fn status_text(&self) -> String {
        self.state.status_text()
    }

    fn rebuild(&mut self) {
        self.header = self
            .state
            .columns()
            .iter()
            .enumerate()
            .map(|(index, label)| HeaderCell { index, label: label.clone(), sort: None })
            .collect();
        self.filter_inputs = vec![String::new(); self.header.len()];
        self.header_builds += 1;
        self.refresh();
    }

    fn refresh(&mut self) {
        let active = self.state.sort_col();
        let indicator = if self.state.sort_ascending() { SortIndicator::Ascending } else { SortIndicator::Descending };
        for cell in &mut self.header {
            cell.sort = (active == Some(cell.index)).then_some(indicator);
        }
        let name_col = self.state.column_index(NAME_LABEL);
        let ns_col = self.state.column_index(NAMESPACE_LABEL);
        let rows = self.state.rows();
        self.body = self
            .state
            .visible_indices()
            .into_iter()
            .map(|source| {
                let row = &rows[source];
                BodyRow {
                    source,
                    cells: row.iter().map(|c| c.to_string()).collect(),
                    actions: row_actions(row, name_col, ns_col),
                }
            })
            .collect();
        self.body_builds += 1;
    }

    /// Plain-text rendering for terminals.
    pub fn render_text(&self) -> String {
        let headers: Vec<String> = self.header.iter().map(HeaderCell::text).collect();
        let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.body {
            for (i, c) in row.cells.iter().enumerate() {
                if let Some(w) = widths.get_mut(i) {
                    *w = (*w).max(c.chars().count());
                }
            }
        }
        let line = |cells: &[String]| {
            let padded: Vec<String> = cells
                .iter()
                .enumerate()
                .map(|(i, c)| format!("{:<w$}", c, w = widths.get(i).copied().unwrap_or(0)))
                .collect();
            padded.join("  ").trim_end().to_string()
        };
        let mut out = String::new();
        if !headers.is_empty() {
            out.push_str(&line(&headers));
            out.push('\n');
        }
        for row in &self.body {
            out.push_str(&line(&row.cells));
            out.push('\n');
        }
        out
    }
}

fn row_actions(row: &ResultRow, name_col: Option<usize>, ns_col: Option<usize>) -> Vec<RowAction> {
    let Some(name) = name_col.and_then(|i| row.get(i)).filter(|c| !c.is_null()) else {
        return Vec::new();
    };
    let namespace = ns_col.and_then(|i| row.get(i)).filter(|c| !c.is_null()).map(|c| c.to_string());
    vec![RowAction { label: OPEN_YAML, intent: Intent::OpenInstance { name: name.to_string(), namespace } }]
}
