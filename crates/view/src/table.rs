//! Tabular data model: current columns and rows, with local sort and per-column filters.

use std::collections::BTreeMap;

use kindlens_core::{Cell, ResultRow};

/// What a call to [`TableState::set_columns_and_rows`] amounted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ingest {
    /// Column list differs: sort and filters were reset, header UI must be rebuilt.
    ShapeChange,
    /// Same columns, new rows: active sort reapplied, filters kept.
    Refresh,
}

#[derive(Debug, Clone, Default)]
pub struct TableState {
    columns: Vec<String>,
    /// Canonical row order; sorting rewrites it, filtering never does.
    rows: Vec<ResultRow>,
    sort_col: Option<usize>,
    sort_asc: bool,
    filters: BTreeMap<usize, String>,
}

static NULL_CELL: Cell = Cell::Null;

fn cell_at(row: &ResultRow, idx: usize) -> &Cell {
    row.get(idx).unwrap_or(&NULL_CELL)
}

impl TableState {
    pub fn new() -> Self {
        Self { sort_asc: true, ..Default::default() }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    pub fn sort_col(&self) -> Option<usize> {
        self.sort_col
    }

    pub fn sort_ascending(&self) -> bool {
        self.sort_asc
    }

    pub fn filter(&self, col: usize) -> &str {
        self.filters.get(&col).map(String::as_str).unwrap_or("")
    }

    pub fn has_active_filters(&self) -> bool {
        !self.filters.is_empty()
    }

    pub fn column_index(&self, label: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == label)
    }

    pub fn set_columns_and_rows(&mut self, columns: Vec<String>, rows: Vec<ResultRow>) -> Ingest {
        if columns != self.columns {
            self.columns = columns;
            self.rows = rows;
            self.sort_col = None;
            self.sort_asc = true;
            self.filters.clear();
            return Ingest::ShapeChange;
        }
        self.rows = rows;
        self.apply_sort();
        Ingest::Refresh
    }

    /// Same column toggles direction; a new column starts ascending. Out-of-range indices are ignored.
    pub fn sort_by(&mut self, col: usize) {
        if col >= self.columns.len() {
            return;
        }
        if self.sort_col == Some(col) {
            self.sort_asc = !self.sort_asc;
        } else {
            self.sort_col = Some(col);
            self.sort_asc = true;
        }
        self.apply_sort();
    }

    fn apply_sort(&mut self) {
        let Some(col) = self.sort_col else { return };
        let asc = self.sort_asc;
        // slice::sort_by is stable, equal keys keep their input order
        self.rows.sort_by(|a, b| {
            let ord = cell_at(a, col).sort_cmp(cell_at(b, col));
            if asc { ord } else { ord.reverse() }
        });
    }

    /// Empty text removes the filter for that column.
    pub fn set_filter(&mut self, col: usize, text: impl Into<String>) {
        if col >= self.columns.len() {
            return;
        }
        let text = text.into();
        if text.is_empty() {
            self.filters.remove(&col);
        } else {
            self.filters.insert(col, text);
        }
    }

    fn keeps(&self, row: &ResultRow, needles: &[(usize, String)]) -> bool {
        needles
            .iter()
            .all(|(col, needle)| cell_at(row, *col).to_string().to_lowercase().contains(needle.as_str()))
    }

    /// Indices into [`rows`](Self::rows) that pass every filter, in current sort order.
    pub fn visible_indices(&self) -> Vec<usize> {
        let needles: Vec<(usize, String)> = self.filters.iter().map(|(c, f)| (*c, f.to_lowercase())).collect();
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| self.keeps(row, &needles))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn visible_rows(&self) -> Vec<&ResultRow> {
        self.visible_indices().into_iter().map(|i| &self.rows[i]).collect()
    }

    /// Blank columns and rows, as on a `clear` event.
    pub fn clear(&mut self) {
        self.columns.clear();
        self.rows.clear();
        self.sort_col = None;
        self.sort_asc = true;
        self.filters.clear();
    }

    pub fn status_text(&self) -> String {
        format!("Showing {} of {}", self.visible_indices().len(), self.rows.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn row(name: &str, val: i64) -> ResultRow {
        vec![Cell::from(name), Cell::Int(val)]
    }

    fn names(t: &TableState) -> Vec<String> {
        t.visible_rows().iter().map(|r| r[0].to_string()).collect()
    }

    #[test]
    fn sort_then_toggle() {
        let mut t = TableState::new();
        t.set_columns_and_rows(cols(&["name", "val"]), vec![row("b", 2), row("a", 1)]);
        t.sort_by(0);
        assert_eq!(t.rows(), &[row("a", 1), row("b", 2)]);
        assert!(t.sort_ascending());
        t.sort_by(0);
        assert_eq!(t.rows(), &[row("b", 2), row("a", 1)]);
        assert!(!t.sort_ascending());
    }

    #[test]
    fn new_column_sorts_ascending() {
        let mut t = TableState::new();
        t.set_columns_and_rows(cols(&["name", "val"]), vec![row("a", 10), row("b", 9), row("c", 100)]);
        t.sort_by(0);
        t.sort_by(0);
        t.sort_by(1);
        assert_eq!(t.sort_col(), Some(1));
        assert!(t.sort_ascending());
        // numeric, not lexicographic
        assert_eq!(names(&t), vec!["b", "a", "c"]);
    }

    #[test]
    fn out_of_range_sort_is_ignored() {
        let mut t = TableState::new();
        t.set_columns_and_rows(cols(&["name"]), vec![vec![Cell::from("x")]]);
        t.sort_by(3);
        assert_eq!(t.sort_col(), None);
    }

    #[test]
    fn nulls_sort_as_empty_and_sort_is_stable() {
        let mut t = TableState::new();
        let rows = vec![
            vec![Cell::from("x"), Cell::from("b")],
            vec![Cell::from("y"), Cell::Null],
            vec![Cell::from("z"), Cell::from("b")],
            vec![Cell::from("w")],
        ];
        t.set_columns_and_rows(cols(&["name", "tag"]), rows);
        t.sort_by(1);
        assert_eq!(names(&t), vec!["y", "w", "x", "z"]);
    }

    #[test]
    fn substring_filter_is_case_insensitive() {
        let mut t = TableState::new();
        t.set_columns_and_rows(cols(&["name", "n"]), vec![row("Cat", 1), row("dog", 2), row("bat", 3)]);
        t.set_filter(0, "A");
        assert_eq!(names(&t), vec!["Cat", "bat"]);
        assert_eq!(t.rows().len(), 3);
        assert_eq!(t.status_text(), "Showing 2 of 3");
    }

    #[test]
    fn filters_are_anded() {
        let mut t = TableState::new();
        t.set_columns_and_rows(cols(&["name", "n"]), vec![row("cat", 1), row("dog", 2), row("bat", 13)]);
        t.set_filter(0, "at");
        t.set_filter(1, "3");
        assert_eq!(names(&t), vec!["bat"]);
        t.set_filter(1, "");
        assert_eq!(names(&t), vec!["cat", "bat"]);
    }

    #[test]
    fn empty_filters_are_identity_over_sorted_rows() {
        let mut t = TableState::new();
        t.set_columns_and_rows(cols(&["name", "n"]), vec![row("b", 1), row("c", 2), row("a", 3)]);
        t.sort_by(0);
        t.set_filter(0, "");
        let visible: Vec<ResultRow> = t.visible_rows().into_iter().cloned().collect();
        assert_eq!(visible, t.rows().to_vec());
    }

    #[test]
    fn shape_change_resets_sort_and_filters() {
        let mut t = TableState::new();
        assert_eq!(t.set_columns_and_rows(cols(&["a", "b"]), vec![row("x", 1)]), Ingest::ShapeChange);
        t.sort_by(1);
        t.set_filter(0, "x");
        let ingest = t.set_columns_and_rows(cols(&["a", "c"]), vec![row("y", 2)]);
        assert_eq!(ingest, Ingest::ShapeChange);
        assert_eq!(t.sort_col(), None);
        assert!(!t.has_active_filters());
        assert_eq!(names(&t), vec!["y"]);
    }

    #[test]
    fn refresh_keeps_filters_and_reapplies_sort() {
        let mut t = TableState::new();
        t.set_columns_and_rows(cols(&["name", "val"]), vec![row("a", 1)]);
        t.sort_by(1);
        t.sort_by(1);
        t.set_filter(0, "o");
        let ingest = t.set_columns_and_rows(cols(&["name", "val"]), vec![row("one", 1), row("two", 2), row("six", 6)]);
        assert_eq!(ingest, Ingest::Refresh);
        assert_eq!(t.sort_col(), Some(1));
        assert_eq!(names(&t), vec!["two", "one"]);
    }

    #[test]
    fn clear_blanks_everything() {
        let mut t = TableState::new();
        t.set_columns_and_rows(cols(&["name"]), vec![vec![Cell::from("x")]]);
        t.clear();
        assert!(t.columns().is_empty());
        assert!(t.rows().is_empty());
        assert_eq!(t.status_text(), "Showing 0 of 0");
    }
}
