#![forbid(unsafe_code)]

use eframe::egui;
use egui_table::{CellInfo, Column, HeaderCellInfo, HeaderRow, Table, TableDelegate};
use kindlens_view::{TableView, ACTIONS_LABEL};

use super::{GuiAction, KindlensGuiApp};

const ACTIONS_WIDTH: f32 = 90.0;
const MIN_COL_WIDTH: f32 = 70.0;
const CHAR_WIDTH: f32 = 8.0;

impl KindlensGuiApp {
    pub(crate) fn ui_results(&mut self, ui: &mut egui::Ui) {
        ui.heading("Instances");
        let table = self.session.table();
        if table.header().is_empty() {
            if self.session.is_loading() {
                ui.add(egui::Spinner::new());
            }
            return;
        }
        let lead = usize::from(table.has_actions());
        let mut cols: Vec<Column> = Vec::with_capacity(table.header().len() + lead);
        if lead == 1 {
            cols.push(Column::new(ACTIONS_WIDTH));
        }
        cols.extend(table.header().iter().map(|h| Column::new(column_width(table, h.index)).resizable(true)));
        let rows = table.body().len() as u64;
        let mut delegate = ResultsDelegate {
            table,
            lead,
            filter_buf: &mut self.filter_buf,
            actions: &mut self.actions,
        };
        Table::new()
            .id_salt("results_table")
            .headers(vec![HeaderRow::new(22.0), HeaderRow::new(24.0)])
            .num_sticky_cols(lead)
            .num_rows(rows)
            .columns(cols)
            .show(ui, &mut delegate);
        if rows == 0 && table.state().has_active_filters() {
            ui.label(egui::RichText::new("No matches").italics().weak());
        }
    }
}

/// Wide enough for the header and the longest visible cell, within reason.
fn column_width(table: &TableView, col: usize) -> f32 {
    let longest = table
        .body()
        .iter()
        .take(200)
        .filter_map(|r| r.cells.get(col))
        .map(|c| c.chars().count())
        .chain(table.header().get(col).map(|h| h.text().chars().count() + 2))
        .max()
        .unwrap_or(0);
    (longest as f32 * CHAR_WIDTH).clamp(MIN_COL_WIDTH, 420.0)
}

struct ResultsDelegate<'a> {
    table: &'a TableView,
    /// 1 when the leading actions column is shown.
    lead: usize,
    filter_buf: &'a mut Vec<String>,
    actions: &'a mut Vec<GuiAction>,
}

impl TableDelegate for ResultsDelegate<'_> {
    fn prepare(&mut self, _info: &egui_table::PrefetchInfo) {}

    fn header_cell_ui(&mut self, ui: &mut egui::Ui, cell: &HeaderCellInfo) {
        let col = cell.col_range.start as usize;
        let Some(data_col) = col.checked_sub(self.lead) else {
            if cell.row_nr == 0 {
                ui.label(egui::RichText::new(ACTIONS_LABEL).strong());
            }
            return;
        };
        let Some(header) = self.table.header().get(data_col) else { return };
        if cell.row_nr == 0 {
            let rect = ui.max_rect();
            ui.painter().rect_filled(rect, 0.0, ui.visuals().widgets.inactive.bg_fill);
            let active = header.sort.is_some();
            if ui.selectable_label(active, egui::RichText::new(header.text()).strong()).clicked() {
                self.actions.push(GuiAction::SortBy(data_col));
            }
            return;
        }
        let Some(buf) = self.filter_buf.get_mut(data_col) else { return };
        let te = egui::TextEdit::singleline(buf).hint_text("filter").desired_width(f32::INFINITY);
        if ui.add(te).changed() {
            self.actions.push(GuiAction::Filter(data_col, buf.clone()));
        }
    }

    fn cell_ui(&mut self, ui: &mut egui::Ui, cell: &CellInfo) {
        let row = cell.row_nr as usize;
        let Some(body) = self.table.body().get(row) else { return };
        if row % 2 == 0 {
            ui.painter().rect_filled(ui.max_rect(), 0.0, ui.visuals().faint_bg_color);
        }
        match (cell.col_nr as usize).checked_sub(self.lead) {
            None => {
                for (i, a) in body.actions.iter().enumerate() {
                    if ui.small_button(a.label).clicked() {
                        self.actions.push(GuiAction::RowAction { row, action: i });
                    }
                }
            }
            Some(col) => {
                if let Some(text) = body.cells.get(col) {
                    ui.label(egui::RichText::new(text).monospace());
                }
            }
        }
    }

    fn default_row_height(&self) -> f32 {
        20.0
    }
}
