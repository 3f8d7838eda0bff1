#![forbid(unsafe_code)]

use eframe::egui;
use egui::text::{LayoutJob, TextFormat};

use super::{GuiAction, KindlensGuiApp};
use crate::util::highlight_runs;

impl KindlensGuiApp {
    pub(crate) fn ui_catalog(&mut self, ui: &mut egui::Ui) {
        ui.heading("Kinds");
        ui.horizontal(|ui| {
            let te = egui::TextEdit::singleline(&mut self.catalog_query).hint_text("filter kinds…");
            if ui.add(te).changed() {
                self.actions.push(GuiAction::CatalogQuery(self.catalog_query.clone()));
            }
            if ui.button("×").on_hover_text("Clear filter").clicked() {
                self.catalog_query.clear();
                self.actions.push(GuiAction::CatalogQuery(String::new()));
            }
        });
        ui.separator();
        let catalog = self.session.catalog();
        if catalog.entries().is_empty() {
            ui.label(egui::RichText::new("Waiting for catalog…").italics().weak());
            return;
        }
        if catalog.matches().is_empty() {
            ui.label(egui::RichText::new("No matches").italics().weak());
            return;
        }
        let selected = self.session.selected();
        let hl = ui.visuals().selection.stroke.color;
        let normal = ui.visuals().text_color();
        let mut picked = None;
        egui::ScrollArea::vertical().id_salt("catalog_scroll").show(ui, |ui| {
            for m in catalog.matches() {
                let entry = &catalog.entries()[m.index];
                let mut job = LayoutJob::default();
                for (run, hit) in highlight_runs(&entry.kind, &m.hi_indices) {
                    let color = if hit { hl } else { normal };
                    job.append(&run, 0.0, TextFormat { color, ..Default::default() });
                }
                let is_sel = selected == Some(entry.display_key.as_str());
                let mut hover = entry.display_key.clone();
                if let Some(d) = &entry.description {
                    hover.push('\n');
                    hover.push_str(d);
                }
                if ui.selectable_label(is_sel, job).on_hover_text(hover).clicked() && !is_sel {
                    picked = Some(entry.display_key.clone());
                }
            }
        });
        if let Some(key) = picked {
            self.actions.push(GuiAction::Select(key));
        }
    }
}
