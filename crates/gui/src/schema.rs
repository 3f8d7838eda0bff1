#![forbid(unsafe_code)]

use eframe::egui;

use super::{GuiAction, KindlensGuiApp};

const INDENT: f32 = 16.0;

impl KindlensGuiApp {
    pub(crate) fn ui_schema(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading("Schema");
            if ui.small_button("Expand all").clicked() {
                self.actions.push(GuiAction::ExpandAll);
            }
            if ui.small_button("Collapse all").clicked() {
                self.actions.push(GuiAction::CollapseAll);
            }
        });
        if let Some(d) = self.session.description() {
            ui.label(egui::RichText::new(d).weak());
        }
        ui.separator();
        let tree = self.session.tree();
        if tree.is_empty() {
            if self.session.is_loading() {
                ui.add(egui::Spinner::new());
            } else {
                ui.label(egui::RichText::new("No schema published for this kind").italics().weak());
            }
            return;
        }
        let warn = ui.visuals().warn_fg_color;
        let mut toggled = None;
        egui::ScrollArea::vertical().id_salt("schema_scroll").show(ui, |ui| {
            for line in tree.lines() {
                ui.horizontal(|ui| {
                    ui.add_space(line.depth as f32 * INDENT);
                    if line.expandable {
                        let glyph = if line.expanded { "▾" } else { "▸" };
                        if ui.small_button(glyph).clicked() {
                            toggled = Some(line.path.clone());
                        }
                    } else {
                        ui.add_space(INDENT);
                    }
                    ui.label(egui::RichText::new(&line.name).strong().monospace());
                    if line.required {
                        ui.label(egui::RichText::new("required").small().color(warn));
                    }
                    if !line.type_badge.is_empty() {
                        ui.label(egui::RichText::new(&line.type_badge).small().monospace().weak());
                    }
                    if line.unrenderable {
                        ui.label(egui::RichText::new("unrenderable").small().italics().color(warn));
                    }
                    if let Some(d) = &line.description {
                        let first = d.lines().next().unwrap_or_default();
                        ui.label(egui::RichText::new(first).weak()).on_hover_text(d.as_str());
                    }
                });
            }
        });
        if let Some(path) = toggled {
            self.actions.push(GuiAction::Toggle(path));
        }
    }
}
