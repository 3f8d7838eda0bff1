#![forbid(unsafe_code)]

use eframe::egui;
use kindlens_core::protocol::ALL_NAMESPACES;

use crate::{GuiAction, KindlensGuiApp};

pub(crate) fn ui_topbar(app: &mut KindlensGuiApp, ctx: &egui::Context) {
    egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
        ui.horizontal(|ui| {
            ui.strong("kindlens");
            ui.separator();
            let current = app.session.scope().unwrap_or(ALL_NAMESPACES).to_string();
            ui.add_enabled_ui(!app.session.scope_options().is_empty(), |ui| {
                egui::ComboBox::from_label("Scope")
                    .selected_text(current.as_str())
                    .show_ui(ui, |ui| {
                        for option in app.session.scope_options() {
                            let selected = *option == current;
                            if ui.selectable_label(selected, option.as_str()).clicked() && !selected {
                                app.actions.push(GuiAction::SetScope(option.clone()));
                            }
                        }
                    });
            });
            ui.separator();
            let has_schema = !app.session.raw_text().is_empty();
            if ui
                .add_enabled(has_schema, egui::Button::new("Raw YAML"))
                .on_hover_text("Show the schema as YAML")
                .clicked()
            {
                app.show_raw = !app.show_raw;
            }
            if ui
                .add_enabled(has_schema, egui::Button::new("Open schema"))
                .on_hover_text("Open the schema YAML in the editor")
                .clicked()
            {
                app.actions.push(GuiAction::OpenSchema);
            }
        });
    });
}
