#![forbid(unsafe_code)]

use eframe::egui;

use crate::KindlensGuiApp;

pub(crate) fn ui_statusbar(app: &mut KindlensGuiApp, ctx: &egui::Context) {
    egui::TopBottomPanel::bottom("bottom_bar")
        .default_height(24.0)
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                if app.session.is_loading() {
                    ui.add(egui::Spinner::new());
                }
                ui.label(app.session.status_line());
                if let Some(key) = app.session.selected() {
                    ui.separator();
                    ui.label(egui::RichText::new(key).monospace().weak());
                }
                if let Some(err) = app.session.error() {
                    ui.separator();
                    ui.label(egui::RichText::new(err).color(ui.visuals().warn_fg_color));
                }
            });
        });
}
