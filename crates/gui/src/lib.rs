#![forbid(unsafe_code)]

use std::time::Duration;

use eframe::egui;
use kindlens_view::{NodePath, ViewSession};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::info;

mod nav;
mod results;
mod schema;
mod statusbar;
mod topbar;
mod util;

/// Upper bound on host messages applied per frame so a burst cannot stall painting.
const EVENTS_PER_FRAME: usize = 256;

/// Entry point used by the desktop binary. `events` carries encoded host events
/// addressed to `session`.
pub fn run_native(session: ViewSession, events: UnboundedReceiver<String>) -> eframe::Result<()> {
    let options = eframe::NativeOptions::default();
    let app = KindlensGuiApp::new(session, events);
    eframe::run_native("kindlens", options, Box::new(|_cc| Ok(Box::new(app))))
}

/// Everything a panel may ask the session to do. Panels only read the session
/// while painting and queue these; they are applied once the frame is laid out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum GuiAction {
    Select(String),
    SetScope(String),
    CatalogQuery(String),
    Toggle(NodePath),
    ExpandAll,
    CollapseAll,
    SortBy(usize),
    Filter(usize, String),
    RowAction { row: usize, action: usize },
    OpenSchema,
}

pub struct KindlensGuiApp {
    session: ViewSession,
    events: UnboundedReceiver<String>,
    /// Editable copies of the filter inputs, resynced when the header is rebuilt.
    filter_buf: Vec<String>,
    header_builds: u64,
    catalog_query: String,
    show_raw: bool,
    actions: Vec<GuiAction>,
}

impl KindlensGuiApp {
    pub fn new(mut session: ViewSession, events: UnboundedReceiver<String>) -> Self {
        session.start();
        info!("gui: view session started");
        Self {
            session,
            events,
            filter_buf: Vec::new(),
            header_builds: 0,
            catalog_query: String::new(),
            show_raw: false,
            actions: Vec::new(),
        }
    }

    fn sync_filter_buf(&mut self) {
        let (builds, _) = self.session.table().build_counts();
        if builds != self.header_builds {
            self.header_builds = builds;
            self.filter_buf = self.session.table().filter_inputs().to_vec();
        }
    }

    fn apply_actions(&mut self) {
        for action in std::mem::take(&mut self.actions) {
            match action {
                GuiAction::Select(key) => {
                    self.session.select(&key);
                }
                GuiAction::SetScope(value) => {
                    self.session.set_scope(&value);
                }
                GuiAction::CatalogQuery(q) => self.session.set_catalog_query(&q),
                GuiAction::Toggle(path) => self.session.toggle_node(&path),
                GuiAction::ExpandAll => self.session.expand_all(),
                GuiAction::CollapseAll => self.session.collapse_all(),
                GuiAction::SortBy(col) => self.session.click_header(col),
                GuiAction::Filter(col, text) => self.session.edit_filter(col, &text),
                GuiAction::RowAction { row, action } => {
                    self.session.trigger_row_action(row, action);
                }
                GuiAction::OpenSchema => {
                    self.session.open_schema();
                }
            }
        }
    }
}

impl eframe::App for KindlensGuiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let applied = self.session.pump(&mut self.events, EVENTS_PER_FRAME);
        self.sync_filter_buf();
        // host replies arrive without input events; keep polling at a modest cadence
        if applied > 0 || self.session.is_loading() {
            ctx.request_repaint_after(Duration::from_millis(16));
        } else {
            ctx.request_repaint_after(Duration::from_millis(250));
        }

        topbar::ui_topbar(self, ctx);
        statusbar::ui_statusbar(self, ctx);

        egui::SidePanel::left("catalog_panel")
            .resizable(true)
            .default_width(260.0)
            .show(ctx, |ui| self.ui_catalog(ui));

        egui::CentralPanel::default().show(ctx, |ui| {
            if let Some(err) = self.session.error() {
                ui.add_space(8.0);
                ui.label(egui::RichText::new(err).color(ui.visuals().error_fg_color));
                return;
            }
            if self.session.selected().is_none() {
                ui.label(egui::RichText::new("Select a kind to browse its schema and instances").italics().weak());
                return;
            }
            let avail = ui.available_height();
            egui::TopBottomPanel::top("schema_panel")
                .resizable(true)
                .default_height(avail * 0.45)
                .show_inside(ui, |ui| self.ui_schema(ui));
            self.ui_results(ui);
        });

        if self.show_raw {
            let mut open = self.show_raw;
            egui::Window::new("Schema YAML")
                .open(&mut open)
                .default_size([560.0, 480.0])
                .show(ctx, |ui| {
                    egui::ScrollArea::both().show(ui, |ui| {
                        let job = util::highlight::yaml_job(self.session.raw_text(), ui);
                        ui.label(job);
                    });
                });
            self.show_raw = open;
        }

        self.apply_actions();
    }
}
