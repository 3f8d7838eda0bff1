//! The view session: one explicit owner for everything a view shows, driven by
//! inbound host events and local user actions.

use kindlens_core::protocol::{decode_event, HostEvent, Intent};
use kindlens_core::ResultRow;
use kindlens_schema::{TreeBuilder, DEFAULT_MAX_DEPTH};
use metrics::counter;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::{debug, info};

use crate::bridge::Bridge;
use crate::catalog::CatalogState;
use crate::grid::TableView;
use crate::table::Ingest;
use crate::tree::TreeView;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Ready,
    Loading,
    Populated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewConfig {
    pub tree_max_depth: usize,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self { tree_max_depth: DEFAULT_MAX_DEPTH }
    }
}

impl ViewConfig {
    pub fn from_env() -> Self {
        let tree_max_depth = std::env::var("KINDLENS_TREE_MAX_DEPTH")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_MAX_DEPTH);
        Self { tree_max_depth }
    }
}

pub struct ViewSession {
    bridge: Bridge,
    config: ViewConfig,
    phase: Phase,
    catalog: CatalogState,
    scope_options: Vec<String>,
    scope: Option<String>,
    selected: Option<String>,
    tree: TreeView,
    description: Option<String>,
    raw_text: String,
    table: TableView,
    host_status: String,
    error: Option<String>,
    /// Token of the latest `select`; schema payloads older than this are stale.
    select_token: u64,
    /// Token of the latest request of any kind; row payloads older than this are stale.
    latest_token: u64,
}

impl ViewSession {
    pub fn new(intents: UnboundedSender<String>, config: ViewConfig) -> Self {
        Self {
            bridge: Bridge::new(intents),
            config,
            phase: Phase::Uninitialized,
            catalog: CatalogState::new(),
            scope_options: Vec::new(),
            scope: None,
            selected: None,
            tree: TreeView::new(),
            description: None,
            raw_text: String::new(),
            table: TableView::new(),
            host_status: String::new(),
            error: None,
            select_token: 0,
            latest_token: 0,
        }
    }

    // ----------------- accessors -----------------

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_loading(&self) -> bool {
        self.phase == Phase::Loading
    }

    pub fn catalog(&self) -> &CatalogState {
        &self.catalog
    }

    pub fn scope_options(&self) -> &[String] {
        &self.scope_options
    }

    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn tree(&self) -> &TreeView {
        &self.tree
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn table(&self) -> &TableView {
        &self.table
    }

    pub fn has_results(&self) -> bool {
        !self.table.state().columns().is_empty()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Host summary plus the visible row count.
    pub fn status_line(&self) -> String {
        if self.is_loading() {
            return "Loading…".to_string();
        }
        let local = self.table.status_text();
        if self.host_status.is_empty() {
            local
        } else {
            format!("{} | {}", self.host_status, local)
        }
    }

    // ----------------- intents -----------------

    /// Announce the view to the host. Only the first call sends anything.
    pub fn start(&mut self) -> bool {
        if self.phase != Phase::Uninitialized {
            return false;
        }
        self.phase = Phase::Ready;
        info!("view: session started");
        self.bridge.post(&Intent::Ready)
    }

    /// Ask for the schema and rows of one catalog entry. Supersedes any earlier request.
    pub fn select(&mut self, display_key: &str) -> u64 {
        let token = self.bridge.issue_token();
        self.select_token = token;
        self.latest_token = token;
        self.selected = Some(display_key.to_string());
        self.tree.clear();
        self.description = None;
        self.raw_text.clear();
        self.begin_loading();
        self.bridge.post(&Intent::Select { name: display_key.to_string(), token: Some(token) });
        token
    }

    pub fn set_scope(&mut self, value: &str) -> u64 {
        let token = self.bridge.issue_token();
        self.latest_token = token;
        self.scope = Some(value.to_string());
        self.begin_loading();
        self.bridge.post(&Intent::SetScope { value: value.to_string(), token: Some(token) });
        token
    }

    fn begin_loading(&mut self) {
        self.table.clear();
        self.host_status.clear();
        self.error = None;
        self.phase = Phase::Loading;
    }

    /// Fire the `action`-th operation of the `row`-th visible row.
    pub fn trigger_row_action(&mut self, row: usize, action: usize) -> bool {
        let intent = match self.table.body().get(row).and_then(|r| r.actions.get(action)) {
            Some(a) => a.intent.clone(),
            None => return false,
        };
        self.bridge.post(&intent)
    }

    pub fn open_schema(&mut self) -> bool {
        if self.raw_text.is_empty() {
            return false;
        }
        self.bridge.post(&Intent::OpenSchema)
    }

    // ----------------- local-only actions -----------------

    pub fn set_catalog_query(&mut self, query: &str) {
        self.catalog.set_query(query);
    }

    pub fn toggle_node(&mut self, path: &[usize]) {
        self.tree.toggle(path);
    }

    pub fn expand_all(&mut self) {
        self.tree.expand_all();
    }

    pub fn collapse_all(&mut self) {
        self.tree.collapse_all();
    }

    pub fn click_header(&mut self, col: usize) {
        self.table.click_header(col);
    }

    pub fn edit_filter(&mut self, col: usize, text: &str) {
        self.table.edit_filter(col, text);
    }

    // ----------------- inbound -----------------

    /// Apply up to `budget` queued messages without blocking. Returns how many were read.
    pub fn pump(&mut self, events: &mut UnboundedReceiver<String>, budget: usize) -> usize {
        let mut n = 0;
        while n < budget {
            match events.try_recv() {
                Ok(raw) => {
                    self.handle_message(&raw);
                    n += 1;
                }
                Err(_) => break,
            }
        }
        n
    }

    /// Decode and apply one raw message. Desynced messages are dropped.
    pub fn handle_message(&mut self, raw: &str) -> bool {
        match decode_event(raw) {
            Ok(ev) => self.handle(ev),
            Err(e) => {
                debug!(error = %e, "view: ignoring undecodable message");
                counter!("view_events_ignored", 1);
                false
            }
        }
    }

    fn is_stale(&self, ev: &HostEvent) -> bool {
        let Some(token) = ev.token() else { return false };
        let floor = match ev {
            HostEvent::ResourceData { .. } => self.select_token,
            _ => self.latest_token,
        };
        token < floor
    }

    /// Apply one event. Returns false when it was ignored as stale.
    pub fn handle(&mut self, ev: HostEvent) -> bool {
        if self.is_stale(&ev) {
            debug!(command = ev.command(), token = ?ev.token(), latest = self.latest_token, "view: dropping stale event");
            counter!("view_events_ignored", 1);
            return false;
        }
        counter!("view_events_applied", 1);
        match ev {
            HostEvent::Init { options, selected_option } => {
                self.scope = selected_option.or_else(|| options.first().cloned());
                self.scope_options = options;
            }
            HostEvent::Catalog { entries } => {
                debug!(entries = entries.len(), "view: catalog received");
                self.catalog.set_entries(entries);
            }
            HostEvent::Clear { .. } => self.begin_loading(),
            HostEvent::Results { columns, rows, status, .. } => self.on_results(columns, rows, status),
            HostEvent::ResourceData { details, description, raw_text, .. } => {
                let roots = TreeBuilder::new(self.config.tree_max_depth).build(&details);
                self.tree.load(roots);
                self.description = description;
                self.raw_text = raw_text;
                self.phase = Phase::Populated;
            }
            HostEvent::Error { message, .. } => {
                info!(error = %message, "view: host reported an error");
                self.error = Some(message);
                self.phase = Phase::Populated;
            }
        }
        true
    }

    fn on_results(&mut self, columns: Vec<String>, rows: Vec<ResultRow>, status: String) {
        let n = rows.len();
        let ingest = self.table.ingest(columns, rows);
        if ingest == Ingest::ShapeChange {
            debug!(columns = self.table.header().len(), rows = n, "view: table shape changed");
        }
        self.host_status = status;
        self.error = None;
        self.phase = Phase::Populated;
    }
}
