use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use kindlens_core::protocol::{decode_intent, encode, HostEvent, Intent, ALL_NAMESPACES};
use kindlens_core::ResultRow;
use kindlens_schema::CrdDocument;
use metrics::{counter, histogram};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use crate::{CatalogProvider, DocumentOpener, HostConfig};

/// Channel carrying encoded [`HostEvent`]s to the view.
pub type EventSink = UnboundedSender<String>;

/// Answers view intents one at a time, in arrival order.
pub struct Host {
    provider: Arc<dyn CatalogProvider>,
    opener: Arc<dyn DocumentOpener>,
    config: HostConfig,
    current: Option<CrdDocument>,
    scope: Option<String>,
    raw_schema: Option<String>,
}

impl Host {
    pub fn new(provider: Arc<dyn CatalogProvider>, opener: Arc<dyn DocumentOpener>, config: HostConfig) -> Self {
        let scope = config.default_namespace.clone();
        Self { provider, opener, config, current: None, scope, raw_schema: None }
    }

    /// Drain intents until the view side hangs up.
    pub async fn run(mut self, mut intents: UnboundedReceiver<String>, events: EventSink) {
        info!("host: dispatch loop started");
        while let Some(raw) = intents.recv().await {
            let intent = match decode_intent(&raw) {
                Ok(i) => i,
                Err(e) => {
                    debug!(error = %e, "host: ignoring undecodable intent");
                    continue;
                }
            };
            if !self.handle(intent, &events).await {
                break;
            }
        }
        info!("host: dispatch loop ended");
    }

    /// Handle one intent. Returns false once the view is gone.
    pub async fn handle(&mut self, intent: Intent, events: &EventSink) -> bool {
        let t0 = Instant::now();
        let alive = match intent {
            Intent::Ready => self.on_ready(events).await,
            Intent::Select { name, token } => self.on_select(&name, token, events).await,
            Intent::SetScope { value, token } => {
                self.scope = (value != ALL_NAMESPACES && !value.is_empty()).then_some(value);
                emit(events, HostEvent::Clear { token }) && {
                    let ev = self.results(token).await;
                    emit(events, ev)
                }
            }
            Intent::OpenInstance { name, namespace } => {
                self.open_instance(&name, namespace.as_deref()).await;
                !events.is_closed()
            }
            Intent::OpenSchema => {
                match &self.raw_schema {
                    Some(text) => self.open_document(text),
                    None => debug!("host: no schema to open"),
                }
                !events.is_closed()
            }
        };
        histogram!("host_request_ms", t0.elapsed().as_millis() as f64);
        alive
    }

    async fn on_ready(&mut self, events: &EventSink) -> bool {
        let catalog = match self.provider.list_entries().await {
            Ok(entries) => {
                info!(entries = entries.len(), "host: catalog ready");
                HostEvent::Catalog { entries }
            }
            Err(e) => HostEvent::Error { message: e.to_string(), token: None },
        };
        let mut options = vec![ALL_NAMESPACES.to_string()];
        match self.provider.list_namespaces().await {
            Ok(ns) => options.extend(ns),
            Err(e) => warn!(error = %e, "host: namespaces unavailable; offering all namespaces only"),
        }
        let selected = self.scope.clone().unwrap_or_else(|| ALL_NAMESPACES.to_string());
        emit(events, catalog) && emit(events, HostEvent::Init { options, selected_option: Some(selected) })
    }

    async fn on_select(&mut self, key: &str, token: Option<u64>, events: &EventSink) -> bool {
        if !emit(events, HostEvent::Clear { token }) {
            return false;
        }
        let doc = match self.provider.get_schema(key).await {
            Ok(doc) => doc,
            Err(e) => {
                self.current = None;
                self.raw_schema = None;
                return emit(events, HostEvent::Error { message: e.to_string(), token });
            }
        };
        // a CRD without a published schema still renders, as an empty tree
        let details = doc.schema.clone().unwrap_or_else(|| serde_json::json!({}));
        let raw_text = serde_yaml::to_string(&details).unwrap_or_else(|e| {
            warn!(error = %e, "host: schema not representable as YAML");
            String::new()
        });
        self.raw_schema = Some(raw_text.clone());
        let data = HostEvent::ResourceData { details, description: doc.description.clone(), raw_text, token };
        self.current = Some(doc);
        if !emit(events, data) {
            return false;
        }
        let results = self.results(token).await;
        emit(events, results)
    }

    async fn results(&self, token: Option<u64>) -> HostEvent {
        let Some(doc) = &self.current else {
            return HostEvent::Results { columns: Vec::new(), rows: Vec::new(), status: "No kind selected".into(), token };
        };
        let namespace = if doc.namespaced { self.scope.as_deref() } else { None };
        match self.provider.list_instances(doc, namespace).await {
            Ok(objects) => {
                let projector = doc.projector();
                let now = Utc::now();
                let rows: Vec<ResultRow> = objects
                    .iter()
                    .take(self.config.max_rows)
                    .map(|o| projector.project(o, now))
                    .collect();
                let scope = match (doc.namespaced, namespace) {
                    (false, _) => "cluster",
                    (true, Some(ns)) => ns,
                    (true, None) => ALL_NAMESPACES,
                };
                let label = if doc.plural.is_empty() { doc.kind.as_str() } else { doc.plural.as_str() };
                let mut status = format!("{} {} in {}", objects.len(), label, scope);
                if rows.len() < objects.len() {
                    status.push_str(&format!(" (first {} shown)", rows.len()));
                }
                HostEvent::Results { columns: projector.column_labels(), rows, status, token }
            }
            Err(e) => HostEvent::Error { message: e.to_string(), token },
        }
    }

    async fn open_instance(&self, name: &str, namespace: Option<&str>) {
        let Some(doc) = &self.current else {
            debug!(name = %name, "host: open requested with no kind selected");
            return;
        };
        let text = match self.provider.get_instance(doc, name, namespace).await {
            Ok(obj) => serde_yaml::to_string(&obj),
            Err(e) => {
                warn!(name = %name, ns = ?namespace, error = %e, "host: instance fetch failed");
                return;
            }
        };
        match text {
            Ok(text) => self.open_document(&text),
            Err(e) => warn!(error = %e, "host: instance not representable as YAML"),
        }
    }

    fn open_document(&self, text: &str) {
        if let Err(e) = self.opener.open(text, "yaml") {
            warn!(error = %format!("{:#}", e), "host: document open failed");
        }
    }
}

fn emit(events: &EventSink, ev: HostEvent) -> bool {
    let command = ev.command();
    match encode(&ev) {
        Ok(json) => {
            counter!("host_events_sent", 1);
            if events.send(json).is_err() {
                debug!(command, "host: view disconnected");
                return false;
            }
        }
        Err(e) => warn!(command, error = %e, "host: failed to encode event"),
    }
    true
}
